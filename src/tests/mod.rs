mod grasp_random;
