//! Frame transforms for wrenches and twists.
//!
//! A contact frame is placed relative to the body (reference) frame by a translation and a
//! rotation. The operators built here move twists from the body frame into the contact
//! frame; their transposes move wrenches from the contact frame back into the body frame.
//!
//! In space the orientation is given by the fixed sequence `Rx(θx)·Ry(θy)·Rz(θz)`, in the
//! plane by a single angle about Z. The operators are pure functions of the pose, there is
//! nothing to fail for finite input.

use nalgebra::{DMatrix, Isometry3, Matrix3, Matrix6, Rotation3, Vector3};
use crate::grasp_error::GraspError;
use crate::wrench_traits::{Dimensionality, Wrench};

/// Elementary rotation about the X axis.
pub fn rot_x(theta: f64) -> Matrix3<f64> {
    let (st, ct) = theta.sin_cos();
    Matrix3::new(
        1.0, 0.0, 0.0,
        0.0, ct, -st,
        0.0, st, ct,
    )
}

/// Elementary rotation about the Y axis.
pub fn rot_y(theta: f64) -> Matrix3<f64> {
    let (st, ct) = theta.sin_cos();
    Matrix3::new(
        ct, 0.0, st,
        0.0, 1.0, 0.0,
        -st, 0.0, ct,
    )
}

/// Elementary rotation about the Z axis.
pub fn rot_z(theta: f64) -> Matrix3<f64> {
    let (st, ct) = theta.sin_cos();
    Matrix3::new(
        ct, -st, 0.0,
        st, ct, 0.0,
        0.0, 0.0, 1.0,
    )
}

/// Skew symmetric cross product matrix, `skew(r) * v == r.cross(v)`.
pub fn skew(r: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(
        0.0, -r.z, r.y,
        r.z, 0.0, -r.x,
        -r.y, r.x, 0.0,
    )
}

/// Planar twist map for a frame located at `(x, y)` and rotated by `theta` with respect to
/// the reference frame. Maps `(vx, vy, omega)` from the reference into the located frame.
pub fn planar_twist_map(x: f64, y: f64, theta: f64) -> Matrix3<f64> {
    let (st, ct) = theta.sin_cos();
    Matrix3::new(
        ct, st, x * st - y * ct,
        -st, ct, x * ct + y * st,
        0.0, 0.0, 1.0,
    )
}

/// Planar wrench map: `[fx, fy, mz]` in the located frame to the reference frame.
pub fn planar_wrench_map(x: f64, y: f64, theta: f64) -> Matrix3<f64> {
    planar_twist_map(x, y, theta).transpose()
}

/// Spatial twist map for a frame translated by `r` and then rotated by `orientation`.
/// Maps `(vx, vy, vz, wx, wy, wz)` from the reference into the located frame.
pub fn spatial_twist_map(r: &Vector3<f64>, orientation: &Matrix3<f64>) -> Matrix6<f64> {
    let upper_left = orientation.transpose();
    let upper_right = upper_left * skew(r).transpose();

    let mut map = Matrix6::zeros();
    map.fixed_view_mut::<3, 3>(0, 0).copy_from(&upper_left);
    map.fixed_view_mut::<3, 3>(0, 3).copy_from(&upper_right);
    map.fixed_view_mut::<3, 3>(3, 3).copy_from(&upper_left);
    map
}

/// Spatial wrench map, `[[A, 0], [skew(r)·A, A]]`. Maps a wrench expressed in the located
/// frame into the reference frame.
pub fn spatial_wrench_map(r: &Vector3<f64>, orientation: &Matrix3<f64>) -> Matrix6<f64> {
    spatial_twist_map(r, orientation).transpose()
}

/// Orientation for the sequence of elementary rotations `Rx(θx)·Ry(θy)·Rz(θz)`.
pub fn orientation_xyz(angles: &Vector3<f64>) -> Matrix3<f64> {
    rot_x(angles.x) * rot_y(angles.y) * rot_z(angles.z)
}

/// Inverse of [orientation_xyz], with `θy` in `[-π/2, π/2]`. At `θy = ±π/2` only the sum
/// or difference of the other two angles is defined, `θz` is then reported as zero.
pub fn xyz_angles(orientation: &Matrix3<f64>) -> Vector3<f64> {
    let sy = orientation[(0, 2)].clamp(-1.0, 1.0);
    let theta_y = sy.asin();
    if 1.0 - sy.abs() < 1e-12 {
        let theta_x = orientation[(2, 1)].atan2(orientation[(1, 1)]);
        return Vector3::new(theta_x, theta_y, 0.0);
    }
    let theta_x = (-orientation[(1, 2)]).atan2(orientation[(2, 2)]);
    let theta_z = (-orientation[(0, 1)]).atan2(orientation[(0, 0)]);
    Vector3::new(theta_x, theta_y, theta_z)
}

/// Pose of a contact frame relative to the body frame. Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactPose {
    Planar { x: f64, y: f64, theta: f64 },
    Spatial { translation: Vector3<f64>, orientation: Rotation3<f64> },
}

impl ContactPose {
    pub fn planar(x: f64, y: f64, theta: f64) -> Self {
        ContactPose::Planar { x, y, theta }
    }

    /// Spatial pose from translation and the `[θx, θy, θz]` rotation sequence.
    pub fn spatial(translation: [f64; 3], angles: [f64; 3]) -> Self {
        let orientation = orientation_xyz(&Vector3::from(angles));
        ContactPose::Spatial {
            translation: Vector3::from(translation),
            orientation: Rotation3::from_matrix_unchecked(orientation),
        }
    }

    /// Spatial pose from an isometry placing the contact frame in the body frame.
    pub fn from_isometry(isometry: &Isometry3<f64>) -> Self {
        ContactPose::Spatial {
            translation: isometry.translation.vector,
            orientation: isometry.rotation.to_rotation_matrix(),
        }
    }

    pub fn dimensionality(&self) -> Dimensionality {
        match self {
            ContactPose::Planar { .. } => Dimensionality::Planar,
            ContactPose::Spatial { .. } => Dimensionality::Spatial,
        }
    }

    /// Position of the contact in the body frame. Planar poses have zero Z.
    pub fn position(&self) -> Vector3<f64> {
        match self {
            ContactPose::Planar { x, y, .. } => Vector3::new(*x, *y, 0.0),
            ContactPose::Spatial { translation, .. } => *translation,
        }
    }

    /// Rotation angles: `[θ]` in the plane, `[θx, θy, θz]` in space.
    pub fn angles(&self) -> Vec<f64> {
        match self {
            ContactPose::Planar { theta, .. } => vec![*theta],
            ContactPose::Spatial { orientation, .. } => xyz_angles(orientation.matrix()).iter().copied().collect(),
        }
    }

    pub fn is_finite(&self) -> bool {
        match self {
            ContactPose::Planar { x, y, theta } =>
                x.is_finite() && y.is_finite() && theta.is_finite(),
            ContactPose::Spatial { translation, orientation } =>
                translation.iter().all(|v| v.is_finite())
                    && orientation.matrix().iter().all(|v| v.is_finite()),
        }
    }

    /// Operator taking a contact frame wrench into the body frame (3x3 or 6x6).
    pub fn wrench_map(&self) -> DMatrix<f64> {
        match self {
            ContactPose::Planar { x, y, theta } => {
                let map = planar_wrench_map(*x, *y, *theta);
                DMatrix::from_column_slice(3, 3, map.as_slice())
            }
            ContactPose::Spatial { translation, orientation } => {
                let map = spatial_wrench_map(translation, orientation.matrix());
                DMatrix::from_column_slice(6, 6, map.as_slice())
            }
        }
    }

    /// Operator taking a body frame twist into the contact frame, transpose of [Self::wrench_map].
    pub fn twist_map(&self) -> DMatrix<f64> {
        self.wrench_map().transpose()
    }

    /// Express a contact frame wrench in the body frame.
    pub fn transform_wrench(&self, local: &Wrench) -> Result<Wrench, GraspError> {
        self.check_length(local.len())?;
        Ok(self.wrench_map() * local)
    }

    /// Express a body frame twist in the contact frame.
    pub fn transform_twist(&self, body: &Wrench) -> Result<Wrench, GraspError> {
        self.check_length(body.len())?;
        Ok(self.twist_map() * body)
    }

    fn check_length(&self, found: usize) -> Result<(), GraspError> {
        let expected = self.dimensionality().wrench_dim();
        if found != expected {
            return Err(GraspError::InvalidInput(format!(
                "vector of length {} passed to a pose expecting {}", found, expected
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};
    use nalgebra::{DVector, Translation3, UnitQuaternion};

    const EPSILON: f64 = 1e-9;

    fn assert_vector_approx_eq(left: &DVector<f64>, right: &[f64]) {
        assert_eq!(left.len(), right.len());
        for i in 0..right.len() {
            assert!((left[i] - right[i]).abs() < EPSILON,
                    "left[{0}] = {1} is not approximately equal to right[{0}] = {2}", i, left[i], right[i]);
        }
    }

    #[test]
    fn test_skew_is_cross_product() {
        let r = Vector3::new(1.0, -2.0, 0.5);
        let v = Vector3::new(0.3, 0.7, -1.1);
        assert!((skew(&r) * v - r.cross(&v)).norm() < EPSILON);
        assert!((skew(&r) + skew(&r).transpose()).norm() < EPSILON);
    }

    #[test]
    fn test_planar_wrench_moment() {
        // Unit force along +Y applied at x = 2 produces mz = 2
        let pose = ContactPose::planar(2.0, 0.0, 0.0);
        let body = pose.transform_wrench(&DVector::from_vec(vec![0.0, 1.0, 0.0])).unwrap();
        assert_vector_approx_eq(&body, &[0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_planar_rotated_inward_normal() {
        // Contact at the bottom of a block, local X pointing down (outward)
        let pose = ContactPose::planar(0.0, -1.0, -FRAC_PI_2);
        let body = pose.transform_wrench(&DVector::from_vec(vec![-1.0, 0.0, 0.0])).unwrap();
        assert_vector_approx_eq(&body, &[0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_twist_map_is_transpose() {
        let pose = ContactPose::spatial([0.4, -0.2, 1.0], [0.1, 0.2, 0.3]);
        assert!((pose.twist_map() - pose.wrench_map().transpose()).norm() < EPSILON);
    }

    #[test]
    fn test_zero_translation_is_pure_rotation() {
        let map = spatial_wrench_map(&Vector3::zeros(), &orientation_xyz(&Vector3::new(0.5, -0.4, 1.2)));
        assert!(map.fixed_view::<3, 3>(3, 0).norm() < EPSILON);
        assert!(map.fixed_view::<3, 3>(0, 3).norm() < EPSILON);
        assert!((map.fixed_view::<3, 3>(0, 0) - map.fixed_view::<3, 3>(3, 3)).norm() < EPSILON);
    }

    #[test]
    fn test_spatial_contact_on_top() {
        // Finger at (1, 1, 0) with local Z rotated onto body +Y, pushing along local -Z (body -Y)
        let pose = ContactPose::spatial([1.0, 1.0, 0.0], [-FRAC_PI_2, 0.0, 0.0]);
        let local = DVector::from_vec(vec![0.0, 0.0, -1.0, 0.0, 0.0, 0.0]);
        let body = pose.transform_wrench(&local).unwrap();
        assert_vector_approx_eq(&body, &[0.0, -1.0, 0.0, 0.0, 0.0, -1.0]);
    }

    #[test]
    fn test_planar_matches_spatial_about_z() {
        let (x, y, theta) = (0.7, -1.3, 0.9);
        let planar = ContactPose::planar(x, y, theta).wrench_map();
        let spatial = ContactPose::spatial([x, y, 0.0], [0.0, 0.0, theta]).wrench_map();
        // Planar [fx, fy, mz] corresponds to spatial rows/columns 0, 1 and 5
        let idx = [0, 1, 5];
        for i in 0..3 {
            for j in 0..3 {
                assert!((planar[(i, j)] - spatial[(idx[i], idx[j])]).abs() < EPSILON);
            }
        }
    }

    #[test]
    fn test_from_isometry_matches_angles() {
        let angles = [0.0, 0.0, PI / 3.0];
        let by_angles = ContactPose::spatial([0.5, 0.5, 0.2], angles);
        let isometry = Isometry3::from_parts(
            Translation3::new(0.5, 0.5, 0.2),
            UnitQuaternion::from_euler_angles(0.0, 0.0, PI / 3.0),
        );
        let by_isometry = ContactPose::from_isometry(&isometry);
        assert!((by_angles.wrench_map() - by_isometry.wrench_map()).norm() < EPSILON);
    }

    #[test]
    fn test_wrong_length_rejected() {
        let pose = ContactPose::planar(0.0, 0.0, 0.0);
        let result = pose.transform_wrench(&DVector::zeros(6));
        assert!(matches!(result, Err(GraspError::InvalidInput(_))));
    }

    #[test]
    fn test_xyz_angles_round_trip() {
        for angles in [[0.3, -0.7, 1.9], [0.0, 0.0, -FRAC_PI_2], [-2.5, 1.2, 0.4], [0.4, FRAC_PI_2, 0.0]] {
            let recovered = xyz_angles(&orientation_xyz(&Vector3::from(angles)));
            let rebuilt = orientation_xyz(&recovered);
            assert!((rebuilt - orientation_xyz(&Vector3::from(angles))).norm() < EPSILON, "{:?}", angles);
        }
        let pose = ContactPose::spatial([0.0; 3], [0.3, -0.7, 1.9]);
        let angles = pose.angles();
        assert!((angles[0] - 0.3).abs() < EPSILON);
        assert!((angles[1] + 0.7).abs() < EPSILON);
        assert!((angles[2] - 1.9).abs() < EPSILON);
    }
}
