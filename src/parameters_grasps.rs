//! Hardcoded grasps for a few classic configurations

pub mod grasps {
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};
    use crate::analysis::GraspAnalysis;
    use crate::contact::Contact;
    use crate::frame::ContactPose;
    use crate::wrench_traits::Dimensionality;

    /// Names accepted by [by_name].
    pub const PRESETS: [&str; 6] = [
        "trapezoid",
        "trapezoid_four",
        "block_frictionless",
        "block_friction",
        "block_tangential",
        "block_spatial",
    ];

    /// Default friction coefficient of the presets that have one.
    pub const DEFAULT_FRICTION: f64 = 0.5;

    // Trapezoid with vertices [1, -1], [3, 1], [-3, 1], [-1, -1]. Fingers at the midpoints of
    // the left side, the bottom and the right side, frame X along the outward normal.
    fn trapezoid_poses() -> Vec<ContactPose> {
        vec![
            ContactPose::planar(-2.0, 0.0, 5.0 * PI / 4.0),
            ContactPose::planar(0.0, -1.0, -FRAC_PI_2),
            ContactPose::planar(2.0, 0.0, -FRAC_PI_4),
        ]
    }

    // Square block 2 x 2: one finger below, two above
    fn block_poses() -> Vec<ContactPose> {
        vec![
            ContactPose::planar(0.0, -1.0, -FRAC_PI_2),
            ContactPose::planar(-1.0, 1.0, FRAC_PI_2),
            ContactPose::planar(1.0, 1.0, FRAC_PI_2),
        ]
    }

    /// Three fingers on the trapezoid. Not force closure for moderate friction.
    pub fn trapezoid(mu: f64) -> GraspAnalysis {
        let contacts = trapezoid_poses().into_iter().map(|p| Contact::with_friction(p, mu)).collect();
        GraspAnalysis::new(Dimensionality::Planar, contacts)
    }

    /// The trapezoid with a fourth finger in the middle of the top side.
    pub fn trapezoid_four(mu: f64) -> GraspAnalysis {
        let mut poses = trapezoid_poses();
        poses.push(ContactPose::planar(0.0, 1.0, FRAC_PI_2));
        let contacts = poses.into_iter().map(|p| Contact::with_friction(p, mu)).collect();
        GraspAnalysis::new(Dimensionality::Planar, contacts)
    }

    pub fn block_frictionless() -> GraspAnalysis {
        let contacts = block_poses().into_iter().map(Contact::frictionless).collect();
        GraspAnalysis::new(Dimensionality::Planar, contacts)
    }

    pub fn block_friction(mu: f64) -> GraspAnalysis {
        let contacts = block_poses().into_iter().map(|p| Contact::with_friction(p, mu)).collect();
        GraspAnalysis::new(Dimensionality::Planar, contacts)
    }

    /// Block with the bottom finger able to push sideways as well.
    pub fn block_tangential(mu: f64) -> GraspAnalysis {
        let poses = block_poses();
        let contacts = vec![
            Contact::tangential(poses[0], mu),
            Contact::frictionless(poses[1]),
            Contact::frictionless(poses[2]),
        ];
        GraspAnalysis::new(Dimensionality::Planar, contacts)
    }

    /// Cube 2 x 2 x 2, the block fingers placed in the z = 0 plane.
    pub fn block_spatial(mu: f64) -> GraspAnalysis {
        let contacts = vec![
            Contact::with_friction(ContactPose::spatial([0.0, -1.0, 0.0], [0.0, 0.0, -FRAC_PI_2]), mu),
            Contact::with_friction(ContactPose::spatial([-1.0, 1.0, 0.0], [0.0, 0.0, FRAC_PI_2]), mu),
            Contact::with_friction(ContactPose::spatial([1.0, 1.0, 0.0], [0.0, 0.0, FRAC_PI_2]), mu),
        ];
        GraspAnalysis::new(Dimensionality::Spatial, contacts)
    }

    /// Preset by name, with the given friction where the preset uses one.
    pub fn by_name(name: &str, mu: f64) -> Option<GraspAnalysis> {
        match name {
            "trapezoid" => Some(trapezoid(mu)),
            "trapezoid_four" => Some(trapezoid_four(mu)),
            "block_frictionless" => Some(block_frictionless()),
            "block_friction" => Some(block_friction(mu)),
            "block_tangential" => Some(block_tangential(mu)),
            "block_spatial" => Some(block_spatial(mu)),
            _ => None,
        }
    }

}
