
#[cfg(test)]
mod tests {
    extern crate rand;

    use std::f64::consts::PI;
    use rand::{Rng, SeedableRng};
    use rand::rngs::StdRng;
    use crate::contact::{Contact, Sense};
    use crate::force_closure::ForceClosureSolver;
    use crate::frame::ContactPose;
    use crate::grasp_matrix::GraspMatrix;
    use crate::quality::{GraspQualityEngine, Strategy};
    use crate::wrench_traits::Dimensionality;

    const TOLERANCE: f64 = 1e-6;
    const CASES: usize = 64;

    // Random contact on the boundary of the unit disk, frame X pointing outwards
    fn random_planar_contact(rng: &mut StdRng) -> Contact {
        let angle: f64 = rng.gen_range(-PI..PI);
        let pose = ContactPose::planar(angle.cos(), angle.sin(), angle);
        let mu: f64 = if rng.gen_bool(0.3) { 0.0 } else { rng.gen_range(0.05..1.0) };
        if rng.gen_bool(0.2) {
            Contact::tangential(pose, mu)
        } else {
            Contact::with_friction(pose, mu)
        }
    }

    fn random_spatial_contact(rng: &mut StdRng) -> Contact {
        let translation = [rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)];
        let angles = [rng.gen_range(-PI..PI), rng.gen_range(-PI..PI), rng.gen_range(-PI..PI)];
        let mu: f64 = if rng.gen_bool(0.2) { 0.0 } else { rng.gen_range(0.1..0.8) };
        Contact::with_friction(ContactPose::spatial(translation, angles), mu).with_cone_sides(rng.gen_range(3..7))
    }

    #[test]
    fn test_rank_gates_feasibility_planar() {
        let mut rng = StdRng::seed_from_u64(42);
        let solver = ForceClosureSolver::default();
        for case in 0..CASES {
            let n = rng.gen_range(1..5);
            let contacts: Vec<Contact> = (0..n).map(|_| random_planar_contact(&mut rng)).collect();
            let grasp = GraspMatrix::assemble(&contacts, Dimensionality::Planar).unwrap();
            let result = solver.analyze(&grasp, &ForceClosureSolver::uniform_weights(&grasp)).unwrap();

            assert_eq!(result.rank, grasp.rank(TOLERANCE), "case {}", case);
            if result.rank < 3 {
                assert!(!result.is_full_rank && !result.is_feasible, "case {}", case);
            }
            if let Some(k) = &result.coefficients {
                for (column, index) in grasp.columns().iter().enumerate() {
                    if index.sense == Sense::Unisense {
                        assert!(k[column] >= 1.0 - TOLERANCE, "case {}: k[{}] = {}", case, column, k[column]);
                    }
                }
                assert!((grasp.matrix() * k).norm() < 1e-5, "case {}", case);
            }
        }
    }

    #[test]
    fn test_rank_gates_feasibility_spatial() {
        let mut rng = StdRng::seed_from_u64(7);
        let solver = ForceClosureSolver::default();
        for case in 0..CASES / 2 {
            let n = rng.gen_range(1..4);
            let contacts: Vec<Contact> = (0..n).map(|_| random_spatial_contact(&mut rng)).collect();
            let grasp = GraspMatrix::assemble(&contacts, Dimensionality::Spatial).unwrap();
            let result = solver.analyze(&grasp, &ForceClosureSolver::uniform_weights(&grasp)).unwrap();
            if result.rank < 6 {
                assert!(!result.is_full_rank && !result.is_feasible, "case {}", case);
                assert!(result.coefficients.is_none());
            }
        }
    }

    #[test]
    fn test_column_count_and_order() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..CASES {
            let n = rng.gen_range(1..6);
            let contacts: Vec<Contact> = (0..n).map(|_| random_planar_contact(&mut rng)).collect();
            let grasp = GraspMatrix::assemble(&contacts, Dimensionality::Planar).unwrap();
            let expected: usize = contacts.iter().map(|c| c.candidate_count()).sum();
            assert_eq!(grasp.ncols(), expected);

            let mut column = 0;
            for (i, contact) in contacts.iter().enumerate() {
                for candidate in 0..contact.candidate_count() {
                    assert_eq!(grasp.column_of(i, candidate), Some(column));
                    column += 1;
                }
            }
        }
    }

    #[test]
    fn test_enclosing_union_means_force_closure() {
        let mut rng = StdRng::seed_from_u64(2024);
        let solver = ForceClosureSolver::default();
        let engine = GraspQualityEngine::default();
        let mut enclosing = 0;
        for case in 0..CASES {
            let n = rng.gen_range(2..5);
            let contacts: Vec<Contact> = (0..n)
                .map(|_| {
                    let angle: f64 = rng.gen_range(-PI..PI);
                    let pose = ContactPose::planar(angle.cos(), angle.sin(), angle);
                    Contact::with_friction(pose, rng.gen_range(0.1..1.0))
                })
                .collect();
            let metric = match engine.quality(&contacts, Strategy::Union) {
                Ok(metric) => metric,
                Err(err) => {
                    assert!(err.is_degenerate_geometry(), "case {}: {}", case, err);
                    continue;
                }
            };
            if metric.encloses_origin && metric.min_facet_distance > 1e-3 {
                enclosing += 1;
                let grasp = GraspMatrix::assemble(&contacts, Dimensionality::Planar).unwrap();
                let result = solver.analyze(&grasp, &ForceClosureSolver::uniform_weights(&grasp)).unwrap();
                assert!(result.is_force_closure(), "case {}", case);
            }
        }
        assert!(enclosing > 0);
    }

    #[test]
    fn test_union_and_minkowski_sizes() {
        let mut rng = StdRng::seed_from_u64(11);
        let engine = GraspQualityEngine::default();
        for _ in 0..CASES / 4 {
            let n = rng.gen_range(2..5);
            let contacts: Vec<Contact> = (0..n)
                .map(|_| {
                    let angle: f64 = rng.gen_range(-PI..PI);
                    Contact::with_friction(ContactPose::planar(angle.cos(), angle.sin(), angle), 0.5)
                })
                .collect();
            let union = engine.polytope(&contacts, Strategy::Union);
            let minkowski = engine.polytope(&contacts, Strategy::Minkowski);
            if let Ok(union) = union {
                assert_eq!(union.points().len(), 2 * n);
            }
            if let Ok(minkowski) = minkowski {
                assert_eq!(minkowski.points().len(), 1 << n);
                // Repeated construction gives the same polytope
                assert_eq!(engine.polytope(&contacts, Strategy::Minkowski).unwrap(), minkowski);
            }
        }
    }
}
