//! Grasp quality metric: the polytope of wrenches the contacts can apply with unit normal force
//! and the distance from the origin to its closest facet plane, the largest disturbance the
//! grasp is guaranteed to resist in every direction.

use nalgebra::DVector;
use tracing::{debug, warn};
use crate::contact::Sense;
use crate::grasp_error::GraspError;
use crate::grasp_matrix::GraspMatrix;
use crate::hull::{ConvexHull, Facet};
use crate::parameters::AnalysisConfig;
use crate::wrench_traits::{Dimensionality, Wrench, WrenchSource};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// How the candidate wrenches of all contacts are combined into one point set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Every candidate of every contact, as is.
    Union,
    /// One candidate per contact, summed, over all combinations (all contacts push at once).
    Minkowski,
}

/// Convex hull of the combined wrench points, in the scaled wrench space
/// (moment components divided by the torque scale).
#[derive(Debug, Clone, PartialEq)]
pub struct WrenchPolytope {
    strategy: Strategy,
    dimensionality: Dimensionality,
    torque_scale: f64,
    points: Vec<Wrench>,
    hull: ConvexHull,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityMetric {
    /// Smallest distance from the origin to a facet plane of the polytope.
    pub min_facet_distance: f64,
    /// True if the origin is strictly inside the polytope. Otherwise `min_facet_distance`
    /// is not a bound on anything.
    pub encloses_origin: bool,
    /// Points the hull was built from.
    pub points: usize,
    pub vertices: usize,
    pub facets: usize,
}

impl QualityMetric {
    /// The facet distance, only if it is meaningful.
    pub fn valid_distance(&self) -> Option<f64> {
        if self.encloses_origin { Some(self.min_facet_distance) } else { None }
    }
}

impl WrenchPolytope {
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn dimensionality(&self) -> Dimensionality {
        self.dimensionality
    }

    /// All combined points, scaled. Hull vertex and facet indices refer to this list.
    pub fn points(&self) -> &[Wrench] {
        &self.points
    }

    pub fn hull(&self) -> &ConvexHull {
        &self.hull
    }

    pub fn vertices(&self) -> Vec<&Wrench> {
        self.hull.vertices().iter().map(|&i| &self.points[i]).collect()
    }

    pub fn facets(&self) -> &[Facet] {
        self.hull.facets()
    }

    pub fn metric(&self) -> QualityMetric {
        QualityMetric {
            min_facet_distance: self.hull.min_facet_distance(),
            encloses_origin: self.hull.contains_origin(),
            points: self.points.len(),
            vertices: self.hull.vertices().len(),
            facets: self.hull.facets().len(),
        }
    }

    /// True if the body frame wrench is strictly inside the polytope.
    pub fn contains(&self, wrench: &Wrench) -> bool {
        wrench.len() == self.dimensionality.wrench_dim()
            && self.hull.contains(&scale_moments(wrench.clone(), self.dimensionality, self.torque_scale))
    }

    /// Largest `t` such that the wrench `t * direction` can still be produced by the grasp,
    /// `direction` given in the body frame. `None` if the polytope does not enclose the origin.
    pub fn resistance_along(&self, direction: &Wrench) -> Option<f64> {
        if direction.len() != self.dimensionality.wrench_dim() {
            return None;
        }
        self.hull.ray_exit(&scale_moments(direction.clone(), self.dimensionality, self.torque_scale))
    }
}

fn scale_moments(mut wrench: Wrench, dimensionality: Dimensionality, torque_scale: f64) -> Wrench {
    let forces = dimensionality.force_dim();
    let moments = dimensionality.wrench_dim() - forces;
    wrench.rows_mut(forces, moments).unscale_mut(torque_scale);
    wrench
}

/// Every sum `a + b` with `a` from `left` and `b` from `right`, the sum of `left[i]` and
/// `right[j]` landing at `i * right.len() + j`.
fn minkowski_pair(left: &[Wrench], right: &[Wrench]) -> Vec<Wrench> {
    #[cfg(feature = "parallel")]
    {
        left.par_iter()
            .flat_map(|a| right.par_iter().map(move |b| a + b))
            .collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        left.iter()
            .flat_map(|a| right.iter().map(move |b| a + b))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraspQualityEngine {
    pub tolerance: f64,
    pub torque_scale: f64,
    pub minkowski_limit: usize,
    pub prune_threshold: usize,
}

impl Default for GraspQualityEngine {
    fn default() -> Self {
        GraspQualityEngine::new(&AnalysisConfig::default())
    }
}

impl GraspQualityEngine {
    pub fn new(config: &AnalysisConfig) -> Self {
        GraspQualityEngine {
            tolerance: config.tolerance,
            torque_scale: config.torque_scale,
            minkowski_limit: config.minkowski_limit,
            prune_threshold: config.prune_threshold,
        }
    }

    /// Quality of the grasp formed by the given contacts.
    pub fn quality<S: WrenchSource>(&self, contacts: &[S], strategy: Strategy) -> Result<QualityMetric, GraspError> {
        Ok(self.polytope(contacts, strategy)?.metric())
    }

    pub fn polytope<S: WrenchSource>(&self, contacts: &[S], strategy: Strategy) -> Result<WrenchPolytope, GraspError> {
        let dimensionality = contacts.first()
            .ok_or_else(|| GraspError::InvalidInput("grasp has no contacts".to_string()))?
            .dimensionality();
        let grasp = GraspMatrix::assemble(contacts, dimensionality)?;
        self.polytope_of(&grasp, strategy)
    }

    /// Polytope of an already assembled grasp. Bisense columns contribute both signs.
    pub fn polytope_of(&self, grasp: &GraspMatrix, strategy: Strategy) -> Result<WrenchPolytope, GraspError> {
        if !(self.torque_scale.is_finite() && self.torque_scale > 0.0) {
            return Err(GraspError::InvalidInput(format!("torque_scale must be positive (got {})", self.torque_scale)));
        }
        let dimensionality = grasp.dimensionality();
        let sets = self.candidate_sets(grasp);
        let points = match strategy {
            Strategy::Union => sets.concat(),
            Strategy::Minkowski => self.minkowski_sum(&sets)?,
        };
        debug!("{:?} strategy: {} points from {} contacts", strategy, points.len(), sets.len());

        let hull = ConvexHull::build(&points, self.tolerance)?;
        let polytope = WrenchPolytope { strategy, dimensionality, torque_scale: self.torque_scale, points, hull };
        if !polytope.hull.contains_origin() {
            warn!("{:?} wrench polytope does not enclose the origin", strategy);
        }
        Ok(polytope)
    }

    /// Scaled candidate points of each contact, in column order.
    fn candidate_sets(&self, grasp: &GraspMatrix) -> Vec<Vec<Wrench>> {
        let dimensionality = grasp.dimensionality();
        let mut sets: Vec<Vec<Wrench>> = vec![Vec::new(); grasp.contact_count()];
        for (column, index) in grasp.columns().iter().enumerate() {
            let wrench = scale_moments(grasp.matrix().column(column).into_owned(), dimensionality, self.torque_scale);
            let set = &mut sets[index.contact];
            if index.sense == Sense::Bisense {
                set.push(-&wrench);
            }
            set.push(wrench);
        }
        sets
    }

    /// Minkowski sum of all sets, contact by contact. Partial sums larger than the prune
    /// threshold are replaced by their hull vertices, which leaves the final hull unchanged.
    fn minkowski_sum(&self, sets: &[Vec<Wrench>]) -> Result<Vec<Wrench>, GraspError> {
        let Some(first) = sets.first() else {
            return Ok(Vec::new());
        };
        let mut sum: Vec<Wrench> = first.clone();
        for (k, set) in sets.iter().enumerate().skip(1) {
            let next = sum.len().checked_mul(set.len()).unwrap_or(usize::MAX);
            if next > self.minkowski_limit {
                return Err(GraspError::CombinatorialLimit { points: next, limit: self.minkowski_limit });
            }
            sum = minkowski_pair(&sum, set);
            if sum.len() > self.prune_threshold && k + 1 < sets.len() {
                sum = self.prune(sum);
            }
        }
        Ok(sum)
    }

    /// Keep only hull vertices if the points span the space, otherwise keep all.
    fn prune(&self, points: Vec<Wrench>) -> Vec<Wrench> {
        match ConvexHull::build(&points, self.tolerance) {
            Ok(hull) => {
                debug!("pruned partial Minkowski sum from {} to {} points", points.len(), hull.vertices().len());
                hull.vertices().iter().map(|&i| points[i].clone()).collect()
            }
            Err(_) => points,
        }
    }
}

/// Wrench of the given components, convenience for queries.
pub fn wrench(components: &[f64]) -> Wrench {
    DVector::from_row_slice(components)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};
    use crate::contact::Contact;
    use crate::frame::ContactPose;
    use crate::grasp_error::DegeneracyKind;

    const EPSILON: f64 = 1e-6;

    fn trapezoid(mu: f64) -> Vec<Contact> {
        vec![
            Contact::with_friction(ContactPose::planar(-2.0, 0.0, 5.0 * PI / 4.0), mu),
            Contact::with_friction(ContactPose::planar(0.0, -1.0, -FRAC_PI_2), mu),
            Contact::with_friction(ContactPose::planar(2.0, 0.0, -FRAC_PI_4), mu),
        ]
    }

    fn block(mu: f64) -> Vec<Contact> {
        vec![
            Contact::with_friction(ContactPose::planar(0.0, -1.0, -FRAC_PI_2), mu),
            Contact::with_friction(ContactPose::planar(-1.0, 1.0, FRAC_PI_2), mu),
            Contact::with_friction(ContactPose::planar(1.0, 1.0, FRAC_PI_2), mu),
        ]
    }

    #[test]
    fn test_point_counts() {
        let engine = GraspQualityEngine::default();
        let union = engine.polytope(&trapezoid(0.5), Strategy::Union).unwrap();
        let minkowski = engine.polytope(&trapezoid(0.5), Strategy::Minkowski).unwrap();
        assert_eq!(union.points().len(), 6);
        assert_eq!(minkowski.points().len(), 8);
        // Combination order: first contact varies slowest
        let sets = engine.candidate_sets(&GraspMatrix::assemble(&trapezoid(0.5), Dimensionality::Planar).unwrap());
        let expected = &(&sets[0][1] + &sets[1][0]) + &sets[2][1];
        assert!((&minkowski.points()[5] - expected).norm() < 1e-12);
    }

    #[test]
    fn test_trapezoid_does_not_enclose() {
        let engine = GraspQualityEngine::default();
        let union = engine.quality(&trapezoid(0.5), Strategy::Union).unwrap();
        assert!(!union.encloses_origin);
        assert!(union.valid_distance().is_none());

        let minkowski = engine.quality(&trapezoid(0.5), Strategy::Minkowski).unwrap();
        assert!(!minkowski.encloses_origin);
        assert!((minkowski.min_facet_distance - 0.2).abs() < EPSILON);
    }

    #[test]
    fn test_block_union_encloses() {
        let engine = GraspQualityEngine::default();
        let polytope = engine.polytope(&block(0.5), Strategy::Union).unwrap();
        let metric = polytope.metric();
        assert!(metric.encloses_origin);
        let expected = 1.0 / 5f64.sqrt();
        assert!((metric.valid_distance().unwrap() - expected).abs() < EPSILON);

        assert!(polytope.contains(&wrench(&[0.0, 0.0, 0.0])));
        assert!(polytope.contains(&wrench(&[0.1, 0.1, 0.1])));
        assert!(!polytope.contains(&wrench(&[2.0, 0.0, 0.0])));

        let fx = polytope.resistance_along(&wrench(&[1.0, 0.0, 0.0])).unwrap();
        assert!((fx - expected).abs() < EPSILON);
        let fy = polytope.resistance_along(&wrench(&[0.0, 1.0, 0.0])).unwrap();
        assert!((fy - 2.0 * expected).abs() < EPSILON);
    }

    #[test]
    fn test_common_half_space_never_encloses() {
        // All contacts push the block upwards
        let contacts = vec![
            Contact::with_friction(ContactPose::planar(-1.0, -1.0, -FRAC_PI_2), 0.5),
            Contact::with_friction(ContactPose::planar(1.0, -1.0, -FRAC_PI_2 - 0.3), 0.5),
            Contact::with_friction(ContactPose::planar(0.5, -1.0, -FRAC_PI_2 + 0.2), 0.5),
        ];
        let engine = GraspQualityEngine::default();
        for strategy in [Strategy::Union, Strategy::Minkowski] {
            assert!(!engine.quality(&contacts, strategy).unwrap().encloses_origin);
        }
    }

    #[test]
    fn test_single_contact_is_degenerate() {
        let engine = GraspQualityEngine::default();
        let single = vec![Contact::frictionless(ContactPose::planar(0.0, -1.0, -FRAC_PI_2))];
        match engine.quality(&single, Strategy::Union) {
            Err(GraspError::DegenerateGeometry { kind, points, .. }) => {
                assert_eq!(kind, DegeneracyKind::InsufficientPoints);
                assert_eq!(points, 1);
            }
            other => panic!("expected degenerate geometry, got {:?}", other),
        }
    }

    #[test]
    fn test_block_minkowski_is_flat() {
        // Total normal force along y is the same for every combination
        let engine = GraspQualityEngine::default();
        let result = engine.quality(&block(0.5), Strategy::Minkowski);
        assert!(matches!(result, Err(ref e) if e.is_degenerate_geometry()), "{:?}", result);
    }

    #[test]
    fn test_quality_is_idempotent() {
        let engine = GraspQualityEngine::default();
        for strategy in [Strategy::Union, Strategy::Minkowski] {
            let a = engine.polytope(&trapezoid(0.3), strategy).unwrap();
            let b = engine.polytope(&trapezoid(0.3), strategy).unwrap();
            assert_eq!(a, b);
            assert_eq!(a.metric().min_facet_distance.to_bits(), b.metric().min_facet_distance.to_bits());
        }
    }

    #[test]
    fn test_minkowski_limit() {
        let engine = GraspQualityEngine { minkowski_limit: 4, ..Default::default() };
        match engine.quality(&trapezoid(0.5), Strategy::Minkowski) {
            Err(GraspError::CombinatorialLimit { points, limit }) => assert_eq!((points, limit), (8, 4)),
            other => panic!("expected combinatorial limit, got {:?}", other),
        }
        // Union is not affected by the limit
        assert!(engine.quality(&trapezoid(0.5), Strategy::Union).is_ok());
    }

    #[test]
    fn test_pruning_keeps_the_hull() {
        let contacts = vec![
            Contact::with_friction(ContactPose::planar(-2.0, 0.0, 5.0 * PI / 4.0), 0.5),
            Contact::with_friction(ContactPose::planar(0.0, -1.0, -FRAC_PI_2), 0.5),
            Contact::tangential(ContactPose::planar(2.0, 0.0, -FRAC_PI_4), 0.5),
            Contact::with_friction(ContactPose::planar(0.0, 1.0, FRAC_PI_2), 0.5),
        ];
        let full = GraspQualityEngine::default().quality(&contacts, Strategy::Minkowski).unwrap();
        let pruned = GraspQualityEngine { prune_threshold: 4, ..Default::default() }
            .quality(&contacts, Strategy::Minkowski).unwrap();
        assert_eq!(full.points, 2 * 2 * 3 * 2);
        assert!(pruned.points <= full.points);
        assert_eq!(full.encloses_origin, pruned.encloses_origin);
        assert!((full.min_facet_distance - pruned.min_facet_distance).abs() < EPSILON);
    }

    #[test]
    fn test_torque_scale() {
        let unit = GraspQualityEngine::default().polytope(&block(0.5), Strategy::Union).unwrap();
        let scaled = GraspQualityEngine { torque_scale: 2.0, ..Default::default() }
            .polytope(&block(0.5), Strategy::Union).unwrap();
        for (u, s) in unit.points().iter().zip(scaled.points()) {
            assert_eq!(u[0], s[0]);
            assert_eq!(u[1], s[1]);
            assert!((u[2] - 2.0 * s[2]).abs() < 1e-12);
        }
        // Queries take body frame wrenches, so resistance does not depend on the scale
        for direction in [wrench(&[1.0, 0.0, 0.0]), wrench(&[0.0, 0.0, 1.0]), wrench(&[0.3, -0.2, 0.7])] {
            let a = unit.resistance_along(&direction).unwrap();
            let b = scaled.resistance_along(&direction).unwrap();
            assert!((a - b).abs() < EPSILON);
        }
    }
}
