//! Contact models and the admissible wrenches they produce.
//!
//! Every contact frame has its local X axis along the outward surface normal, so the
//! pushing (inward) normal force acts along local -X. Candidates are generated with unit
//! force magnitude in the contact frame and then mapped into the body frame.

use std::f64::consts::PI;
use nalgebra::DVector;
use crate::frame::ContactPose;
use crate::grasp_error::GraspError;
use crate::wrench_traits::{Dimensionality, Wrench, WrenchSource};

/// Sides of the polygon approximating a spatial friction cone unless configured otherwise.
pub const DEFAULT_CONE_SIDES: usize = 8;

/// Fewest sides a spatial friction cone polygon may have.
pub const MIN_CONE_SIDES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactModel {
    /// Single inward normal force.
    Frictionless,
    /// Coulomb point contact, friction cone approximated by its edges.
    PointWithFriction,
    /// Inward normal force plus tangential forces of either sign. The tangential magnitude is
    /// not limited by the friction coefficient; only its presence depends on it.
    TangentialFriction,
}

/// Sign restriction of a candidate's coefficient in the grasp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sense {
    /// Coefficient must be positive (pushing only).
    Unisense,
    /// Coefficient may take either sign (tangential friction).
    Bisense,
}

/// One admissible wrench direction of a contact.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateWrench {
    pub wrench: Wrench,
    pub sense: Sense,
}

impl CandidateWrench {
    pub fn unisense(wrench: Wrench) -> Self {
        CandidateWrench { wrench, sense: Sense::Unisense }
    }

    pub fn bisense(wrench: Wrench) -> Self {
        CandidateWrench { wrench, sense: Sense::Bisense }
    }
}

/// Contact of a finger with the grasped body.
#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
    pub pose: ContactPose,

    /// Coulomb friction coefficient, zero or positive.
    pub friction: f64,

    pub model: ContactModel,

    /// Polygon sides for the spatial friction cone. Ignored in the plane where the cone
    /// has exactly two edges. `None` takes the analysis default.
    pub cone_sides: Option<usize>,
}

impl Contact {
    pub fn frictionless(pose: ContactPose) -> Self {
        Contact { pose, friction: 0.0, model: ContactModel::Frictionless, cone_sides: None }
    }

    pub fn with_friction(pose: ContactPose, friction: f64) -> Self {
        Contact { pose, friction, model: ContactModel::PointWithFriction, cone_sides: None }
    }

    pub fn tangential(pose: ContactPose, friction: f64) -> Self {
        Contact { pose, friction, model: ContactModel::TangentialFriction, cone_sides: None }
    }

    pub fn with_cone_sides(mut self, cone_sides: usize) -> Self {
        self.cone_sides = Some(cone_sides);
        self
    }

    /// Fill in the cone sides unless set on this contact.
    pub fn with_default_cone_sides(mut self, cone_sides: usize) -> Self {
        self.cone_sides.get_or_insert(cone_sides);
        self
    }

    /// Sides of the spatial friction cone actually used.
    pub fn cone_sides(&self) -> usize {
        self.cone_sides.unwrap_or(DEFAULT_CONE_SIDES)
    }

    /// Friction cone half-angle, `atan(mu)`.
    pub fn half_angle(&self) -> f64 {
        self.friction.atan()
    }

    /// Model actually used: any friction model without friction degrades to frictionless.
    pub fn effective_model(&self) -> ContactModel {
        if self.friction == 0.0 {
            ContactModel::Frictionless
        } else {
            self.model
        }
    }

    pub fn validate(&self) -> Result<(), GraspError> {
        if !self.friction.is_finite() || self.friction < 0.0 {
            return Err(GraspError::InvalidInput(format!(
                "friction coefficient must be finite and not negative (got {})", self.friction
            )));
        }
        if !self.pose.is_finite() {
            return Err(GraspError::InvalidInput("contact pose must be finite".to_string()));
        }
        if self.pose.dimensionality() == Dimensionality::Spatial
            && self.effective_model() == ContactModel::PointWithFriction
            && self.cone_sides() < MIN_CONE_SIDES
        {
            return Err(GraspError::InvalidInput(format!(
                "friction cone needs at least {} sides (got {})", MIN_CONE_SIDES, self.cone_sides()
            )));
        }
        Ok(())
    }

    /// Number of candidates [Self::local_candidates] produces.
    pub fn candidate_count(&self) -> usize {
        let spatial = self.pose.dimensionality() == Dimensionality::Spatial;
        match (self.effective_model(), spatial) {
            (ContactModel::Frictionless, _) => 1,
            (ContactModel::PointWithFriction, false) => 2,
            (ContactModel::PointWithFriction, true) => self.cone_sides(),
            (ContactModel::TangentialFriction, false) => 2,
            (ContactModel::TangentialFriction, true) => 3,
        }
    }

    /// Candidates expressed in the contact frame.
    pub fn local_candidates(&self) -> Result<Vec<CandidateWrench>, GraspError> {
        self.validate()?;
        let dim = self.pose.dimensionality().wrench_dim();
        let spatial = self.pose.dimensionality() == Dimensionality::Spatial;
        let force = |components: &[f64]| {
            let mut w = DVector::zeros(dim);
            w.rows_mut(0, components.len()).copy_from_slice(components);
            w
        };

        let candidates = match self.effective_model() {
            ContactModel::Frictionless => vec![CandidateWrench::unisense(force(&[-1.0]))],
            ContactModel::PointWithFriction => {
                let (sin_phi, cos_phi) = self.half_angle().sin_cos();
                if spatial {
                    let sides = self.cone_sides();
                    (0..sides)
                        .map(|k| {
                            let alpha = 2.0 * PI * k as f64 / sides as f64;
                            let (sa, ca) = alpha.sin_cos();
                            CandidateWrench::unisense(force(&[-cos_phi, sin_phi * ca, sin_phi * sa]))
                        })
                        .collect()
                } else {
                    // Left and right edges of the planar cone
                    vec![
                        CandidateWrench::unisense(force(&[-cos_phi, -sin_phi])),
                        CandidateWrench::unisense(force(&[-cos_phi, sin_phi])),
                    ]
                }
            }
            ContactModel::TangentialFriction => {
                let mut candidates = vec![
                    CandidateWrench::unisense(force(&[-1.0])),
                    CandidateWrench::bisense(force(&[0.0, 1.0])),
                ];
                if spatial {
                    candidates.push(CandidateWrench::bisense(force(&[0.0, 0.0, 1.0])));
                }
                candidates
            }
        };
        Ok(candidates)
    }
}

impl WrenchSource for Contact {
    fn dimensionality(&self) -> Dimensionality {
        self.pose.dimensionality()
    }

    /// Candidates mapped into the body frame.
    fn candidates(&self) -> Result<Vec<CandidateWrench>, GraspError> {
        let map = self.pose.wrench_map();
        Ok(self.local_candidates()?
            .into_iter()
            .map(|c| CandidateWrench { wrench: &map * c.wrench, sense: c.sense })
            .collect())
    }
}
