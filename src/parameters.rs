//! Defines the analysis configuration

use crate::contact::{DEFAULT_CONE_SIDES, MIN_CONE_SIDES};
use crate::grasp_error::GraspError;

/// Numeric settings shared by the force closure solver and the quality engine.
/// See [parameters_grasps.rs](parameters_grasps.rs) for ready made grasps to analyze.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisConfig {
    /// Absolute tolerance for singular values (rank), for snapping solver output to zero
    /// and for hull plane side tests.
    pub tolerance: f64,

    /// Lower bound on every pushing (unisense) coefficient. Any positive value excludes the
    /// trivial all-zero solution; it scales the coefficients but not the verdict.
    pub min_coefficient: f64,

    /// Optional upper bound on coefficient magnitudes.
    pub max_coefficient: Option<f64>,

    /// Sides of the polygon approximating spatial friction cones.
    pub cone_sides: usize,

    /// Characteristic length dividing the moment components before the quality hull is built.
    /// 1.0 weights forces and moments equally.
    pub torque_scale: f64,

    /// Most points a Minkowski sum may produce.
    pub minkowski_limit: usize,

    /// Partial Minkowski sums larger than this are reduced to their hull vertices.
    pub prune_threshold: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            tolerance: 1e-6,
            min_coefficient: 1.0,
            max_coefficient: None,
            cone_sides: DEFAULT_CONE_SIDES,
            torque_scale: 1.0,
            minkowski_limit: 250_000,
            prune_threshold: 4_096,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), GraspError> {
        let invalid = |msg: String| Err(GraspError::InvalidInput(msg));
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return invalid(format!("tolerance must be positive (got {})", self.tolerance));
        }
        if !(self.min_coefficient.is_finite() && self.min_coefficient > 0.0) {
            return invalid(format!("min_coefficient must be positive (got {})", self.min_coefficient));
        }
        if let Some(max) = self.max_coefficient {
            if !(max >= self.min_coefficient) {
                return invalid(format!(
                    "max_coefficient {} is below min_coefficient {}", max, self.min_coefficient
                ));
            }
        }
        if self.cone_sides < MIN_CONE_SIDES {
            return invalid(format!("cone_sides must be at least {} (got {})", MIN_CONE_SIDES, self.cone_sides));
        }
        if !(self.torque_scale.is_finite() && self.torque_scale > 0.0) {
            return invalid(format!("torque_scale must be positive (got {})", self.torque_scale));
        }
        if self.minkowski_limit == 0 {
            return invalid("minkowski_limit must not be zero".to_string());
        }
        Ok(())
    }

    /// Convert to string yaml representation (quick viewing, etc).
    pub fn to_yaml(&self) -> String {
        format!(
            "config:\n  \
              tolerance: {:e}\n  \
              min_coefficient: {}\n  \
              max_coefficient: {}\n  \
              cone_sides: {}\n  \
              torque_scale: {}\n  \
              minkowski_limit: {}\n  \
              prune_threshold: {}\n",
            self.tolerance,
            self.min_coefficient,
            self.max_coefficient.map(|m| m.to_string()).unwrap_or_else(|| "null".to_string()),
            self.cone_sides,
            self.torque_scale,
            self.minkowski_limit,
            self.prune_threshold,
        )
    }
}
