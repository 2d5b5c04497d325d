//! Common types used across contact, grasp matrix and quality modules.

extern crate nalgebra as na;

use na::{DMatrix, DVector};
use crate::grasp_error::GraspError;

/// Wrench components in the plane: `[fx, fy, mz]`.
pub const PLANAR_DIM: usize = 3;

/// Wrench components in space: `[fx, fy, fz, mx, my, mz]`.
pub const SPATIAL_DIM: usize = 6;

/// A generalized force. Length is 3 for planar and 6 for spatial problems.
pub type Wrench = DVector<f64>;

/// Matrix with one wrench per column.
pub type WrenchMatrix = DMatrix<f64>;

/// Whether the grasp is analyzed in the plane or in space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimensionality {
    Planar,
    Spatial,
}

impl Dimensionality {
    /// Number of wrench components, also the rank required for force closure.
    pub fn wrench_dim(&self) -> usize {
        match self {
            Dimensionality::Planar => PLANAR_DIM,
            Dimensionality::Spatial => SPATIAL_DIM,
        }
    }

    /// Number of force components. The rest of the wrench are moments.
    pub fn force_dim(&self) -> usize {
        match self {
            Dimensionality::Planar => 2,
            Dimensionality::Spatial => 3,
        }
    }

    pub fn from_wrench_dim(dim: usize) -> Option<Self> {
        match dim {
            PLANAR_DIM => Some(Dimensionality::Planar),
            SPATIAL_DIM => Some(Dimensionality::Spatial),
            _ => None,
        }
    }
}

/// Anything that can contribute admissible unit wrenches to a grasp, expressed in the
/// body frame. Implemented by [crate::contact::Contact]; tests and callers may provide
/// their own sources (for instance wrenches measured by a sensor).
pub trait WrenchSource {
    /// Dimensionality of the produced wrenches.
    fn dimensionality(&self) -> Dimensionality;

    /// Admissible wrench directions, in a stable order.
    fn candidates(&self) -> Result<Vec<crate::contact::CandidateWrench>, GraspError>;
}
