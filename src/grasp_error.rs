//! Error handling for grasp assembly, hull construction and scenario loading

use std::io;

/// Why a point set cannot be turned into a full-dimensional wrench polytope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegeneracyKind {
    /// Fewer than `dimension + 1` distinct points were supplied.
    InsufficientPoints,
    /// The points are coplanar, collinear or otherwise fail to span wrench space.
    RankDeficient,
}

/// Unified error for all analysis stages. Rank deficiency of the grasp matrix and
/// infeasibility of the force closure program are not errors; they are reported in
/// [crate::force_closure::ForceClosureResult].
#[derive(Debug)]
pub enum GraspError {
    IoError(io::Error),
    ParseError(String),
    InvalidInput(String),
    /// Contact `contact` (index in the supplied order) has the wrong dimensionality.
    DimensionMismatch { contact: usize, expected: usize, found: usize },
    /// Hull construction failed. `points` is the size of the point set, `rank` is the
    /// affine rank reached and `spanning` lists the point indices that were affinely
    /// independent before the construction gave up.
    DegenerateGeometry { kind: DegeneracyKind, points: usize, rank: usize, spanning: Vec<usize> },
    /// Minkowski sum would produce more points than allowed.
    CombinatorialLimit { points: usize, limit: usize },
    SolverError(String),
}

impl std::fmt::Display for GraspError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            GraspError::IoError(ref err) =>
                write!(f, "IO Error: {}", err),
            GraspError::ParseError(ref msg) =>
                write!(f, "Parse Error: {}", msg),
            GraspError::InvalidInput(ref msg) =>
                write!(f, "Invalid Input: {}", msg),
            GraspError::DimensionMismatch { contact, expected, found } =>
                write!(f, "Dimension Mismatch: contact {} has wrench dimension {}, expected {}",
                       contact, found, expected),
            GraspError::DegenerateGeometry { kind, points, rank, ref spanning } => match kind {
                DegeneracyKind::InsufficientPoints =>
                    write!(f, "Degenerate Geometry: {} points with too few distinct ones, rank {} reached", points, rank),
                DegeneracyKind::RankDeficient =>
                    write!(f, "Degenerate Geometry: {} points span only rank {} (spanning points {:?})",
                           points, rank, spanning),
            },
            GraspError::CombinatorialLimit { points, limit } =>
                write!(f, "Combinatorial Limit: Minkowski sum needs {} points, limit is {}", points, limit),
            GraspError::SolverError(ref msg) =>
                write!(f, "Solver Error: {}", msg),
        }
    }
}

impl std::error::Error for GraspError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GraspError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for GraspError {
    fn from(err: io::Error) -> Self {
        GraspError::IoError(err)
    }
}

impl GraspError {
    /// True if the error comes from hull construction, so only the quality query is affected.
    pub fn is_degenerate_geometry(&self) -> bool {
        matches!(self, GraspError::DegenerateGeometry { .. })
    }
}
