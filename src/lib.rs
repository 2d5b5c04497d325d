//! Force closure and grasp quality analysis for point contacts on a rigid body, in the plane
//! and in space.
//!
//! A grasp is an ordered list of contacts. Each contact has a frame (X axis along the outward
//! surface normal) placed on the body and a contact model that decides which unit wrenches the
//! finger can apply there. From these the crate builds:
//!
//! - the grasp wrench matrix, one column per admissible contact wrench, expressed in the body
//!   frame, with every column traceable back to its contact;
//! - the force closure verdict: the matrix must have full rank (3 in the plane, 6 in space) and
//!   a linear program must find strictly positive pushing forces that balance each other
//!   (or a given external load);
//! - the grasp quality: convex hull of the contact wrenches, combined either as a union or as a
//!   Minkowski sum, and the distance from the origin to its closest facet plane, which is the
//!   largest disturbance wrench the grasp resists in every direction.
//!
//! # Features
//!
//! - Frictionless, Coulomb friction (cone edges) and tangential friction contact models.
//! - Internal force and external load cases, weighted objective, optional coefficient bounds.
//! - Null space of the grasp matrix (internal forces).
//! - Deterministic convex hull in 3 and 6 dimensions with point membership and directional
//!   resistance queries.
//! - Minkowski sums generated in parallel (feature `parallel`), with hull-preserving pruning of
//!   partial sums and an explicit size limit.
//! - Grasp scenarios from YAML files, with `deg(angle)` support (feature `allow_filesystem`).
//!
//! ## Example
//!
//! ```
//! use grasp_closure::parameters_grasps::grasps;
//!
//! let report = grasps::block_friction(0.5).run().unwrap();
//! assert!(report.closure.is_force_closure());
//! assert!(report.valid_quality().is_some());
//! ```

pub mod wrench_traits;
pub mod grasp_error;

pub mod frame;
pub mod contact;
pub mod grasp_matrix;

pub mod force_closure;

pub mod hull;
pub mod quality;

pub mod analysis;

pub mod parameters;
pub mod parameters_grasps;

#[cfg(feature = "allow_filesystem")]
pub mod grasp_from_file;

#[path = "utils/utils.rs"]
pub mod utils;

#[cfg(test)]
#[cfg(feature = "allow_filesystem")]
mod tests;
