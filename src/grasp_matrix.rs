//! Grasp wrench matrix: all admissible contact wrenches of a grasp, expressed in the body
//! frame, one column per candidate.
//!
//! Columns are stored contact by contact, in the order the contacts were supplied, and within
//! a contact in the order the contact model produces them. The parallel [ColumnIndex] list
//! maps every column back to its contact and candidate, so coefficient vectors returned by the
//! force closure solver can be read per contact.

use nalgebra::{DMatrix, DVector, SVD};
use tracing::debug;
use crate::contact::Sense;
use crate::grasp_error::GraspError;
use crate::utils::numeric_rank;
use crate::wrench_traits::{Dimensionality, Wrench, WrenchMatrix, WrenchSource};

/// Origin of a grasp matrix column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnIndex {
    /// Index of the contact in the supplied sequence
    pub contact: usize,
    /// Index of the candidate within that contact
    pub candidate: usize,
    pub sense: Sense,
}

#[derive(Debug, Clone)]
pub struct GraspMatrix {
    matrix: WrenchMatrix,
    columns: Vec<ColumnIndex>,
    dimensionality: Dimensionality,
}

impl GraspMatrix {
    /// Stack candidates of all sources into one matrix.
    ///
    /// Fails with [GraspError::InvalidInput] if there are no sources and with
    /// [GraspError::DimensionMismatch] if a source does not match `dimensionality`.
    pub fn assemble<S: WrenchSource>(sources: &[S], dimensionality: Dimensionality) -> Result<Self, GraspError> {
        if sources.is_empty() {
            return Err(GraspError::InvalidInput("grasp has no contacts".to_string()));
        }
        let dim = dimensionality.wrench_dim();

        let mut wrenches: Vec<Wrench> = Vec::new();
        let mut columns = Vec::new();
        for (contact, source) in sources.iter().enumerate() {
            if source.dimensionality() != dimensionality {
                return Err(GraspError::DimensionMismatch {
                    contact,
                    expected: dim,
                    found: source.dimensionality().wrench_dim(),
                });
            }
            for (candidate, c) in source.candidates()?.into_iter().enumerate() {
                if c.wrench.len() != dim {
                    return Err(GraspError::DimensionMismatch { contact, expected: dim, found: c.wrench.len() });
                }
                columns.push(ColumnIndex { contact, candidate, sense: c.sense });
                wrenches.push(c.wrench);
            }
        }

        if wrenches.is_empty() {
            return Err(GraspError::InvalidInput("contacts produced no candidate wrenches".to_string()));
        }

        debug!("assembled {} columns from {} contacts", columns.len(), sources.len());
        Ok(GraspMatrix {
            matrix: WrenchMatrix::from_columns(&wrenches),
            columns,
            dimensionality,
        })
    }

    /// Grasp matrix from explicit columns with the given senses. Every column is treated as
    /// its own contact. Useful for matrices written down by hand.
    pub fn from_matrix(matrix: WrenchMatrix, senses: &[Sense]) -> Result<Self, GraspError> {
        let dimensionality = Dimensionality::from_wrench_dim(matrix.nrows()).ok_or_else(|| {
            GraspError::InvalidInput(format!("wrench matrix must have 3 or 6 rows (got {})", matrix.nrows()))
        })?;
        if matrix.ncols() == 0 {
            return Err(GraspError::InvalidInput("grasp has no contacts".to_string()));
        }
        if senses.len() != matrix.ncols() {
            return Err(GraspError::InvalidInput(format!(
                "{} senses given for {} columns", senses.len(), matrix.ncols()
            )));
        }
        let columns = senses.iter().enumerate()
            .map(|(i, sense)| ColumnIndex { contact: i, candidate: 0, sense: *sense })
            .collect();
        Ok(GraspMatrix { matrix, columns, dimensionality })
    }

    /// Grasp matrix where every column is a pushing (unisense) wrench.
    pub fn from_unisense_matrix(matrix: WrenchMatrix) -> Result<Self, GraspError> {
        let senses = vec![Sense::Unisense; matrix.ncols()];
        Self::from_matrix(matrix, &senses)
    }

    pub fn matrix(&self) -> &WrenchMatrix {
        &self.matrix
    }

    pub fn columns(&self) -> &[ColumnIndex] {
        &self.columns
    }

    pub fn dimensionality(&self) -> Dimensionality {
        self.dimensionality
    }

    pub fn ncols(&self) -> usize {
        self.matrix.ncols()
    }

    /// Number of distinct contacts referenced by the columns.
    pub fn contact_count(&self) -> usize {
        self.columns.last().map(|c| c.contact + 1).unwrap_or(0)
    }

    /// Column holding the given candidate of the given contact.
    pub fn column_of(&self, contact: usize, candidate: usize) -> Option<usize> {
        self.columns.iter().position(|c| c.contact == contact && c.candidate == candidate)
    }

    /// Body frame wrenches of each contact, in contact order.
    pub fn wrenches_by_contact(&self) -> Vec<Vec<Wrench>> {
        let mut grouped: Vec<Vec<Wrench>> = vec![Vec::new(); self.contact_count()];
        for (column, index) in self.columns.iter().enumerate() {
            grouped[index.contact].push(self.matrix.column(column).into_owned());
        }
        grouped
    }

    pub fn rank(&self, tolerance: f64) -> usize {
        numeric_rank(&self.matrix, tolerance)
    }

    pub fn is_full_rank(&self, tolerance: f64) -> bool {
        self.rank(tolerance) == self.dimensionality.wrench_dim()
    }

    /// Orthonormal basis of the null space, one vector per column of the result. These are the
    /// combinations of contact wrenches that produce no net body wrench (internal forces).
    pub fn null_space(&self, tolerance: f64) -> Result<DMatrix<f64>, GraspError> {
        let (rows, cols) = self.matrix.shape();
        // Pad to at least square so the SVD returns a complete right basis
        let mut padded = DMatrix::zeros(rows.max(cols), cols);
        padded.view_mut((0, 0), (rows, cols)).copy_from(&self.matrix);

        let svd = SVD::new(padded, false, true);
        let v_t = svd.v_t.ok_or_else(|| GraspError::SolverError("SVD did not produce V".to_string()))?;

        let basis: Vec<DVector<f64>> = svd.singular_values.iter().enumerate()
            .filter(|(_, s)| **s <= tolerance)
            .map(|(i, _)| v_t.row(i).transpose())
            .collect();
        Ok(if basis.is_empty() {
            DMatrix::zeros(cols, 0)
        } else {
            DMatrix::from_columns(&basis)
        })
    }
}
