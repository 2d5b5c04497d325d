//! Helper functions

use nalgebra::{DMatrix, DVector};
use crate::force_closure::ForceClosureResult;
use crate::grasp_matrix::GraspMatrix;
use crate::quality::QualityMetric;

/// Numeric rank: number of singular values above `tolerance`.
pub fn numeric_rank(matrix: &DMatrix<f64>, tolerance: f64) -> usize {
    if matrix.is_empty() {
        return 0;
    }
    matrix.rank(tolerance)
}

/// Replace values whose magnitude is below `tolerance` by exact zero.
pub fn snap_to_zero(values: &mut DVector<f64>, tolerance: f64) {
    for v in values.iter_mut() {
        if v.abs() < tolerance {
            *v = 0.0;
        }
    }
}

/// Checks if all elements are finite
pub fn is_finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}

/// Format a wrench or coefficient vector as `[a, b, c]` with the given precision.
pub fn format_vector(values: &DVector<f64>, precision: usize) -> String {
    let parts: Vec<String> = values.iter().map(|v| format!("{:.*}", precision, v)).collect();
    format!("[{}]", parts.join(", "))
}

/// Print a matrix one row per line.
pub fn dump_matrix(matrix: &DMatrix<f64>) {
    for r in 0..matrix.nrows() {
        let mut row_str = String::new();
        for c in 0..matrix.ncols() {
            row_str.push_str(&format!("{:6.2} ", matrix[(r, c)]));
        }
        println!("[{}]", row_str.trim_end());
    }
}

/// Print the force closure verdict and, if present, the coefficients per contact.
pub fn dump_force_closure(result: &ForceClosureResult, grasp: &GraspMatrix) {
    println!("rank: {} (required {}), full rank: {}, feasible: {}",
             result.rank, grasp.dimensionality().wrench_dim(), result.is_full_rank, result.is_feasible);
    match &result.coefficients {
        None => println!("No coefficients"),
        Some(k) => {
            for (column, index) in grasp.columns().iter().enumerate() {
                println!("  contact {} candidate {} ({:?}): {:.3}",
                         index.contact, index.candidate, index.sense, k[column]);
            }
        }
    }
}

/// Print the quality metric.
pub fn dump_quality(metric: &QualityMetric) {
    match metric.valid_distance() {
        Some(distance) => println!("least resisted wrench: {:.4} ({} facets)", distance, metric.facets),
        None => println!("origin not enclosed, distance {:.4} is not a valid bound", metric.min_facet_distance),
    }
}

/// formatting for YAML output
pub(crate) fn deg(x: &f64) -> String {
    if *x == 0.0 {
        return "0".to_string();
    }
    format!("deg({:.4})", x.to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_to_zero() {
        let mut v = DVector::from_vec(vec![1e-9, -2e-7, 0.5, -1.0]);
        snap_to_zero(&mut v, 1e-6);
        assert_eq!(v.as_slice(), &[0.0, 0.0, 0.5, -1.0]);
    }

    #[test]
    fn test_numeric_rank() {
        let m = DMatrix::from_row_slice(3, 3, &[
            0.0, 0.0, 0.0,
            1.0, -1.0, -1.0,
            0.0, 1.0, -1.0,
        ]);
        assert_eq!(numeric_rank(&m, 1e-6), 2);
        assert_eq!(numeric_rank(&DMatrix::zeros(3, 0), 1e-6), 0);
    }

    #[test]
    fn test_is_finite() {
        assert!(is_finite(&[0.0, 1.0, -1.0]));
        assert!(!is_finite(&[0.0, f64::NAN]));
        assert!(!is_finite(&[f64::INFINITY]));
    }

    #[test]
    fn test_deg() {
        assert_eq!(deg(&0.0), "0");
        assert_eq!(deg(&std::f64::consts::PI), "deg(180.0000)");
    }
}
