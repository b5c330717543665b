//! Validation and summary statistics for sample matrices
//!
//! A dataset is an n x p `DMatrix<f64>`: one row per sample, one column per
//! feature. All estimators in the workspace validate through these helpers
//! before touching the data.

use crate::error::{Error, Result};
use nalgebra::{DMatrix, DVector};

/// Validate a sample matrix: non-empty in both dimensions and all-finite.
pub fn check_matrix(x: &DMatrix<f64>) -> Result<()> {
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(Error::InvalidInput(format!(
            "matrix must be non-empty, got shape {}x{}",
            x.nrows(),
            x.ncols()
        )));
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(Error::non_finite("sample matrix"));
    }
    Ok(())
}

/// Check that a matrix has the expected number of feature columns.
pub fn check_width(x: &DMatrix<f64>, expected: usize) -> Result<()> {
    if x.ncols() != expected {
        return Err(Error::DimensionMismatch {
            expected,
            actual: x.ncols(),
        });
    }
    Ok(())
}

/// Mean and maximum-likelihood scatter matrix of a row subset.
///
/// The covariance is normalized by the subset size m, not m - 1, which is the
/// convention concentration steps rely on. With `assume_centered` the mean is
/// pinned at the origin and the scatter is the uncentered second moment.
pub fn subset_stats(
    x: &DMatrix<f64>,
    indices: &[usize],
    assume_centered: bool,
) -> (DVector<f64>, DMatrix<f64>) {
    let p = x.ncols();
    let m = indices.len();
    debug_assert!(m > 0, "subset must be non-empty");

    let mean = if assume_centered {
        DVector::zeros(p)
    } else {
        let mut mean = DVector::zeros(p);
        for &i in indices {
            mean += x.row(i).transpose();
        }
        mean / m as f64
    };

    let mut scatter = DMatrix::zeros(p, p);
    for &i in indices {
        let d = x.row(i).transpose() - &mean;
        scatter += &d * d.transpose();
    }
    scatter /= m as f64;

    (mean, scatter)
}
