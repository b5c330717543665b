//! Squared Mahalanobis distances under a fitted location/precision pair
//!
//! Pure functions of their inputs; no fitted state is read or written here.

use nalgebra::{DMatrix, DVector};
use outlier_core::{Error, Result};

/// Squared Mahalanobis distance of every row of `x` to `location` under the
/// metric given by `precision` (the inverse covariance).
///
/// Returns one value per row: `(x_i - location)^T * precision * (x_i - location)`.
pub fn squared_distances(
    x: &DMatrix<f64>,
    location: &DVector<f64>,
    precision: &DMatrix<f64>,
) -> Result<Vec<f64>> {
    let p = location.len();
    if x.ncols() != p {
        return Err(Error::DimensionMismatch {
            expected: p,
            actual: x.ncols(),
        });
    }
    if precision.nrows() != p || precision.ncols() != p {
        return Err(Error::DimensionMismatch {
            expected: p,
            actual: precision.nrows().max(precision.ncols()),
        });
    }

    let mut distances = Vec::with_capacity(x.nrows());
    for i in 0..x.nrows() {
        let d = x.row(i).transpose() - location;
        distances.push((precision * &d).dot(&d));
    }
    Ok(distances)
}
