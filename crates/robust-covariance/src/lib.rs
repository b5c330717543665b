//! Robust location and scatter estimation via Minimum Covariance Determinant
//!
//! The estimator finds the subset of h samples whose empirical covariance has
//! minimal determinant (FastMCD with seeded random starts and concentration
//! steps), corrects it for Gaussian consistency, and reweights it at the
//! chi-squared 0.975 cutoff. Squared Mahalanobis distances under the fitted
//! estimate serve as outlier scores downstream.
//!
//! # Example
//!
//! ```rust
//! use nalgebra::DMatrix;
//! use robust_covariance::{McdParams, MinCovDet};
//!
//! let x = DMatrix::from_row_slice(8, 1, &[1.0, 1.2, 0.9, 1.1, 0.8, 1.0, 1.3, 60.0]);
//! let estimator = MinCovDet::new(McdParams::new().with_seed(42));
//! let fit = estimator.fit(&x).unwrap();
//!
//! // The gross outlier in the last row gets by far the largest distance.
//! assert!(fit.dist[7] > 10.0 * fit.dist[0]);
//! ```

pub mod correction;
pub mod mahalanobis;
pub mod mcd;
pub mod types;

pub use correction::{consistency_factor, reweight_cutoff, REWEIGHT_FRACTION};
pub use mcd::MinCovDet;
pub use types::{
    default_n_trials, default_support_size, McdEstimate, McdFit, McdParams, RawEstimate,
};

// Error handling is shared across the workspace.
pub use outlier_core::{Error, Result};
