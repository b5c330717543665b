//! Shared foundations for robust outlier detection
//!
//! This crate provides the unified error type and the sample-matrix
//! validation helpers used by `robust-covariance` and `robust-outlier`.
//! Datasets are plain `nalgebra::DMatrix<f64>` values, one row per sample.

pub mod error;
pub mod matrix;

pub use error::{Error, Result};
pub use matrix::{check_matrix, check_width, subset_stats};

// Re-exported so downstream crates agree on the matrix types in signatures.
pub use nalgebra::{DMatrix, DVector};
