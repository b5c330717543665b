//! Error types for robust outlier detection
//!
//! Provides a unified error type for all workspace crates.

use thiserror::Error;

/// Core error type for robust covariance estimation and outlier detection
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid parameter provided to a function
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Insufficient data for the requested operation
    #[error("Insufficient data: expected at least {expected} samples, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    /// Feature dimensionality does not match the fitted model
    #[error("Dimension mismatch: expected {expected} features, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Covariance matrix is numerically singular
    #[error("Singular matrix: {0}")]
    SingularMatrix(String),

    /// Accessor used before the detector was fitted
    #[error("Detector is not fitted: call fit before accessing {0}")]
    NotFitted(String),

    /// Numerical computation error
    #[error("Computation error: {0}")]
    Computation(String),

    /// Other errors
    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

// Helper functions for common error patterns

impl Error {
    /// Create an error for NaN/Inf values
    pub fn non_finite(context: &str) -> Self {
        Self::InvalidInput(format!("{context} contains NaN or infinite values"))
    }

    /// Create an error for an out-of-range contamination fraction
    pub fn invalid_contamination(c: f64) -> Self {
        Self::InvalidParameter(format!("Contamination {c} must be in (0, 0.5)"))
    }

    /// Create an error for an accessor used before fit
    pub fn not_fitted(attribute: &str) -> Self {
        Self::NotFitted(attribute.to_string())
    }
}
