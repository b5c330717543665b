//! Outlier detection with robust covariance estimates
//!
//! This crate turns the robust location/scatter estimate from
//! `robust-covariance` into an anomaly detector: squared Mahalanobis
//! distances to the robust center are the decision scores, and a threshold
//! fitted from a contamination fraction converts scores into binary labels.
//!
//! The [`Mcd`] detector follows the usual unsupervised-detector lifecycle:
//! configure, `fit` on a training matrix, then read fitted attributes or
//! score unseen data with `decision_function`/`predict`.

pub mod mcd;
pub mod threshold;
pub mod traits;

#[cfg(feature = "test-utils")]
pub mod test_data;

pub use mcd::{Mcd, DEFAULT_CONTAMINATION};
pub use threshold::{apply_threshold, fit_threshold};
pub use traits::{OutlierDetector, OutlierDetectorProperties};

// Error handling is shared across the workspace.
pub use outlier_core::{Error, Result};
