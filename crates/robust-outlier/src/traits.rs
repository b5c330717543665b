//! Detector contracts for outlier detection

use crate::threshold::apply_threshold;
use nalgebra::DMatrix;
use outlier_core::Result;

/// Static properties of a detector, independent of any fitted state.
pub trait OutlierDetectorProperties {
    /// Human-readable algorithm name.
    fn algorithm_name(&self) -> &'static str;

    /// Assumed fraction of outliers in training data.
    fn contamination(&self) -> f64;
}

/// Contract every unsupervised outlier detector satisfies.
///
/// `fit` learns from an n x p training matrix and fixes the decision
/// threshold from the configured contamination; all other methods read the
/// fitted state and fail with `NotFitted` before the first successful fit.
/// Higher decision scores mean more anomalous.
pub trait OutlierDetector: OutlierDetectorProperties {
    /// Fit on training data. `y` is informational only (class bookkeeping);
    /// it never influences the unsupervised estimate.
    fn fit(&mut self, x: &DMatrix<f64>, y: Option<&[usize]>) -> Result<()>;

    /// Score unseen samples. Pure and side-effect-free once fitted.
    fn decision_function(&self, x: &DMatrix<f64>) -> Result<Vec<f64>>;

    /// Decision scores of the training samples, in input order.
    fn decision_scores(&self) -> Result<&[f64]>;

    /// Threshold separating inliers from outliers on decision scores.
    fn threshold(&self) -> Result<f64>;

    /// Binary training labels: 1 for outlier, 0 for inlier.
    fn labels(&self) -> Result<&[u8]>;

    /// Number of classes seen in `y` at fit time (2 when `y` was absent).
    fn n_classes(&self) -> Result<usize>;

    /// Label unseen samples with the fitted threshold.
    fn predict(&self, x: &DMatrix<f64>) -> Result<Vec<u8>> {
        let scores = self.decision_function(x)?;
        Ok(apply_threshold(&scores, self.threshold()?))
    }
}
