//! MCD outlier detector
//!
//! Wraps [`MinCovDet`] for anomaly detection: fit the robust location and
//! scatter on training data, score every sample by its squared Mahalanobis
//! distance to the robust center, and threshold the scores at the configured
//! contamination fraction. Fitted attributes are exposed read-only and fail
//! with `NotFitted` before the first successful fit.

use crate::threshold::fit_threshold;
use crate::traits::{OutlierDetector, OutlierDetectorProperties};
use nalgebra::{DMatrix, DVector};
use outlier_core::{check_matrix, check_width, Error, Result};
use robust_covariance::{mahalanobis, McdEstimate, McdParams, MinCovDet, RawEstimate};
use tracing::debug;

/// Default assumed outlier fraction.
pub const DEFAULT_CONTAMINATION: f64 = 0.1;

/// Outlier detector built on the Minimum Covariance Determinant estimator.
///
/// Meant for unimodal, roughly elliptical data; the MCD subset search is
/// likely to fail on multi-modal datasets.
///
/// # Example
///
/// ```rust
/// use nalgebra::DMatrix;
/// use robust_outlier::{Mcd, OutlierDetector};
///
/// let x = DMatrix::from_row_slice(10, 1, &[
///     1.0, 1.1, 0.9, 1.2, 0.8, 1.0, 1.1, 0.95, 1.05, 9.0,
/// ]);
///
/// let mut detector = Mcd::new().with_contamination(0.1).with_seed(42);
/// detector.fit(&x, None).unwrap();
///
/// assert_eq!(detector.labels().unwrap()[9], 1);
/// assert!(detector.labels().unwrap()[..9].iter().all(|&l| l == 0));
/// ```
#[derive(Debug, Clone)]
pub struct Mcd {
    contamination: f64,
    params: McdParams,
    fitted: Option<FittedMcd>,
}

#[derive(Debug, Clone)]
struct FittedMcd {
    raw: RawEstimate,
    estimate: McdEstimate,
    decision_scores: Vec<f64>,
    threshold: f64,
    labels: Vec<u8>,
    n_classes: usize,
}

impl Default for Mcd {
    fn default() -> Self {
        Self::new()
    }
}

impl Mcd {
    pub fn new() -> Self {
        Self {
            contamination: DEFAULT_CONTAMINATION,
            params: McdParams::new(),
            fitted: None,
        }
    }

    /// Assumed outlier fraction, in (0, 0.5) exclusive. Validated at fit time.
    pub fn with_contamination(mut self, contamination: f64) -> Self {
        self.contamination = contamination;
        self
    }

    /// Fraction of samples in the raw MCD support, in (0, 1].
    pub fn with_support_fraction(mut self, fraction: f64) -> Self {
        self.params = self.params.with_support_fraction(fraction);
        self
    }

    /// Treat the training data as centered at the origin.
    pub fn with_assume_centered(mut self, assume_centered: bool) -> Self {
        self.params = self.params.with_assume_centered(assume_centered);
        self
    }

    /// Keep the precision matrix on the fitted estimate.
    pub fn with_store_precision(mut self, store_precision: bool) -> Self {
        self.params = self.params.with_store_precision(store_precision);
        self
    }

    /// Number of FastMCD random starts.
    pub fn with_n_trials(mut self, n_trials: usize) -> Self {
        self.params = self.params.with_n_trials(n_trials);
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.params = self.params.with_seed(seed);
        self
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    fn state(&self, attribute: &str) -> Result<&FittedMcd> {
        self.fitted
            .as_ref()
            .ok_or_else(|| Error::not_fitted(attribute))
    }

    /// Raw robust location, before correction and reweighting.
    pub fn raw_location(&self) -> Result<&DVector<f64>> {
        Ok(self.state("raw_location")?.raw.location())
    }

    /// Raw robust covariance, before correction and reweighting.
    pub fn raw_covariance(&self) -> Result<&DMatrix<f64>> {
        Ok(self.state("raw_covariance")?.raw.covariance())
    }

    /// Mask of the samples in the raw minimal-determinant support.
    pub fn raw_support(&self) -> Result<&[bool]> {
        Ok(self.state("raw_support")?.raw.support())
    }

    /// Robust location estimate.
    pub fn location(&self) -> Result<&DVector<f64>> {
        Ok(self.state("location")?.estimate.location())
    }

    /// Robust covariance estimate.
    pub fn covariance(&self) -> Result<&DMatrix<f64>> {
        Ok(self.state("covariance")?.estimate.covariance())
    }

    /// Inverse covariance; stored at fit time unless precision storage was
    /// disabled, in which case it is recomputed here.
    pub fn precision(&self) -> Result<DMatrix<f64>> {
        self.state("precision")?.estimate.precision()
    }

    /// Mask of the samples in the reweighted support.
    pub fn support(&self) -> Result<&[bool]> {
        Ok(self.state("support")?.estimate.support())
    }

    /// Whether the winning subset search converged within the step cap.
    pub fn converged(&self) -> Result<bool> {
        Ok(self.state("converged")?.raw.converged())
    }
}

impl OutlierDetectorProperties for Mcd {
    fn algorithm_name(&self) -> &'static str {
        "MCD"
    }

    fn contamination(&self) -> f64 {
        self.contamination
    }
}

impl OutlierDetector for Mcd {
    fn fit(&mut self, x: &DMatrix<f64>, y: Option<&[usize]>) -> Result<()> {
        // Reject a bad contamination before the subset search runs; the
        // threshold fit would catch it, but only after the expensive part.
        if !(self.contamination > 0.0 && self.contamination < 0.5) {
            return Err(Error::invalid_contamination(self.contamination));
        }
        check_matrix(x)?;
        let n_classes = match y {
            Some(labels) => {
                if labels.len() != x.nrows() {
                    return Err(Error::InvalidInput(format!(
                        "label vector has {} entries for {} samples",
                        labels.len(),
                        x.nrows()
                    )));
                }
                let mut distinct = labels.to_vec();
                distinct.sort_unstable();
                distinct.dedup();
                distinct.len()
            }
            None => 2,
        };

        // Refit replaces the previous state wholesale; a failed refit leaves
        // the detector unfitted rather than half-updated.
        self.fitted = None;

        let fit = MinCovDet::new(self.params.clone()).fit(x)?;
        let (threshold, labels) = fit_threshold(&fit.dist, self.contamination)?;
        debug!(
            n = x.nrows(),
            p = x.ncols(),
            threshold,
            n_flagged = labels.iter().filter(|&&l| l == 1).count(),
            "fitted MCD detector"
        );

        self.fitted = Some(FittedMcd {
            raw: fit.raw,
            estimate: fit.estimate,
            decision_scores: fit.dist,
            threshold,
            labels,
            n_classes,
        });
        Ok(())
    }

    fn decision_function(&self, x: &DMatrix<f64>) -> Result<Vec<f64>> {
        let fitted = self.state("decision_function")?;
        check_matrix(x)?;
        check_width(x, fitted.estimate.n_features())?;

        let precision = fitted.estimate.precision()?;
        mahalanobis::squared_distances(x, fitted.estimate.location(), &precision)
    }

    fn decision_scores(&self) -> Result<&[f64]> {
        Ok(&self.state("decision_scores")?.decision_scores)
    }

    fn threshold(&self) -> Result<f64> {
        Ok(self.state("threshold")?.threshold)
    }

    fn labels(&self) -> Result<&[u8]> {
        Ok(&self.state("labels")?.labels)
    }

    fn n_classes(&self) -> Result<usize> {
        Ok(self.state("n_classes")?.n_classes)
    }
}
