//! Parameter and result types for the MCD estimator

use nalgebra::{DMatrix, DVector};
use outlier_core::Result;

/// Default support size: floor((n + p + 1) / 2), the highest-breakdown choice.
pub fn default_support_size(n: usize, p: usize) -> usize {
    (n + p + 1) / 2
}

/// Default number of random starts as a function of dimensionality.
///
/// Trades start count against concentration work as p grows, following the
/// usual FastMCD tuning. Override with [`McdParams::with_n_trials`].
pub fn default_n_trials(p: usize) -> usize {
    match p {
        0..=5 => 500,
        6..=10 => 300,
        11..=20 => 150,
        _ => 50,
    }
}

/// Configuration for [`MinCovDet`](crate::MinCovDet).
#[derive(Debug, Clone)]
pub struct McdParams {
    pub(crate) support_fraction: Option<f64>,
    pub(crate) n_trials: Option<usize>,
    pub(crate) max_c_steps: usize,
    pub(crate) assume_centered: bool,
    pub(crate) store_precision: bool,
    pub(crate) seed: Option<u64>,
}

impl Default for McdParams {
    fn default() -> Self {
        Self {
            support_fraction: None,
            n_trials: None,
            max_c_steps: 30,
            assume_centered: false,
            store_precision: true,
            seed: None,
        }
    }
}

impl McdParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fraction of samples in the raw support, in (0, 1]. `None` uses the
    /// minimum (highest-breakdown) support size.
    pub fn with_support_fraction(mut self, fraction: f64) -> Self {
        self.support_fraction = Some(fraction);
        self
    }

    /// Number of random starts. `None` uses [`default_n_trials`].
    pub fn with_n_trials(mut self, n_trials: usize) -> Self {
        assert!(n_trials > 0, "Number of trials must be positive");
        self.n_trials = Some(n_trials);
        self
    }

    /// Cap on concentration steps per start.
    pub fn with_max_c_steps(mut self, max_c_steps: usize) -> Self {
        assert!(max_c_steps > 0, "Concentration step cap must be positive");
        self.max_c_steps = max_c_steps;
        self
    }

    /// Treat the data as already centered at the origin.
    pub fn with_assume_centered(mut self, assume_centered: bool) -> Self {
        self.assume_centered = assume_centered;
        self
    }

    /// Keep the inverse covariance on the fitted estimate.
    pub fn with_store_precision(mut self, store_precision: bool) -> Self {
        self.store_precision = store_precision;
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn assume_centered(&self) -> bool {
        self.assume_centered
    }

    pub fn store_precision(&self) -> bool {
        self.store_precision
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

/// Minimal-determinant subset statistics before correction and reweighting.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEstimate {
    location: DVector<f64>,
    covariance: DMatrix<f64>,
    support: Vec<bool>,
    determinant: f64,
    converged: bool,
    c_steps: usize,
}

impl RawEstimate {
    pub(crate) fn new(
        location: DVector<f64>,
        covariance: DMatrix<f64>,
        support: Vec<bool>,
        determinant: f64,
        converged: bool,
        c_steps: usize,
    ) -> Self {
        Self {
            location,
            covariance,
            support,
            determinant,
            converged,
            c_steps,
        }
    }

    /// Raw robust location, before correction and reweighting.
    pub fn location(&self) -> &DVector<f64> {
        &self.location
    }

    /// Raw robust covariance, before correction and reweighting.
    pub fn covariance(&self) -> &DMatrix<f64> {
        &self.covariance
    }

    /// Mask of the samples in the minimal-determinant subset.
    pub fn support(&self) -> &[bool] {
        &self.support
    }

    /// Determinant of the raw covariance.
    pub fn determinant(&self) -> f64 {
        self.determinant
    }

    /// Whether the winning start's concentration steps reached a fixed point
    /// within the step cap. A `false` here is best-effort, not an error.
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Concentration steps taken by the winning start.
    pub fn c_steps(&self) -> usize {
        self.c_steps
    }
}

/// Corrected and reweighted location/scatter estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct McdEstimate {
    location: DVector<f64>,
    covariance: DMatrix<f64>,
    precision: Option<DMatrix<f64>>,
    support: Vec<bool>,
}

impl McdEstimate {
    pub(crate) fn new(
        location: DVector<f64>,
        covariance: DMatrix<f64>,
        precision: Option<DMatrix<f64>>,
        support: Vec<bool>,
    ) -> Self {
        Self {
            location,
            covariance,
            precision,
            support,
        }
    }

    /// Robust location estimate.
    pub fn location(&self) -> &DVector<f64> {
        &self.location
    }

    /// Robust covariance estimate.
    pub fn covariance(&self) -> &DMatrix<f64> {
        &self.covariance
    }

    /// Inverse covariance. Returns the stored matrix when precision storage
    /// was requested, otherwise inverts the covariance on demand.
    pub fn precision(&self) -> Result<DMatrix<f64>> {
        match &self.precision {
            Some(precision) => Ok(precision.clone()),
            None => crate::mcd::spd_inverse(&self.covariance, "corrected covariance"),
        }
    }

    /// Stored precision matrix, if storage was requested at fit time.
    pub fn stored_precision(&self) -> Option<&DMatrix<f64>> {
        self.precision.as_ref()
    }

    /// Mask of the samples in the reweighted support.
    pub fn support(&self) -> &[bool] {
        &self.support
    }

    /// Number of features the estimate was fitted on.
    pub fn n_features(&self) -> usize {
        self.location.len()
    }
}

/// Full result of one [`MinCovDet`](crate::MinCovDet) fit.
#[derive(Debug, Clone)]
pub struct McdFit {
    pub raw: RawEstimate,
    pub estimate: McdEstimate,
    /// Squared robust distance of every training sample under the final
    /// estimate, in input order.
    pub dist: Vec<f64>,
}

impl McdFit {
    /// Convenience accessor mirroring the estimate's precision behavior.
    pub fn precision(&self) -> Result<DMatrix<f64>> {
        self.estimate.precision()
    }
}

// Support masks are all-false except at the given indices.
pub(crate) fn support_mask(n: usize, indices: &[usize]) -> Vec<bool> {
    let mut mask = vec![false; n];
    for &i in indices {
        mask[i] = true;
    }
    mask
}
