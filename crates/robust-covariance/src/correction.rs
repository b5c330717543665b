//! Chi-squared consistency corrections for subset-based scatter estimates
//!
//! A covariance computed from the h most concentrated points of a Gaussian
//! sample is biased low. The correction factor here rescales it so the
//! estimator is asymptotically unbiased under the Gaussian model, for any
//! retained fraction h/n. The same factor, evaluated at 0.975, covers the
//! reweighting stage.

use outlier_core::{Error, Result};
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Quantile used for the reweighting cutoff and its consistency factor.
pub const REWEIGHT_FRACTION: f64 = 0.975;

/// Consistency factor c(fraction, p) = fraction / F_{chi2(p+2)}(Q_{chi2(p)}(fraction)).
///
/// Multiplying a scatter matrix computed from the most concentrated
/// `fraction` of a Gaussian sample by this factor makes it a consistent
/// estimate of the underlying covariance. The factor is 1 when the whole
/// sample is retained and grows as the fraction shrinks.
pub fn consistency_factor(fraction: f64, p: usize) -> Result<f64> {
    if !(fraction > 0.0 && fraction <= 1.0) {
        return Err(Error::InvalidParameter(format!(
            "Support fraction {fraction} must be in (0, 1]"
        )));
    }
    if fraction >= 1.0 {
        return Ok(1.0);
    }

    let chi_p = ChiSquared::new(p as f64).map_err(|e| {
        Error::Computation(format!("Failed to create chi-squared({p}) distribution: {e}"))
    })?;
    let chi_p2 = ChiSquared::new((p + 2) as f64).map_err(|e| {
        Error::Computation(format!(
            "Failed to create chi-squared({}) distribution: {e}",
            p + 2
        ))
    })?;

    let quantile = chi_p.inverse_cdf(fraction);
    let mass = chi_p2.cdf(quantile);
    if mass <= 0.0 {
        return Err(Error::Computation(format!(
            "Degenerate chi-squared mass for fraction {fraction}, p = {p}"
        )));
    }

    Ok(fraction / mass)
}

/// Squared-distance cutoff for the reweighting step: Q_{chi2(p)}(0.975).
pub fn reweight_cutoff(p: usize) -> Result<f64> {
    let chi_p = ChiSquared::new(p as f64).map_err(|e| {
        Error::Computation(format!("Failed to create chi-squared({p}) distribution: {e}"))
    })?;
    Ok(chi_p.inverse_cdf(REWEIGHT_FRACTION))
}
