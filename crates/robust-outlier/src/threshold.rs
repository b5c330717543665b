//! Decision-score thresholding from a contamination fraction
//!
//! Converts per-sample decision scores into a scalar threshold and binary
//! labels. The threshold is the ascending order statistic at 1-based rank
//! ceil(n * (1 - contamination)); labels are strictly greater-than, so score
//! values tied with the threshold stay inliers and at most
//! floor(n * contamination) samples are flagged (exactly that many when the
//! scores are distinct). Ties therefore resolve reproducibly without looking
//! at sample order.

use outlier_core::{Error, Result};

/// Fit a threshold from training scores and label them.
///
/// `contamination` is the assumed outlier fraction, in (0, 0.5) exclusive.
/// Returns the threshold and one label per score: 1 for outlier, 0 for
/// inlier.
pub fn fit_threshold(scores: &[f64], contamination: f64) -> Result<(f64, Vec<u8>)> {
    if !(contamination > 0.0 && contamination < 0.5) {
        return Err(Error::invalid_contamination(contamination));
    }
    if scores.is_empty() {
        return Err(Error::InvalidInput(
            "decision scores must be non-empty".to_string(),
        ));
    }
    if scores.iter().any(|s| !s.is_finite()) {
        return Err(Error::non_finite("decision scores"));
    }

    let n = scores.len();
    let rank = ((n as f64) * (1.0 - contamination)).ceil() as usize;
    let rank = rank.clamp(1, n);

    let mut sorted = scores.to_vec();
    sorted.sort_by(f64::total_cmp);
    let threshold = sorted[rank - 1];

    Ok((threshold, apply_threshold(scores, threshold)))
}

/// Label scores against an already-fitted threshold: 1 where the score
/// strictly exceeds it.
pub fn apply_threshold(scores: &[f64], threshold: f64) -> Vec<u8> {
    scores.iter().map(|&s| u8::from(s > threshold)).collect()
}
