//! FastMCD: Minimum Covariance Determinant estimation
//!
//! Searches for the h-sample subset whose scatter matrix has minimal
//! determinant, via seeded random elemental starts refined by concentration
//! steps, then applies the chi-squared consistency correction and a 0.975
//! reweighting pass. Starts are seeded per trial index, so results are
//! reproducible for a fixed seed regardless of the `parallel` feature or
//! thread scheduling.

use crate::correction::{consistency_factor, reweight_cutoff, REWEIGHT_FRACTION};
use crate::mahalanobis;
use crate::types::{
    default_n_trials, default_support_size, support_mask, McdEstimate, McdFit, McdParams,
    RawEstimate,
};
use nalgebra::{Cholesky, DMatrix, Dynamic};
use outlier_core::{check_matrix, subset_stats, Error, Result};
use rand::prelude::*;
use tracing::{debug, warn};

/// Relative determinant decrease below which concentration has converged.
const DET_RELATIVE_TOL: f64 = 1e-12;

/// Smallest acceptable ratio between Cholesky pivots. Below this the scatter
/// matrix is treated as numerically singular.
const PIVOT_RATIO_TOL: f64 = 1e-9;

/// Minimum Covariance Determinant estimator of robust location and scatter.
#[derive(Debug, Clone, Default)]
pub struct MinCovDet {
    params: McdParams,
}

impl MinCovDet {
    pub fn new(params: McdParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &McdParams {
        &self.params
    }

    /// Support size h for an n x p dataset.
    ///
    /// Defaults to floor((n + p + 1) / 2). A configured support fraction f
    /// gives round(n * f), clamped into [floor((n + p + 1) / 2), n] so the
    /// subset always stays large enough for a full-rank scatter and never
    /// exceeds the sample.
    fn support_size(&self, n: usize, p: usize) -> Result<usize> {
        let h_min = default_support_size(n, p);
        let h = match self.params.support_fraction {
            None => h_min,
            Some(f) => {
                if !(f > 0.0 && f <= 1.0) {
                    return Err(Error::InvalidParameter(format!(
                        "Support fraction {f} must be in (0, 1]"
                    )));
                }
                ((n as f64) * f).round() as usize
            }
        };
        let h = h.clamp(h_min, n);
        if h > n || h < p + 1 {
            return Err(Error::InsufficientData {
                expected: p + 1,
                actual: n,
            });
        }
        Ok(h)
    }

    /// Fit the robust location/scatter estimate.
    ///
    /// Returns the raw minimal-determinant subset statistics, the corrected
    /// and reweighted estimate, and the squared robust distance of every
    /// training sample under the final estimate.
    pub fn fit(&self, x: &DMatrix<f64>) -> Result<McdFit> {
        check_matrix(x)?;
        let n = x.nrows();
        let p = x.ncols();
        if n < p + 1 {
            return Err(Error::InsufficientData {
                expected: p + 1,
                actual: n,
            });
        }
        let h = self.support_size(n, p)?;
        let seed = self.params.seed.unwrap_or_else(|| thread_rng().gen());

        let best = if h == n {
            // The support is the whole sample: classical estimate, no search.
            let indices: Vec<usize> = (0..n).collect();
            let (mean, covariance) = subset_stats(x, &indices, self.params.assume_centered);
            let (_, determinant) = spd_cholesky(&covariance, "full-sample covariance")?;
            Trial {
                indices,
                mean,
                covariance,
                determinant,
                converged: true,
                c_steps: 0,
            }
        } else {
            let n_trials = self.params.n_trials.unwrap_or_else(|| default_n_trials(p));
            debug!(n, p, h, n_trials, seed, "running FastMCD random starts");
            best_trial(
                x,
                h,
                n_trials,
                seed,
                self.params.max_c_steps,
                self.params.assume_centered,
            )?
        };

        if !best.converged {
            warn!(
                c_steps = best.c_steps,
                "concentration hit the step cap before the determinant stabilized; \
                 keeping the best subset found"
            );
        }

        let raw = RawEstimate::new(
            best.mean.clone(),
            best.covariance.clone(),
            support_mask(n, &best.indices),
            best.determinant,
            best.converged,
            best.c_steps,
        );

        // Consistency correction on the raw scatter, then reweighting: keep
        // every sample within the chi-squared cutoff and re-estimate.
        let corrected = &best.covariance * consistency_factor(h as f64 / n as f64, p)?;
        let corrected_precision = spd_inverse(&corrected, "corrected raw covariance")?;
        let d2 = mahalanobis::squared_distances(x, &best.mean, &corrected_precision)?;
        let cutoff = reweight_cutoff(p)?;
        let kept: Vec<usize> = d2
            .iter()
            .enumerate()
            .filter(|&(_, &d)| d <= cutoff)
            .map(|(i, _)| i)
            .collect();
        if kept.len() < p + 1 {
            return Err(Error::SingularMatrix(format!(
                "reweighted support kept {} of {n} samples, fewer than p + 1 = {}",
                kept.len(),
                p + 1
            )));
        }

        let (location, reweighted) = subset_stats(x, &kept, self.params.assume_centered);
        let covariance = reweighted * consistency_factor(REWEIGHT_FRACTION, p)?;
        let precision = spd_inverse(&covariance, "reweighted covariance")?;
        let dist = mahalanobis::squared_distances(x, &location, &precision)?;

        let estimate = McdEstimate::new(
            location,
            covariance,
            self.params.store_precision.then_some(precision),
            support_mask(n, &kept),
        );

        Ok(McdFit {
            raw,
            estimate,
            dist,
        })
    }
}

/// One random start refined to a local determinant minimum.
struct Trial {
    indices: Vec<usize>,
    mean: nalgebra::DVector<f64>,
    covariance: DMatrix<f64>,
    determinant: f64,
    converged: bool,
    c_steps: usize,
}

fn best_trial(
    x: &DMatrix<f64>,
    h: usize,
    n_trials: usize,
    seed: u64,
    max_c_steps: usize,
    assume_centered: bool,
) -> Result<Trial> {
    let run = |trial: usize| -> Result<(usize, Trial)> {
        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(trial as u64));
        run_trial(x, h, max_c_steps, assume_centered, &mut rng).map(|t| (trial, t))
    };

    #[cfg(feature = "parallel")]
    let trials = {
        use rayon::prelude::*;
        (0..n_trials)
            .into_par_iter()
            .map(run)
            .collect::<Result<Vec<_>>>()?
    };
    #[cfg(not(feature = "parallel"))]
    let trials = (0..n_trials).map(run).collect::<Result<Vec<_>>>()?;

    // Smallest determinant wins; equal determinants keep the earliest trial,
    // so the outcome does not depend on scheduling.
    trials
        .into_iter()
        .min_by(|(ia, a), (ib, b)| a.determinant.total_cmp(&b.determinant).then(ia.cmp(ib)))
        .map(|(_, t)| t)
        .ok_or_else(|| Error::InvalidParameter("Number of trials must be positive".to_string()))
}

fn run_trial(
    x: &DMatrix<f64>,
    h: usize,
    max_c_steps: usize,
    assume_centered: bool,
    rng: &mut StdRng,
) -> Result<Trial> {
    let n = x.nrows();
    let p = x.ncols();

    // Elemental start of p + 1 samples, grown one random sample at a time
    // while its scatter stays singular.
    let order = rand::seq::index::sample(rng, n, n).into_vec();
    let mut size = (p + 1).min(h);
    let (mut indices, mut mean, mut covariance, mut chol, mut determinant) = loop {
        let mut idx = order[..size].to_vec();
        idx.sort_unstable();
        let (mean, cov) = subset_stats(x, &idx, assume_centered);
        match try_spd_cholesky(&cov) {
            Some((chol, det)) => break (idx, mean, cov, chol, det),
            None if size < h => size += 1,
            None => {
                return Err(Error::SingularMatrix(format!(
                    "subset of {h} samples has singular covariance; \
                     features may be collinear"
                )))
            }
        }
    };

    // The determinant stopping rule only applies once two consecutive
    // h-sized subsets are compared; the elemental start is smaller.
    let mut have_h_det = indices.len() == h;
    let mut converged = false;
    let mut c_steps = 0;

    for _ in 0..max_c_steps {
        let precision = chol.inverse();
        let d2 = mahalanobis::squared_distances(x, &mean, &precision)?;
        let new_indices = select_smallest(&d2, h);
        if new_indices == indices {
            converged = true;
            break;
        }

        let (new_mean, new_cov) = subset_stats(x, &new_indices, assume_centered);
        let (new_chol, new_det) = spd_cholesky(&new_cov, "concentration step covariance")?;
        let prev_det = determinant;

        indices = new_indices;
        mean = new_mean;
        covariance = new_cov;
        chol = new_chol;
        determinant = new_det;
        c_steps += 1;

        if have_h_det && new_det >= prev_det * (1.0 - DET_RELATIVE_TOL) {
            converged = true;
            break;
        }
        have_h_det = true;
    }

    Ok(Trial {
        indices,
        mean,
        covariance,
        determinant,
        converged,
        c_steps,
    })
}

/// Indices of the h smallest values, ties broken by position, returned sorted.
fn select_smallest(d2: &[f64], h: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..d2.len()).collect();
    order.sort_by(|&a, &b| d2[a].total_cmp(&d2[b]).then(a.cmp(&b)));
    order.truncate(h);
    order.sort_unstable();
    order
}

fn try_spd_cholesky(cov: &DMatrix<f64>) -> Option<(Cholesky<f64, Dynamic>, f64)> {
    let chol = Cholesky::new(cov.clone())?;
    let diag = chol.l().diagonal();
    let mut min = f64::INFINITY;
    let mut max = 0.0f64;
    let mut determinant = 1.0;
    for &pivot in diag.iter() {
        min = min.min(pivot);
        max = max.max(pivot);
        determinant *= pivot * pivot;
    }
    if min <= PIVOT_RATIO_TOL * max {
        return None;
    }
    Some((chol, determinant))
}

/// Cholesky factor and determinant of a symmetric positive definite matrix.
pub(crate) fn spd_cholesky(
    cov: &DMatrix<f64>,
    context: &str,
) -> Result<(Cholesky<f64, Dynamic>, f64)> {
    try_spd_cholesky(cov)
        .ok_or_else(|| Error::SingularMatrix(format!("{context} is not positive definite")))
}

/// Inverse of a symmetric positive definite matrix.
pub(crate) fn spd_inverse(cov: &DMatrix<f64>, context: &str) -> Result<DMatrix<f64>> {
    Ok(spd_cholesky(cov, context)?.0.inverse())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::DVector;
    use rand_chacha::ChaCha8Rng;
    use rand_distr::{Distribution, Normal};

    /// 2D Gaussian cloud with a block of far-away contaminants appended.
    fn contaminated_cloud(seed: u64, n_inliers: usize, n_outliers: usize) -> DMatrix<f64> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let inlier = Normal::new(0.0, 1.0).unwrap();
        let outlier = Normal::new(12.0, 0.5).unwrap();

        let mut rows = Vec::with_capacity((n_inliers + n_outliers) * 2);
        for _ in 0..n_inliers {
            rows.push(inlier.sample(&mut rng));
            rows.push(inlier.sample(&mut rng));
        }
        for _ in 0..n_outliers {
            rows.push(outlier.sample(&mut rng));
            rows.push(outlier.sample(&mut rng));
        }
        DMatrix::from_row_slice(n_inliers + n_outliers, 2, &rows)
    }

    #[test]
    fn test_c_step_determinant_is_non_increasing() {
        let x = contaminated_cloud(42, 60, 8);
        let n = x.nrows();
        let h = default_support_size(n, 2);

        // Start from an arbitrary h-subset and iterate raw concentration
        // steps, logging the determinant at every step.
        let mut rng = StdRng::seed_from_u64(7);
        let mut indices = rand::seq::index::sample(&mut rng, n, h).into_vec();
        indices.sort_unstable();

        let mut dets = Vec::new();
        for _ in 0..20 {
            let (mean, cov) = subset_stats(&x, &indices, false);
            let (chol, det) = spd_cholesky(&cov, "test covariance").unwrap();
            dets.push(det);
            let d2 = mahalanobis::squared_distances(&x, &mean, &chol.inverse()).unwrap();
            let next = select_smallest(&d2, h);
            if next == indices {
                break;
            }
            indices = next;
        }

        assert!(dets.len() >= 2, "expected at least one concentration step");
        for pair in dets.windows(2) {
            assert!(
                pair[1] <= pair[0] * (1.0 + 1e-9),
                "determinant increased across a concentration step: {dets:?}"
            );
        }
    }

    #[test]
    fn test_fit_is_deterministic_for_fixed_seed() {
        let x = contaminated_cloud(1, 50, 5);
        let estimator = MinCovDet::new(McdParams::new().with_seed(99).with_n_trials(50));

        let a = estimator.fit(&x).unwrap();
        let b = estimator.fit(&x).unwrap();

        assert_eq!(a.raw.location(), b.raw.location());
        assert_eq!(a.raw.covariance(), b.raw.covariance());
        assert_eq!(a.raw.support(), b.raw.support());
        assert_eq!(a.estimate.location(), b.estimate.location());
        assert_eq!(a.estimate.covariance(), b.estimate.covariance());
        assert_eq!(a.dist, b.dist);
    }

    #[test]
    fn test_raw_support_avoids_gross_outliers() {
        let x = contaminated_cloud(3, 80, 10);
        let estimator = MinCovDet::new(McdParams::new().with_seed(5).with_n_trials(100));
        let fit = estimator.fit(&x).unwrap();

        // The contaminants occupy the last 10 rows.
        let outliers_in_raw = fit.raw.support()[80..].iter().filter(|&&s| s).count();
        assert_eq!(outliers_in_raw, 0, "raw support absorbed contaminants");

        let outliers_in_final = fit.estimate.support()[80..].iter().filter(|&&s| s).count();
        assert_eq!(outliers_in_final, 0, "reweighted support absorbed contaminants");

        // Robust location stays near the inlier center, not the mixture mean.
        assert!(fit.estimate.location().norm() < 1.0);
    }

    #[test]
    fn test_distances_of_outliers_dominate() {
        let x = contaminated_cloud(11, 80, 10);
        let estimator = MinCovDet::new(McdParams::new().with_seed(17).with_n_trials(100));
        let fit = estimator.fit(&x).unwrap();

        let max_inlier = fit.dist[..80].iter().cloned().fold(0.0, f64::max);
        let min_outlier = fit.dist[80..].iter().cloned().fold(f64::INFINITY, f64::min);
        assert!(
            min_outlier > max_inlier,
            "outlier distances ({min_outlier}) should exceed inlier distances ({max_inlier})"
        );
    }

    #[test]
    fn test_single_feature_degrades_to_scalar_variance() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let normal = Normal::new(5.0, 2.0).unwrap();
        let mut values: Vec<f64> = (0..200).map(|_| normal.sample(&mut rng)).collect();
        values.push(80.0);
        values.push(-70.0);
        let n = values.len();
        let x = DMatrix::from_row_slice(n, 1, &values);

        let estimator = MinCovDet::new(McdParams::new().with_seed(4));
        let fit = estimator.fit(&x).unwrap();

        // 1x1 covariance close to the true variance, location near 5.
        assert_relative_eq!(fit.estimate.location()[0], 5.0, epsilon = 0.6);
        assert_relative_eq!(fit.estimate.covariance()[(0, 0)], 4.0, epsilon = 1.6);
        assert!(fit.dist[n - 1] > fit.dist[0]);
    }

    #[test]
    fn test_collinear_features_are_singular() {
        // Second column is exactly twice the first.
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let normal = Normal::new(0.0, 1.0).unwrap();
        let mut rows = Vec::new();
        for _ in 0..40 {
            let v: f64 = normal.sample(&mut rng);
            rows.push(v);
            rows.push(2.0 * v);
        }
        let x = DMatrix::from_row_slice(40, 2, &rows);

        let estimator = MinCovDet::new(McdParams::new().with_seed(1).with_n_trials(5));
        assert!(matches!(
            estimator.fit(&x),
            Err(Error::SingularMatrix(_))
        ));
    }

    #[test]
    fn test_insufficient_samples_rejected() {
        let x = DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let estimator = MinCovDet::default();
        assert!(matches!(
            estimator.fit(&x),
            Err(Error::InsufficientData { expected: 4, actual: 2 })
        ));
    }

    #[test]
    fn test_invalid_support_fraction_rejected() {
        let x = contaminated_cloud(6, 30, 0);
        let estimator = MinCovDet::new(McdParams::new().with_support_fraction(1.5));
        assert!(matches!(
            estimator.fit(&x),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_full_support_fraction_uses_classical_estimate() {
        let x = contaminated_cloud(9, 40, 0);
        let estimator = MinCovDet::new(McdParams::new().with_support_fraction(1.0).with_seed(3));
        let fit = estimator.fit(&x).unwrap();

        assert!(fit.raw.support().iter().all(|&s| s));
        assert!(fit.raw.converged());
        assert_eq!(fit.raw.c_steps(), 0);
    }

    #[test]
    fn test_nan_input_rejected() {
        let mut x = contaminated_cloud(12, 30, 0);
        x[(3, 1)] = f64::NAN;
        let estimator = MinCovDet::default();
        assert!(matches!(estimator.fit(&x), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_assume_centered_pins_location_at_origin() {
        let x = contaminated_cloud(21, 60, 0);
        let estimator =
            MinCovDet::new(McdParams::new().with_assume_centered(true).with_seed(13));
        let fit = estimator.fit(&x).unwrap();

        assert_eq!(fit.raw.location(), &DVector::from_vec(vec![0.0, 0.0]));
        assert_eq!(fit.estimate.location(), &DVector::from_vec(vec![0.0, 0.0]));
    }

    #[test]
    fn test_precision_available_without_storage() {
        let x = contaminated_cloud(14, 50, 5);
        let estimator = MinCovDet::new(
            McdParams::new()
                .with_store_precision(false)
                .with_seed(23)
                .with_n_trials(50),
        );
        let fit = estimator.fit(&x).unwrap();

        assert!(fit.estimate.stored_precision().is_none());
        let precision = fit.estimate.precision().unwrap();
        let product = fit.estimate.covariance() * &precision;
        for i in 0..2 {
            for j in 0..2 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(product[(i, j)], expected, epsilon = 1e-8);
            }
        }
    }

    #[test]
    fn test_c_step_cap_degrades_to_best_effort() {
        // A cap of one step cannot reach a fixed point from an elemental
        // start, so the fit must still succeed with the best subset found
        // and report non-convergence instead of erroring.
        let x = contaminated_cloud(42, 180, 20);
        let estimator = MinCovDet::new(
            McdParams::new()
                .with_max_c_steps(1)
                .with_seed(3)
                .with_n_trials(20),
        );

        let fit = estimator.fit(&x).unwrap();
        assert!(!fit.raw.converged());
        assert_eq!(fit.raw.c_steps(), 1);
        assert_eq!(fit.dist.len(), 200);
    }

    #[test]
    fn test_select_smallest_breaks_ties_by_position() {
        let d2 = [3.0, 1.0, 1.0, 0.5, 3.0];
        assert_eq!(select_smallest(&d2, 3), vec![1, 2, 3]);
        assert_eq!(select_smallest(&d2, 4), vec![0, 1, 2, 3]);
    }
}
