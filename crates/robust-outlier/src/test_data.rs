//! Synthetic contaminated datasets for tests and benchmarks
//!
//! Only available with the `test-utils` feature.

use nalgebra::DMatrix;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

/// A generated dataset with ground-truth outlier labels.
pub struct ContaminatedSample {
    /// n x p sample matrix, inliers first, outliers last.
    pub x: DMatrix<f64>,
    /// Ground truth: 1 for injected outliers, 0 for inliers.
    pub truth: Vec<u8>,
}

impl ContaminatedSample {
    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_outliers(&self) -> usize {
        self.truth.iter().filter(|&&t| t == 1).count()
    }
}

/// Standard-normal inlier cloud plus a tight cluster of outliers shifted by
/// `shift` in every coordinate. Deterministic for a fixed seed.
pub fn contaminated_gaussian(
    seed: u64,
    n_inliers: usize,
    n_outliers: usize,
    p: usize,
    shift: f64,
) -> ContaminatedSample {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let inlier = Normal::new(0.0, 1.0).unwrap();
    let outlier = Normal::new(shift, 0.5).unwrap();

    let n = n_inliers + n_outliers;
    let mut values = Vec::with_capacity(n * p);
    for _ in 0..n_inliers * p {
        values.push(inlier.sample(&mut rng));
    }
    for _ in 0..n_outliers * p {
        values.push(outlier.sample(&mut rng));
    }

    let mut truth = vec![0u8; n_inliers];
    truth.extend(std::iter::repeat(1).take(n_outliers));

    ContaminatedSample {
        x: DMatrix::from_row_slice(n, p, &values),
        truth,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shapes_and_truth() {
        let sample = contaminated_gaussian(1, 50, 5, 3, 10.0);
        assert_eq!(sample.x.nrows(), 55);
        assert_eq!(sample.x.ncols(), 3);
        assert_eq!(sample.n_samples(), 55);
        assert_eq!(sample.n_outliers(), 5);
        assert_eq!(sample.truth[..50], vec![0u8; 50][..]);
        assert_eq!(sample.truth[50..], vec![1u8; 5][..]);
    }

    #[test]
    fn test_deterministic_for_fixed_seed() {
        let a = contaminated_gaussian(9, 20, 2, 2, 8.0);
        let b = contaminated_gaussian(9, 20, 2, 2, 8.0);
        assert_eq!(a.x, b.x);
    }
}
