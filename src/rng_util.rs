use crate::{Error, Result};

/// Generate a random `f64` in the range `[low, high)`. Returns `low` when
/// the range is degenerate.
#[inline]
pub(crate) fn f64_range(rng: &mut fastrand::Rng, low: f64, high: f64) -> f64 {
    low + rng.f64() * (high - low)
}

/// Standard normal draw (Box–Muller).
pub(crate) fn standard_normal(rng: &mut fastrand::Rng) -> f64 {
    // 1 - f64() lies in (0, 1], keeping ln() finite.
    let u1 = 1.0 - rng.f64();
    let u2 = rng.f64();
    (-2.0 * u1.ln()).sqrt() * (core::f64::consts::TAU * u2).cos()
}

/// Draw an index with probability proportional to `weights`.
///
/// Negative and NaN weights count as zero.
pub(crate) fn weighted_index(rng: &mut fastrand::Rng, weights: &[f64]) -> Result<usize> {
    let total: f64 = weights.iter().filter(|w| **w > 0.0).sum();
    if weights.is_empty() {
        return Err(Error::EmptyDomain);
    }
    if total <= 0.0 || !total.is_finite() {
        return Err(Error::ZeroWeights);
    }
    let mut target = rng.f64() * total;
    let mut last_positive = 0;
    for (i, &w) in weights.iter().enumerate() {
        if w > 0.0 {
            if target < w {
                return Ok(i);
            }
            target -= w;
            last_positive = i;
        }
    }
    // Rounding can leave a sliver past the last bucket.
    Ok(last_positive)
}

/// Uniformly random permutation of `0..n` (Fisher–Yates).
pub(crate) fn permutation(rng: &mut fastrand::Rng, n: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n).collect();
    for i in (1..n).rev() {
        let j = rng.usize(..=i);
        order.swap(i, j);
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f64_range_degenerate() {
        let mut rng = fastrand::Rng::with_seed(1);
        assert!((f64_range(&mut rng, 2.5, 2.5) - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn weighted_index_skips_zero_weights() {
        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..500 {
            let i = weighted_index(&mut rng, &[0.0, 1.0, 0.0, 3.0]).unwrap();
            assert!(i == 1 || i == 3);
        }
    }

    #[test]
    fn weighted_index_rejects_all_zero() {
        let mut rng = fastrand::Rng::with_seed(7);
        assert!(matches!(
            weighted_index(&mut rng, &[0.0, 0.0]),
            Err(Error::ZeroWeights)
        ));
        assert!(matches!(
            weighted_index(&mut rng, &[]),
            Err(Error::EmptyDomain)
        ));
    }

    #[test]
    fn permutation_is_a_permutation() {
        let mut rng = fastrand::Rng::with_seed(3);
        let mut order = permutation(&mut rng, 50);
        order.sort_unstable();
        assert_eq!(order, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn standard_normal_moments() {
        let mut rng = fastrand::Rng::with_seed(11);
        let n = 20_000;
        let xs: Vec<f64> = (0..n).map(|_| standard_normal(&mut rng)).collect();
        #[allow(clippy::cast_precision_loss)]
        let mean = xs.iter().sum::<f64>() / n as f64;
        #[allow(clippy::cast_precision_loss)]
        let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
        assert!(mean.abs() < 0.05, "mean {mean}");
        assert!((var - 1.0).abs() < 0.05, "variance {var}");
    }
}
