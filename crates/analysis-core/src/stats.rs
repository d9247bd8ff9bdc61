//! Small numeric helpers shared by the valuation and risk crates.
//!
//! Sample statistics delegate to `statrs`; the wrappers here pin down the
//! degenerate cases (empty or single-element input) to 0 instead of NaN.

use statrs::statistics::Statistics;

/// Treat standard deviations below this as zero variance.
pub const MIN_STD: f64 = 1e-12;

/// Arithmetic mean. Empty input yields 0.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.mean()
}

/// Sample standard deviation (n - 1). Fewer than two values yield 0.
pub fn sample_std_dev(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    data.std_dev()
}

/// Sample variance (n - 1). Fewer than two values yield 0.
pub fn sample_variance(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    data.variance()
}

/// Sample covariance of two equal-length slices.
/// Returns `None` when the lengths differ or fewer than two pairs exist.
pub fn sample_covariance(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    Some(x.covariance(y))
}

/// Round to cents.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Median of the finite values. Empty input yields `None`.
pub fn median(data: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = data.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Herfindahl index from fractional weights (0-1). Higher = more concentrated.
pub fn herfindahl_index(weights: &[f64]) -> f64 {
    weights.iter().map(|w| w * w).sum()
}
