//! Growth-rate estimation over newest-first period values.
//!
//! Two policies coexist and are kept separate on purpose: compound annual
//! growth between the newest and oldest value, and the mean of
//! period-over-period changes across the most recent four periods. They give
//! different answers on the same data, so callers name the one they use.

use serde::{Deserialize, Serialize};

use crate::stats::round2;

/// Periods in a fiscal year.
pub const PERIODS_PER_YEAR: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthPolicy {
    Cagr,
    SequentialAverage,
}

impl GrowthPolicy {
    pub fn estimate(&self, newest_first: &[f64]) -> f64 {
        match self {
            GrowthPolicy::Cagr => cagr(newest_first),
            GrowthPolicy::SequentialAverage => sequential_average_growth(newest_first),
        }
    }
}

/// Compound growth per period: (v[0] / v[L-1])^(1/(L-1)) - 1.
///
/// Returns 0 for fewer than two values, a non-positive oldest value, or a
/// negative newest value. A newest value of 0 gives -1.
pub fn cagr(newest_first: &[f64]) -> f64 {
    let len = newest_first.len();
    if len < 2 {
        return 0.0;
    }
    let newest = newest_first[0];
    let oldest = newest_first[len - 1];
    if oldest <= 0.0 || newest < 0.0 {
        return 0.0;
    }
    (newest / oldest).powf(1.0 / (len - 1) as f64) - 1.0
}

/// Mean of (current / previous - 1) over the four most recent values,
/// skipping pairs whose older value is not positive.
pub fn sequential_average_growth(newest_first: &[f64]) -> f64 {
    let recent = &newest_first[..newest_first.len().min(PERIODS_PER_YEAR)];
    let ratios: Vec<f64> = recent
        .windows(2)
        .filter(|w| w[1] > 0.0)
        .map(|w| w[0] / w[1] - 1.0)
        .collect();

    if ratios.is_empty() {
        return 0.0;
    }
    ratios.iter().sum::<f64>() / ratios.len() as f64
}

/// Sum of up to `periods` most recent values, scaled by 4/n when fewer than
/// four periods are available, rounded to 2 decimals.
pub fn annualize(newest_first: &[f64], periods: usize) -> f64 {
    let n = periods.min(newest_first.len());
    if n == 0 {
        return 0.0;
    }
    let sum: f64 = newest_first[..n].iter().sum();
    let scaled = if n < PERIODS_PER_YEAR {
        sum * (PERIODS_PER_YEAR as f64 / n as f64)
    } else {
        sum
    };
    round2(scaled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_cagr_known_value() {
        let growth = cagr(&[200.0, 150.0, 100.0]);
        assert_abs_diff_eq!(growth, 2.0_f64.sqrt() - 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(growth, 0.4142, epsilon = 1e-4);
    }

    #[test]
    fn test_cagr_direction() {
        // Newest-first, so this sequence grows over time.
        assert!(cagr(&[130.0, 120.0, 110.0, 100.0]) > 0.0);
        assert_eq!(cagr(&[100.0, 100.0, 100.0]), 0.0);
        assert!(cagr(&[80.0, 90.0, 100.0]) < 0.0);
    }

    #[test]
    fn test_cagr_guards() {
        assert_eq!(cagr(&[]), 0.0);
        assert_eq!(cagr(&[100.0]), 0.0);
        assert_eq!(cagr(&[100.0, 0.0]), 0.0);
        assert_eq!(cagr(&[100.0, -50.0]), 0.0);
        assert_eq!(cagr(&[-10.0, 50.0]), 0.0);
        // Total loss is a defined rate
        assert_eq!(cagr(&[0.0, 100.0]), -1.0);
        assert_eq!(cagr(&[0.0, 50.0, 100.0]), -1.0);
    }

    #[test]
    fn test_sequential_average() {
        let growth = sequential_average_growth(&[120.0, 100.0, 80.0, 50.0]);
        assert_abs_diff_eq!(growth, 0.35, epsilon = 1e-12);
    }

    #[test]
    fn test_sequential_average_uses_four_most_recent() {
        // The fifth value would add a 900% jump if it were used.
        let growth = sequential_average_growth(&[120.0, 100.0, 80.0, 50.0, 5.0]);
        assert_abs_diff_eq!(growth, 0.35, epsilon = 1e-12);
    }

    #[test]
    fn test_sequential_average_skips_invalid_bases() {
        // Pairs: 110/0 skipped, 0/-5 skipped, -5/50 -> -1.1
        let growth = sequential_average_growth(&[110.0, 0.0, -5.0, 50.0]);
        assert_abs_diff_eq!(growth, -1.1, epsilon = 1e-12);
        assert_eq!(sequential_average_growth(&[10.0, 0.0]), 0.0);
        assert_eq!(sequential_average_growth(&[10.0]), 0.0);
    }

    #[test]
    fn test_policies_differ() {
        let values = [120.0, 100.0, 80.0, 50.0];
        assert!(
            (GrowthPolicy::Cagr.estimate(&values)
                - GrowthPolicy::SequentialAverage.estimate(&values))
            .abs()
                > 0.01
        );
    }

    #[test]
    fn test_annualize() {
        assert_eq!(annualize(&[10.0, 20.0, 30.0, 40.0, 50.0], 4), 100.0);
        // Two quarters scaled by 4/2
        assert_eq!(annualize(&[1.111, 2.222], 4), 6.67);
        assert_eq!(annualize(&[5.0], 1), 20.0);
        assert_eq!(annualize(&[], 4), 0.0);
        assert_eq!(annualize(&[5.0, 5.0], 0), 0.0);
    }
}
