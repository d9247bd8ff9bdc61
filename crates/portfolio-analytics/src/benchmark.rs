use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::SecurityHistory;
use crate::series::PortfolioSeries;
use crate::shared_math;

/// Portfolio versus benchmark over the same retained dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkAnalysis {
    pub benchmark_symbol: String,
    pub beta: Option<f64>,
    pub portfolio_return: f64,
    pub benchmark_return: f64,
    pub excess_return: f64,
}

pub struct BenchmarkComparer;

impl BenchmarkComparer {
    /// Benchmark prices at every date of `series`, or `None` if any date is
    /// missing. Beta is only meaningful on identically dated returns.
    fn aligned_prices(series: &PortfolioSeries, benchmark: &SecurityHistory) -> Option<Vec<f64>> {
        let by_date: BTreeMap<NaiveDate, f64> = benchmark
            .prices
            .iter()
            .filter(|p| p.value().is_finite())
            .map(|p| (p.date, p.value()))
            .collect();

        let mut prices = Vec::with_capacity(series.len());
        for point in &series.points {
            match by_date.get(&point.date) {
                Some(price) => prices.push(*price),
                None => {
                    tracing::warn!(
                        benchmark = %benchmark.symbol,
                        date = %point.date,
                        "benchmark missing a portfolio date; beta omitted"
                    );
                    return None;
                }
            }
        }
        Some(prices)
    }

    /// Beta of the portfolio curve against `benchmark`. Omitted when the
    /// benchmark does not cover every retained date or has no variance.
    pub fn beta(series: &PortfolioSeries, benchmark: &SecurityHistory) -> Option<f64> {
        Self::compare(series, benchmark).and_then(|analysis| analysis.beta)
    }

    pub fn compare(series: &PortfolioSeries, benchmark: &SecurityHistory) -> Option<BenchmarkAnalysis> {
        let bench_values = Self::aligned_prices(series, benchmark)?;
        if bench_values.iter().any(|p| *p == 0.0) {
            tracing::warn!(benchmark = %benchmark.symbol, "zero benchmark price; beta omitted");
            return None;
        }
        let port_values = series.values();

        let port_returns = shared_math::daily_returns(&port_values);
        let bench_returns = shared_math::daily_returns(&bench_values);
        let beta = shared_math::beta(&port_returns, &bench_returns);
        if beta.is_none() {
            tracing::debug!(benchmark = %benchmark.symbol, "benchmark variance too small for beta");
        }

        let portfolio_return = shared_math::cumulative_return(&port_values);
        let benchmark_return = shared_math::cumulative_return(&bench_values);
        Some(BenchmarkAnalysis {
            benchmark_symbol: benchmark.symbol.clone(),
            beta,
            portfolio_return,
            benchmark_return,
            excess_return: portfolio_return - benchmark_return,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PortfolioPoint;
    use analysis_core::PricePoint;
    use approx::assert_abs_diff_eq;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    fn series(values: &[f64]) -> PortfolioSeries {
        PortfolioSeries {
            anchor: d(1),
            points: values
                .iter()
                .enumerate()
                .map(|(i, v)| PortfolioPoint {
                    date: d(i as u32 + 1),
                    value: *v,
                })
                .collect(),
        }
    }

    fn benchmark(prices: &[(u32, f64)]) -> SecurityHistory {
        SecurityHistory {
            symbol: "SPY".to_string(),
            prices: prices.iter().map(|(day, p)| PricePoint::new(d(*day), *p)).collect(),
        }
    }

    #[test]
    fn test_beta_of_leveraged_curve() {
        // Portfolio moves twice the benchmark each day
        let bench = benchmark(&[(1, 100.0), (2, 101.0), (3, 99.0), (4, 102.0), (5, 103.0)]);
        let mut values = vec![100.0];
        for w in [100.0, 101.0, 99.0, 102.0, 103.0].windows(2) {
            let r = w[1] / w[0] - 1.0;
            let last = *values.last().unwrap();
            values.push(last * (1.0 + 2.0 * r));
        }
        let analysis = BenchmarkComparer::compare(&series(&values), &bench).unwrap();
        assert_abs_diff_eq!(analysis.beta.unwrap(), 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(analysis.benchmark_return, 0.03, epsilon = 1e-12);
    }

    #[test]
    fn test_beta_omitted_on_gap() {
        let bench = benchmark(&[(1, 100.0), (2, 101.0), (4, 102.0)]);
        assert!(BenchmarkComparer::beta(&series(&[100.0, 101.0, 102.0]), &bench).is_none());
    }

    #[test]
    fn test_beta_omitted_on_flat_benchmark() {
        let bench = benchmark(&[(1, 100.0), (2, 100.0), (3, 100.0)]);
        let analysis = BenchmarkComparer::compare(&series(&[100.0, 101.0, 103.0]), &bench).unwrap();
        assert!(analysis.beta.is_none());
        assert_abs_diff_eq!(analysis.excess_return, 0.03, epsilon = 1e-12);
    }
}
