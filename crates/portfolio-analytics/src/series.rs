//! Weighted portfolio value curve over a trailing window.
//!
//! Every required holding is rebased to its own price at the window anchor,
//! so value(t) = sum over i of 100 * (w_i / 100) * (p_i(t) / p_i(anchor)).
//! A date contributes a point only when every required holding has an
//! observation on it and on the anchor; nothing is filled in.

use analysis_core::{AnalysisError, AnalysisResult, TimeSeriesAligner, TrailingWindow};
use chrono::NaiveDate;

use crate::models::{PortfolioPoint, RiskRequest};

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioSeries {
    pub anchor: NaiveDate,
    pub points: Vec<PortfolioPoint>,
}

impl PortfolioSeries {
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Aligner over the holdings with a non-zero weight, in weight order, paired
/// with their weight fractions.
fn required_holdings(request: &RiskRequest) -> AnalysisResult<(TimeSeriesAligner, Vec<f64>)> {
    let mut aligner = TimeSeriesAligner::new();
    let mut fractions = Vec::new();

    for weight in request.weights.iter().filter(|w| w.weight_percent != 0.0) {
        let history = request.history(&weight.symbol).ok_or_else(|| {
            AnalysisError::missing(format!("no price history for {}", weight.symbol))
        })?;
        aligner.push_series(weight.symbol.clone(), &history.prices)?;
        fractions.push(weight.weight_percent / 100.0);
    }

    if aligner.is_empty() {
        return Err(AnalysisError::missing("portfolio has no weighted holdings"));
    }
    Ok((aligner, fractions))
}

/// Builds the weighted value curve for `window` ending at `request.now`.
pub fn portfolio_value_series(request: &RiskRequest, window: TrailingWindow) -> AnalysisResult<PortfolioSeries> {
    let (aligner, fractions) = required_holdings(request)?;

    let target = aligner
        .trailing_anchor(window, request.now)
        .ok_or(AnalysisError::InsufficientSamples { required: 2, actual: 0 })?;

    // Every holding is rebased to its anchor price, so each must trade on
    // the anchor itself; no later date stands in for it.
    let mut rows = aligner
        .complete_rows_from(target)
        .filter(|row| row.date <= request.now);
    let base_row = match rows.next() {
        Some(row) if row.date == target => row,
        _ => {
            tracing::warn!(
                window = window.label(),
                anchor = %target,
                "holdings incomplete at anchor"
            );
            return Err(AnalysisError::InsufficientSamples { required: 2, actual: 0 });
        }
    };

    let base = base_row.complete_values().unwrap_or_default();
    if let Some(pos) = base.iter().position(|p| *p <= 0.0) {
        return Err(AnalysisError::InvalidData(format!(
            "non-positive anchor price for {}",
            aligner.keys()[pos]
        )));
    }

    let value_of = |prices: &[f64]| -> f64 {
        prices
            .iter()
            .zip(&base)
            .zip(&fractions)
            .map(|((price, base_price), fraction)| 100.0 * fraction * (price / base_price))
            .sum()
    };

    let mut points = vec![PortfolioPoint {
        date: base_row.date,
        value: value_of(&base),
    }];
    points.extend(rows.filter_map(|row| {
        let prices = row.complete_values()?;
        Some(PortfolioPoint {
            date: row.date,
            value: value_of(&prices),
        })
    }));

    tracing::debug!(
        window = window.label(),
        anchor = %base_row.date,
        points = points.len(),
        "built portfolio series"
    );

    Ok(PortfolioSeries {
        anchor: base_row.date,
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RiskFreeRate, SecurityHistory};
    use analysis_core::{PortfolioWeight, PricePoint};
    use approx::assert_abs_diff_eq;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn history(symbol: &str, data: &[(NaiveDate, f64)]) -> SecurityHistory {
        SecurityHistory {
            symbol: symbol.to_string(),
            prices: data.iter().map(|(date, p)| PricePoint::new(*date, *p)).collect(),
        }
    }

    fn weight(symbol: &str, percent: f64) -> PortfolioWeight {
        PortfolioWeight {
            symbol: symbol.to_string(),
            weight_percent: percent,
        }
    }

    fn request(weights: Vec<PortfolioWeight>, histories: Vec<SecurityHistory>) -> RiskRequest {
        RiskRequest {
            weights,
            histories,
            benchmark: None,
            risk_free: RiskFreeRate::Zero,
            now: d(2025, 1, 10),
        }
    }

    #[test]
    fn test_indexed_to_100() {
        let req = request(
            vec![weight("AAA", 60.0), weight("BBB", 40.0)],
            vec![
                history("AAA", &[(d(2024, 1, 10), 50.0), (d(2024, 6, 3), 55.0), (d(2025, 1, 6), 60.0)]),
                history("BBB", &[(d(2024, 1, 10), 20.0), (d(2024, 6, 3), 18.0), (d(2025, 1, 6), 25.0)]),
            ],
        );
        let series = portfolio_value_series(&req, TrailingWindow::OneYear).unwrap();
        assert_eq!(series.anchor, d(2024, 1, 10));
        let values = series.values();
        assert_abs_diff_eq!(values[0], 100.0, epsilon = 1e-12);
        // 60 * 1.1 + 40 * 0.9
        assert_abs_diff_eq!(values[1], 102.0, epsilon = 1e-12);
        // 60 * 1.2 + 40 * 1.25
        assert_abs_diff_eq!(values[2], 122.0, epsilon = 1e-12);
    }

    #[test]
    fn test_incomplete_dates_are_excluded() {
        let req = request(
            vec![weight("AAA", 50.0), weight("BBB", 50.0)],
            vec![
                history("AAA", &[(d(2024, 1, 10), 10.0), (d(2024, 3, 1), 11.0), (d(2024, 4, 1), 12.0)]),
                history("BBB", &[(d(2024, 1, 10), 10.0), (d(2024, 4, 1), 10.0)]),
            ],
        );
        let series = portfolio_value_series(&req, TrailingWindow::OneYear).unwrap();
        assert_eq!(series.dates(), vec![d(2024, 1, 10), d(2024, 4, 1)]);
        assert_abs_diff_eq!(series.values()[1], 110.0, epsilon = 1e-12);
    }

    #[test]
    fn test_anchor_snaps_and_trims_window() {
        let req = request(
            vec![weight("AAA", 100.0)],
            vec![history(
                "AAA",
                &[(d(2023, 6, 1), 5.0), (d(2024, 1, 8), 10.0), (d(2024, 5, 1), 12.0)],
            )],
        );
        let series = portfolio_value_series(&req, TrailingWindow::OneYear).unwrap();
        // Nearest observed date to 2024-01-10
        assert_eq!(series.anchor, d(2024, 1, 8));
        assert_eq!(series.len(), 2);
        assert_abs_diff_eq!(series.values()[1], 120.0, epsilon = 1e-12);
    }

    #[test]
    fn test_incomplete_anchor_yields_no_points() {
        // BBB has no price on the anchor date, so no date qualifies.
        let req = request(
            vec![weight("AAA", 50.0), weight("BBB", 50.0)],
            vec![
                history("AAA", &[(d(2025, 1, 10), 10.0), (d(2025, 1, 11), 20.0), (d(2025, 1, 12), 22.0)]),
                history("BBB", &[(d(2025, 1, 11), 10.0), (d(2025, 1, 12), 10.0)]),
            ],
        );
        assert!(matches!(
            portfolio_value_series(&req, TrailingWindow::OneYear),
            Err(AnalysisError::InsufficientSamples { required: 2, actual: 0 })
        ));
    }

    #[test]
    fn test_zero_weight_is_not_required() {
        let req = request(
            vec![weight("AAA", 100.0), weight("CASH", 0.0)],
            vec![history("AAA", &[(d(2024, 1, 10), 10.0), (d(2024, 2, 1), 11.0)])],
        );
        let series = portfolio_value_series(&req, TrailingWindow::OneYear).unwrap();
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn test_missing_history_is_an_error() {
        let req = request(vec![weight("AAA", 100.0)], vec![]);
        assert!(matches!(
            portfolio_value_series(&req, TrailingWindow::OneYear),
            Err(AnalysisError::MissingData(_))
        ));

        let req = request(vec![weight("AAA", 100.0)], vec![history("AAA", &[])]);
        assert!(matches!(
            portfolio_value_series(&req, TrailingWindow::OneYear),
            Err(AnalysisError::InsufficientSamples { .. })
        ));
    }
}
