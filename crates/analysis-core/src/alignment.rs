//! Date alignment for heterogeneous price series.
//!
//! Series arrive with their own calendars (different listings, holidays,
//! gaps in provider data). The aligner keeps each series keyed by date and
//! exposes the sorted union of observed dates, resolving every series exactly
//! at each date. Nothing is interpolated or forward-filled: a series without
//! an observation on a date resolves to `None` there.

use std::collections::btree_set;
use std::collections::{BTreeMap, BTreeSet};

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AnalysisResult};
use crate::types::PricePoint;

/// Trailing lookback window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrailingWindow {
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "3y")]
    ThreeYears,
    #[serde(rename = "5y")]
    FiveYears,
}

impl TrailingWindow {
    pub const ALL: [TrailingWindow; 3] = [
        TrailingWindow::OneYear,
        TrailingWindow::ThreeYears,
        TrailingWindow::FiveYears,
    ];

    pub fn years(&self) -> u32 {
        match self {
            TrailingWindow::OneYear => 1,
            TrailingWindow::ThreeYears => 3,
            TrailingWindow::FiveYears => 5,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TrailingWindow::OneYear => "1Y",
            TrailingWindow::ThreeYears => "3Y",
            TrailingWindow::FiveYears => "5Y",
        }
    }

    /// The calendar date the window nominally starts on. This date need not
    /// be a trading day; anchors are snapped to observed dates.
    pub fn start_target(&self, now: NaiveDate) -> NaiveDate {
        now.checked_sub_months(Months::new(12 * self.years()))
            .unwrap_or(NaiveDate::MIN)
    }
}

/// One date of the aligned axis.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRow {
    pub date: NaiveDate,
    /// Per-series value in insertion order; `None` where the series has no
    /// observation on `date`.
    pub values: Vec<Option<f64>>,
}

impl AlignedRow {
    pub fn is_complete(&self) -> bool {
        self.values.iter().all(Option::is_some)
    }

    pub fn complete_values(&self) -> Option<Vec<f64>> {
        self.values.iter().copied().collect()
    }
}

/// Lazy iterator over aligned rows. Each call to [`TimeSeriesAligner::rows`]
/// builds a fresh one from the stored series.
pub struct AlignedRows<'a> {
    dates: btree_set::IntoIter<NaiveDate>,
    series: &'a [BTreeMap<NaiveDate, f64>],
}

impl Iterator for AlignedRows<'_> {
    type Item = AlignedRow;

    fn next(&mut self) -> Option<Self::Item> {
        let date = self.dates.next()?;
        let values = self.series.iter().map(|s| s.get(&date).copied()).collect();
        Some(AlignedRow { date, values })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.dates.size_hint()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TimeSeriesAligner {
    keys: Vec<String>,
    series: Vec<BTreeMap<NaiveDate, f64>>,
}

impl TimeSeriesAligner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a series under `key`. Non-finite prices are dropped rather than
    /// stored; a repeated date keeps the last observation.
    pub fn push_series(&mut self, key: impl Into<String>, points: &[PricePoint]) -> AnalysisResult<()> {
        let key = key.into();
        if self.keys.iter().any(|k| *k == key) {
            return Err(AnalysisError::InvalidData(format!("duplicate series key: {key}")));
        }

        let series: BTreeMap<NaiveDate, f64> = points
            .iter()
            .filter(|p| p.value().is_finite())
            .map(|p| (p.date, p.value()))
            .collect();

        if series.len() < points.len() {
            tracing::debug!(
                series = %key,
                dropped = points.len() - series.len(),
                "dropped non-finite or duplicate observations"
            );
        }

        self.keys.push(key);
        self.series.push(series);
        Ok(())
    }

    pub fn with_series(mut self, key: impl Into<String>, points: &[PricePoint]) -> AnalysisResult<Self> {
        self.push_series(key, points)?;
        Ok(self)
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    fn index_of(&self, key: &str) -> Option<usize> {
        self.keys.iter().position(|k| k == key)
    }

    fn date_set(&self) -> BTreeSet<NaiveDate> {
        self.series.iter().flat_map(|s| s.keys().copied()).collect()
    }

    /// Sorted ascending union of every observed date.
    pub fn union_dates(&self) -> Vec<NaiveDate> {
        self.date_set().into_iter().collect()
    }

    /// Exact lookup; never interpolates.
    pub fn value_at(&self, key: &str, date: NaiveDate) -> Option<f64> {
        let idx = self.index_of(key)?;
        self.series[idx].get(&date).copied()
    }

    /// Observed date closest to `target`. Ties resolve to the earlier date.
    pub fn nearest_date(&self, target: NaiveDate) -> Option<NaiveDate> {
        let dates = self.date_set();
        let before = dates.range(..=target).next_back().copied();
        let after = dates.range(target..).next().copied();

        match (before, after) {
            (Some(b), Some(a)) => {
                if (a - target) < (target - b) {
                    Some(a)
                } else {
                    Some(b)
                }
            }
            (Some(b), None) => Some(b),
            (None, Some(a)) => Some(a),
            (None, None) => None,
        }
    }

    /// Observed date nearest to `now - window`.
    pub fn trailing_anchor(&self, window: TrailingWindow, now: NaiveDate) -> Option<NaiveDate> {
        let anchor = self.nearest_date(window.start_target(now));
        tracing::debug!(window = window.label(), ?anchor, %now, "resolved trailing anchor");
        anchor
    }

    pub fn rows(&self) -> AlignedRows<'_> {
        AlignedRows {
            dates: self.date_set().into_iter(),
            series: &self.series,
        }
    }

    /// Rows dated on or after `start`.
    pub fn rows_from(&self, start: NaiveDate) -> AlignedRows<'_> {
        let dates: BTreeSet<NaiveDate> = self.date_set().split_off(&start);
        AlignedRows {
            dates: dates.into_iter(),
            series: &self.series,
        }
    }

    /// Rows on or after `start` where every series resolves.
    pub fn complete_rows_from(&self, start: NaiveDate) -> impl Iterator<Item = AlignedRow> + '_ {
        self.rows_from(start).filter(AlignedRow::is_complete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn points(data: &[(NaiveDate, f64)]) -> Vec<PricePoint> {
        data.iter().map(|(date, v)| PricePoint::new(*date, *v)).collect()
    }

    fn sample_aligner() -> TimeSeriesAligner {
        TimeSeriesAligner::new()
            .with_series(
                "AAA",
                &points(&[(d(2024, 1, 3), 10.0), (d(2024, 1, 2), 9.0), (d(2024, 1, 5), 11.0)]),
            )
            .unwrap()
            .with_series("BBB", &points(&[(d(2024, 1, 2), 20.0), (d(2024, 1, 4), 21.0)]))
            .unwrap()
    }

    #[test]
    fn test_union_is_sorted() {
        let aligner = sample_aligner();
        assert_eq!(
            aligner.union_dates(),
            vec![d(2024, 1, 2), d(2024, 1, 3), d(2024, 1, 4), d(2024, 1, 5)]
        );
    }

    #[test]
    fn test_rows_never_fill_gaps() {
        let aligner = sample_aligner();
        let rows: Vec<AlignedRow> = aligner.rows().collect();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].values, vec![Some(9.0), Some(20.0)]);
        assert_eq!(rows[1].values, vec![Some(10.0), None]);
        assert_eq!(rows[2].values, vec![None, Some(21.0)]);
        assert!(!rows[3].is_complete());
    }

    #[test]
    fn test_rows_are_restartable() {
        let aligner = sample_aligner();
        let first: Vec<AlignedRow> = aligner.rows().collect();
        let second: Vec<AlignedRow> = aligner.rows().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_complete_rows_from_anchor() {
        let aligner = sample_aligner();
        let complete: Vec<AlignedRow> = aligner.complete_rows_from(d(2024, 1, 2)).collect();
        assert_eq!(complete.len(), 1);
        assert_eq!(complete[0].complete_values(), Some(vec![9.0, 20.0]));

        assert_eq!(aligner.rows_from(d(2024, 1, 4)).count(), 2);
    }

    #[test]
    fn test_nearest_date_prefers_earlier_on_tie() {
        let aligner = TimeSeriesAligner::new()
            .with_series("X", &points(&[(d(2024, 1, 1), 1.0), (d(2024, 1, 5), 1.0)]))
            .unwrap();
        assert_eq!(aligner.nearest_date(d(2024, 1, 3)), Some(d(2024, 1, 1)));
        assert_eq!(aligner.nearest_date(d(2024, 1, 4)), Some(d(2024, 1, 5)));
        assert_eq!(aligner.nearest_date(d(2023, 6, 1)), Some(d(2024, 1, 1)));
        assert_eq!(aligner.nearest_date(d(2025, 6, 1)), Some(d(2024, 1, 5)));
        assert_eq!(TimeSeriesAligner::new().nearest_date(d(2024, 1, 1)), None);
    }

    #[test]
    fn test_trailing_anchor_snaps_to_observed_date() {
        // 2023-06-17 is a Saturday; the nearest observation is the Friday.
        let aligner = TimeSeriesAligner::new()
            .with_series(
                "X",
                &points(&[
                    (d(2023, 6, 16), 1.0),
                    (d(2023, 6, 19), 1.0),
                    (d(2024, 6, 17), 1.0),
                ]),
            )
            .unwrap();
        let anchor = aligner.trailing_anchor(TrailingWindow::OneYear, d(2024, 6, 17));
        assert_eq!(anchor, Some(d(2023, 6, 16)));
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let result = sample_aligner().with_series("AAA", &[]);
        assert!(matches!(result, Err(AnalysisError::InvalidData(_))));
    }

    #[test]
    fn test_value_at_is_exact() {
        let aligner = sample_aligner();
        assert_eq!(aligner.value_at("AAA", d(2024, 1, 3)), Some(10.0));
        assert_eq!(aligner.value_at("AAA", d(2024, 1, 4)), None);
        assert_eq!(aligner.value_at("ZZZ", d(2024, 1, 3)), None);
    }

    #[test]
    fn test_adjusted_close_preferred() {
        let mut point = PricePoint::new(d(2024, 1, 2), 100.0);
        point.adjusted_close = Some(98.5);
        let aligner = TimeSeriesAligner::new().with_series("X", &[point]).unwrap();
        assert_eq!(aligner.value_at("X", d(2024, 1, 2)), Some(98.5));
    }

    #[test]
    fn test_window_start_target() {
        assert_eq!(TrailingWindow::ThreeYears.start_target(d(2024, 2, 29)), d(2021, 2, 28));
        assert_eq!(TrailingWindow::OneYear.start_target(d(2024, 6, 17)), d(2023, 6, 17));
    }
}
