use std::collections::BTreeMap;

use analysis_core::stats::{herfindahl_index, round2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakdownDimension {
    Segment,
    Geography,
}

/// Revenue split along one dimension, keyed by the provider's stable
/// segment or region identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueBreakdown {
    pub dimension: BreakdownDimension,
    pub revenue: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixEntry {
    pub key: String,
    pub revenue: f64,
    pub share_percent: f64,
}

impl RevenueBreakdown {
    pub fn new(dimension: BreakdownDimension) -> Self {
        Self {
            dimension,
            revenue: BTreeMap::new(),
        }
    }

    /// Adds revenue to `key`, accumulating repeated keys.
    pub fn add(&mut self, key: impl Into<String>, revenue: f64) {
        *self.revenue.entry(key.into()).or_insert(0.0) += revenue;
    }

    /// Sum of positive entries. Negative entries (eliminations) are not
    /// part of the mix.
    pub fn total(&self) -> f64 {
        self.revenue.values().filter(|v| **v > 0.0).sum()
    }

    /// Share of total per key, largest first. Empty when there is no
    /// positive revenue.
    pub fn mix(&self) -> Vec<MixEntry> {
        let total = self.total();
        if total <= 0.0 {
            return Vec::new();
        }
        let mut entries: Vec<MixEntry> = self
            .revenue
            .iter()
            .filter(|(_, v)| **v > 0.0)
            .map(|(key, v)| MixEntry {
                key: key.clone(),
                revenue: *v,
                share_percent: round2(v / total * 100.0),
            })
            .collect();
        entries.sort_by(|a, b| {
            b.revenue
                .partial_cmp(&a.revenue)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.key.cmp(&b.key))
        });
        entries
    }

    /// Herfindahl concentration of the mix (1.0 = single source).
    pub fn concentration(&self) -> f64 {
        let total = self.total();
        if total <= 0.0 {
            return 0.0;
        }
        let shares: Vec<f64> = self
            .revenue
            .values()
            .filter(|v| **v > 0.0)
            .map(|v| v / total)
            .collect();
        herfindahl_index(&shares)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mix_sorted_by_revenue() {
        let mut breakdown = RevenueBreakdown::new(BreakdownDimension::Geography);
        breakdown.add("EMEA", 250.0);
        breakdown.add("AMER", 500.0);
        breakdown.add("APAC", 250.0);
        breakdown.add("ELIM", -20.0);

        let mix = breakdown.mix();
        assert_eq!(mix.len(), 3);
        assert_eq!(mix[0].key, "AMER");
        assert_eq!(mix[0].share_percent, 50.0);
        // Ties break on key
        assert_eq!(mix[1].key, "APAC");
        assert_eq!(mix[2].key, "EMEA");
        assert!((breakdown.concentration() - 0.375).abs() < 1e-12);
    }

    #[test]
    fn test_repeated_keys_accumulate() {
        let mut breakdown = RevenueBreakdown::new(BreakdownDimension::Segment);
        breakdown.add("services", 10.0);
        breakdown.add("services", 30.0);
        assert_eq!(breakdown.revenue["services"], 40.0);
        assert_eq!(breakdown.concentration(), 1.0);
    }

    #[test]
    fn test_empty_breakdown() {
        let breakdown = RevenueBreakdown::new(BreakdownDimension::Segment);
        assert!(breakdown.mix().is_empty());
        assert_eq!(breakdown.concentration(), 0.0);
    }
}
