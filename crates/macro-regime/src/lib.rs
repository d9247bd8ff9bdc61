pub mod factors;
pub mod source;

use analysis_core::{AnalysisResult, MacroComposite, MacroTilt};
use serde::{Deserialize, Serialize};

pub use factors::{InflationTrend, MacroFactor, PolicyStance};
pub use source::{MacroIndicatorSource, MacroSnapshot, SnapshotPair};

use factors::{interpolate, CREDIT_ANCHORS, CURVE_ANCHORS, GROWTH_ANCHORS, NEUTRAL_SCORE};

/// Most drivers reported per composite.
pub const MAX_DRIVERS: usize = 3;

/// Macro regime classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MacroRegime {
    Expansion,
    LateCycle,
    Overheating,
    Slowdown,
    MidCycle,
    Stagflation,
    Contraction,
}

impl MacroRegime {
    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            MacroRegime::Expansion => "Expansion",
            MacroRegime::LateCycle => "Late Cycle",
            MacroRegime::Overheating => "Overheating",
            MacroRegime::Slowdown => "Slowdown",
            MacroRegime::MidCycle => "Mid Cycle",
            MacroRegime::Stagflation => "Stagflation",
            MacroRegime::Contraction => "Contraction",
        }
    }

    pub fn classify(score: u8, snapshot: &MacroSnapshot) -> Self {
        let inverted = snapshot.curve_spread.map_or(false, |c| c < 0.0);
        let rising_inflation = snapshot.inflation_trend == InflationTrend::Rising;

        if score >= 65 {
            if inverted {
                MacroRegime::LateCycle
            } else {
                MacroRegime::Expansion
            }
        } else if score >= 45 {
            if rising_inflation {
                MacroRegime::Overheating
            } else if inverted {
                MacroRegime::Slowdown
            } else {
                MacroRegime::MidCycle
            }
        } else if rising_inflation {
            MacroRegime::Stagflation
        } else {
            MacroRegime::Contraction
        }
    }
}

/// Sub-score per factor for one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorScores {
    pub growth: f64,
    pub curve: f64,
    pub credit: f64,
    pub inflation: f64,
    pub policy: f64,
}

impl FactorScores {
    pub fn from_snapshot(snapshot: &MacroSnapshot) -> Self {
        let numeric = |reading: Option<f64>, anchors: &[(f64, f64)]| {
            reading.map_or(NEUTRAL_SCORE, |x| interpolate(x, anchors))
        };
        Self {
            growth: numeric(snapshot.growth_proxy, &GROWTH_ANCHORS[..]),
            curve: numeric(snapshot.curve_spread, &CURVE_ANCHORS[..]),
            credit: numeric(snapshot.credit_spread, &CREDIT_ANCHORS[..]),
            inflation: snapshot.inflation_trend.score(),
            policy: snapshot.policy_stance.score(),
        }
    }

    pub fn get(&self, factor: MacroFactor) -> f64 {
        match factor {
            MacroFactor::Growth => self.growth,
            MacroFactor::YieldCurve => self.curve,
            MacroFactor::CreditSpread => self.credit,
            MacroFactor::Inflation => self.inflation,
            MacroFactor::Policy => self.policy,
        }
    }

    /// Weighted sum, rounded and clamped to 0-100.
    pub fn composite(&self) -> u8 {
        let total: f64 = MacroFactor::ALL
            .iter()
            .map(|factor| factor.weight() * self.get(*factor))
            .sum();
        total.round().clamp(0.0, 100.0) as u8
    }
}

/// Composite macro regime scorer
pub struct MacroCompositeScorer;

impl MacroCompositeScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, current: &MacroSnapshot, previous: Option<&MacroSnapshot>) -> MacroComposite {
        let scores = FactorScores::from_snapshot(current);
        let score = scores.composite();
        let regime = MacroRegime::classify(score, current);
        let tilt = match previous {
            Some(prev) => Self::tilt(&FactorScores::from_snapshot(prev), &scores),
            None => MacroTilt::Neutral,
        };

        tracing::debug!(
            score,
            regime = regime.name(),
            ?tilt,
            as_of = %current.as_of,
            "scored macro composite"
        );

        MacroComposite {
            score,
            regime: regime.name().to_string(),
            tilt,
            drivers: Self::drivers(current, &scores),
            as_of: current.as_of,
        }
    }

    pub fn score_from_source(&self, source: &dyn MacroIndicatorSource) -> AnalysisResult<MacroComposite> {
        let latest = source.latest()?;
        let previous = source.previous()?;
        Ok(self.score(&latest, previous.as_ref()))
    }

    /// Positive when growth, curve and credit sub-scores all improved,
    /// Cautious when all deteriorated, Neutral otherwise.
    pub fn tilt(previous: &FactorScores, current: &FactorScores) -> MacroTilt {
        let deltas = [
            current.growth - previous.growth,
            current.curve - previous.curve,
            current.credit - previous.credit,
        ];
        if deltas.iter().all(|d| *d > 0.0) {
            MacroTilt::Positive
        } else if deltas.iter().all(|d| *d < 0.0) {
            MacroTilt::Cautious
        } else {
            MacroTilt::Neutral
        }
    }

    /// Up to three factors furthest from neutral by weighted deviation.
    pub fn drivers(snapshot: &MacroSnapshot, scores: &FactorScores) -> Vec<String> {
        let mut ranked: Vec<(MacroFactor, f64)> = MacroFactor::ALL
            .iter()
            .map(|factor| (*factor, factor.weight() * (scores.get(*factor) - NEUTRAL_SCORE)))
            .filter(|(_, deviation)| *deviation != 0.0)
            .collect();
        ranked.sort_by(|a, b| {
            b.1.abs()
                .partial_cmp(&a.1.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        ranked
            .into_iter()
            .take(MAX_DRIVERS)
            .map(|(factor, deviation)| {
                let direction = if deviation > 0.0 { "supportive" } else { "headwind" };
                format!("{} {} ({})", factor.name(), describe_reading(factor, snapshot), direction)
            })
            .collect()
    }
}

impl Default for MacroCompositeScorer {
    fn default() -> Self {
        Self::new()
    }
}

fn describe_reading(factor: MacroFactor, snapshot: &MacroSnapshot) -> String {
    let percent = |reading: Option<f64>| reading.map_or_else(|| "n/a".to_string(), |x| format!("{x:.2}%"));
    match factor {
        MacroFactor::Growth => percent(snapshot.growth_proxy),
        MacroFactor::YieldCurve => snapshot
            .curve_spread
            .map_or_else(|| "n/a".to_string(), |x| format!("{x:+.2}pp")),
        MacroFactor::CreditSpread => percent(snapshot.credit_spread),
        MacroFactor::Inflation => snapshot.inflation_trend.name().to_lowercase(),
        MacroFactor::Policy => snapshot.policy_stance.name().to_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn snapshot(growth: f64, curve: f64, credit: f64) -> MacroSnapshot {
        MacroSnapshot {
            as_of: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
            growth_proxy: Some(growth),
            curve_spread: Some(curve),
            credit_spread: Some(credit),
            inflation_trend: InflationTrend::Stable,
            policy_stance: PolicyStance::Neutral,
        }
    }

    #[test]
    fn test_weighted_score() {
        // 0.35*75 + 0.2*75 + 0.2*75 + 0.15*60 + 0.1*50 = 70.25
        let composite = MacroCompositeScorer::new().score(&snapshot(3.0, 1.0, 4.0), None);
        assert_eq!(composite.score, 70);
        assert_eq!(composite.regime, "Expansion");
        assert_eq!(composite.tilt, MacroTilt::Neutral);
    }

    #[test]
    fn test_score_clamped_and_monotonic_in_growth() {
        let scorer = MacroCompositeScorer::new();
        let mut previous = 0u8;
        for growth in [-50.0, -2.0, -1.0, 0.0, 0.5, 1.5, 2.2, 3.0, 4.5, 50.0] {
            let score = scorer.score(&snapshot(growth, 0.5, 5.0), None).score;
            assert!(score <= 100);
            assert!(score >= previous);
            previous = score;
        }

        let mut best = snapshot(10.0, 5.0, 1.0);
        best.inflation_trend = InflationTrend::Falling;
        best.policy_stance = PolicyStance::Easing;
        assert_eq!(scorer.score(&best, None).score, 93);

        let mut worst = snapshot(-10.0, -5.0, 15.0);
        worst.inflation_trend = InflationTrend::Rising;
        worst.policy_stance = PolicyStance::Tightening;
        let composite = scorer.score(&worst, None);
        assert_eq!(composite.score, 7);
        assert_eq!(composite.regime, "Stagflation");
    }

    #[test]
    fn test_regime_labels() {
        let mut s = snapshot(3.0, -0.1, 4.0);
        assert_eq!(MacroRegime::classify(70, &s), MacroRegime::LateCycle);
        assert_eq!(MacroRegime::classify(50, &s), MacroRegime::Slowdown);
        s.inflation_trend = InflationTrend::Rising;
        assert_eq!(MacroRegime::classify(50, &s), MacroRegime::Overheating);
        assert_eq!(MacroRegime::classify(44, &s), MacroRegime::Stagflation);

        let s = snapshot(1.0, 0.5, 5.0);
        assert_eq!(MacroRegime::classify(65, &s), MacroRegime::Expansion);
        assert_eq!(MacroRegime::classify(45, &s), MacroRegime::MidCycle);
        assert_eq!(MacroRegime::classify(20, &s), MacroRegime::Contraction);
    }

    #[test]
    fn test_tilt_requires_agreement() {
        let scorer = MacroCompositeScorer::new();
        let before = snapshot(1.5, 0.25, 5.0);

        let improving = snapshot(2.0, 0.5, 4.5);
        assert_eq!(scorer.score(&improving, Some(&before)).tilt, MacroTilt::Positive);

        let worsening = snapshot(1.0, 0.0, 5.5);
        assert_eq!(scorer.score(&worsening, Some(&before)).tilt, MacroTilt::Cautious);

        let mixed = snapshot(2.0, 0.0, 4.5);
        assert_eq!(scorer.score(&mixed, Some(&before)).tilt, MacroTilt::Neutral);

        // Unchanged curve breaks agreement
        let partial = snapshot(2.0, 0.25, 4.5);
        assert_eq!(scorer.score(&partial, Some(&before)).tilt, MacroTilt::Neutral);
    }

    #[test]
    fn test_drivers_ranked_by_weighted_deviation() {
        let mut s = snapshot(4.5, 0.25, 8.0);
        s.policy_stance = PolicyStance::Easing;
        let composite = MacroCompositeScorer::new().score(&s, None);

        // Growth +17.5, credit -10, inflation +1.5, policy +2.5; curve is neutral
        assert_eq!(composite.drivers.len(), MAX_DRIVERS);
        assert!(composite.drivers[0].starts_with("Growth"));
        assert!(composite.drivers[0].ends_with("(supportive)"));
        assert!(composite.drivers[1].starts_with("Credit spreads"));
        assert!(composite.drivers[1].ends_with("(headwind)"));
        assert!(composite.drivers[2].starts_with("Policy"));
    }

    #[test]
    fn test_missing_readings_are_neutral() {
        let s = MacroSnapshot {
            as_of: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
            growth_proxy: None,
            curve_spread: None,
            credit_spread: None,
            inflation_trend: InflationTrend::Unknown,
            policy_stance: PolicyStance::Unknown,
        };
        let composite = MacroCompositeScorer::new().score(&s, None);
        assert_eq!(composite.score, 50);
        assert_eq!(composite.regime, "Mid Cycle");
        assert!(composite.drivers.is_empty());
    }

    #[test]
    fn test_score_from_source() {
        let source = SnapshotPair {
            latest: snapshot(2.0, 0.5, 4.5),
            previous: Some(snapshot(1.5, 0.25, 5.0)),
        };
        let composite = MacroCompositeScorer::new().score_from_source(&source).unwrap();
        assert_eq!(composite.tilt, MacroTilt::Positive);
        assert_eq!(composite.as_of, source.latest.as_of);
    }
}
