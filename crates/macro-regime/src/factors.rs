//! Per-factor mapping of raw macro readings onto a 0-100 scale, where 50 is
//! neutral and higher is more supportive of risk assets.

use serde::{Deserialize, Serialize};

/// Neutral sub-score.
pub const NEUTRAL_SCORE: f64 = 50.0;

/// Real GDP growth proxy, percent.
pub const GROWTH_ANCHORS: [(f64, f64); 5] = [(-2.0, 0.0), (0.0, 25.0), (1.5, 50.0), (3.0, 75.0), (4.5, 100.0)];
/// 10y - 2y treasury spread, percentage points.
pub const CURVE_ANCHORS: [(f64, f64); 5] = [(-1.0, 0.0), (-0.25, 25.0), (0.25, 50.0), (1.0, 75.0), (2.0, 100.0)];
/// High-yield option-adjusted spread, percent. Wider is worse.
pub const CREDIT_ANCHORS: [(f64, f64); 5] = [(3.0, 100.0), (4.0, 75.0), (5.0, 50.0), (6.5, 25.0), (8.0, 0.0)];

/// Piecewise-linear interpolation over anchors sorted by x, flat beyond the
/// first and last anchor.
pub fn interpolate(x: f64, anchors: &[(f64, f64)]) -> f64 {
    let (Some(first), Some(last)) = (anchors.first(), anchors.last()) else {
        return NEUTRAL_SCORE;
    };
    if x.is_nan() {
        return NEUTRAL_SCORE;
    }
    if x <= first.0 {
        return first.1;
    }
    if x >= last.0 {
        return last.1;
    }

    for w in anchors.windows(2) {
        let (x0, y0) = w[0];
        let (x1, y1) = w[1];
        if x <= x1 {
            return y0 + (x - x0) / (x1 - x0) * (y1 - y0);
        }
    }
    last.1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InflationTrend {
    Falling,
    Stable,
    Rising,
    #[default]
    #[serde(other)]
    Unknown,
}

impl InflationTrend {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "falling" | "disinflation" | "cooling" => InflationTrend::Falling,
            "stable" | "steady" => InflationTrend::Stable,
            "rising" | "accelerating" | "heating" => InflationTrend::Rising,
            _ => InflationTrend::Unknown,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            InflationTrend::Falling => "Falling",
            InflationTrend::Stable => "Stable",
            InflationTrend::Rising => "Rising",
            InflationTrend::Unknown => "Unknown",
        }
    }

    pub fn score(&self) -> f64 {
        match self {
            InflationTrend::Falling => 70.0,
            InflationTrend::Stable => 60.0,
            InflationTrend::Rising => 30.0,
            InflationTrend::Unknown => NEUTRAL_SCORE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PolicyStance {
    Easing,
    Neutral,
    Tightening,
    #[default]
    #[serde(other)]
    Unknown,
}

impl PolicyStance {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "easing" | "dovish" | "cutting" => PolicyStance::Easing,
            "neutral" | "on_hold" | "hold" => PolicyStance::Neutral,
            "tightening" | "hawkish" | "hiking" => PolicyStance::Tightening,
            _ => PolicyStance::Unknown,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PolicyStance::Easing => "Easing",
            PolicyStance::Neutral => "Neutral",
            PolicyStance::Tightening => "Tightening",
            PolicyStance::Unknown => "Unknown",
        }
    }

    pub fn score(&self) -> f64 {
        match self {
            PolicyStance::Easing => 75.0,
            PolicyStance::Neutral => NEUTRAL_SCORE,
            PolicyStance::Tightening => 25.0,
            PolicyStance::Unknown => NEUTRAL_SCORE,
        }
    }
}

/// The five composite inputs, in weight order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MacroFactor {
    Growth,
    YieldCurve,
    CreditSpread,
    Inflation,
    Policy,
}

impl MacroFactor {
    pub const ALL: [MacroFactor; 5] = [
        MacroFactor::Growth,
        MacroFactor::YieldCurve,
        MacroFactor::CreditSpread,
        MacroFactor::Inflation,
        MacroFactor::Policy,
    ];

    pub fn weight(&self) -> f64 {
        match self {
            MacroFactor::Growth => 0.35,
            MacroFactor::YieldCurve => 0.20,
            MacroFactor::CreditSpread => 0.20,
            MacroFactor::Inflation => 0.15,
            MacroFactor::Policy => 0.10,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MacroFactor::Growth => "Growth",
            MacroFactor::YieldCurve => "Yield curve",
            MacroFactor::CreditSpread => "Credit spreads",
            MacroFactor::Inflation => "Inflation",
            MacroFactor::Policy => "Policy",
        }
    }
}
