use analysis_core::{PortfolioWeight, PricePoint, RiskMetrics, TrailingWindow};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::benchmark::BenchmarkAnalysis;
use crate::shared_math;

/// How the Sharpe ratio's risk-free leg is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RiskFreeRate {
    #[default]
    Zero,
    /// Externally sourced short rate, decimal (0.0525 = 5.25%).
    ShortRate { annual_rate: f64 },
    /// User-entered annual percent (5.25 = 5.25%).
    Custom { annual_percent: f64 },
}

impl RiskFreeRate {
    pub fn annual_rate(&self) -> f64 {
        match self {
            RiskFreeRate::Zero => 0.0,
            RiskFreeRate::ShortRate { annual_rate } => *annual_rate,
            RiskFreeRate::Custom { annual_percent } => annual_percent / 100.0,
        }
    }

    pub fn daily_rate(&self) -> f64 {
        shared_math::daily_risk_free(self.annual_rate())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityHistory {
    pub symbol: String,
    pub prices: Vec<PricePoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskRequest {
    pub weights: Vec<PortfolioWeight>,
    pub histories: Vec<SecurityHistory>,
    #[serde(default)]
    pub benchmark: Option<SecurityHistory>,
    #[serde(default)]
    pub risk_free: RiskFreeRate,
    pub now: NaiveDate,
}

impl RiskRequest {
    pub fn history(&self, symbol: &str) -> Option<&SecurityHistory> {
        self.histories.iter().find(|h| h.symbol == symbol)
    }
}

/// One point of the weighted portfolio curve (indexed to 100 at the anchor
/// when weights sum to 100).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Result for one trailing window. Exactly one of `metrics` and `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowRisk {
    pub window: TrailingWindow,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<RiskMetrics>,
    /// Portfolio versus benchmark over the same dates, when one was supplied
    /// and covers them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benchmark: Option<BenchmarkAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
