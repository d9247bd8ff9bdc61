use analysis_core::AnalysisResult;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::factors::{InflationTrend, PolicyStance};

/// Macro indicator readings as of one date. Numeric readings the provider
/// could not supply are `None` and score as neutral.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroSnapshot {
    pub as_of: NaiveDate,
    /// Real GDP growth proxy, percent.
    #[serde(default)]
    pub growth_proxy: Option<f64>,
    /// 10y - 2y spread, percentage points.
    #[serde(default)]
    pub curve_spread: Option<f64>,
    /// High-yield spread, percent.
    #[serde(default)]
    pub credit_spread: Option<f64>,
    #[serde(default)]
    pub inflation_trend: InflationTrend,
    #[serde(default)]
    pub policy_stance: PolicyStance,
}

/// Acquisition layer for macro snapshots. Implementations fetch and cache
/// provider data; scoring only ever sees the snapshots.
pub trait MacroIndicatorSource {
    fn latest(&self) -> AnalysisResult<MacroSnapshot>;

    /// The snapshot before `latest`, if one exists.
    fn previous(&self) -> AnalysisResult<Option<MacroSnapshot>>;
}

/// Already-fetched snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotPair {
    pub latest: MacroSnapshot,
    #[serde(default)]
    pub previous: Option<MacroSnapshot>,
}

impl MacroIndicatorSource for SnapshotPair {
    fn latest(&self) -> AnalysisResult<MacroSnapshot> {
        Ok(self.latest.clone())
    }

    fn previous(&self) -> AnalysisResult<Option<MacroSnapshot>> {
        Ok(self.previous.clone())
    }
}
