//! Worst/base/best scenario adjustment.
//!
//! Two patterns exist and are not interchangeable. Scaling growth inputs and
//! re-running the DCF compounds the multiplier through every projected year
//! and the terminal value; scaling the finished value applies it once.

use analysis_core::{stats::round2, AnalysisResult};
use serde::{Deserialize, Serialize};

use crate::valuation::{DiscountedCashFlow, Valuation, ValuationInputs};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    Worst,
    Base,
    Best,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [Scenario::Worst, Scenario::Base, Scenario::Best];

    pub fn multiplier(&self) -> f64 {
        match self {
            Scenario::Worst => 0.8,
            Scenario::Base => 1.0,
            Scenario::Best => 1.2,
        }
    }

    /// Inputs with both growth rates scaled by the multiplier.
    pub fn scale_growth(&self, inputs: &ValuationInputs) -> ValuationInputs {
        ValuationInputs {
            growth_rate: inputs.growth_rate * self.multiplier(),
            eps_growth_rate: inputs.eps_growth_rate * self.multiplier(),
            ..inputs.clone()
        }
    }

    pub fn scale_value(&self, value: f64) -> f64 {
        value * self.multiplier()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioMode {
    /// Multiply growth inputs, then recompute.
    ScaleGrowth,
    /// Multiply the base-case output.
    ScaleOutput,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioValue {
    pub scenario: Scenario,
    pub mode: ScenarioMode,
    pub value_per_share: f64,
}

/// DCF value per share under one scenario.
pub fn dcf_scenario_value(
    inputs: &ValuationInputs,
    scenario: Scenario,
    mode: ScenarioMode,
) -> AnalysisResult<f64> {
    match mode {
        ScenarioMode::ScaleGrowth => DiscountedCashFlow.value_per_share(&scenario.scale_growth(inputs)),
        ScenarioMode::ScaleOutput => DiscountedCashFlow
            .value_per_share(inputs)
            .map(|value| scenario.scale_value(value)),
    }
}

/// Worst, base and best DCF values under `mode`.
pub fn dcf_scenarios(inputs: &ValuationInputs, mode: ScenarioMode) -> AnalysisResult<Vec<ScenarioValue>> {
    Scenario::ALL
        .iter()
        .map(|scenario| {
            dcf_scenario_value(inputs, *scenario, mode).map(|value| ScenarioValue {
                scenario: *scenario,
                mode,
                value_per_share: round2(value),
            })
        })
        .collect()
}
