pub mod breakdown;
pub mod config;
pub mod discount;
pub mod scenario;
pub mod valuation;

use analysis_core::growth::{self, GrowthPolicy, PERIODS_PER_YEAR};
use analysis_core::stats::{median, round2};
use analysis_core::{
    margin_of_safety, CompanyProfile, FinancialPeriodRecord, QuoteSnapshot, TrailingRatios,
    ValuationMethod, ValuationResult,
};
use serde::{Deserialize, Serialize};

pub use breakdown::{BreakdownDimension, MixEntry, RevenueBreakdown};
pub use config::ValuationConfig;
pub use discount::{CapitalStructure, DiscountRateAssumptions, DiscountRateEngine, DiscountRateSource};
pub use scenario::{Scenario, ScenarioMode, ScenarioValue};
pub use valuation::{evaluate_all, methodology, Valuation, ValuationInputs};

/// Policy used for cash-flow growth derived from annual history.
pub const FCF_GROWTH_POLICY: GrowthPolicy = GrowthPolicy::Cagr;
/// Policy used for EPS growth derived from annual history.
pub const EPS_GROWTH_POLICY: GrowthPolicy = GrowthPolicy::SequentialAverage;

/// Caller-supplied assumptions. Anything set here is used as given.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssumptionOverrides {
    #[serde(default)]
    pub growth_rate: Option<f64>,
    #[serde(default)]
    pub eps_growth_rate: Option<f64>,
    #[serde(default)]
    pub discount_rate: Option<f64>,
    #[serde(default)]
    pub risk_free_rate: Option<f64>,
    #[serde(default)]
    pub terminal_growth: Option<f64>,
    #[serde(default)]
    pub projection_years: Option<u32>,
    #[serde(default)]
    pub exit_pe: Option<f64>,
    #[serde(default)]
    pub reference_pe: Option<f64>,
    #[serde(default)]
    pub bond_yield: Option<f64>,
}

/// Everything fetched for one company.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValuationRequest {
    pub symbol: String,
    /// Annual statements, newest first.
    #[serde(default)]
    pub annual: Vec<FinancialPeriodRecord>,
    /// Quarterly statements, newest first.
    #[serde(default)]
    pub quarterly: Vec<FinancialPeriodRecord>,
    pub quote: QuoteSnapshot,
    #[serde(default)]
    pub profile: Option<CompanyProfile>,
    #[serde(default)]
    pub ratios: Option<TrailingRatios>,
    #[serde(default)]
    pub overrides: AssumptionOverrides,
    #[serde(default)]
    pub segments: Option<RevenueBreakdown>,
    #[serde(default)]
    pub geography: Option<RevenueBreakdown>,
}

/// The assumption set behind a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationAssumptions {
    pub growth_rate: f64,
    /// `None` when the caller supplied the rate.
    pub growth_policy: Option<GrowthPolicy>,
    pub eps_growth_rate: f64,
    pub eps_growth_policy: Option<GrowthPolicy>,
    pub terminal_growth: f64,
    pub projection_years: u32,
    pub exit_pe: f64,
    pub reference_pe: f64,
    pub bond_yield: f64,
    pub ttm_free_cash_flow: Option<f64>,
    pub ttm_eps: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub discount: Option<DiscountRateAssumptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValuationVerdict {
    SignificantlyUndervalued,
    Undervalued,
    FairlyValued,
    Overvalued,
    SignificantlyOvervalued,
}

impl ValuationVerdict {
    pub fn from_margin(margin_percent: f64) -> Self {
        match margin_percent {
            m if m >= 30.0 => ValuationVerdict::SignificantlyUndervalued,
            m if m >= 10.0 => ValuationVerdict::Undervalued,
            m if m > -10.0 => ValuationVerdict::FairlyValued,
            m if m > -30.0 => ValuationVerdict::Overvalued,
            _ => ValuationVerdict::SignificantlyOvervalued,
        }
    }

    pub fn to_label(&self) -> &'static str {
        match self {
            ValuationVerdict::SignificantlyUndervalued => "Significantly Undervalued",
            ValuationVerdict::Undervalued => "Undervalued",
            ValuationVerdict::FairlyValued => "Fairly Valued",
            ValuationVerdict::Overvalued => "Overvalued",
            ValuationVerdict::SignificantlyOvervalued => "Significantly Overvalued",
        }
    }
}

/// Median across the methodologies that produced a positive value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationSummary {
    pub fair_value: f64,
    pub margin_of_safety_percent: f64,
    pub verdict: ValuationVerdict,
    pub methods_used: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationReport {
    pub symbol: String,
    pub current_price: f64,
    pub results: Vec<ValuationResult>,
    pub assumptions: ValuationAssumptions,
    /// Firm-level assets less liabilities (not per share).
    pub net_asset_value: f64,
    /// DCF worst/base/best under both scenario modes.
    pub scenarios: Vec<ScenarioValue>,
    pub summary: Option<ValuationSummary>,
    pub segment_mix: Vec<MixEntry>,
    pub geography_mix: Vec<MixEntry>,
    /// Herfindahl index of the segment mix; `None` without a breakdown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_concentration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geography_concentration: Option<f64>,
}

impl ValuationReport {
    pub fn result(&self, method: ValuationMethod) -> Option<&ValuationResult> {
        self.results.iter().find(|r| r.method == method)
    }
}

/// Trailing-twelve-month figure: the annualized sum of up to four quarterly
/// values, else the latest annual value.
fn trailing_value(
    quarterly: &[FinancialPeriodRecord],
    annual: &[FinancialPeriodRecord],
    accessor: fn(&FinancialPeriodRecord) -> Option<f64>,
) -> Option<f64> {
    let values: Vec<f64> = quarterly
        .iter()
        .take(PERIODS_PER_YEAR)
        .filter_map(accessor)
        .collect();
    if !values.is_empty() {
        return Some(growth::annualize(&values, PERIODS_PER_YEAR));
    }
    annual.first().and_then(accessor)
}

/// Newest reported value, quarterly records first.
fn latest_value(
    quarterly: &[FinancialPeriodRecord],
    annual: &[FinancialPeriodRecord],
    accessor: fn(&FinancialPeriodRecord) -> Option<f64>,
) -> Option<f64> {
    quarterly.iter().chain(annual.iter()).find_map(accessor)
}

fn annual_series(
    annual: &[FinancialPeriodRecord],
    accessor: fn(&FinancialPeriodRecord) -> Option<f64>,
) -> Vec<f64> {
    annual.iter().filter_map(accessor).collect()
}

pub struct FundamentalAnalysisEngine {
    config: ValuationConfig,
}

impl FundamentalAnalysisEngine {
    pub fn new() -> Self {
        Self::with_config(ValuationConfig::default())
    }

    pub fn with_config(config: ValuationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValuationConfig {
        &self.config
    }

    /// Values one company under every methodology. Never fails: missing
    /// data yields zero-valued results, and a methodology that cannot run
    /// reports why in its `warning`.
    pub fn value(&self, request: &ValuationRequest) -> ValuationReport {
        let cfg = &self.config;
        let overrides = &request.overrides;
        let quarterly = &request.quarterly;
        let annual = &request.annual;
        let price = request.quote.price;

        let ttm_fcf = trailing_value(quarterly, annual, FinancialPeriodRecord::resolved_free_cash_flow);
        let ttm_eps = trailing_value(quarterly, annual, |r| r.eps_diluted);

        let (growth_rate, growth_policy) = match overrides.growth_rate {
            Some(g) => (g, None),
            None => {
                let history = annual_series(annual, FinancialPeriodRecord::resolved_free_cash_flow);
                let derived = cfg.clamp_derived_growth(FCF_GROWTH_POLICY.estimate(&history));
                (derived, Some(FCF_GROWTH_POLICY))
            }
        };
        let (eps_growth_rate, eps_growth_policy) = match overrides.eps_growth_rate {
            Some(g) => (g, None),
            None => {
                let history = annual_series(annual, |r| r.eps_diluted);
                let derived = cfg.clamp_derived_growth(EPS_GROWTH_POLICY.estimate(&history));
                (derived, Some(EPS_GROWTH_POLICY))
            }
        };

        // Point-in-time balance sheet, each line from the latest record that reports it.
        let total_debt = latest_value(quarterly, annual, |r| r.total_debt);
        let total_assets = latest_value(quarterly, annual, |r| r.total_assets);
        let total_liabilities = latest_value(quarterly, annual, |r| r.total_liabilities);

        let capital = CapitalStructure {
            beta: request.profile.as_ref().and_then(|p| p.beta),
            equity_value: request.quote.resolved_market_cap(),
            total_debt,
            interest_expense: trailing_value(quarterly, annual, |r| r.interest_expense),
            income_tax_expense: trailing_value(quarterly, annual, |r| r.income_tax_expense),
            income_before_tax: trailing_value(quarterly, annual, |r| r.income_before_tax),
        };

        let mut rates = DiscountRateEngine::new(cfg);
        if let Some(rf) = overrides.risk_free_rate {
            rates = rates.with_risk_free_rate(rf);
        }
        let (discount, discount_error) = match rates.resolve(&capital, overrides.discount_rate) {
            Ok(assumptions) => (Some(assumptions), None),
            Err(err) => {
                tracing::warn!(symbol = %request.symbol, error = %err, "discount rate unavailable");
                (None, Some(err.to_string()))
            }
        };

        let exit_pe = overrides
            .exit_pe
            .or_else(|| request.ratios.as_ref().and_then(|r| r.pe_ratio))
            .filter(|pe| *pe > 0.0)
            .unwrap_or(overrides.reference_pe.unwrap_or(cfg.reference_pe));

        let inputs = ValuationInputs {
            current_price: price,
            shares_outstanding: request.quote.resolved_shares(),
            free_cash_flow: ttm_fcf,
            eps: ttm_eps,
            growth_rate,
            eps_growth_rate,
            discount_rate: discount.as_ref().map_or(f64::NAN, |d| d.discount_rate),
            terminal_growth: overrides.terminal_growth.unwrap_or(cfg.terminal_growth),
            projection_years: overrides.projection_years.unwrap_or(cfg.projection_years),
            exit_pe: Some(exit_pe),
            reference_pe: overrides.reference_pe.unwrap_or(cfg.reference_pe),
            bond_yield: overrides.bond_yield.unwrap_or(cfg.graham_bond_yield),
            total_assets,
            total_liabilities,
        };

        let results: Vec<ValuationResult> = ValuationMethod::ALL
            .iter()
            .map(|method| match (&discount_error, method) {
                (Some(err), ValuationMethod::DiscountedCashFlow | ValuationMethod::EpsExitMultiple) => {
                    ValuationResult::unavailable(*method, err.clone())
                }
                _ => methodology(*method).evaluate(&inputs),
            })
            .collect();

        let scenarios: Vec<ScenarioValue> = if discount.is_some() {
            [ScenarioMode::ScaleGrowth, ScenarioMode::ScaleOutput]
                .iter()
                .filter_map(|mode| scenario::dcf_scenarios(&inputs, *mode).ok())
                .flatten()
                .collect()
        } else {
            Vec::new()
        };

        tracing::debug!(
            symbol = %request.symbol,
            growth_rate,
            eps_growth_rate,
            discount_rate = inputs.discount_rate,
            "valuation assumptions resolved"
        );

        ValuationReport {
            symbol: request.symbol.clone(),
            current_price: price,
            summary: summarize(&results, price),
            results,
            net_asset_value: valuation::net_asset_value(inputs.total_assets, inputs.total_liabilities),
            scenarios,
            assumptions: ValuationAssumptions {
                growth_rate,
                growth_policy,
                eps_growth_rate,
                eps_growth_policy,
                terminal_growth: inputs.terminal_growth,
                projection_years: inputs.projection_years,
                exit_pe,
                reference_pe: inputs.reference_pe,
                bond_yield: inputs.bond_yield,
                ttm_free_cash_flow: ttm_fcf,
                ttm_eps,
                shares_outstanding: inputs.shares_outstanding,
                discount,
                discount_error,
            },
            segment_mix: request.segments.as_ref().map(RevenueBreakdown::mix).unwrap_or_default(),
            geography_mix: request.geography.as_ref().map(RevenueBreakdown::mix).unwrap_or_default(),
            segment_concentration: request.segments.as_ref().map(RevenueBreakdown::concentration),
            geography_concentration: request.geography.as_ref().map(RevenueBreakdown::concentration),
        }
    }
}

impl Default for FundamentalAnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn summarize(results: &[ValuationResult], price: f64) -> Option<ValuationSummary> {
    let values: Vec<f64> = results
        .iter()
        .filter(|r| r.warning.is_none() && r.value_per_share > 0.0)
        .map(|r| r.value_per_share)
        .collect();
    let fair_value = round2(median(&values)?);
    let margin = round2(margin_of_safety(fair_value, price));
    Some(ValuationSummary {
        fair_value,
        margin_of_safety_percent: margin,
        verdict: ValuationVerdict::from_margin(margin),
        methods_used: values.len(),
    })
}
