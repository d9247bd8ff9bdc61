//! Intrinsic value per share under five methodologies.
//!
//! Each methodology implements [`Valuation`] over the same [`ValuationInputs`].
//! Absent inputs produce `Ok(0.0)` so partial data still renders; inputs that
//! make the formula meaningless (a discount rate at or below terminal growth,
//! a non-positive bond yield) produce `AnalysisError::InvalidDomain`.

use analysis_core::{AnalysisError, AnalysisResult, ValuationMethod, ValuationResult};
use serde::{Deserialize, Serialize};

/// Graham's no-growth P/E.
pub const GRAHAM_BASE_PE: f64 = 8.5;
/// Average AAA corporate yield when Graham published the formula.
pub const GRAHAM_BASE_YIELD: f64 = 4.4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationInputs {
    pub current_price: f64,
    pub shares_outstanding: Option<f64>,
    /// Annual firm-level free cash flow for the base year.
    pub free_cash_flow: Option<f64>,
    /// Annual (TTM) diluted EPS.
    pub eps: Option<f64>,
    /// Cash-flow growth per year, decimal.
    pub growth_rate: f64,
    /// EPS growth per year, decimal.
    pub eps_growth_rate: f64,
    pub discount_rate: f64,
    pub terminal_growth: f64,
    pub projection_years: u32,
    pub exit_pe: Option<f64>,
    pub reference_pe: f64,
    /// AAA corporate bond yield in percent (4.5 = 4.5%).
    pub bond_yield: f64,
    pub total_assets: Option<f64>,
    pub total_liabilities: Option<f64>,
}

impl Default for ValuationInputs {
    fn default() -> Self {
        Self {
            current_price: 0.0,
            shares_outstanding: None,
            free_cash_flow: None,
            eps: None,
            growth_rate: 0.0,
            eps_growth_rate: 0.0,
            discount_rate: 0.10,
            terminal_growth: 0.03,
            projection_years: 5,
            exit_pe: None,
            reference_pe: 15.0,
            bond_yield: 4.5,
            total_assets: None,
            total_liabilities: None,
        }
    }
}

impl ValuationInputs {
    fn positive_shares(&self) -> Option<f64> {
        self.shares_outstanding.filter(|s| *s > 0.0)
    }

    fn positive_eps(&self) -> Option<f64> {
        self.eps.filter(|e| *e > 0.0)
    }
}

pub trait Valuation {
    fn method(&self) -> ValuationMethod;

    fn value_per_share(&self, inputs: &ValuationInputs) -> AnalysisResult<f64>;

    /// Runs the methodology and wraps the outcome. A domain error becomes a
    /// zero-valued result carrying the error text, so one failing method never
    /// hides the others.
    fn evaluate(&self, inputs: &ValuationInputs) -> ValuationResult {
        match self.value_per_share(inputs) {
            Ok(value) => ValuationResult::new(self.method(), value, inputs.current_price),
            Err(err) => {
                tracing::warn!(method = self.method().name(), error = %err, "valuation unavailable");
                ValuationResult::unavailable(self.method(), err.to_string())
            }
        }
    }
}

/// The terminal value diverges or flips sign unless the discount rate
/// exceeds terminal growth.
pub fn ensure_converges(discount_rate: f64, terminal_growth: f64) -> AnalysisResult<()> {
    if discount_rate <= terminal_growth {
        return Err(AnalysisError::invalid_domain(format!(
            "discount rate {discount_rate:.4} must exceed terminal growth {terminal_growth:.4}"
        )));
    }
    Ok(())
}

/// Present value of `years` of cash flow growing at `growth_rate` plus a
/// Gordon-growth terminal value, all discounted at `discount_rate`.
pub fn discounted_cash_flow_value(
    base_cash_flow: f64,
    growth_rate: f64,
    discount_rate: f64,
    terminal_growth: f64,
    years: u32,
) -> AnalysisResult<f64> {
    ensure_converges(discount_rate, terminal_growth)?;
    if years == 0 {
        return Err(AnalysisError::invalid_domain("projection horizon must be at least one year"));
    }

    let mut cash_flow = base_cash_flow;
    let mut present_value = 0.0;
    for year in 1..=years as i32 {
        cash_flow *= 1.0 + growth_rate;
        present_value += cash_flow / (1.0 + discount_rate).powi(year);
    }

    let terminal_value = cash_flow * (1.0 + terminal_growth) / (discount_rate - terminal_growth);
    let terminal_pv = terminal_value / (1.0 + discount_rate).powi(years as i32);

    Ok(present_value + terminal_pv)
}

/// Firm-level net asset value: total assets less total liabilities.
pub fn net_asset_value(total_assets: Option<f64>, total_liabilities: Option<f64>) -> f64 {
    match (total_assets, total_liabilities) {
        (Some(assets), Some(liabilities)) => assets - liabilities,
        _ => 0.0,
    }
}

/// Net asset value divided by shares outstanding.
pub fn net_asset_value_per_share(
    total_assets: Option<f64>,
    total_liabilities: Option<f64>,
    shares_outstanding: Option<f64>,
) -> f64 {
    match shares_outstanding {
        Some(shares) if shares > 0.0 => net_asset_value(total_assets, total_liabilities) / shares,
        _ => 0.0,
    }
}

pub struct DiscountedCashFlow;

impl Valuation for DiscountedCashFlow {
    fn method(&self) -> ValuationMethod {
        ValuationMethod::DiscountedCashFlow
    }

    fn value_per_share(&self, inputs: &ValuationInputs) -> AnalysisResult<f64> {
        // Checked before data so a bad rate is reported even on sparse input.
        ensure_converges(inputs.discount_rate, inputs.terminal_growth)?;
        let (Some(fcf), Some(shares)) = (inputs.free_cash_flow, inputs.positive_shares()) else {
            return Ok(0.0);
        };
        let firm_value = discounted_cash_flow_value(
            fcf,
            inputs.growth_rate,
            inputs.discount_rate,
            inputs.terminal_growth,
            inputs.projection_years,
        )?;
        Ok(firm_value / shares)
    }
}

pub struct EpsExitMultiple;

impl EpsExitMultiple {
    pub fn exit_multiple(inputs: &ValuationInputs) -> f64 {
        inputs
            .exit_pe
            .filter(|pe| *pe > 0.0 && pe.is_finite())
            .unwrap_or(inputs.reference_pe)
    }
}

impl Valuation for EpsExitMultiple {
    fn method(&self) -> ValuationMethod {
        ValuationMethod::EpsExitMultiple
    }

    fn value_per_share(&self, inputs: &ValuationInputs) -> AnalysisResult<f64> {
        if inputs.discount_rate <= -1.0 {
            return Err(AnalysisError::invalid_domain("discount rate must exceed -100%"));
        }
        if inputs.projection_years == 0 {
            return Err(AnalysisError::invalid_domain("projection horizon must be at least one year"));
        }
        let Some(eps) = inputs.positive_eps() else {
            return Ok(0.0);
        };

        let years = inputs.projection_years as i32;
        let terminal_eps = eps * (1.0 + inputs.eps_growth_rate).powi(years);
        let exit_price = terminal_eps * Self::exit_multiple(inputs);
        Ok(exit_price / (1.0 + inputs.discount_rate).powi(years))
    }
}

/// Graham: EPS × (8.5 + 2g) × 4.4 / Y, g in percent, Y the current AAA yield in percent.
pub struct GrahamFormula;

impl Valuation for GrahamFormula {
    fn method(&self) -> ValuationMethod {
        ValuationMethod::Graham
    }

    fn value_per_share(&self, inputs: &ValuationInputs) -> AnalysisResult<f64> {
        if inputs.bond_yield <= 0.0 {
            return Err(AnalysisError::invalid_domain(format!(
                "bond yield must be positive, got {}",
                inputs.bond_yield
            )));
        }
        let Some(eps) = inputs.positive_eps() else {
            return Ok(0.0);
        };
        let growth_percent = inputs.eps_growth_rate * 100.0;
        Ok(eps * (GRAHAM_BASE_PE + 2.0 * growth_percent) * GRAHAM_BASE_YIELD / inputs.bond_yield)
    }
}

/// Next year's EPS at a reference multiple.
pub struct EarningsBased;

impl Valuation for EarningsBased {
    fn method(&self) -> ValuationMethod {
        ValuationMethod::EarningsBased
    }

    fn value_per_share(&self, inputs: &ValuationInputs) -> AnalysisResult<f64> {
        let Some(eps) = inputs.positive_eps() else {
            return Ok(0.0);
        };
        Ok(eps * (1.0 + inputs.eps_growth_rate) * inputs.reference_pe)
    }
}

pub struct NetAssetValue;

impl Valuation for NetAssetValue {
    fn method(&self) -> ValuationMethod {
        ValuationMethod::AssetBased
    }

    fn value_per_share(&self, inputs: &ValuationInputs) -> AnalysisResult<f64> {
        Ok(net_asset_value_per_share(
            inputs.total_assets,
            inputs.total_liabilities,
            inputs.shares_outstanding,
        ))
    }
}

pub fn methodology(method: ValuationMethod) -> &'static dyn Valuation {
    match method {
        ValuationMethod::DiscountedCashFlow => &DiscountedCashFlow,
        ValuationMethod::EpsExitMultiple => &EpsExitMultiple,
        ValuationMethod::Graham => &GrahamFormula,
        ValuationMethod::EarningsBased => &EarningsBased,
        ValuationMethod::AssetBased => &NetAssetValue,
    }
}

/// One result per methodology, in [`ValuationMethod::ALL`] order.
pub fn evaluate_all(inputs: &ValuationInputs) -> Vec<ValuationResult> {
    ValuationMethod::ALL
        .iter()
        .map(|method| methodology(*method).evaluate(inputs))
        .collect()
}
