use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::stats::round2;

/// One reporting period of company financials. Sequences of these are
/// always handled newest-first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinancialPeriodRecord {
    pub fiscal_period: String,
    pub fiscal_year: i32,
    #[serde(default)]
    pub period_end: Option<NaiveDate>,
    #[serde(default)]
    pub revenue: Option<f64>,
    #[serde(default)]
    pub net_income: Option<f64>,
    #[serde(default)]
    pub eps_diluted: Option<f64>,
    #[serde(default)]
    pub free_cash_flow: Option<f64>,
    #[serde(default)]
    pub operating_cash_flow: Option<f64>,
    #[serde(default)]
    pub capital_expenditure: Option<f64>,
    #[serde(default)]
    pub interest_expense: Option<f64>,
    #[serde(default)]
    pub income_tax_expense: Option<f64>,
    #[serde(default)]
    pub income_before_tax: Option<f64>,
    #[serde(default)]
    pub total_assets: Option<f64>,
    #[serde(default)]
    pub total_liabilities: Option<f64>,
    #[serde(default)]
    pub shareholders_equity: Option<f64>,
    #[serde(default)]
    pub total_debt: Option<f64>,
    #[serde(default)]
    pub current_assets: Option<f64>,
    #[serde(default)]
    pub current_liabilities: Option<f64>,
    #[serde(default)]
    pub cash_and_equivalents: Option<f64>,
}

impl FinancialPeriodRecord {
    /// Reported free cash flow, or operating cash flow less capex when the
    /// statement only carries the components. Capex sign conventions vary
    /// between providers, so its magnitude is subtracted.
    pub fn resolved_free_cash_flow(&self) -> Option<f64> {
        self.free_cash_flow.or_else(|| {
            let ocf = self.operating_cash_flow?;
            let capex = self.capital_expenditure?;
            Some(ocf - capex.abs())
        })
    }
}

/// Daily closing price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
    #[serde(default)]
    pub adjusted_close: Option<f64>,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            close,
            adjusted_close: None,
        }
    }

    /// Adjusted close when the provider supplies it, raw close otherwise.
    pub fn value(&self) -> f64 {
        self.adjusted_close.unwrap_or(self.close)
    }
}

/// Target allocation for one holding. Weights are percentages that
/// approximately sum to 100; the sum is not enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioWeight {
    pub symbol: String,
    pub weight_percent: f64,
}

/// Market quote snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub price: f64,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub shares_outstanding: Option<f64>,
    #[serde(default)]
    pub previous_close: Option<f64>,
    #[serde(default)]
    pub year_high: Option<f64>,
    #[serde(default)]
    pub year_low: Option<f64>,
}

impl QuoteSnapshot {
    /// Shares outstanding, falling back to market cap / price.
    pub fn resolved_shares(&self) -> Option<f64> {
        match self.shares_outstanding {
            Some(s) if s > 0.0 => Some(s),
            _ => match self.market_cap {
                Some(cap) if cap > 0.0 && self.price > 0.0 => Some(cap / self.price),
                _ => None,
            },
        }
    }

    /// Market value of equity, falling back to price × shares.
    pub fn resolved_market_cap(&self) -> Option<f64> {
        match self.market_cap {
            Some(cap) if cap > 0.0 => Some(cap),
            _ => self
                .shares_outstanding
                .filter(|s| *s > 0.0)
                .map(|s| s * self.price),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub symbol: String,
    #[serde(default)]
    pub beta: Option<f64>,
    #[serde(default)]
    pub sector: Option<String>,
}

/// Trailing valuation ratios as reported by the data provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrailingRatios {
    #[serde(default)]
    pub pe_ratio: Option<f64>,
    #[serde(default)]
    pub price_to_book: Option<f64>,
    #[serde(default)]
    pub dividend_yield: Option<f64>,
}

/// Valuation methodology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationMethod {
    DiscountedCashFlow,
    EpsExitMultiple,
    Graham,
    EarningsBased,
    AssetBased,
}

impl ValuationMethod {
    pub const ALL: [ValuationMethod; 5] = [
        ValuationMethod::DiscountedCashFlow,
        ValuationMethod::EpsExitMultiple,
        ValuationMethod::Graham,
        ValuationMethod::EarningsBased,
        ValuationMethod::AssetBased,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ValuationMethod::DiscountedCashFlow => "Discounted Cash Flow",
            ValuationMethod::EpsExitMultiple => "EPS Exit Multiple",
            ValuationMethod::Graham => "Graham Number",
            ValuationMethod::EarningsBased => "Earnings Based",
            ValuationMethod::AssetBased => "Net Asset Value",
        }
    }
}

/// Margin of safety in percent: (value - price) / value * 100.
///
/// The divisor is the estimate, not the price. Positive means the price sits
/// below the estimate. A non-positive estimate yields 0.
pub fn margin_of_safety(estimated_value: f64, current_price: f64) -> f64 {
    if estimated_value <= 0.0 || !estimated_value.is_finite() {
        return 0.0;
    }
    (estimated_value - current_price) / estimated_value * 100.0
}

/// Fair value per share under one methodology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    pub method: ValuationMethod,
    pub value_per_share: f64,
    pub margin_of_safety_percent: f64,
    /// Why the methodology could not produce a meaningful value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl ValuationResult {
    /// Builds a result, storing value and margin at cent precision.
    pub fn new(method: ValuationMethod, value_per_share: f64, current_price: f64) -> Self {
        let value = if value_per_share.is_finite() {
            round2(value_per_share)
        } else {
            0.0
        };
        Self {
            method,
            value_per_share: value,
            margin_of_safety_percent: round2(margin_of_safety(value, current_price)),
            warning: None,
        }
    }

    pub fn unavailable(method: ValuationMethod, reason: impl Into<String>) -> Self {
        Self {
            method,
            value_per_share: 0.0,
            margin_of_safety_percent: 0.0,
            warning: Some(reason.into()),
        }
    }

    pub fn is_undervalued(&self) -> bool {
        self.value_per_share > 0.0 && self.margin_of_safety_percent > 0.0
    }
}

/// Portfolio risk statistics over one trailing window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub cumulative_return: f64,
    pub annualized_volatility: f64,
    pub sharpe_ratio: f64,
    /// Signed peak-to-trough decline (<= 0).
    pub max_drawdown: f64,
    #[serde(default)]
    pub beta: Option<f64>,
    /// One-day 95% historical VaR as a positive loss fraction.
    pub var_95: f64,
    pub observations: usize,
}

impl RiskMetrics {
    pub fn max_drawdown_magnitude(&self) -> f64 {
        self.max_drawdown.abs()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MacroTilt {
    Positive,
    Neutral,
    Cautious,
}

/// Composite macro regime reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroComposite {
    pub score: u8,
    pub regime: String,
    pub tilt: MacroTilt,
    pub drivers: Vec<String>,
    pub as_of: NaiveDate,
}
