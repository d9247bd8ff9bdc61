//! Discount-rate derivation: CAPM cost of equity, cost of debt, effective
//! tax rate and WACC, with a caller override that always wins.

use analysis_core::{AnalysisError, AnalysisResult};
use serde::{Deserialize, Serialize};

use crate::config::ValuationConfig;

/// Beta used when the profile has none.
pub const DEFAULT_BETA: f64 = 1.0;

/// Cost of equity = risk-free + beta × market risk premium.
pub fn cost_of_equity(risk_free_rate: f64, beta: Option<f64>, market_risk_premium: f64) -> f64 {
    let beta = beta.filter(|b| b.is_finite()).unwrap_or(DEFAULT_BETA);
    risk_free_rate + beta * market_risk_premium
}

/// Interest expense / total debt when both are positive, else `default_rate`.
pub fn cost_of_debt(interest_expense: Option<f64>, total_debt: Option<f64>, default_rate: f64) -> f64 {
    match (interest_expense, total_debt) {
        (Some(interest), Some(debt)) if interest > 0.0 && debt > 0.0 => interest / debt,
        _ => default_rate,
    }
}

/// Income tax expense / income before tax when both are positive, else `default_rate`.
pub fn effective_tax_rate(
    income_tax_expense: Option<f64>,
    income_before_tax: Option<f64>,
    default_rate: f64,
) -> f64 {
    match (income_tax_expense, income_before_tax) {
        (Some(tax), Some(pretax)) if tax > 0.0 && pretax > 0.0 => tax / pretax,
        _ => default_rate,
    }
}

/// Weighted average cost of capital from market values of equity and debt.
pub fn wacc(
    equity_value: f64,
    debt_value: f64,
    cost_of_equity: f64,
    cost_of_debt: f64,
    tax_rate: f64,
) -> AnalysisResult<f64> {
    if equity_value < 0.0 || debt_value < 0.0 {
        return Err(AnalysisError::invalid_domain(format!(
            "capital structure values must be non-negative (equity {equity_value}, debt {debt_value})"
        )));
    }
    let capital = equity_value + debt_value;
    if capital <= 0.0 {
        return Err(AnalysisError::invalid_domain(
            "equity plus debt must be positive to weight WACC",
        ));
    }
    if cost_of_equity <= 0.0 || cost_of_debt <= 0.0 {
        return Err(AnalysisError::invalid_domain(format!(
            "costs of capital must be positive (equity {cost_of_equity:.4}, debt {cost_of_debt:.4})"
        )));
    }

    let equity_weight = equity_value / capital;
    let debt_weight = debt_value / capital;
    Ok(equity_weight * cost_of_equity + debt_weight * cost_of_debt * (1.0 - tax_rate))
}

/// Firm data feeding the discount-rate derivation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapitalStructure {
    pub beta: Option<f64>,
    /// Market value of equity (market cap).
    pub equity_value: Option<f64>,
    pub total_debt: Option<f64>,
    pub interest_expense: Option<f64>,
    pub income_tax_expense: Option<f64>,
    pub income_before_tax: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountRateSource {
    Wacc,
    /// No equity market value to weight by; cost of equity stands in.
    CostOfEquity,
    Override,
}

/// Every figure behind the discount rate, for audit and display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountRateAssumptions {
    pub risk_free_rate: f64,
    pub beta: f64,
    pub beta_defaulted: bool,
    pub market_risk_premium: f64,
    pub cost_of_equity: f64,
    pub cost_of_debt: f64,
    pub tax_rate: f64,
    pub equity_weight: Option<f64>,
    pub debt_weight: Option<f64>,
    pub wacc: Option<f64>,
    pub discount_rate: f64,
    pub source: DiscountRateSource,
}

pub struct DiscountRateEngine {
    risk_free_rate: f64,
    market_risk_premium: f64,
    default_cost_of_debt: f64,
    default_tax_rate: f64,
}

impl DiscountRateEngine {
    pub fn new(config: &ValuationConfig) -> Self {
        Self {
            risk_free_rate: config.risk_free_rate,
            market_risk_premium: config.market_risk_premium,
            default_cost_of_debt: config.default_cost_of_debt,
            default_tax_rate: config.default_tax_rate,
        }
    }

    /// Replaces the configured risk-free rate, e.g. with a live short rate.
    pub fn with_risk_free_rate(mut self, rate: f64) -> Self {
        self.risk_free_rate = rate;
        self
    }

    /// Resolves the discount rate. An override is returned as the discount
    /// rate regardless of the capital structure, but CAPM and (when
    /// computable) WACC figures are still reported alongside it.
    pub fn resolve(
        &self,
        capital: &CapitalStructure,
        override_rate: Option<f64>,
    ) -> AnalysisResult<DiscountRateAssumptions> {
        let beta_defaulted = !capital.beta.map_or(false, f64::is_finite);
        let beta = if beta_defaulted {
            DEFAULT_BETA
        } else {
            capital.beta.unwrap_or(DEFAULT_BETA)
        };

        let coe = cost_of_equity(self.risk_free_rate, Some(beta), self.market_risk_premium);
        let cod = cost_of_debt(capital.interest_expense, capital.total_debt, self.default_cost_of_debt);
        let tax_rate = effective_tax_rate(
            capital.income_tax_expense,
            capital.income_before_tax,
            self.default_tax_rate,
        );

        let debt_value = capital.total_debt.unwrap_or(0.0);
        let weighted = capital.equity_value.map(|equity| {
            let computed = wacc(equity, debt_value, coe, cod, tax_rate);
            let total = equity + debt_value;
            (computed, equity / total, debt_value / total)
        });

        let mut assumptions = DiscountRateAssumptions {
            risk_free_rate: self.risk_free_rate,
            beta,
            beta_defaulted,
            market_risk_premium: self.market_risk_premium,
            cost_of_equity: coe,
            cost_of_debt: cod,
            tax_rate,
            equity_weight: None,
            debt_weight: None,
            wacc: None,
            discount_rate: coe,
            source: DiscountRateSource::CostOfEquity,
        };

        match weighted {
            Some((Ok(rate), equity_weight, debt_weight)) => {
                assumptions.equity_weight = Some(equity_weight);
                assumptions.debt_weight = Some(debt_weight);
                assumptions.wacc = Some(rate);
                assumptions.discount_rate = rate;
                assumptions.source = DiscountRateSource::Wacc;
            }
            Some((Err(err), _, _)) => {
                if override_rate.is_none() {
                    return Err(err);
                }
                tracing::debug!(error = %err, "WACC not computable; override in effect");
            }
            None => {
                if override_rate.is_none() {
                    tracing::warn!("no equity market value; discounting at cost of equity");
                }
            }
        }

        if let Some(rate) = override_rate {
            assumptions.discount_rate = rate;
            assumptions.source = DiscountRateSource::Override;
        }

        Ok(assumptions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn engine() -> DiscountRateEngine {
        DiscountRateEngine::new(&ValuationConfig::default())
    }

    #[test]
    fn test_capm() {
        assert_abs_diff_eq!(cost_of_equity(0.04, Some(1.5), 0.06), 0.13, epsilon = 1e-12);
        // Missing beta falls back to 1
        assert_abs_diff_eq!(cost_of_equity(0.04, None, 0.06), 0.10, epsilon = 1e-12);
        assert_abs_diff_eq!(cost_of_equity(0.04, Some(f64::NAN), 0.06), 0.10, epsilon = 1e-12);
    }

    #[test]
    fn test_cost_of_debt_and_tax_defaults() {
        assert_abs_diff_eq!(cost_of_debt(Some(30.0), Some(600.0), 0.05), 0.05, epsilon = 1e-12);
        assert_abs_diff_eq!(cost_of_debt(Some(48.0), Some(600.0), 0.05), 0.08, epsilon = 1e-12);
        assert_eq!(cost_of_debt(Some(0.0), Some(600.0), 0.05), 0.05);
        assert_eq!(cost_of_debt(Some(10.0), None, 0.05), 0.05);

        assert_abs_diff_eq!(effective_tax_rate(Some(25.0), Some(100.0), 0.21), 0.25, epsilon = 1e-12);
        assert_eq!(effective_tax_rate(Some(25.0), Some(-100.0), 0.21), 0.21);
        assert_eq!(effective_tax_rate(None, Some(100.0), 0.21), 0.21);
    }

    #[test]
    fn test_wacc_weights() {
        // 75/25 split: 0.75 * 0.10 + 0.25 * 0.08 * 0.75 = 0.09
        let rate = wacc(750.0, 250.0, 0.10, 0.08, 0.25).unwrap();
        assert_abs_diff_eq!(rate, 0.09, epsilon = 1e-12);
    }

    #[test]
    fn test_wacc_rejects_empty_capital() {
        assert!(matches!(
            wacc(0.0, 0.0, 0.10, 0.05, 0.21),
            Err(AnalysisError::InvalidDomain(_))
        ));
        assert!(matches!(
            wacc(100.0, 0.0, -0.01, 0.05, 0.21),
            Err(AnalysisError::InvalidDomain(_))
        ));
        assert!(wacc(-100.0, 50.0, 0.10, 0.05, 0.21).is_err());
    }

    #[test]
    fn test_resolve_wacc() {
        let capital = CapitalStructure {
            beta: Some(1.2),
            equity_value: Some(800.0),
            total_debt: Some(200.0),
            interest_expense: Some(12.0),
            income_tax_expense: Some(20.0),
            income_before_tax: Some(100.0),
        };
        let a = engine().resolve(&capital, None).unwrap();
        assert_eq!(a.source, DiscountRateSource::Wacc);
        assert!(!a.beta_defaulted);
        assert_abs_diff_eq!(a.cost_of_equity, 0.045 + 1.2 * 0.055, epsilon = 1e-12);
        assert_abs_diff_eq!(a.cost_of_debt, 0.06, epsilon = 1e-12);
        assert_abs_diff_eq!(a.tax_rate, 0.20, epsilon = 1e-12);
        let expected = 0.8 * a.cost_of_equity + 0.2 * 0.06 * 0.8;
        assert_abs_diff_eq!(a.discount_rate, expected, epsilon = 1e-12);
        assert_eq!(a.wacc, Some(a.discount_rate));
    }

    #[test]
    fn test_override_still_reports_capm() {
        let capital = CapitalStructure {
            beta: Some(1.5),
            equity_value: Some(1_000.0),
            ..Default::default()
        };
        let a = engine().resolve(&capital, Some(0.12)).unwrap();
        assert_eq!(a.source, DiscountRateSource::Override);
        assert_eq!(a.discount_rate, 0.12);
        assert_abs_diff_eq!(a.cost_of_equity, 0.045 + 1.5 * 0.055, epsilon = 1e-12);
        assert!(a.wacc.is_some());
    }

    #[test]
    fn test_invalid_structure_errors_without_override() {
        let capital = CapitalStructure {
            equity_value: Some(0.0),
            total_debt: Some(0.0),
            ..Default::default()
        };
        assert!(matches!(
            engine().resolve(&capital, None),
            Err(AnalysisError::InvalidDomain(_))
        ));

        let a = engine().resolve(&capital, Some(0.09)).unwrap();
        assert_eq!(a.discount_rate, 0.09);
        assert!(a.wacc.is_none());
    }

    #[test]
    fn test_missing_equity_value_uses_cost_of_equity() {
        let a = engine().resolve(&CapitalStructure::default(), None).unwrap();
        assert_eq!(a.source, DiscountRateSource::CostOfEquity);
        assert!(a.beta_defaulted);
        assert_abs_diff_eq!(a.discount_rate, 0.10, epsilon = 1e-12);
    }
}
