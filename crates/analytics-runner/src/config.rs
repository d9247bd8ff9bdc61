use anyhow::{Context, Result};
use fundamental_analysis::ValuationConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    pub valuation: ValuationConfig,
    pub pretty_output: bool, // true
}

/// Reads `key`, falling back to `default` when unset. A set but unparseable
/// value is an error rather than a silent default.
fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}

impl RunnerConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = ValuationConfig::default();
        let valuation = ValuationConfig {
            risk_free_rate: env_or("ANALYTICS_RISK_FREE_RATE", defaults.risk_free_rate)?,
            market_risk_premium: env_or("ANALYTICS_MARKET_RISK_PREMIUM", defaults.market_risk_premium)?,
            default_cost_of_debt: env_or("ANALYTICS_DEFAULT_COST_OF_DEBT", defaults.default_cost_of_debt)?,
            default_tax_rate: env_or("ANALYTICS_DEFAULT_TAX_RATE", defaults.default_tax_rate)?,
            terminal_growth: env_or("ANALYTICS_TERMINAL_GROWTH", defaults.terminal_growth)?,
            projection_years: env_or("ANALYTICS_PROJECTION_YEARS", defaults.projection_years)?,
            graham_bond_yield: env_or("ANALYTICS_GRAHAM_BOND_YIELD", defaults.graham_bond_yield)?,
            reference_pe: env_or("ANALYTICS_REFERENCE_PE", defaults.reference_pe)?,
            min_derived_growth: env_or("ANALYTICS_MIN_DERIVED_GROWTH", defaults.min_derived_growth)?,
            max_derived_growth: env_or("ANALYTICS_MAX_DERIVED_GROWTH", defaults.max_derived_growth)?,
        };

        let config = Self {
            valuation,
            pretty_output: env_or("ANALYTICS_PRETTY_OUTPUT", true)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let v = &self.valuation;
        if v.projection_years == 0 {
            anyhow::bail!("ANALYTICS_PROJECTION_YEARS must be at least 1");
        }
        if v.min_derived_growth > v.max_derived_growth {
            anyhow::bail!(
                "derived growth band is empty: min {} > max {}",
                v.min_derived_growth,
                v.max_derived_growth
            );
        }
        if v.graham_bond_yield <= 0.0 {
            anyhow::bail!("ANALYTICS_GRAHAM_BOND_YIELD must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = RunnerConfig {
            valuation: ValuationConfig::default(),
            pretty_output: true,
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_growth_band_rejected() {
        let config = RunnerConfig {
            valuation: ValuationConfig {
                min_derived_growth: 0.3,
                max_derived_growth: 0.1,
                ..Default::default()
            },
            pretty_output: false,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unset_key_uses_default() {
        let value: f64 = env_or("ANALYTICS_TEST_SURELY_UNSET_KEY", 0.07).unwrap();
        assert_eq!(value, 0.07);
    }
}
