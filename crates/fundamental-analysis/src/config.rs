use serde::{Deserialize, Serialize};

/// Defaults applied when a valuation input is neither supplied by the caller
/// nor derivable from the fetched data. Rates are decimals (0.05 = 5%),
/// except `graham_bond_yield`, which the Graham formula takes in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationConfig {
    pub risk_free_rate: f64,         // 4.5%
    pub market_risk_premium: f64,    // 5.5%
    pub default_cost_of_debt: f64,   // 5%
    pub default_tax_rate: f64,       // 21% US federal
    pub terminal_growth: f64,        // 3%
    pub projection_years: u32,       // 5
    pub graham_bond_yield: f64,      // 4.5 (AAA corporate, percent)
    pub reference_pe: f64,           // 15x
    // Band applied to growth rates derived from history; caller overrides are used as given.
    pub min_derived_growth: f64,     // -5%
    pub max_derived_growth: f64,     // 25%
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.045,
            market_risk_premium: 0.055,
            default_cost_of_debt: 0.05,
            default_tax_rate: 0.21,
            terminal_growth: 0.03,
            projection_years: 5,
            graham_bond_yield: 4.5,
            reference_pe: 15.0,
            min_derived_growth: -0.05,
            max_derived_growth: 0.25,
        }
    }
}

impl ValuationConfig {
    pub fn clamp_derived_growth(&self, growth: f64) -> f64 {
        growth.max(self.min_derived_growth).min(self.max_derived_growth)
    }
}
