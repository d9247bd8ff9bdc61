/// Pure return-series math for portfolio risk.
/// Stateless functions over already-aligned values; degenerate input yields 0 or `None`.
use analysis_core::stats::{self, MIN_STD};

/// Trading days per year.
pub const TRADING_DAYS: f64 = 252.0;

/// Compute daily returns from a value series.
pub fn daily_returns(values: &[f64]) -> Vec<f64> {
    if values.len() < 2 {
        return Vec::new();
    }
    values
        .windows(2)
        .filter_map(|w| {
            if w[0] != 0.0 {
                Some(w[1] / w[0] - 1.0)
            } else {
                None
            }
        })
        .collect()
}

/// Last value over first, minus one.
pub fn cumulative_return(values: &[f64]) -> f64 {
    match (values.first(), values.last()) {
        (Some(first), Some(last)) if *first != 0.0 => last / first - 1.0,
        _ => 0.0,
    }
}

/// Sample standard deviation of daily returns scaled by sqrt(252).
pub fn annualized_volatility(returns: &[f64]) -> f64 {
    stats::sample_std_dev(returns) * TRADING_DAYS.sqrt()
}

/// Geometric daily equivalent of an annual rate: (1 + r)^(1/252) - 1.
pub fn daily_risk_free(annual_rate: f64) -> f64 {
    (1.0 + annual_rate).powf(1.0 / TRADING_DAYS) - 1.0
}

/// Sharpe ratio: mean(excess) / std(excess) * sqrt(252), excess over the
/// daily risk-free rate. Zero when the excess returns have no dispersion.
pub fn sharpe_ratio(returns: &[f64], rf_annual: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let rf_daily = daily_risk_free(rf_annual);
    let excess: Vec<f64> = returns.iter().map(|r| r - rf_daily).collect();
    let std_dev = stats::sample_std_dev(&excess);
    if std_dev < MIN_STD {
        return 0.0;
    }
    stats::mean(&excess) / std_dev * TRADING_DAYS.sqrt()
}

/// Largest peak-to-trough decline of an equity curve, signed (0 or negative,
/// e.g. -0.15 = 15% below the running peak).
pub fn max_drawdown(values: &[f64]) -> f64 {
    let Some(&first) = values.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;
    for &v in values {
        if v > peak {
            peak = v;
        }
        if peak > 0.0 {
            max_dd = max_dd.min(v / peak - 1.0);
        }
    }
    max_dd
}

/// Historical VaR at given confidence (e.g. 0.95 for 95%): the magnitude of
/// the return at index max(0, floor((1 - confidence) * N) - 1) of the
/// ascending returns.
pub fn var_historical(returns: &[f64], confidence: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let mut sorted: Vec<f64> = returns.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let tail = ((1.0 - confidence) * sorted.len() as f64).floor() as usize;
    let idx = tail.saturating_sub(1).min(sorted.len() - 1);
    sorted[idx].abs()
}

/// Beta = Cov(asset, benchmark) / Var(benchmark) over length-matched returns.
/// `None` on mismatched lengths, fewer than two pairs, or a flat benchmark.
pub fn beta(asset_returns: &[f64], benchmark_returns: &[f64]) -> Option<f64> {
    let covariance = stats::sample_covariance(asset_returns, benchmark_returns)?;
    let variance = stats::sample_variance(benchmark_returns);
    if variance < MIN_STD * MIN_STD {
        return None;
    }
    Some(covariance / variance)
}
