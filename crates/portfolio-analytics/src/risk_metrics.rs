use analysis_core::{AnalysisError, AnalysisResult, RiskMetrics, TrailingWindow};

use crate::benchmark::{BenchmarkAnalysis, BenchmarkComparer};
use crate::models::{RiskRequest, WindowRisk};
use crate::series::{self, PortfolioSeries};
use crate::shared_math;

/// One-day VaR confidence level.
pub const VAR_CONFIDENCE: f64 = 0.95;

pub struct RiskCalculator;

impl RiskCalculator {
    /// Risk statistics of the weighted portfolio over one trailing window.
    pub fn compute(request: &RiskRequest, window: TrailingWindow) -> AnalysisResult<RiskMetrics> {
        let series = series::portfolio_value_series(request, window)?;
        Self::from_series(&series, request)
    }

    /// Every trailing window, shortest first. A window that cannot be
    /// computed carries its error instead of metrics.
    pub fn compute_windows(request: &RiskRequest) -> Vec<WindowRisk> {
        TrailingWindow::ALL
            .iter()
            .map(|window| {
                let analyzed = series::portfolio_value_series(request, *window)
                    .and_then(|series| Self::analyze(&series, request));
                match analyzed {
                    Ok((metrics, benchmark)) => WindowRisk {
                        window: *window,
                        metrics: Some(metrics),
                        benchmark,
                        error: None,
                    },
                    Err(err) => {
                        tracing::warn!(window = window.label(), error = %err, "risk window not computable");
                        WindowRisk {
                            window: *window,
                            metrics: None,
                            benchmark: None,
                            error: Some(err.to_string()),
                        }
                    }
                }
            })
            .collect()
    }

    pub fn from_series(series: &PortfolioSeries, request: &RiskRequest) -> AnalysisResult<RiskMetrics> {
        Self::analyze(series, request).map(|(metrics, _)| metrics)
    }

    /// Metrics plus the benchmark comparison they take beta from.
    fn analyze(
        series: &PortfolioSeries,
        request: &RiskRequest,
    ) -> AnalysisResult<(RiskMetrics, Option<BenchmarkAnalysis>)> {
        let (Some(first), Some(last)) = (series.points.first(), series.points.last()) else {
            return Err(AnalysisError::InsufficientSamples { required: 2, actual: 0 });
        };
        if series.len() < 2 {
            return Err(AnalysisError::InsufficientSamples {
                required: 2,
                actual: series.len(),
            });
        }

        let values = series.values();
        let returns = shared_math::daily_returns(&values);
        let comparison = request
            .benchmark
            .as_ref()
            .and_then(|benchmark| BenchmarkComparer::compare(series, benchmark));

        let metrics = RiskMetrics {
            period_start: first.date,
            period_end: last.date,
            cumulative_return: shared_math::cumulative_return(&values),
            annualized_volatility: shared_math::annualized_volatility(&returns),
            sharpe_ratio: shared_math::sharpe_ratio(&returns, request.risk_free.annual_rate()),
            max_drawdown: shared_math::max_drawdown(&values),
            beta: comparison.as_ref().and_then(|c| c.beta),
            var_95: shared_math::var_historical(&returns, VAR_CONFIDENCE),
            observations: values.len(),
        };
        Ok((metrics, comparison))
    }
}
