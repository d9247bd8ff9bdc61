pub mod benchmark;
pub mod models;
pub mod risk_metrics;
pub mod series;
pub mod shared_math;

pub use benchmark::{BenchmarkAnalysis, BenchmarkComparer};
pub use models::*;
pub use risk_metrics::RiskCalculator;
pub use series::{portfolio_value_series, PortfolioSeries};
