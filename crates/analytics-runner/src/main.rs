//! analytics-runner: run one analytics engine over a JSON request file and
//! print the JSON result to stdout.
//!
//! Usage:
//!   analytics-runner valuation --input request.json
//!   analytics-runner risk --input portfolio.json [--as-of 2025-06-30] [--window 3y]
//!   analytics-runner macro --input snapshots.json

mod config;

use analysis_core::TrailingWindow;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use config::RunnerConfig;
use fundamental_analysis::{FundamentalAnalysisEngine, ValuationRequest};
use macro_regime::{MacroCompositeScorer, SnapshotPair};
use portfolio_analytics::{RiskCalculator, RiskRequest};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Valuation,
    Risk,
    Macro,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "valuation" => Some(Command::Valuation),
            "risk" => Some(Command::Risk),
            "macro" => Some(Command::Macro),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct CliArgs {
    command: Command,
    input: String,
    as_of: Option<NaiveDate>,
    window: Option<TrailingWindow>,
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

fn parse_window(raw: &str) -> Result<TrailingWindow> {
    TrailingWindow::ALL
        .into_iter()
        .find(|w| w.label().eq_ignore_ascii_case(raw))
        .with_context(|| format!("unknown window {raw:?} (expected 1y, 3y or 5y)"))
}

impl CliArgs {
    fn parse(args: &[String]) -> Result<Self> {
        let command = args
            .get(1)
            .and_then(|a| Command::from_arg(a))
            .context("expected a command: valuation, risk or macro")?;
        let input = flag_value(args, "--input")
            .context("--input FILE is required")?
            .to_string();
        let as_of = flag_value(args, "--as-of")
            .map(|raw| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .with_context(|| format!("--as-of must be YYYY-MM-DD, got {raw:?}"))
            })
            .transpose()?;
        let window = flag_value(args, "--window").map(parse_window).transpose()?;

        Ok(Self {
            command,
            input,
            as_of,
            window,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  analytics-runner valuation --input FILE");
    eprintln!("  analytics-runner risk --input FILE [--as-of YYYY-MM-DD] [--window 1y|3y|5y]");
    eprintln!("  analytics-runner macro --input FILE");
    eprintln!();
    eprintln!("Valuation defaults come from ANALYTICS_* environment variables (.env is loaded).");
}

fn run_valuation(input: Value, config: &RunnerConfig) -> Result<Value> {
    let request: ValuationRequest =
        serde_json::from_value(input).context("input is not a valuation request")?;
    let engine = FundamentalAnalysisEngine::with_config(config.valuation.clone());
    let report = engine.value(&request);

    if let Some(summary) = &report.summary {
        tracing::info!(
            symbol = %report.symbol,
            fair_value = summary.fair_value,
            margin = summary.margin_of_safety_percent,
            verdict = summary.verdict.to_label(),
            "valuation complete"
        );
    } else {
        tracing::warn!(symbol = %report.symbol, "no methodology produced a positive value");
    }
    Ok(serde_json::to_value(report)?)
}

fn run_risk(mut input: Value, args: &CliArgs) -> Result<Value> {
    // The clock is only read here; the engine always takes an explicit date.
    let now = args
        .as_of
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    if let Some(obj) = input.as_object_mut() {
        if args.as_of.is_some() || !obj.contains_key("now") {
            obj.insert("now".to_string(), Value::String(now.format("%Y-%m-%d").to_string()));
        }
    }
    let request: RiskRequest =
        serde_json::from_value(input).context("input is not a risk request")?;
    tracing::info!(
        holdings = request.weights.len(),
        now = %request.now,
        benchmark = ?request.benchmark.as_ref().map(|b| &b.symbol),
        "computing portfolio risk"
    );

    match args.window {
        Some(window) => {
            let metrics = RiskCalculator::compute(&request, window)
                .with_context(|| format!("risk not computable over {}", window.label()))?;
            Ok(serde_json::to_value(metrics)?)
        }
        None => Ok(serde_json::to_value(RiskCalculator::compute_windows(&request))?),
    }
}

fn run_macro(input: Value) -> Result<Value> {
    let snapshots: SnapshotPair =
        serde_json::from_value(input).context("input is not a macro snapshot pair")?;
    let composite = MacroCompositeScorer::new().score_from_source(&snapshots)?;
    tracing::info!(
        score = composite.score,
        regime = %composite.regime,
        tilt = ?composite.tilt,
        "macro composite scored"
    );
    Ok(serde_json::to_value(composite)?)
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    // Logs go to stderr; stdout carries the JSON result.
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    let args: Vec<String> = std::env::args().collect();
    let cli = match CliArgs::parse(&args) {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("error: {err:#}");
            print_usage();
            std::process::exit(2);
        }
    };

    let config = RunnerConfig::from_env()?;
    let raw = std::fs::read_to_string(&cli.input)
        .with_context(|| format!("failed to read {}", cli.input))?;
    let input: Value =
        serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", cli.input))?;

    let output = match cli.command {
        Command::Valuation => run_valuation(input, &config)?,
        Command::Risk => run_risk(input, &cli)?,
        Command::Macro => run_macro(input)?,
    };

    let rendered = if config.pretty_output {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{rendered}");
    Ok(())
}
