//! Folio CLI - Command line driver for the analytics engine.
//!
//! Reads JSON input files and prints an `ApiResponse` JSON envelope on stdout.
//! Logs go to stderr; set `RUST_LOG` to adjust verbosity.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use folio_core::{
    aggregate_sectors, calculate_allocation_drift, compare_benchmark, compare_benchmark_aligned,
    compute_risk_with, needs_rebalancing, plan_rebalance_with, valuate, AnalyticsConfig,
    ApiResponse, BenchmarkId, Classification, PerformancePoint, PortfolioSummary, Position, Quote,
    RebalanceStrategy, StrategyParams,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Folio CLI - portfolio valuation, risk and rebalancing")]
#[command(version)]
struct Cli {
    /// Analytics config file (defaults to FOLIO_CONFIG_FILE or the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Value holdings against quotes
    Value {
        /// Portfolio snapshot (holdings, quotes, classifications)
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Per-sector rollup of a valued portfolio
    Sectors {
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Risk metrics over a historical value series
    Risk {
        #[arg(short, long)]
        input: PathBuf,
        /// Portfolio value series (array of {date, value})
        #[arg(short, long)]
        series: PathBuf,
        /// Benchmark daily returns (array of numbers)
        #[arg(short, long)]
        benchmark_returns: Option<PathBuf>,
    },
    /// Compare a portfolio series with a benchmark series
    Benchmark {
        #[arg(short, long)]
        series: PathBuf,
        #[arg(short, long)]
        benchmark: PathBuf,
        /// Benchmark symbol
        #[arg(long, default_value = "SPY")]
        symbol: String,
        /// Benchmark display name
        #[arg(long, default_value = "S&P 500")]
        name: String,
        /// Pair returns by date instead of by position
        #[arg(long)]
        align: bool,
    },
    /// Build a rebalancing plan
    Rebalance {
        #[arg(short, long)]
        input: PathBuf,
        /// Strategy (equal_weight, market_cap_weight, sector_balanced, risk_parity, custom_targets)
        #[arg(short = 't', long)]
        strategy: String,
        /// Strategy parameters (market_caps, volatilities, custom_targets, sector_cap_percent)
        #[arg(short, long)]
        params: Option<PathBuf>,
    },
    /// Allocation drift against target percentages
    Drift {
        #[arg(short, long)]
        input: PathBuf,
        /// Target percentages (object of symbol -> percent)
        #[arg(short = 't', long)]
        targets: PathBuf,
        /// Drift threshold in percentage points (defaults to config)
        #[arg(long)]
        threshold: Option<f64>,
    },
}

/// Portfolio snapshot as supplied by the data layer.
#[derive(Debug, Deserialize)]
struct Snapshot {
    holdings: Vec<Position>,
    #[serde(default)]
    quotes: HashMap<String, Quote>,
    #[serde(default)]
    classifications: HashMap<String, Classification>,
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let output = match load_config(cli.config.as_deref()) {
        Ok(config) => run(&config, cli.command),
        Err(e) => respond::<()>(Err(e)),
    };

    println!("{}", output);
}

fn load_config(path: Option<&Path>) -> Result<AnalyticsConfig> {
    match path {
        Some(path) => AnalyticsConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(AnalyticsConfig::load_or_default()?),
    }
}

fn run(config: &AnalyticsConfig, command: Commands) -> String {
    match command {
        Commands::Value { input } => respond(handle_value(&input)),
        Commands::Sectors { input } => respond(handle_sectors(&input)),
        Commands::Risk {
            input,
            series,
            benchmark_returns,
        } => respond(handle_risk(config, &input, &series, benchmark_returns.as_deref())),
        Commands::Benchmark {
            series,
            benchmark,
            symbol,
            name,
            align,
        } => respond(handle_benchmark(
            &series,
            &benchmark,
            &BenchmarkId::new(&symbol, &name),
            align,
        )),
        Commands::Rebalance {
            input,
            strategy,
            params,
        } => respond(handle_rebalance(config, &input, &strategy, params.as_deref())),
        Commands::Drift {
            input,
            targets,
            threshold,
        } => respond(handle_drift(config, &input, &targets, threshold)),
    }
}

fn respond<T: Serialize>(result: Result<T>) -> String {
    let rendered = match result {
        Ok(data) => serde_json::to_string_pretty(&ApiResponse::ok(data)),
        Err(e) => {
            tracing::error!("{:#}", e);
            serde_json::to_string_pretty(&ApiResponse::<()>::err(format!("{:#}", e)))
        }
    };
    rendered.unwrap_or_else(|e| format!(r#"{{"ok":false,"error":"{}"}}"#, e))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}

fn load_summary(input: &Path) -> Result<PortfolioSummary> {
    let snapshot: Snapshot = read_json(input)?;
    Ok(valuate(
        &snapshot.holdings,
        &snapshot.quotes,
        &snapshot.classifications,
    ))
}

fn handle_value(input: &Path) -> Result<PortfolioSummary> {
    load_summary(input)
}

fn handle_sectors(input: &Path) -> Result<serde_json::Value> {
    let summary = load_summary(input)?;
    Ok(json!({
        "total_value": summary.total_value,
        "sectors": aggregate_sectors(&summary.positions),
    }))
}

fn handle_risk(
    config: &AnalyticsConfig,
    input: &Path,
    series: &Path,
    benchmark_returns: Option<&Path>,
) -> Result<serde_json::Value> {
    let summary = load_summary(input)?;
    let series: Vec<PerformancePoint> = read_json(series)?;
    let benchmark = benchmark_returns
        .map(read_json::<Vec<f64>>)
        .transpose()?;

    let metrics = compute_risk_with(
        &config.risk,
        &series,
        &summary.positions,
        benchmark.as_deref(),
    );
    Ok(json!({
        "total_value": summary.total_value,
        "points": series.len(),
        "metrics": metrics,
    }))
}

fn handle_benchmark(
    series: &Path,
    benchmark: &Path,
    benchmark_id: &BenchmarkId,
    align: bool,
) -> Result<folio_core::BenchmarkComparison> {
    let portfolio: Vec<PerformancePoint> = read_json(series)?;
    let benchmark: Vec<PerformancePoint> = read_json(benchmark)?;

    Ok(if align {
        compare_benchmark_aligned(&portfolio, &benchmark, benchmark_id)
    } else {
        compare_benchmark(&portfolio, &benchmark, benchmark_id)
    })
}

fn handle_rebalance(
    config: &AnalyticsConfig,
    input: &Path,
    strategy: &str,
    params: Option<&Path>,
) -> Result<folio_core::RebalancingPlan> {
    let strategy: RebalanceStrategy = strategy.parse()?;
    let params: StrategyParams = match params {
        Some(path) => read_json(path)?,
        None => StrategyParams::default(),
    };
    let summary = load_summary(input)?;

    Ok(plan_rebalance_with(
        &config.rebalance,
        strategy,
        &summary.positions,
        summary.total_value,
        &params,
    )?)
}

fn handle_drift(
    config: &AnalyticsConfig,
    input: &Path,
    targets: &Path,
    threshold: Option<f64>,
) -> Result<serde_json::Value> {
    let summary = load_summary(input)?;
    let targets: BTreeMap<String, f64> = read_json(targets)?;
    let threshold = threshold.unwrap_or(config.rebalance.drift_threshold_percent);

    Ok(json!({
        "threshold_percent": threshold,
        "drift": calculate_allocation_drift(&summary.positions, &targets),
        "needs_rebalancing": needs_rebalancing(&summary.positions, &targets, threshold),
    }))
}
