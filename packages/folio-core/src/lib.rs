//! Folio Core - Portfolio analytics and rebalancing engine.
//!
//! A deterministic computation layer over already-resolved data:
//!
//! - **Valuation**: holdings + quotes + classifications into enriched positions and totals
//! - **Sector rollups**: per-sector value, weight and P/L
//! - **Risk metrics**: volatility, beta, Sharpe ratio, drawdowns, Herfindahl concentration, VaR
//! - **Benchmark comparison**: returns, alpha, correlation
//! - **Rebalancing**: five target-allocation strategies and drift detection
//!
//! Nothing here performs I/O or keeps state between calls.
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use folio_core::{plan_rebalance, valuate, Position, Quote, RebalanceStrategy, StrategyParams};
//!
//! let holdings = vec![Position::new("AAPL", 10.0, 150.0), Position::new("MSFT", 5.0, 300.0)];
//! let mut quotes = HashMap::new();
//! quotes.insert("AAPL".to_string(), Quote::new(175.0, 1.5, 0.86));
//! quotes.insert("MSFT".to_string(), Quote::new(310.0, -2.0, -0.64));
//!
//! let summary = valuate(&holdings, &quotes, &HashMap::new());
//! let plan = plan_rebalance(
//!     RebalanceStrategy::EqualWeight,
//!     &summary.positions,
//!     summary.total_value,
//!     &StrategyParams::default(),
//! )
//! .unwrap();
//! println!("{} trades", plan.summary.total_trades);
//! ```

pub mod config;
pub mod portfolio;
pub mod rebalance;
pub mod types;

// Re-export commonly used types
pub use config::{AnalyticsConfig, RebalanceSettings, RiskSettings};
pub use types::{
    ApiResponse, BenchmarkComparison, BenchmarkId, Classification, EnrichedPosition,
    PerformancePoint, PlanSummary, PortfolioSummary, Position, Quote, RebalancingAction,
    RebalancingPlan, RiskMetrics, SectorAllocation, TradeAction,
};

// Re-export main functionality
pub use portfolio::{
    aggregate_sectors, compare_benchmark, compare_benchmark_aligned, compute_risk,
    compute_risk_with, valuate,
};
pub use rebalance::{
    calculate_allocation_drift, needs_rebalancing, plan_rebalance, plan_rebalance_with,
    RebalanceStrategy, StrategyParams, TargetAllocationStrategy,
};

/// Error types for folio-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("Target references a symbol not in the portfolio: {0}")]
    UnknownSymbol(String),

    #[error("Invalid target for {symbol}: {value}")]
    InvalidTarget { symbol: String, value: f64 },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for folio-core operations.
pub type Result<T> = std::result::Result<T, Error>;
