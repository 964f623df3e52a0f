//! Core data types for the folio analytics engine.
//!
//! Every type here is a plain value object: built fresh for each call and
//! never retained by the engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Sector label used when a holding carries no classification.
pub const UNKNOWN_SECTOR: &str = "Unknown";

/// A raw holding: shares owned of a particular asset at an average cost.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Position {
    /// Stock ticker symbol (uppercase)
    pub symbol: String,
    /// Number of shares owned
    pub shares: f64,
    /// Average cost per share
    pub avg_cost: f64,
    /// Company name, if the holding record carries one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    /// Sector, if the holding record carries one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
}

impl Position {
    /// Create a new position with the given symbol, shares, and average cost.
    pub fn new(symbol: &str, shares: f64, avg_cost: f64) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            shares,
            avg_cost,
            company_name: None,
            sector: None,
        }
    }

    /// Attach a sector to the position.
    pub fn with_sector(mut self, sector: &str) -> Self {
        self.sector = Some(sector.to_string());
        self
    }

    /// Attach a company name to the position.
    pub fn with_company_name(mut self, name: &str) -> Self {
        self.company_name = Some(name.to_string());
        self
    }

    /// Total cost of this position (`shares * avg_cost`).
    pub fn cost_basis(&self) -> f64 {
        self.shares * self.avg_cost
    }
}

/// Live quote snapshot for a symbol.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Quote {
    /// Last traded price
    pub price: f64,
    /// Absolute price change on the day
    #[serde(default)]
    pub change: f64,
    /// Percentage price change on the day
    #[serde(default)]
    pub change_percent: f64,
}

impl Quote {
    pub fn new(price: f64, change: f64, change_percent: f64) -> Self {
        Self {
            price,
            change,
            change_percent,
        }
    }
}

/// Reference data for a symbol.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Classification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
}

/// A holding valued against the current quote.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichedPosition {
    pub symbol: String,
    pub shares: f64,
    pub avg_cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    /// Price used for valuation (quote price, or `avg_cost` when unquoted)
    pub current_price: f64,
    /// `shares * current_price`
    pub market_value: f64,
    /// `shares * avg_cost`
    pub cost_basis: f64,
    /// `market_value - cost_basis`
    pub unrealized_pl: f64,
    /// Unrealized P/L as a percentage of cost basis
    pub unrealized_pl_percent: f64,
    /// `shares * quote.change`
    pub day_change: f64,
    pub day_change_percent: f64,
    /// Share of portfolio market value, in percent (0-100)
    pub weight: f64,
}

impl EnrichedPosition {
    /// Sector label, `"Unknown"` when missing or blank.
    pub fn sector_or_unknown(&self) -> &str {
        match self.sector.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s,
            _ => UNKNOWN_SECTOR,
        }
    }
}

/// Result of valuing a set of holdings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PortfolioSummary {
    pub positions: Vec<EnrichedPosition>,
    /// Total market value
    pub total_value: f64,
    /// Total cost basis
    pub total_cost: f64,
    pub total_unrealized_pl: f64,
    pub total_unrealized_pl_percent: f64,
    pub total_day_change: f64,
    /// Day change relative to the previous close value
    pub total_day_change_percent: f64,
    /// Number of positions with gains
    pub positions_in_profit: usize,
    /// Number of positions with losses
    pub positions_in_loss: usize,
}

impl PortfolioSummary {
    /// Get the number of positions.
    pub fn position_count(&self) -> usize {
        self.positions.len()
    }
}

/// Per-sector rollup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SectorAllocation {
    pub sector: String,
    /// Aggregate market value
    pub value: f64,
    /// Share of total value, in percent
    pub weight: f64,
    /// Aggregate unrealized P/L
    pub pl: f64,
    /// P/L relative to the sector's cost (`value - pl`)
    pub pl_percent: f64,
    /// Number of holdings in the sector
    pub count: usize,
}

/// One observation of portfolio (or benchmark) value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PerformancePoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl PerformancePoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Risk statistics for a portfolio value series.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct RiskMetrics {
    /// Population standard deviation of daily returns
    pub daily_volatility: f64,
    /// `daily_volatility * sqrt(trading days)`
    pub annualized_volatility: f64,
    /// Sensitivity to the benchmark's daily returns
    pub beta: f64,
    /// Annualized return over annualized volatility
    pub sharpe_ratio: f64,
    /// Largest peak-to-trough decline as a fraction (0.15 = 15%)
    pub max_drawdown: f64,
    /// Decline of the latest value from the all-time peak, as a fraction
    pub current_drawdown: f64,
    /// Herfindahl index over sector weight fractions, in [0, 1]
    pub sector_concentration: f64,
    /// Herfindahl index over position weight fractions, in [0, 1]
    pub position_concentration: f64,
    /// One-day parametric Value at Risk in currency units
    pub value_at_risk: f64,
}

/// Identity of the benchmark a portfolio is compared against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BenchmarkId {
    pub symbol: String,
    pub name: String,
}

impl BenchmarkId {
    pub fn new(symbol: &str, name: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: name.to_string(),
        }
    }
}

/// Portfolio versus benchmark over the same window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BenchmarkComparison {
    pub benchmark_symbol: String,
    pub benchmark_name: String,
    /// Portfolio holding-period return, in percent
    pub portfolio_return: f64,
    /// Benchmark holding-period return, in percent
    pub benchmark_return: f64,
    /// `portfolio_return - benchmark_return`
    pub alpha: f64,
    /// Pearson correlation of paired daily returns
    pub correlation: f64,
}

/// Trade direction proposed by a rebalancing plan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "buy"),
            TradeAction::Sell => write!(f, "sell"),
            TradeAction::Hold => write!(f, "hold"),
        }
    }
}

/// Proposed change for a single holding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RebalancingAction {
    pub symbol: String,
    pub current_value: f64,
    pub target_value: f64,
    /// `target_value - current_value`
    pub value_difference: f64,
    /// Current share of total value, in percent
    pub current_percent: f64,
    /// Target share of total value, in percent
    pub target_percent: f64,
    pub action: TradeAction,
}

/// Order counts of a plan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PlanSummary {
    pub buy_orders: usize,
    pub sell_orders: usize,
    pub hold_positions: usize,
    /// `buy_orders + sell_orders`
    pub total_trades: usize,
}

/// A complete trade plan produced by one rebalancing strategy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RebalancingPlan {
    /// Human-readable strategy name
    pub strategy: String,
    pub total_value: f64,
    /// Sorted by `|value_difference|`, largest first
    pub actions: Vec<RebalancingAction>,
    pub summary: PlanSummary,
    /// Present iff the plan contains sell orders
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_implications: Option<String>,
    /// Reduction of the largest over-allocation, in percentage points
    pub risk_reduction: f64,
}

/// API response wrapper used by the command line driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}
