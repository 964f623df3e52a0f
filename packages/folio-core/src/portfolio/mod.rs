//! Portfolio analytics module.
//!
//! Provides valuation, sector rollups, return helpers, risk metrics and
//! benchmark comparison.

mod benchmark;
mod performance;
mod risk;
mod sectors;
mod valuation;

pub use benchmark::{compare_benchmark, compare_benchmark_aligned, pearson_correlation};
pub use performance::{daily_returns, holding_period_return, series_values};
pub use risk::{
    beta, compute_risk, compute_risk_with, covariance, current_drawdown, herfindahl_index,
    max_drawdown, mean, population_std_dev, sharpe_ratio, value_at_risk, DEFAULT_BETA,
};
pub use sectors::{aggregate_sectors, position_weight_fractions, sector_weight_fractions};
pub use valuation::valuate;

pub(crate) use sectors::total_market_value;

/// `numerator / denominator`, or 0 when the denominator is not positive or
/// the result is not finite.
pub(crate) fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        finite_or_zero(numerator / denominator)
    } else {
        0.0
    }
}

/// `part / whole * 100`, guarded like [`ratio`].
pub(crate) fn percent_of(part: f64, whole: f64) -> f64 {
    finite_or_zero(ratio(part, whole) * 100.0)
}

pub(crate) fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
