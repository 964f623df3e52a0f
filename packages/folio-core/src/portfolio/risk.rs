//! Portfolio risk metrics calculation.
//!
//! Provides volatility, beta, Sharpe ratio, drawdowns, Herfindahl
//! concentration and parametric Value at Risk over a daily value series.

use crate::config::RiskSettings;
use crate::portfolio::performance::{daily_returns, series_values};
use crate::portfolio::sectors::{
    position_weight_fractions, sector_weight_fractions, total_market_value,
};
use crate::portfolio::{finite_or_zero, ratio};
use crate::types::{EnrichedPosition, PerformancePoint, RiskMetrics};

/// Beta reported when no comparable benchmark return series is supplied.
pub const DEFAULT_BETA: f64 = 1.0;

/// Calculate risk metrics with default settings.
///
/// See [`compute_risk_with`].
pub fn compute_risk(
    series: &[PerformancePoint],
    positions: &[EnrichedPosition],
    benchmark_returns: Option<&[f64]>,
) -> RiskMetrics {
    compute_risk_with(&RiskSettings::default(), series, positions, benchmark_returns)
}

/// Calculate comprehensive risk metrics for a portfolio.
///
/// # Arguments
///
/// * `settings` - Annualisation, VaR multiplier and risk-free rate
/// * `series` - Portfolio values ordered by date
/// * `positions` - Current valued holdings, for concentration and VaR
/// * `benchmark_returns` - Benchmark daily returns aligned with the
///   portfolio's derived return series
///
/// # Returns
///
/// All-zero metrics when the series has fewer than two points. Beta falls
/// back to [`DEFAULT_BETA`] when the benchmark series is absent or its length
/// differs from the portfolio's return series. VaR is taken against the
/// positions' market value, or against the latest series value when the
/// positions carry none.
pub fn compute_risk_with(
    settings: &RiskSettings,
    series: &[PerformancePoint],
    positions: &[EnrichedPosition],
    benchmark_returns: Option<&[f64]>,
) -> RiskMetrics {
    if series.len() < 2 {
        return RiskMetrics::default();
    }

    let values = series_values(series);
    let returns = daily_returns(&values);
    let annualization = f64::from(settings.trading_days_per_year).sqrt();

    let daily_volatility = population_std_dev(&returns);
    let annualized_volatility = daily_volatility * annualization;

    let beta = match benchmark_returns {
        Some(benchmark) if benchmark.len() == returns.len() => beta(&returns, benchmark),
        _ => DEFAULT_BETA,
    };

    let mut total_value = total_market_value(positions);
    if total_value <= 0.0 {
        total_value = values.last().copied().unwrap_or(0.0).max(0.0);
    }

    let metrics = RiskMetrics {
        daily_volatility: finite_or_zero(daily_volatility),
        annualized_volatility: finite_or_zero(annualized_volatility),
        beta: finite_or_zero(beta),
        sharpe_ratio: sharpe_ratio(
            &returns,
            settings.risk_free_rate,
            settings.trading_days_per_year,
        ),
        max_drawdown: max_drawdown(&values),
        current_drawdown: current_drawdown(&values),
        sector_concentration: herfindahl_index(&sector_weight_fractions(positions)),
        position_concentration: herfindahl_index(&position_weight_fractions(positions)),
        value_at_risk: value_at_risk(total_value, daily_volatility, settings.var_z_score),
    };

    tracing::debug!(
        points = series.len(),
        returns = returns.len(),
        daily_volatility = metrics.daily_volatility,
        max_drawdown = metrics.max_drawdown,
        "computed risk metrics"
    );

    metrics
}

/// Arithmetic mean, 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by `n`).
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    finite_or_zero(variance.sqrt())
}

/// Population covariance over the common prefix of two slices.
pub fn covariance(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    let (a, b) = (&a[..n], &b[..n]);
    let (mean_a, mean_b) = (mean(a), mean(b));
    let sum: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| (x - mean_a) * (y - mean_b))
        .sum();
    finite_or_zero(sum / n as f64)
}

/// `cov(returns, benchmark) / var(benchmark)`, 0 when the benchmark has no variance.
pub fn beta(returns: &[f64], benchmark: &[f64]) -> f64 {
    let variance = covariance(benchmark, benchmark);
    ratio(covariance(returns, benchmark), variance)
}

/// Calculate Sharpe ratio from daily returns.
///
/// # Arguments
///
/// * `returns` - Daily returns
/// * `risk_free_rate` - Annual risk-free rate
/// * `trading_days` - Periods per year used for annualisation
///
/// # Returns
///
/// `(mean * trading_days - risk_free_rate) / annualized volatility`, or 0
/// when volatility is 0.
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64, trading_days: u32) -> f64 {
    let days = f64::from(trading_days);
    let annualized_volatility = population_std_dev(returns) * days.sqrt();
    let annualized_return = mean(returns) * days;
    ratio(annualized_return - risk_free_rate, annualized_volatility)
}

/// Calculate maximum drawdown from a series of values.
///
/// Returns the maximum peak-to-trough decline as a decimal (e.g., 0.15 for 15% drawdown).
pub fn max_drawdown(values: &[f64]) -> f64 {
    let mut running_peak = f64::NEG_INFINITY;
    let mut max_drawdown = 0.0;

    for &value in values.iter().filter(|v| v.is_finite()) {
        if value > running_peak {
            running_peak = value;
        }
        let drawdown = ratio(running_peak - value, running_peak);
        if drawdown > max_drawdown {
            max_drawdown = drawdown;
        }
    }

    max_drawdown
}

/// Decline of the last value from the all-time peak, as a decimal.
pub fn current_drawdown(values: &[f64]) -> f64 {
    let finite = values.iter().copied().filter(|v| v.is_finite());
    let peak = finite.clone().fold(f64::NEG_INFINITY, f64::max);
    match finite.last() {
        Some(last) => ratio(peak - last, peak).max(0.0),
        None => 0.0,
    }
}

/// Herfindahl-Hirschman index: sum of squared weight fractions.
pub fn herfindahl_index(fractions: &[f64]) -> f64 {
    finite_or_zero(fractions.iter().map(|w| w * w).sum())
}

/// One-day parametric Value at Risk (normal approximation).
///
/// VaR in currency units, as a positive number representing potential loss.
pub fn value_at_risk(total_value: f64, daily_volatility: f64, z_score: f64) -> f64 {
    if total_value <= 0.0 {
        return 0.0;
    }
    finite_or_zero(total_value * z_score * daily_volatility)
}
