//! Portfolio versus benchmark comparison.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::portfolio::performance::{holding_period_return, step_return};
use crate::portfolio::{finite_or_zero, ratio};
use crate::portfolio::risk::{covariance, population_std_dev};
use crate::types::{BenchmarkComparison, BenchmarkId, PerformancePoint};

/// Compare a portfolio series with a benchmark series.
///
/// Returns are holding-period returns of each series. Correlation pairs the
/// two series by position, up to the shorter length; use
/// [`compare_benchmark_aligned`] when the series may have different gaps.
pub fn compare_benchmark(
    portfolio: &[PerformancePoint],
    benchmark: &[PerformancePoint],
    benchmark_id: &BenchmarkId,
) -> BenchmarkComparison {
    if portfolio.is_empty() || benchmark.is_empty() {
        return empty_comparison(benchmark_id);
    }

    let n = portfolio.len().min(benchmark.len());
    let portfolio_values: Vec<f64> = portfolio[..n].iter().map(|p| p.value).collect();
    let benchmark_values: Vec<f64> = benchmark[..n].iter().map(|p| p.value).collect();

    build_comparison(
        portfolio,
        benchmark,
        benchmark_id,
        &portfolio_values,
        &benchmark_values,
    )
}

/// Compare a portfolio series with a benchmark series aligned by date.
///
/// Each series goes into a date-ordered map (a later point for the same date
/// wins) and only dates present in both take part in the correlation.
pub fn compare_benchmark_aligned(
    portfolio: &[PerformancePoint],
    benchmark: &[PerformancePoint],
    benchmark_id: &BenchmarkId,
) -> BenchmarkComparison {
    if portfolio.is_empty() || benchmark.is_empty() {
        return empty_comparison(benchmark_id);
    }

    let portfolio_by_date = by_date(portfolio);
    let benchmark_by_date = by_date(benchmark);

    let (portfolio_values, benchmark_values): (Vec<f64>, Vec<f64>) = portfolio_by_date
        .iter()
        .filter_map(|(date, &p)| benchmark_by_date.get(date).map(|&b| (p, b)))
        .unzip();

    build_comparison(
        portfolio,
        benchmark,
        benchmark_id,
        &portfolio_values,
        &benchmark_values,
    )
}

fn build_comparison(
    portfolio: &[PerformancePoint],
    benchmark: &[PerformancePoint],
    benchmark_id: &BenchmarkId,
    paired_portfolio: &[f64],
    paired_benchmark: &[f64],
) -> BenchmarkComparison {
    let portfolio_return = series_return(portfolio);
    let benchmark_return = series_return(benchmark);
    let (p, b) = paired_returns(paired_portfolio, paired_benchmark);
    let correlation = pearson_correlation(&p, &b);

    tracing::debug!(
        benchmark = %benchmark_id.symbol,
        paired_returns = p.len(),
        portfolio_return,
        benchmark_return,
        "compared against benchmark"
    );

    BenchmarkComparison {
        benchmark_symbol: benchmark_id.symbol.clone(),
        benchmark_name: benchmark_id.name.clone(),
        portfolio_return,
        benchmark_return,
        alpha: finite_or_zero(portfolio_return - benchmark_return),
        correlation,
    }
}

fn empty_comparison(benchmark_id: &BenchmarkId) -> BenchmarkComparison {
    BenchmarkComparison {
        benchmark_symbol: benchmark_id.symbol.clone(),
        benchmark_name: benchmark_id.name.clone(),
        ..Default::default()
    }
}

fn by_date(series: &[PerformancePoint]) -> BTreeMap<NaiveDate, f64> {
    series.iter().map(|p| (p.date, p.value)).collect()
}

/// Holding-period return from first to last point, in percent.
fn series_return(series: &[PerformancePoint]) -> f64 {
    match (series.first(), series.last()) {
        (Some(start), Some(end)) => holding_period_return(start.value, end.value),
        _ => 0.0,
    }
}

/// Step returns of two equally long value sequences.
///
/// A step is kept only when both sides have a defined return, so the two
/// return series stay paired.
fn paired_returns(portfolio: &[f64], benchmark: &[f64]) -> (Vec<f64>, Vec<f64>) {
    portfolio
        .windows(2)
        .zip(benchmark.windows(2))
        .filter_map(|(p, b)| Some((step_return(p[0], p[1])?, step_return(b[0], b[1])?)))
        .unzip()
}

/// Pearson correlation, 0 when either side has no variance.
pub fn pearson_correlation(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    let (a, b) = (&a[..n], &b[..n]);
    let denominator = population_std_dev(a) * population_std_dev(b);
    ratio(covariance(a, b), denominator).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::test_support::{day, series};
    use approx::assert_abs_diff_eq;

    fn spy() -> BenchmarkId {
        BenchmarkId::new("SPY", "S&P 500")
    }

    #[test]
    fn test_returns_and_alpha() {
        let portfolio = series(&[10_000.0, 10_500.0, 11_000.0]);
        let benchmark = series(&[400.0, 410.0, 420.0]);

        let cmp = compare_benchmark(&portfolio, &benchmark, &spy());

        assert_eq!(cmp.benchmark_symbol, "SPY");
        assert_eq!(cmp.benchmark_name, "S&P 500");
        assert_abs_diff_eq!(cmp.portfolio_return, 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(cmp.benchmark_return, 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(cmp.alpha, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_non_finite_values_give_finite_comparison() {
        let cmp = compare_benchmark(
            &series(&[f64::INFINITY, 100.0]),
            &series(&[100.0, 110.0]),
            &spy(),
        );
        assert_eq!(cmp.portfolio_return, 0.0);
        assert_abs_diff_eq!(cmp.alpha, -10.0, epsilon = 1e-9);
        assert_eq!(cmp.correlation, 0.0);

        let cmp = compare_benchmark(
            &series(&[f64::MAX, -f64::MAX]),
            &series(&[100.0, 110.0]),
            &spy(),
        );
        assert_eq!(cmp.portfolio_return, 0.0);
        assert!(cmp.alpha.is_finite());

        let cmp = compare_benchmark_aligned(
            &series(&[100.0, f64::NAN, 120.0, 90.0]),
            &series(&[10.0, 11.0, f64::INFINITY, 9.0]),
            &spy(),
        );
        assert!(cmp.portfolio_return.is_finite());
        assert!(cmp.benchmark_return.is_finite());
        assert!(cmp.alpha.is_finite());
        assert!(cmp.correlation.is_finite());
    }

    #[test]
    fn test_empty_series() {
        let cmp = compare_benchmark(&[], &series(&[1.0, 2.0]), &spy());
        assert_eq!(cmp.portfolio_return, 0.0);
        assert_eq!(cmp.correlation, 0.0);
        assert_eq!(cmp.benchmark_symbol, "SPY");

        let cmp = compare_benchmark_aligned(&series(&[1.0, 2.0]), &[], &spy());
        assert_eq!(cmp.alpha, 0.0);
    }

    #[test]
    fn test_perfect_correlation() {
        let portfolio = series(&[100.0, 102.0, 99.0, 104.0, 103.0]);
        let benchmark: Vec<PerformancePoint> = portfolio
            .iter()
            .map(|p| PerformancePoint::new(p.date, p.value * 3.0))
            .collect();

        let cmp = compare_benchmark(&portfolio, &benchmark, &spy());
        assert_abs_diff_eq!(cmp.correlation, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_inverse_correlation() {
        let portfolio = series(&[100.0, 110.0, 99.0, 108.9]);
        let benchmark = series(&[100.0, 90.0, 99.0, 89.1]);

        let cmp = compare_benchmark(&portfolio, &benchmark, &spy());
        assert_abs_diff_eq!(cmp.correlation, -1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_flat_series_has_zero_correlation() {
        let portfolio = series(&[100.0, 100.0, 100.0]);
        let benchmark = series(&[100.0, 101.0, 99.0]);

        let cmp = compare_benchmark(&portfolio, &benchmark, &spy());
        assert_eq!(cmp.correlation, 0.0);
    }

    #[test]
    fn test_zero_start_value() {
        let portfolio = series(&[0.0, 100.0]);
        let benchmark = series(&[100.0, 110.0]);

        let cmp = compare_benchmark(&portfolio, &benchmark, &spy());
        assert_eq!(cmp.portfolio_return, 0.0);
        assert_abs_diff_eq!(cmp.alpha, -10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_positional_pairing_uses_shorter_length() {
        let portfolio = series(&[100.0, 101.0, 102.0, 50.0]);
        let benchmark = series(&[100.0, 101.0, 102.0]);

        let cmp = compare_benchmark(&portfolio, &benchmark, &spy());
        // Only the first two steps are paired; both rise together
        assert_abs_diff_eq!(cmp.correlation, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(cmp.portfolio_return, -50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_aligned_by_date() {
        // Benchmark misses day 2 (holiday); positional pairing would misalign
        let portfolio = vec![
            PerformancePoint::new(day(1), 100.0),
            PerformancePoint::new(day(2), 90.0),
            PerformancePoint::new(day(3), 110.0),
            PerformancePoint::new(day(4), 99.0),
            PerformancePoint::new(day(5), 120.0),
        ];
        let benchmark = vec![
            PerformancePoint::new(day(1), 200.0),
            PerformancePoint::new(day(3), 220.0),
            PerformancePoint::new(day(4), 198.0),
            PerformancePoint::new(day(5), 240.0),
        ];

        let aligned = compare_benchmark_aligned(&portfolio, &benchmark, &spy());
        assert_abs_diff_eq!(aligned.correlation, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(aligned.portfolio_return, 20.0, epsilon = 1e-9);
        assert_abs_diff_eq!(aligned.benchmark_return, 20.0, epsilon = 1e-9);

        let positional = compare_benchmark(&portfolio, &benchmark, &spy());
        assert!(positional.correlation < 0.99);
    }

    #[test]
    fn test_aligned_duplicate_date_last_wins() {
        let portfolio = vec![
            PerformancePoint::new(day(1), 100.0),
            PerformancePoint::new(day(2), 50.0),
            PerformancePoint::new(day(2), 110.0),
            PerformancePoint::new(day(3), 99.0),
        ];
        let benchmark = series(&[10.0, 11.0, 9.9]);

        // With the first day-2 point the returns would run opposite to the benchmark
        let cmp = compare_benchmark_aligned(&portfolio, &benchmark, &spy());
        assert_abs_diff_eq!(cmp.correlation, 1.0, epsilon = 1e-9);
    }
}
