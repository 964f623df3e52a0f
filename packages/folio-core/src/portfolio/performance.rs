//! Return calculations over value series.

use crate::portfolio::{percent_of, ratio};
use crate::types::PerformancePoint;

/// Daily simple returns of a value series.
///
/// `r[i] = (V[i] - V[i-1]) / V[i-1]`. Steps whose previous value is not
/// positive, or where either value is not finite, are skipped, so the result
/// may be shorter than `len - 1`.
pub fn daily_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .filter_map(|w| step_return(w[0], w[1]))
        .collect()
}

/// Simple return from `previous` to `next`, or `None` when it is undefined.
pub(crate) fn step_return(previous: f64, next: f64) -> Option<f64> {
    if previous > 0.0 && previous.is_finite() && next.is_finite() {
        Some(ratio(next - previous, previous))
    } else {
        None
    }
}

/// Values of a performance series, in order.
pub fn series_values(series: &[PerformancePoint]) -> Vec<f64> {
    series.iter().map(|p| p.value).collect()
}

/// Return from `initial_value` to `final_value`, in percent.
///
/// 0 when the start is not positive or either value is not finite.
pub fn holding_period_return(initial_value: f64, final_value: f64) -> f64 {
    if !(initial_value.is_finite() && final_value.is_finite()) {
        return 0.0;
    }
    percent_of(final_value - initial_value, initial_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_daily_returns() {
        let returns = daily_returns(&[100.0, 110.0, 99.0]);
        assert_eq!(returns.len(), 2);
        assert_abs_diff_eq!(returns[0], 0.10, epsilon = 1e-12);
        assert_abs_diff_eq!(returns[1], -0.10, epsilon = 1e-12);
    }

    #[test]
    fn test_daily_returns_skip_non_positive_base() {
        // 0 -> 50 has no defined return
        let returns = daily_returns(&[100.0, 0.0, 50.0, 55.0]);
        assert_eq!(returns.len(), 2);
        assert_abs_diff_eq!(returns[0], -1.0);
        assert_abs_diff_eq!(returns[1], 0.10, epsilon = 1e-12);
    }

    #[test]
    fn test_daily_returns_short_series() {
        assert!(daily_returns(&[]).is_empty());
        assert!(daily_returns(&[100.0]).is_empty());
    }

    #[test]
    fn test_holding_period_return() {
        let hpr = holding_period_return(10000.0, 11500.0);
        assert!((hpr - 15.0).abs() < 0.01);
        assert_eq!(holding_period_return(0.0, 11500.0), 0.0);
        assert_eq!(holding_period_return(-5.0, 11500.0), 0.0);
    }

    #[test]
    fn test_non_finite_values_never_leak() {
        assert!(daily_returns(&[f64::INFINITY, 100.0]).is_empty());
        assert!(daily_returns(&[100.0, f64::NAN, 110.0]).is_empty());

        let returns = daily_returns(&[f64::MAX, -f64::MAX, 1e-300, 1e300]);
        assert!(returns.iter().all(|r| r.is_finite()));

        assert_eq!(holding_period_return(f64::INFINITY, 100.0), 0.0);
        assert_eq!(holding_period_return(100.0, f64::NAN), 0.0);
        assert_eq!(holding_period_return(f64::MAX, -f64::MAX), 0.0);
        assert_eq!(holding_period_return(1e-300, 1e300), 0.0);
    }
}
