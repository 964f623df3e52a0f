//! Allocation drift detection.

use std::collections::BTreeMap;

use crate::portfolio::{percent_of, total_market_value};
use crate::types::EnrichedPosition;

/// Actual minus target allocation, in percentage points, per symbol.
///
/// Actual allocation is each holding's share of total market value. A held
/// symbol missing from `targets` has a target of 0; a target for a symbol
/// that is not held yields a drift of `-target`. Target keys match symbols
/// case-insensitively.
pub fn calculate_allocation_drift(
    positions: &[EnrichedPosition],
    targets: &BTreeMap<String, f64>,
) -> BTreeMap<String, f64> {
    let total_value = total_market_value(positions);

    let mut drift: BTreeMap<String, f64> = BTreeMap::new();
    for position in positions {
        *drift.entry(position.symbol.to_uppercase()).or_default() +=
            percent_of(position.market_value, total_value);
    }

    for (symbol, &target) in targets {
        let target = if target.is_finite() { target } else { 0.0 };
        *drift.entry(symbol.to_uppercase()).or_default() -= target;
    }

    drift
}

/// Whether any symbol drifts strictly more than `threshold_percent` from
/// its target. Drift exactly at the threshold does not trigger.
pub fn needs_rebalancing(
    positions: &[EnrichedPosition],
    targets: &BTreeMap<String, f64>,
    threshold_percent: f64,
) -> bool {
    let drift = calculate_allocation_drift(positions, targets);
    let breach = drift.iter().find(|(_, d)| d.abs() > threshold_percent);

    if let Some((symbol, d)) = breach {
        tracing::debug!(
            symbol = %symbol,
            drift = *d,
            threshold_percent,
            "allocation drift exceeds threshold"
        );
    }
    breach.is_some()
}
