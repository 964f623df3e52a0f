//! Sector rollups and concentration inputs.

use std::collections::BTreeMap;

use crate::portfolio::{percent_of, ratio};
use crate::types::{EnrichedPosition, SectorAllocation};

/// Group positions by sector.
///
/// Missing sectors are reported as `"Unknown"`. The result is sorted by
/// value, largest first, with ties broken by sector name.
pub fn aggregate_sectors(positions: &[EnrichedPosition]) -> Vec<SectorAllocation> {
    let total_value = total_market_value(positions);

    // sector -> (value, pl, count)
    let mut groups: BTreeMap<&str, (f64, f64, usize)> = BTreeMap::new();
    for position in positions {
        let entry = groups.entry(position.sector_or_unknown()).or_default();
        entry.0 += position.market_value;
        entry.1 += position.unrealized_pl;
        entry.2 += 1;
    }

    let mut sectors: Vec<SectorAllocation> = groups
        .into_iter()
        .map(|(sector, (value, pl, count))| SectorAllocation {
            sector: sector.to_string(),
            value,
            weight: percent_of(value, total_value),
            pl,
            pl_percent: percent_of(pl, value - pl),
            count,
        })
        .collect();

    sectors.sort_by(|a, b| {
        b.value
            .total_cmp(&a.value)
            .then_with(|| a.sector.cmp(&b.sector))
    });
    sectors
}

/// Sector weights as fractions of total value (not percentages), in the
/// order produced by [`aggregate_sectors`].
pub fn sector_weight_fractions(positions: &[EnrichedPosition]) -> Vec<f64> {
    let total_value = total_market_value(positions);
    aggregate_sectors(positions)
        .iter()
        .map(|s| ratio(s.value, total_value))
        .collect()
}

/// Position weights as fractions of total value, in input order.
pub fn position_weight_fractions(positions: &[EnrichedPosition]) -> Vec<f64> {
    let total_value = total_market_value(positions);
    positions
        .iter()
        .map(|p| ratio(p.market_value, total_value))
        .collect()
}

pub(crate) fn total_market_value(positions: &[EnrichedPosition]) -> f64 {
    positions.iter().map(|p| p.market_value).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::test_support::enriched;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_aggregate_sectors() {
        let positions = vec![
            enriched("AAPL", Some("Technology"), 5000.0, 1000.0),
            enriched("MSFT", Some("Technology"), 3000.0, -200.0),
            enriched("XOM", Some("Energy"), 2000.0, 500.0),
        ];

        let sectors = aggregate_sectors(&positions);

        assert_eq!(sectors.len(), 2);
        assert_eq!(sectors[0].sector, "Technology");
        assert_abs_diff_eq!(sectors[0].value, 8000.0);
        assert_abs_diff_eq!(sectors[0].weight, 80.0, epsilon = 1e-9);
        assert_abs_diff_eq!(sectors[0].pl, 800.0);
        // 800 / (8000 - 800)
        assert_abs_diff_eq!(sectors[0].pl_percent, 800.0 / 7200.0 * 100.0, epsilon = 1e-9);
        assert_eq!(sectors[0].count, 2);

        assert_eq!(sectors[1].sector, "Energy");
        assert_abs_diff_eq!(sectors[1].weight, 20.0, epsilon = 1e-9);
    }

    #[test]
    fn test_missing_sector_is_unknown() {
        let positions = vec![
            enriched("A", None, 100.0, 0.0),
            enriched("B", Some("  "), 100.0, 0.0),
            enriched("C", Some("Utilities"), 50.0, 0.0),
        ];

        let sectors = aggregate_sectors(&positions);
        assert_eq!(sectors[0].sector, "Unknown");
        assert_eq!(sectors[0].count, 2);
    }

    #[test]
    fn test_ties_sorted_by_name() {
        let positions = vec![
            enriched("A", Some("Materials"), 100.0, 0.0),
            enriched("B", Some("Energy"), 100.0, 0.0),
        ];

        let sectors = aggregate_sectors(&positions);
        assert_eq!(sectors[0].sector, "Energy");
        assert_eq!(sectors[1].sector, "Materials");
    }

    #[test]
    fn test_pl_percent_guarded() {
        // value - pl <= 0 must not divide
        let positions = vec![enriched("A", Some("Tech"), 100.0, 100.0)];
        let sectors = aggregate_sectors(&positions);
        assert_eq!(sectors[0].pl_percent, 0.0);
    }

    #[test]
    fn test_weight_fractions() {
        let positions = vec![
            enriched("A", Some("Tech"), 600.0, 0.0),
            enriched("B", Some("Tech"), 200.0, 0.0),
            enriched("C", Some("Energy"), 200.0, 0.0),
        ];

        let sector = sector_weight_fractions(&positions);
        assert_abs_diff_eq!(sector[0], 0.8, epsilon = 1e-12);
        assert_abs_diff_eq!(sector[1], 0.2, epsilon = 1e-12);

        let position = position_weight_fractions(&positions);
        assert_abs_diff_eq!(position.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(position[0], 0.6, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_and_zero_value() {
        assert!(aggregate_sectors(&[]).is_empty());

        let positions = vec![enriched("A", None, 0.0, 0.0)];
        let sectors = aggregate_sectors(&positions);
        assert_eq!(sectors[0].weight, 0.0);
        assert_eq!(position_weight_fractions(&positions), vec![0.0]);
    }
}
