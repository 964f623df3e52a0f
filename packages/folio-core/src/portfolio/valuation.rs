//! Position valuation against live quotes.

use std::collections::HashMap;

use crate::portfolio::{finite_or_zero, percent_of};
use crate::types::{Classification, EnrichedPosition, PortfolioSummary, Position, Quote};

/// Value a set of holdings.
///
/// Computation is two-pass: the first pass values each holding and sums the
/// portfolio totals, the second divides each market value by the total to
/// get the weight.
///
/// A holding whose symbol has no usable quote (missing, non-positive or
/// non-finite price) is valued at its average cost with zero day change.
/// It is never dropped, so weights and concentration figures always cover
/// the whole portfolio.
///
/// Classification data takes precedence over the name and sector carried on
/// the holding itself.
pub fn valuate(
    holdings: &[Position],
    quotes: &HashMap<String, Quote>,
    classifications: &HashMap<String, Classification>,
) -> PortfolioSummary {
    let mut positions: Vec<EnrichedPosition> = holdings
        .iter()
        .map(|holding| value_holding(holding, quotes, classifications))
        .collect();

    let total_value: f64 = positions.iter().map(|p| p.market_value).sum();
    let total_cost: f64 = positions.iter().map(|p| p.cost_basis).sum();
    let total_day_change: f64 = positions.iter().map(|p| p.day_change).sum();
    let total_unrealized_pl = total_value - total_cost;

    for position in &mut positions {
        position.weight = percent_of(position.market_value, total_value);
    }

    let positions_in_profit = positions.iter().filter(|p| p.unrealized_pl > 0.0).count();
    let positions_in_loss = positions.iter().filter(|p| p.unrealized_pl < 0.0).count();

    let summary = PortfolioSummary {
        total_value: finite_or_zero(total_value),
        total_cost: finite_or_zero(total_cost),
        total_unrealized_pl: finite_or_zero(total_unrealized_pl),
        total_unrealized_pl_percent: percent_of(total_unrealized_pl, total_cost),
        total_day_change: finite_or_zero(total_day_change),
        total_day_change_percent: percent_of(total_day_change, total_value - total_day_change),
        positions_in_profit,
        positions_in_loss,
        positions,
    };

    tracing::debug!(
        positions = summary.positions.len(),
        total_value = summary.total_value,
        total_cost = summary.total_cost,
        "valued portfolio"
    );

    summary
}

/// First pass for a single holding. `weight` is left at zero.
fn value_holding(
    holding: &Position,
    quotes: &HashMap<String, Quote>,
    classifications: &HashMap<String, Classification>,
) -> EnrichedPosition {
    let symbol = holding.symbol.to_uppercase();
    let shares = finite_or_zero(holding.shares);
    let avg_cost = finite_or_zero(holding.avg_cost);

    let quote = lookup(quotes, &holding.symbol, &symbol)
        .filter(|q| q.price.is_finite() && q.price > 0.0);

    let (current_price, day_change, day_change_percent) = match quote {
        Some(q) => (
            q.price,
            finite_or_zero(shares * q.change),
            finite_or_zero(q.change_percent),
        ),
        None => {
            tracing::warn!(symbol = %symbol, "no usable quote, valuing at average cost");
            (avg_cost, 0.0, 0.0)
        }
    };

    let classification = lookup(classifications, &holding.symbol, &symbol);
    let company_name = classification
        .and_then(|c| c.name.clone())
        .or_else(|| holding.company_name.clone());
    let sector = classification
        .and_then(|c| c.sector.clone())
        .or_else(|| holding.sector.clone());

    let market_value = finite_or_zero(shares * current_price);
    let cost_basis = finite_or_zero(shares * avg_cost);
    let unrealized_pl = market_value - cost_basis;

    EnrichedPosition {
        symbol,
        shares,
        avg_cost,
        company_name,
        sector,
        current_price,
        market_value,
        cost_basis,
        unrealized_pl,
        unrealized_pl_percent: percent_of(unrealized_pl, cost_basis),
        day_change,
        day_change_percent,
        weight: 0.0,
    }
}

/// Map lookup by the symbol as given, then by its upper-case form.
fn lookup<'a, V>(map: &'a HashMap<String, V>, raw: &str, upper: &str) -> Option<&'a V> {
    map.get(raw).or_else(|| map.get(upper))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn quotes(entries: &[(&str, f64, f64, f64)]) -> HashMap<String, Quote> {
        entries
            .iter()
            .map(|&(s, p, c, cp)| (s.to_string(), Quote::new(p, c, cp)))
            .collect()
    }

    #[test]
    fn test_valuate_basic() {
        let holdings = vec![
            Position::new("AAPL", 10.0, 150.0),
            Position::new("GOOGL", 5.0, 100.0),
        ];
        let quotes = quotes(&[("AAPL", 175.0, 2.0, 1.16), ("GOOGL", 90.0, -1.0, -1.1)]);

        let summary = valuate(&holdings, &quotes, &HashMap::new());

        assert_eq!(summary.position_count(), 2);
        assert_abs_diff_eq!(summary.total_value, 2200.0); // 1750 + 450
        assert_abs_diff_eq!(summary.total_cost, 2000.0);
        assert_abs_diff_eq!(summary.total_unrealized_pl, 200.0);
        assert_abs_diff_eq!(summary.total_unrealized_pl_percent, 10.0);
        assert_abs_diff_eq!(summary.total_day_change, 15.0); // 20 - 5
        assert_eq!(summary.positions_in_profit, 1);
        assert_eq!(summary.positions_in_loss, 1);

        let aapl = &summary.positions[0];
        assert_abs_diff_eq!(aapl.market_value, 1750.0);
        assert_abs_diff_eq!(aapl.unrealized_pl, 250.0);
        assert_abs_diff_eq!(aapl.unrealized_pl_percent, 16.666666, epsilon = 1e-4);
        assert_abs_diff_eq!(aapl.weight, 1750.0 / 2200.0 * 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_weights_sum_to_hundred() {
        let holdings = vec![
            Position::new("A", 3.0, 10.0),
            Position::new("B", 7.0, 20.0),
            Position::new("C", 11.0, 5.0),
        ];
        let quotes = quotes(&[("A", 12.0, 0.0, 0.0), ("B", 19.0, 0.0, 0.0), ("C", 6.5, 0.0, 0.0)]);

        let summary = valuate(&holdings, &quotes, &HashMap::new());
        let total_weight: f64 = summary.positions.iter().map(|p| p.weight).sum();
        assert_abs_diff_eq!(total_weight, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_missing_quote_falls_back_to_cost() {
        let holdings = vec![
            Position::new("AAPL", 10.0, 100.0),
            Position::new("DELISTED", 10.0, 100.0),
        ];
        let quotes = quotes(&[("AAPL", 100.0, 1.0, 1.0)]);

        let summary = valuate(&holdings, &quotes, &HashMap::new());

        assert_eq!(summary.position_count(), 2);
        let delisted = &summary.positions[1];
        assert_eq!(delisted.current_price, 100.0);
        assert_eq!(delisted.unrealized_pl, 0.0);
        assert_eq!(delisted.day_change, 0.0);
        assert_abs_diff_eq!(delisted.weight, 50.0);
    }

    #[test]
    fn test_zero_price_quote_is_unusable() {
        let holdings = vec![Position::new("X", 2.0, 50.0)];
        let quotes = quotes(&[("X", 0.0, 0.0, 0.0)]);

        let summary = valuate(&holdings, &quotes, &HashMap::new());
        assert_eq!(summary.positions[0].current_price, 50.0);
        assert_abs_diff_eq!(summary.total_value, 100.0);
    }

    #[test]
    fn test_zero_total_gives_zero_weights() {
        let holdings = vec![Position::new("A", 0.0, 10.0), Position::new("B", 0.0, 10.0)];
        let summary = valuate(&holdings, &HashMap::new(), &HashMap::new());

        assert_eq!(summary.total_value, 0.0);
        assert!(summary.positions.iter().all(|p| p.weight == 0.0));
        assert_eq!(summary.total_unrealized_pl_percent, 0.0);
        assert_eq!(summary.total_day_change_percent, 0.0);
    }

    #[test]
    fn test_non_finite_inputs_never_leak() {
        let holdings = vec![Position::new("A", f64::NAN, 10.0), Position::new("B", 1.0, 10.0)];
        let quotes = quotes(&[("B", f64::INFINITY, 0.0, 0.0)]);

        let summary = valuate(&holdings, &quotes, &HashMap::new());
        for p in &summary.positions {
            for v in [p.market_value, p.cost_basis, p.unrealized_pl, p.weight, p.current_price] {
                assert!(v.is_finite());
            }
        }
        assert!(summary.total_value.is_finite());
    }

    #[test]
    fn test_classification_precedence() {
        let holdings = vec![
            Position::new("AAPL", 1.0, 100.0).with_sector("Tech").with_company_name("Apple"),
            Position::new("XOM", 1.0, 100.0).with_sector("Energy"),
        ];
        let mut classifications = HashMap::new();
        classifications.insert(
            "AAPL".to_string(),
            Classification {
                name: Some("Apple Inc.".to_string()),
                sector: Some("Technology".to_string()),
            },
        );

        let summary = valuate(&holdings, &HashMap::new(), &classifications);
        assert_eq!(summary.positions[0].sector.as_deref(), Some("Technology"));
        assert_eq!(summary.positions[0].company_name.as_deref(), Some("Apple Inc."));
        assert_eq!(summary.positions[1].sector.as_deref(), Some("Energy"));
    }

    #[test]
    fn test_lowercase_symbol_matches_quote() {
        let holdings = vec![Position {
            symbol: "msft".to_string(),
            shares: 2.0,
            avg_cost: 300.0,
            company_name: None,
            sector: None,
        }];
        let quotes = quotes(&[("MSFT", 310.0, 0.0, 0.0)]);

        let summary = valuate(&holdings, &quotes, &HashMap::new());
        assert_eq!(summary.positions[0].symbol, "MSFT");
        assert_eq!(summary.positions[0].current_price, 310.0);
    }

    #[test]
    fn test_day_change_percent() {
        // Previous close value 1000, today 1100
        let holdings = vec![Position::new("A", 10.0, 80.0)];
        let quotes = quotes(&[("A", 110.0, 10.0, 10.0)]);

        let summary = valuate(&holdings, &quotes, &HashMap::new());
        assert_abs_diff_eq!(summary.total_day_change, 100.0);
        assert_abs_diff_eq!(summary.total_day_change_percent, 10.0);
    }
}
