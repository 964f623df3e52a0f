//! Turns a target allocation into a rebalancing plan.

use crate::config::RebalanceSettings;
use crate::portfolio::{finite_or_zero, percent_of};
use crate::rebalance::strategy::{RebalanceStrategy, StrategyParams, TargetAllocations};
use crate::types::{EnrichedPosition, PlanSummary, RebalancingAction, RebalancingPlan, TradeAction};
use crate::Result;

/// Build a rebalancing plan with default settings.
///
/// See [`plan_rebalance_with`].
pub fn plan_rebalance(
    strategy: RebalanceStrategy,
    positions: &[EnrichedPosition],
    total_value: f64,
    params: &StrategyParams,
) -> Result<RebalancingPlan> {
    plan_rebalance_with(
        &RebalanceSettings::default(),
        strategy,
        positions,
        total_value,
        params,
    )
}

/// Build a rebalancing plan for `strategy`.
///
/// Errors only on caller mistakes: custom targets for symbols that are not
/// held, negative custom targets, or an out-of-range sector cap.
pub fn plan_rebalance_with(
    settings: &RebalanceSettings,
    strategy: RebalanceStrategy,
    positions: &[EnrichedPosition],
    total_value: f64,
    params: &StrategyParams,
) -> Result<RebalancingPlan> {
    let allocator = strategy.allocator(settings);
    let targets = allocator.target_allocations(positions, params)?;
    Ok(build_plan(
        allocator.name(),
        positions,
        total_value,
        &targets,
        settings.materiality_percent,
    ))
}

/// Diff every holding against its target and summarise the trades.
///
/// A holding whose gap to target is smaller than `materiality_percent` of
/// `total_value` is held. Actions are sorted by absolute value difference,
/// largest first; ties keep input order.
pub fn build_plan(
    strategy_name: &str,
    positions: &[EnrichedPosition],
    total_value: f64,
    targets: &TargetAllocations,
    materiality_percent: f64,
) -> RebalancingPlan {
    let total_value = finite_or_zero(total_value).max(0.0);
    let materiality_value = total_value * materiality_percent.max(0.0) / 100.0;

    let mut gross_sells = 0.0;
    let mut realized_estimate = 0.0;

    let mut actions: Vec<RebalancingAction> = positions
        .iter()
        .map(|position| {
            let current_value = position.market_value;
            let target_percent =
                finite_or_zero(targets.get(&position.symbol).copied().unwrap_or(0.0));
            let target_value = target_percent / 100.0 * total_value;
            let value_difference = target_value - current_value;
            let action = classify(value_difference, materiality_value);

            if action == TradeAction::Sell {
                let sold = value_difference.abs();
                gross_sells += sold;
                let fraction = if current_value > 0.0 {
                    (sold / current_value).min(1.0)
                } else {
                    0.0
                };
                realized_estimate += fraction * position.unrealized_pl;
            }

            RebalancingAction {
                symbol: position.symbol.clone(),
                current_value,
                target_value,
                value_difference,
                current_percent: percent_of(current_value, total_value),
                target_percent,
                action,
            }
        })
        .collect();

    actions.sort_by(|a, b| {
        b.value_difference
            .abs()
            .total_cmp(&a.value_difference.abs())
    });

    let summary = summarize(&actions);
    let tax_implications = (summary.sell_orders > 0)
        .then(|| tax_note(summary.sell_orders, gross_sells, realized_estimate));
    let risk_reduction = risk_reduction(&actions);

    tracing::debug!(
        strategy = strategy_name,
        total_value,
        buys = summary.buy_orders,
        sells = summary.sell_orders,
        holds = summary.hold_positions,
        risk_reduction,
        "built rebalancing plan"
    );

    RebalancingPlan {
        strategy: strategy_name.to_string(),
        total_value,
        actions,
        summary,
        tax_implications,
        risk_reduction,
    }
}

fn classify(value_difference: f64, materiality_value: f64) -> TradeAction {
    let gap = value_difference.abs();
    if gap == 0.0 || gap < materiality_value {
        TradeAction::Hold
    } else if value_difference > 0.0 {
        TradeAction::Buy
    } else {
        TradeAction::Sell
    }
}

fn summarize(actions: &[RebalancingAction]) -> PlanSummary {
    let count = |kind: TradeAction| actions.iter().filter(|a| a.action == kind).count();
    let buy_orders = count(TradeAction::Buy);
    let sell_orders = count(TradeAction::Sell);
    PlanSummary {
        buy_orders,
        sell_orders,
        hold_positions: count(TradeAction::Hold),
        total_trades: buy_orders + sell_orders,
    }
}

fn tax_note(sell_orders: usize, gross_sells: f64, realized_estimate: f64) -> String {
    let direction = if realized_estimate >= 0.0 { "gain" } else { "loss" };
    format!(
        "{sell_orders} sell order(s) totaling ${gross_sells:.2} may realize taxable capital gains or losses \
         (estimated net {direction} ${:.2}). Review holding periods and tax lots before executing.",
        realized_estimate.abs()
    )
}

/// Percentage-point reduction of the largest over-allocation.
///
/// Over-allocation is `current% - target%`. Holdings with a buy or sell
/// action are assumed to reach their target; held ones keep their gap.
fn risk_reduction(actions: &[RebalancingAction]) -> f64 {
    let over_allocation = |a: &RebalancingAction| a.current_percent - a.target_percent;

    let before = actions.iter().map(over_allocation).fold(0.0, f64::max);
    let after = actions
        .iter()
        .filter(|a| a.action == TradeAction::Hold)
        .map(over_allocation)
        .fold(0.0, f64::max);

    finite_or_zero(before - after).max(0.0)
}
