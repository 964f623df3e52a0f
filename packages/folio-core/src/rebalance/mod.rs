//! Rebalancing module.
//!
//! Five interchangeable target-allocation strategies feed one shared plan
//! builder. Drift detection decides whether a plan is worth building.

mod drift;
mod plan;
mod strategy;

pub use drift::{calculate_allocation_drift, needs_rebalancing};
pub use plan::{build_plan, plan_rebalance, plan_rebalance_with};
pub use strategy::{
    CustomTargets, EqualWeight, MarketCapWeight, RebalanceStrategy, RiskParity, SectorBalanced,
    StrategyParams, TargetAllocationStrategy, TargetAllocations,
};
