//! Target allocation strategies.
//!
//! Each strategy maps the current holdings (plus caller-supplied parameters)
//! to a target percentage per symbol. The plan builder in
//! [`plan`](super::plan) turns those targets into trade actions.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::RebalanceSettings;
use crate::types::EnrichedPosition;
use crate::{Error, Result};

/// Target percentage (0-100) per symbol.
pub type TargetAllocations = BTreeMap<String, f64>;

/// Custom targets may miss 100 by this much before a warning is logged.
const CUSTOM_TARGET_SUM_TOLERANCE: f64 = 0.01;

const EPSILON: f64 = 1e-12;

/// Computes a target allocation for a set of holdings.
///
/// Holdings are expected to carry unique symbols.
pub trait TargetAllocationStrategy {
    /// Human-readable strategy name.
    fn name(&self) -> &'static str;

    /// Target percentage per held symbol.
    fn target_allocations(
        &self,
        positions: &[EnrichedPosition],
        params: &StrategyParams,
    ) -> Result<TargetAllocations>;
}

/// Caller-supplied inputs for the parameterised strategies.
///
/// Keys are symbols; lookups fall back to the upper-case symbol.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StrategyParams {
    /// Market capitalisation per symbol (Market-Cap Weight)
    pub market_caps: BTreeMap<String, f64>,
    /// Volatility per symbol, any consistent unit (Risk Parity)
    pub volatilities: BTreeMap<String, f64>,
    /// Target percentage per symbol (Custom Targets)
    pub custom_targets: BTreeMap<String, f64>,
    /// Overrides the configured sector cap (Sector Balanced)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector_cap_percent: Option<f64>,
}

impl StrategyParams {
    pub fn with_market_caps(mut self, caps: &[(&str, f64)]) -> Self {
        self.market_caps = to_map(caps);
        self
    }

    pub fn with_volatilities(mut self, volatilities: &[(&str, f64)]) -> Self {
        self.volatilities = to_map(volatilities);
        self
    }

    pub fn with_custom_targets(mut self, targets: &[(&str, f64)]) -> Self {
        self.custom_targets = to_map(targets);
        self
    }

    pub fn with_sector_cap(mut self, cap_percent: f64) -> Self {
        self.sector_cap_percent = Some(cap_percent);
        self
    }
}

fn to_map(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
    entries.iter().map(|&(s, v)| (s.to_string(), v)).collect()
}

fn param_for(map: &BTreeMap<String, f64>, symbol: &str) -> Option<f64> {
    map.get(symbol)
        .or_else(|| map.get(&symbol.to_uppercase()))
        .copied()
}

/// Positive, finite value or `None`.
fn usable(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

/// The built-in strategies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RebalanceStrategy {
    EqualWeight,
    MarketCapWeight,
    SectorBalanced,
    RiskParity,
    CustomTargets,
}

impl RebalanceStrategy {
    pub const ALL: [RebalanceStrategy; 5] = [
        RebalanceStrategy::EqualWeight,
        RebalanceStrategy::MarketCapWeight,
        RebalanceStrategy::SectorBalanced,
        RebalanceStrategy::RiskParity,
        RebalanceStrategy::CustomTargets,
    ];

    /// Identifier accepted by [`FromStr`].
    pub fn id(&self) -> &'static str {
        match self {
            RebalanceStrategy::EqualWeight => "equal_weight",
            RebalanceStrategy::MarketCapWeight => "market_cap_weight",
            RebalanceStrategy::SectorBalanced => "sector_balanced",
            RebalanceStrategy::RiskParity => "risk_parity",
            RebalanceStrategy::CustomTargets => "custom_targets",
        }
    }

    /// Build the allocator for this strategy.
    pub fn allocator(&self, settings: &RebalanceSettings) -> Box<dyn TargetAllocationStrategy> {
        match self {
            RebalanceStrategy::EqualWeight => Box::new(EqualWeight),
            RebalanceStrategy::MarketCapWeight => Box::new(MarketCapWeight),
            RebalanceStrategy::SectorBalanced => Box::new(SectorBalanced {
                cap_percent: settings.sector_cap_percent,
            }),
            RebalanceStrategy::RiskParity => Box::new(RiskParity),
            RebalanceStrategy::CustomTargets => Box::new(CustomTargets),
        }
    }
}

impl fmt::Display for RebalanceStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for RebalanceStrategy {
    type Err = Error;

    /// Case-insensitive; `_`, `-` and spaces are interchangeable.
    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                c => c.to_ascii_lowercase(),
            })
            .collect();

        match normalized.as_str() {
            "equal_weight" | "equal" => Ok(RebalanceStrategy::EqualWeight),
            "market_cap_weight" | "market_cap" => Ok(RebalanceStrategy::MarketCapWeight),
            "sector_balanced" => Ok(RebalanceStrategy::SectorBalanced),
            "risk_parity" => Ok(RebalanceStrategy::RiskParity),
            "custom_targets" | "custom" => Ok(RebalanceStrategy::CustomTargets),
            _ => Err(Error::UnknownStrategy(s.to_string())),
        }
    }
}

/// `100 / N` for every holding.
#[derive(Debug, Clone, Copy, Default)]
pub struct EqualWeight;

impl TargetAllocationStrategy for EqualWeight {
    fn name(&self) -> &'static str {
        "Equal Weight"
    }

    fn target_allocations(
        &self,
        positions: &[EnrichedPosition],
        _params: &StrategyParams,
    ) -> Result<TargetAllocations> {
        Ok(equal_weights(positions))
    }
}

fn equal_weights(positions: &[EnrichedPosition]) -> TargetAllocations {
    if positions.is_empty() {
        return TargetAllocations::new();
    }
    let each = 100.0 / positions.len() as f64;
    positions.iter().map(|p| (p.symbol.clone(), each)).collect()
}

/// Targets proportional to a per-holding score.
///
/// Holdings without a usable score get 0. When no holding has one, the
/// strategy degrades to equal weight.
fn proportional(
    strategy: &str,
    positions: &[EnrichedPosition],
    scores: &[Option<f64>],
) -> TargetAllocations {
    let total: f64 = scores.iter().flatten().sum();
    if !(total.is_finite() && total > 0.0) {
        if !positions.is_empty() {
            tracing::warn!(strategy, "no usable inputs for any holding, using equal weight");
        }
        return equal_weights(positions);
    }

    positions
        .iter()
        .zip(scores)
        .map(|(p, score)| (p.symbol.clone(), score.unwrap_or(0.0) / total * 100.0))
        .collect()
}

/// `marketCap / sum(marketCap)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarketCapWeight;

impl TargetAllocationStrategy for MarketCapWeight {
    fn name(&self) -> &'static str {
        "Market-Cap Weight"
    }

    fn target_allocations(
        &self,
        positions: &[EnrichedPosition],
        params: &StrategyParams,
    ) -> Result<TargetAllocations> {
        let caps: Vec<Option<f64>> = positions
            .iter()
            .map(|p| usable(param_for(&params.market_caps, &p.symbol)))
            .collect();
        Ok(proportional(self.name(), positions, &caps))
    }
}

/// Inverse volatility, normalised to 100%.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskParity;

impl TargetAllocationStrategy for RiskParity {
    fn name(&self) -> &'static str {
        "Risk Parity"
    }

    fn target_allocations(
        &self,
        positions: &[EnrichedPosition],
        params: &StrategyParams,
    ) -> Result<TargetAllocations> {
        let inverse_vols: Vec<Option<f64>> = positions
            .iter()
            .map(|p| usable(param_for(&params.volatilities, &p.symbol)).map(|v| 1.0 / v))
            .collect();
        Ok(proportional(self.name(), positions, &inverse_vols))
    }
}

/// Caller-supplied targets; holdings without one target 0%.
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomTargets;

impl TargetAllocationStrategy for CustomTargets {
    fn name(&self) -> &'static str {
        "Custom Targets"
    }

    fn target_allocations(
        &self,
        positions: &[EnrichedPosition],
        params: &StrategyParams,
    ) -> Result<TargetAllocations> {
        let held: BTreeSet<String> = positions.iter().map(|p| p.symbol.to_uppercase()).collect();

        let mut seen: BTreeMap<String, &str> = BTreeMap::new();
        for (symbol, &value) in &params.custom_targets {
            let normalized = symbol.to_uppercase();
            if !held.contains(&normalized) {
                return Err(Error::UnknownSymbol(symbol.clone()));
            }
            if let Some(previous) = seen.insert(normalized, symbol) {
                return Err(Error::InvalidParameter(format!(
                    "custom targets repeat a symbol as {previous} and {symbol}"
                )));
            }
            if !(value.is_finite() && value >= 0.0) {
                return Err(Error::InvalidTarget {
                    symbol: symbol.clone(),
                    value,
                });
            }
        }

        let targets: TargetAllocations = positions
            .iter()
            .map(|p| {
                let target = param_for(&params.custom_targets, &p.symbol).unwrap_or(0.0);
                (p.symbol.clone(), target)
            })
            .collect();

        let sum: f64 = targets.values().sum();
        if !positions.is_empty() && (sum - 100.0).abs() > CUSTOM_TARGET_SUM_TOLERANCE {
            tracing::warn!(sum, "custom targets do not sum to 100%");
        }

        Ok(targets)
    }
}

/// Caps each sector's aggregate target, keeping relative weights within a sector.
///
/// Starts from current weights (equal weights when the portfolio has no
/// value). Sectors above the cap are pinned to it and the excess flows to the
/// remaining sectors in proportion to their weight, repeating until no sector
/// exceeds the cap. With `K` sectors the cap is raised to `100 / K` when it
/// could not otherwise be met.
#[derive(Debug, Clone, Copy)]
pub struct SectorBalanced {
    pub cap_percent: f64,
}

impl Default for SectorBalanced {
    fn default() -> Self {
        Self {
            cap_percent: crate::config::DEFAULT_SECTOR_CAP_PERCENT,
        }
    }
}

impl TargetAllocationStrategy for SectorBalanced {
    fn name(&self) -> &'static str {
        "Sector Balanced"
    }

    fn target_allocations(
        &self,
        positions: &[EnrichedPosition],
        params: &StrategyParams,
    ) -> Result<TargetAllocations> {
        let cap_percent = params.sector_cap_percent.unwrap_or(self.cap_percent);
        if !(cap_percent > 0.0 && cap_percent <= 100.0) {
            return Err(Error::InvalidParameter(format!(
                "sector cap must be in (0, 100], got {cap_percent}"
            )));
        }
        if positions.is_empty() {
            return Ok(TargetAllocations::new());
        }

        let values: Vec<f64> = positions
            .iter()
            .map(|p| if p.market_value > 0.0 { p.market_value } else { 0.0 })
            .collect();
        let total: f64 = values.iter().sum();
        let base: Vec<f64> = if total > 0.0 {
            values.iter().map(|v| v / total).collect()
        } else {
            vec![1.0 / positions.len() as f64; positions.len()]
        };

        // sector -> (base weight, member indices)
        let mut sectors: BTreeMap<&str, (f64, Vec<usize>)> = BTreeMap::new();
        for (i, position) in positions.iter().enumerate() {
            let entry = sectors.entry(position.sector_or_unknown()).or_default();
            entry.0 += base[i];
            entry.1.push(i);
        }

        let cap = (cap_percent / 100.0).max(1.0 / sectors.len() as f64);
        let original: BTreeMap<&str, f64> = sectors.iter().map(|(s, (w, _))| (*s, *w)).collect();
        let sector_targets = cap_sectors(&original, cap);

        let mut targets = TargetAllocations::new();
        for (sector, (sector_base, members)) in &sectors {
            let sector_target = sector_targets.get(sector).copied().unwrap_or(0.0);
            for &i in members {
                let share = if *sector_base > 0.0 {
                    base[i] / sector_base
                } else {
                    1.0 / members.len() as f64
                };
                targets.insert(positions[i].symbol.clone(), sector_target * share * 100.0);
            }
        }
        Ok(targets)
    }
}

/// Water-fill sector fractions so none exceeds `cap`.
fn cap_sectors<'a>(original: &BTreeMap<&'a str, f64>, cap: f64) -> BTreeMap<&'a str, f64> {
    let mut targets = original.clone();
    let mut capped: BTreeSet<&str> = BTreeSet::new();

    loop {
        let over: Vec<&str> = targets
            .iter()
            .filter(|(s, w)| !capped.contains(*s) && **w > cap + EPSILON)
            .map(|(s, _)| *s)
            .collect();
        if over.is_empty() {
            break;
        }
        capped.extend(over);

        let remaining = (1.0 - cap * capped.len() as f64).max(0.0);
        let uncapped: Vec<&str> = original
            .keys()
            .copied()
            .filter(|s| !capped.contains(s))
            .collect();
        let uncapped_sum: f64 = uncapped.iter().map(|s| original[s]).sum();

        for (sector, target) in targets.iter_mut() {
            *target = if capped.contains(sector) {
                cap
            } else if uncapped_sum > 0.0 {
                original[sector] / uncapped_sum * remaining
            } else {
                remaining / uncapped.len() as f64
            };
        }
    }

    targets
}
