//! Tunable analytics settings loaded from TOML.
//!
//! The engine never reads configuration on its own. Callers load an
//! [`AnalyticsConfig`] once and pass the relevant section into the `_with`
//! variants of the analytics functions.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Trading days used to annualise daily statistics.
pub const DEFAULT_TRADING_DAYS_PER_YEAR: u32 = 252;
/// z-score of the one-sided 95% normal quantile.
pub const DEFAULT_VAR_Z_SCORE: f64 = 1.645;
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.0;
/// Gaps smaller than this many percentage points of total value are held.
pub const DEFAULT_MATERIALITY_PERCENT: f64 = 0.25;
/// Maximum aggregate target of one sector under Sector Balanced.
pub const DEFAULT_SECTOR_CAP_PERCENT: f64 = 25.0;
pub const DEFAULT_DRIFT_THRESHOLD_PERCENT: f64 = 5.0;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub risk: RiskSettings,
    pub rebalance: RebalanceSettings,
}

/// Parameters of the risk metrics calculator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RiskSettings {
    pub trading_days_per_year: u32,
    pub var_z_score: f64,
    /// Annual risk-free rate as a fraction (0.04 = 4%)
    pub risk_free_rate: f64,
}

impl Default for RiskSettings {
    fn default() -> Self {
        Self {
            trading_days_per_year: DEFAULT_TRADING_DAYS_PER_YEAR,
            var_z_score: DEFAULT_VAR_Z_SCORE,
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
        }
    }
}

/// Parameters of the rebalancing planner and drift detector.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RebalanceSettings {
    pub materiality_percent: f64,
    pub sector_cap_percent: f64,
    pub drift_threshold_percent: f64,
}

impl Default for RebalanceSettings {
    fn default() -> Self {
        Self {
            materiality_percent: DEFAULT_MATERIALITY_PERCENT,
            sector_cap_percent: DEFAULT_SECTOR_CAP_PERCENT,
            drift_threshold_percent: DEFAULT_DRIFT_THRESHOLD_PERCENT,
        }
    }
}

impl AnalyticsConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load from [`default_path`](Self::default_path), falling back to defaults
    /// when the file does not exist.
    pub fn load_or_default() -> Result<Self> {
        let path = Self::default_path();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no analytics config, using defaults");
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    /// Get the default config file path.
    ///
    /// Default path: `<config dir>/folio/analytics.toml`
    /// Can be overridden with `FOLIO_CONFIG_FILE` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("FOLIO_CONFIG_FILE") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.config_dir().join("folio/analytics.toml"))
            .unwrap_or_else(|| PathBuf::from("analytics.toml"))
    }

    /// Check every setting is inside its meaningful range.
    pub fn validate(&self) -> Result<()> {
        let risk = &self.risk;
        if risk.trading_days_per_year == 0 {
            return Err(Error::InvalidConfig(
                "risk.trading_days_per_year must be positive".to_string(),
            ));
        }
        if !(risk.var_z_score.is_finite() && risk.var_z_score > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "risk.var_z_score must be positive, got {}",
                risk.var_z_score
            )));
        }
        if !risk.risk_free_rate.is_finite() {
            return Err(Error::InvalidConfig(
                "risk.risk_free_rate must be finite".to_string(),
            ));
        }

        let rebalance = &self.rebalance;
        if !(rebalance.materiality_percent.is_finite() && rebalance.materiality_percent >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "rebalance.materiality_percent must be non-negative, got {}",
                rebalance.materiality_percent
            )));
        }
        if !(rebalance.sector_cap_percent > 0.0 && rebalance.sector_cap_percent <= 100.0) {
            return Err(Error::InvalidConfig(format!(
                "rebalance.sector_cap_percent must be in (0, 100], got {}",
                rebalance.sector_cap_percent
            )));
        }
        if !(rebalance.drift_threshold_percent.is_finite()
            && rebalance.drift_threshold_percent >= 0.0)
        {
            return Err(Error::InvalidConfig(format!(
                "rebalance.drift_threshold_percent must be non-negative, got {}",
                rebalance.drift_threshold_percent
            )));
        }
        Ok(())
    }
}
