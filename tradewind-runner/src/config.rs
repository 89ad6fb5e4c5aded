//! Typed application configuration.
//!
//! Every field has a default; unknown keys in the TOML are ignored, so
//! configs written for newer builds keep loading on older ones.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use tradewind_core::policy::{BreakoutConfig, RenkoAoConfig, TrendConfig};
use tradewind_core::risk::RiskConfig;

use crate::lifecycle::LifecycleConfig;

/// One strategy's section: toggle, cadence, risk knobs, policy knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategySection<P> {
    pub enabled: bool,
    pub poll_interval_secs: f64,
    pub error_delay_secs: f64,
    pub risk: RiskConfig,
    pub policy: P,
}

fn section<P: Default>(
    enabled: bool,
    poll_interval_secs: f64,
    error_delay_secs: f64,
    risk: RiskConfig,
) -> StrategySection<P> {
    StrategySection {
        enabled,
        poll_interval_secs,
        error_delay_secs,
        risk,
        policy: P::default(),
    }
}

impl Default for StrategySection<TrendConfig> {
    fn default() -> Self {
        section(
            false,
            5.0,
            10.0,
            RiskConfig {
                base_cooldown_secs: 20.0,
                max_losing_streak: 3,
                pause_secs: 300.0,
                ..RiskConfig::default()
            },
        )
    }
}

impl Default for StrategySection<RenkoAoConfig> {
    fn default() -> Self {
        section(
            true,
            1.0,
            5.0,
            RiskConfig {
                base_cooldown_secs: 10.0,
                max_losing_streak: 5,
                pause_secs: 180.0,
                ..RiskConfig::default()
            },
        )
    }
}

impl Default for StrategySection<BreakoutConfig> {
    fn default() -> Self {
        section(
            false,
            5.0,
            10.0,
            RiskConfig {
                base_cooldown_secs: 20.0,
                max_losing_streak: 2,
                pause_secs: 300.0,
                ..RiskConfig::default()
            },
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub market: String,
    /// Simulate fills instead of routing orders.
    pub dry_run: bool,
    pub order_timeout_secs: f64,
    /// Window caps for candle/brick series.
    pub series_cap: usize,
    pub trend: StrategySection<TrendConfig>,
    pub renko: StrategySection<RenkoAoConfig>,
    pub breakout: StrategySection<BreakoutConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            market: "market:2".to_string(),
            dry_run: true,
            order_timeout_secs: 30.0,
            series_cap: 100,
            trend: StrategySection::default(),
            renko: StrategySection::default(),
            breakout: StrategySection::default(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Lifecycle knobs shared by every strategy, with the policy-specific
    /// size floor supplied by the caller.
    pub fn lifecycle(&self, min_position_size: f64) -> LifecycleConfig {
        LifecycleConfig {
            dry_run: self.dry_run,
            min_position_size,
            order_timeout_secs: self.order_timeout_secs,
            ..LifecycleConfig::default()
        }
    }

    /// Short stable identifier for this exact configuration; interleaved
    /// logs from different runs stay attributable.
    pub fn run_id(&self) -> String {
        let serialized = toml::to_string(self).unwrap_or_default();
        let hash = blake3::hash(serialized.as_bytes());
        hash.to_hex()[..8].to_string()
    }
}
