//! Per-strategy risk state: adaptive cooldown and losing-streak pauses.
//!
//! The lifecycle feeds every closed trade into [`EngineState`]; the state
//! answers one question per cycle — may we look for an entry right now —
//! and adapts the answer to recent volatility and recent outcomes.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::domain::ExitReason;

const RECENT_EXITS_CAP: usize = 5;
const RECENT_PNL_CAP: usize = 10;

/// Knobs for [`EngineState`]. Defaults fit a fast Renko strategy; slower
/// strategies override the cooldown and pause settings in config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Baseline seconds between an exit and the next entry attempt.
    pub base_cooldown_secs: f64,
    pub max_cooldown_secs: f64,
    /// Consecutive losers that trigger a trading pause.
    pub max_losing_streak: u32,
    pub pause_secs: f64,
    /// Volatility above this (bps) stretches the cooldown.
    pub high_volatility_bps: f64,
    /// Volatility below this (bps) shortens it.
    pub low_volatility_bps: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            base_cooldown_secs: 10.0,
            max_cooldown_secs: 60.0,
            max_losing_streak: 5,
            pause_secs: 180.0,
            high_volatility_bps: 8.0,
            low_volatility_bps: 2.0,
        }
    }
}

/// Mutable risk state for one strategy instance.
#[derive(Debug, Clone)]
pub struct EngineState {
    cfg: RiskConfig,
    cooldown_secs: f64,
    last_exit_time: Option<f64>,
    pause_until: Option<f64>,
    losing_streak: u32,
    recent_exit_reasons: VecDeque<ExitReason>,
    recent_pnl: VecDeque<f64>,
}

impl EngineState {
    pub fn new(cfg: RiskConfig) -> Self {
        let cooldown_secs = cfg.base_cooldown_secs;
        Self {
            cfg,
            cooldown_secs,
            last_exit_time: None,
            pause_until: None,
            losing_streak: 0,
            recent_exit_reasons: VecDeque::with_capacity(RECENT_EXITS_CAP),
            recent_pnl: VecDeque::with_capacity(RECENT_PNL_CAP),
        }
    }

    /// Record a closed trade. A losing streak reaching the limit starts a
    /// pause and resets the streak.
    pub fn record_exit(&mut self, reason: ExitReason, pnl_pct: f64, now: f64) {
        self.last_exit_time = Some(now);

        if self.recent_exit_reasons.len() == RECENT_EXITS_CAP {
            self.recent_exit_reasons.pop_front();
        }
        self.recent_exit_reasons.push_back(reason);

        if self.recent_pnl.len() == RECENT_PNL_CAP {
            self.recent_pnl.pop_front();
        }
        self.recent_pnl.push_back(pnl_pct);

        if pnl_pct < 0.0 {
            self.losing_streak += 1;
            if self.losing_streak >= self.cfg.max_losing_streak {
                self.pause_until = Some(now + self.cfg.pause_secs);
                self.losing_streak = 0;
            }
        } else {
            self.losing_streak = 0;
        }
    }

    /// Whether an entry may be attempted at `now`. Checks the pause first,
    /// then the cooldown since the last exit.
    pub fn can_enter(&mut self, now: f64) -> bool {
        if let Some(until) = self.pause_until {
            if now < until {
                return false;
            }
            self.pause_until = None;
        }
        match self.last_exit_time {
            Some(last) if now - last < self.cooldown_secs => false,
            _ => true,
        }
    }

    /// Recompute the cooldown from current volatility and recent outcomes.
    pub fn update_cooldown(&mut self, volatility_bps: f64) {
        let mut cooldown = self.cfg.base_cooldown_secs;
        if volatility_bps > self.cfg.high_volatility_bps {
            cooldown *= 1.5;
        } else if volatility_bps < self.cfg.low_volatility_bps {
            cooldown *= 0.8;
        }
        if self.recent_stop_losses() >= 2 {
            cooldown *= 1.3;
        }
        if self.losing_streak >= 2 {
            cooldown *= 1.2;
        }
        self.cooldown_secs = cooldown.min(self.cfg.max_cooldown_secs);
    }

    pub fn recent_stop_losses(&self) -> usize {
        self.recent_exit_reasons
            .iter()
            .filter(|reason| reason.is_stop_loss())
            .count()
    }

    pub fn cooldown_secs(&self) -> f64 {
        self.cooldown_secs
    }

    pub fn losing_streak(&self) -> u32 {
        self.losing_streak
    }

    pub fn is_paused(&self, now: f64) -> bool {
        self.pause_until.is_some_and(|until| now < until)
    }

    pub fn recent_pnl(&self) -> impl Iterator<Item = f64> + '_ {
        self.recent_pnl.iter().copied()
    }
}
