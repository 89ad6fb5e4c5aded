//! Signals and exit reasons — the engine's decision vocabulary.
//!
//! A `Signal` is ephemeral: it is consumed by the position lifecycle the same
//! cycle it is produced and never persisted. `ExitReason` is the opposite —
//! it outlives the position on the trade record.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// +1 for long, -1 for short. Used to sign PnL and excursion math.
    pub fn sign(self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Long => "long",
            Side::Short => "short",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entry decision produced by a signal policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub side: Side,
    /// Conviction in [0, 1].
    pub strength: f64,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub size: f64,
    /// Human-readable trigger description for logs.
    pub reason: String,
    /// The broken level, when the entry is a breakout.
    pub breakout_level: Option<f64>,
}

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    TimeStop,
    TrendReversal,
    AoReversal,
    TrailingStop,
    BreakoutFailure,
    NoMovement,
    Shutdown,
}

impl ExitReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ExitReason::StopLoss => "stop_loss",
            ExitReason::TakeProfit => "take_profit",
            ExitReason::TimeStop => "time_stop",
            ExitReason::TrendReversal => "trend_reversal",
            ExitReason::AoReversal => "ao_reversal",
            ExitReason::TrailingStop => "trailing_stop",
            ExitReason::BreakoutFailure => "breakout_failure",
            ExitReason::NoMovement => "no_movement",
            ExitReason::Shutdown => "shutdown",
        }
    }

    /// Stop-loss exits feed the adaptive cooldown's re-entry guard.
    pub fn is_stop_loss(self) -> bool {
        matches!(self, ExitReason::StopLoss)
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
