//! Position — the single open position a strategy instance may hold.
//!
//! Owned exclusively by the position lifecycle; mutated only by the entry,
//! scale-in, mark, and exit transitions. `entry_price` is the size-weighted
//! average across the original fill and every scale-in.

use serde::{Deserialize, Serialize};

use super::signal::{Side, Signal};

/// One scale-in fill layered onto an open position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaledEntry {
    pub price: f64,
    pub size: f64,
    /// Unix timestamp (seconds) of the scale fill.
    pub time: f64,
    /// Client order index of the scale order, for later cancellation.
    pub order_index: u64,
}

/// An open position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub side: Side,
    /// Size-weighted average entry across all fills.
    pub entry_price: f64,
    /// Total size across all fills.
    pub size: f64,
    /// Size of the original fill, before any scaling.
    pub initial_size: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    /// Unix timestamp (seconds) of the original entry.
    pub entry_time: f64,
    pub scaled_entries: Vec<ScaledEntry>,
    /// Client order index of the entry order (0 in dry-run).
    pub order_index: u64,
    /// The broken level this position entered on (breakout entries only).
    #[serde(default)]
    pub breakout_level: Option<f64>,
    /// ATR at entry, anchor for trailing-stop distances.
    #[serde(default)]
    pub entry_atr: Option<f64>,
    /// Whether the trailing stop has activated.
    #[serde(default)]
    pub trailing_active: bool,
    /// Maximum favorable excursion, signed bps of average entry.
    #[serde(default)]
    pub mfe_bps: f64,
    /// Maximum adverse excursion, signed bps of average entry (<= 0).
    #[serde(default)]
    pub mae_bps: f64,
    /// True when this position was resumed from a saved snapshot.
    #[serde(default)]
    pub recovered: bool,
}

impl Position {
    /// Open a position from a filled entry signal.
    pub fn open(signal: &Signal, order_index: u64, entry_time: f64) -> Self {
        Self {
            side: signal.side,
            entry_price: signal.entry_price,
            size: signal.size,
            initial_size: signal.size,
            stop_loss: signal.stop_loss,
            take_profit: signal.take_profit,
            entry_time,
            scaled_entries: Vec::new(),
            order_index,
            breakout_level: signal.breakout_level,
            entry_atr: None,
            trailing_active: false,
            mfe_bps: 0.0,
            mae_bps: 0.0,
            recovered: false,
        }
    }

    /// Signed unrealized PnL percent at `price`, relative to average entry.
    pub fn pnl_pct(&self, price: f64) -> f64 {
        self.side.sign() * (price - self.entry_price) / self.entry_price * 100.0
    }

    /// Signed excursion at `price` in bps of average entry (positive =
    /// favorable).
    pub fn excursion_bps(&self, price: f64) -> f64 {
        self.side.sign() * (price - self.entry_price) / self.entry_price * 10_000.0
    }

    /// Update MFE/MAE high-water marks from the current price.
    pub fn mark(&mut self, price: f64) {
        let excursion = self.excursion_bps(price);
        self.mfe_bps = self.mfe_bps.max(excursion);
        self.mae_bps = self.mae_bps.min(excursion);
    }

    /// Fold a scale-in fill into the position: total size grows and
    /// `entry_price` becomes the size-weighted mean of all fills.
    ///
    /// Does not touch the stop — re-anchoring the stop around the new
    /// average is the caller's decision.
    pub fn apply_scale(&mut self, price: f64, size: f64, time: f64, order_index: u64) {
        let total = self.size + size;
        self.entry_price = (self.entry_price * self.size + price * size) / total;
        self.size = total;
        self.scaled_entries.push(ScaledEntry {
            price,
            size,
            time,
            order_index,
        });
    }

    pub fn scale_count(&self) -> usize {
        self.scaled_entries.len()
    }

    /// Timestamp of the most recent fill (entry or last scale).
    pub fn last_fill_time(&self) -> f64 {
        self.scaled_entries
            .last()
            .map(|entry| entry.time)
            .unwrap_or(self.entry_time)
    }

    pub fn held_secs(&self, now: f64) -> f64 {
        now - self.entry_time
    }
}
