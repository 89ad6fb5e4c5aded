//! Trade record — the immutable artifact of a fully closed position.
//!
//! Created exactly once, at the moment a position closes, then handed to the
//! persistence collaborator. Never mutated afterwards.

use serde::{Deserialize, Serialize};

use super::position::Position;
use super::signal::{ExitReason, Side};

/// A completed round-trip trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub strategy: String,
    pub market: String,
    pub side: Side,

    // ── Entry ──
    /// Size-weighted average entry across all fills.
    pub entry_price: f64,
    pub entry_time: f64,

    // ── Exit ──
    pub exit_price: f64,
    pub exit_time: f64,
    pub exit_reason: ExitReason,

    // ── Result ──
    pub size: f64,
    /// Signed realized PnL percent: (exit - entry) / entry * 100, by side.
    pub pnl_pct: f64,
    /// Approximate quote-currency PnL: pnl_pct/100 * exit_price * size.
    pub pnl_usd: f64,
    /// Maximum favorable excursion observed, bps of entry.
    pub mfe_bps: f64,
    /// Maximum adverse excursion observed, bps of entry (<= 0).
    pub mae_bps: f64,
    pub scale_count: usize,
    /// Whether the position had been recovered from a saved snapshot.
    pub recovered: bool,
}

impl TradeRecord {
    /// Build the record for a position closing at `exit_price`.
    pub fn from_close(
        strategy: &str,
        market: &str,
        position: &Position,
        exit_price: f64,
        exit_time: f64,
        exit_reason: ExitReason,
    ) -> Self {
        let pnl_pct = position.pnl_pct(exit_price);
        Self {
            strategy: strategy.to_string(),
            market: market.to_string(),
            side: position.side,
            entry_price: position.entry_price,
            entry_time: position.entry_time,
            exit_price,
            exit_time,
            exit_reason,
            size: position.size,
            pnl_pct,
            pnl_usd: pnl_pct / 100.0 * exit_price * position.size,
            mfe_bps: position.mfe_bps,
            mae_bps: position.mae_bps,
            scale_count: position.scale_count(),
            recovered: position.recovered,
        }
    }

    pub fn is_winner(&self) -> bool {
        self.pnl_pct > 0.0
    }
}
