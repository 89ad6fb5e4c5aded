//! Signal policies — pure entry/exit decision functions.
//!
//! A policy never sees the order collaborator, the store, or the clock
//! beyond the `now` it is handed; it maps (price, indicator snapshot,
//! position) to decisions. All order placement, retries, and risk-state
//! bookkeeping live in the position lifecycle, not here.

pub mod breakout;
pub mod renko_ao;
pub mod trend;

pub use breakout::{BreakoutConfig, BreakoutPolicy};
pub use renko_ao::{RenkoAoConfig, RenkoAoPolicy, ScalingConfig};
pub use trend::{TrendConfig, TrendPolicy};

use crate::domain::{ExitReason, Position, Signal};
use crate::indicators::{IndicatorConfig, IndicatorSnapshot};

/// A scale-in request from a policy that averages into positions.
///
/// The lifecycle executes the order, folds the fill into the position's
/// weighted average, and re-anchors the stop at
/// `avg ∓ stop_loss_bps * stop_multiplier` (tighter side by position side).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleRequest {
    pub size: f64,
    pub stop_loss_bps: f64,
    /// Widening multiplier for the re-anchored stop (grows with scale count).
    pub stop_multiplier: f64,
}

/// A pluggable entry/exit policy.
///
/// Implementations must be pure: same inputs, same decision. Entry is only
/// consulted while flat, exit/scale only while a position is open — the
/// lifecycle enforces that contract.
pub trait SignalPolicy: Send + Sync {
    /// Stable name used in logs, trade records, and persistence keys.
    fn name(&self) -> &'static str;

    /// Indicator periods this policy wants the pipeline to run with.
    fn indicator_config(&self) -> IndicatorConfig;

    /// Entry decision while flat.
    fn check_entry(&self, price: f64, snapshot: &IndicatorSnapshot) -> Option<Signal>;

    /// Exit decision while open. `now` is unix seconds.
    fn check_exit(
        &self,
        price: f64,
        snapshot: &IndicatorSnapshot,
        position: &Position,
        now: f64,
    ) -> Option<ExitReason>;

    /// Trailing-stop proposal while open. The lifecycle applies the
    /// tighten-only ratchet; policies just propose raw levels.
    fn propose_stop(
        &self,
        _price: f64,
        _snapshot: &IndicatorSnapshot,
        _position: &Position,
    ) -> Option<f64> {
        None
    }

    /// Scale-in request while open, for policies that average in.
    fn check_scale(
        &self,
        _price: f64,
        _snapshot: &IndicatorSnapshot,
        _position: &Position,
        _now: f64,
    ) -> Option<ScaleRequest> {
        None
    }
}

/// Clamp a raw size into [min, max].
pub(crate) fn clamp_size(raw: f64, min: f64, max: f64) -> f64 {
    raw.max(min).min(max)
}
