//! Renko brick — price-displacement-based (not time-based) price summary.

use serde::{Deserialize, Serialize};

/// Direction a brick closed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrickDirection {
    Up,
    Down,
}

/// A completed Renko brick.
///
/// `close` snaps to one brick size past the last tracked price, regardless of
/// how far price actually travelled. `high`/`low` record the raw tick
/// extremes seen while the brick formed, so they may overshoot the snapped
/// close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenkoBrick {
    /// Unix timestamp (seconds) when the brick started forming.
    pub open_time: i64,
    pub open: f64,
    pub close: f64,
    pub direction: BrickDirection,
    pub high: f64,
    pub low: f64,
}

impl RenkoBrick {
    pub fn is_up(&self) -> bool {
        self.direction == BrickDirection::Up
    }
}
