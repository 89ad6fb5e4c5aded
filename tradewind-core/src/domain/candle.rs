//! Candle — fixed-interval OHLCV summary of a price stream.
//!
//! Candles built from tick observations carry volume 0 (a tick-only feed has
//! no trade sizes); backfilled candles from a historical source may carry real
//! volume. Consumers that gate on volume must treat 0 as "unavailable".

use serde::{Deserialize, Serialize};

/// A fixed-interval open/high/low/close/volume candle.
///
/// `open_time` is an interval-aligned unix timestamp in seconds. Within a
/// window, candles are strictly ordered by `open_time`; gaps are tolerated
/// but never filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Start a fresh candle from a single tick. OHLC collapse to the tick
    /// price; volume is unknown and recorded as 0.
    pub fn from_tick(open_time: i64, price: f64) -> Self {
        Self {
            open_time,
            open: price,
            high: price,
            low: price,
            close: price,
            volume: 0.0,
        }
    }

    /// Fold one more tick into the in-progress candle.
    pub fn absorb(&mut self, price: f64) {
        self.high = self.high.max(price);
        self.low = self.low.min(price);
        self.close = price;
    }

    /// OHLC ordering holds and the timestamp is a real wall-clock instant.
    pub fn is_sane(&self) -> bool {
        self.open_time > 0
            && self.high >= self.open.max(self.close)
            && self.low <= self.open.min(self.close)
            && self.low <= self.high
    }
}

/// Align a wall-clock timestamp to the start of its candle interval.
pub fn slot_for(now: i64, interval_secs: i64) -> i64 {
    now.div_euclid(interval_secs) * interval_secs
}
