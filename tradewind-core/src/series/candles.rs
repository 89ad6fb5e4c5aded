//! Candle aggregation — folds a tick stream into fixed-interval candles.
//!
//! The window is bounded: once `cap` candles exist the oldest is evicted on
//! rollover. `backfill` replaces the whole window with a fetched batch; it is
//! used to seed history at startup and periodically to correct drift in the
//! tick-built candles.

use crate::domain::{slot_for, Candle};

/// Bounded, time-ordered window of candles built from price observations.
#[derive(Debug, Clone)]
pub struct CandleWindow {
    interval_secs: i64,
    cap: usize,
    candles: Vec<Candle>,
}

impl CandleWindow {
    pub fn new(interval_secs: i64, cap: usize) -> Self {
        assert!(interval_secs >= 1, "interval_secs must be >= 1");
        assert!(cap >= 2, "cap must be >= 2");
        Self {
            interval_secs,
            cap,
            candles: Vec::with_capacity(cap),
        }
    }

    pub fn interval_secs(&self) -> i64 {
        self.interval_secs
    }

    /// Fold one price observation into the window.
    ///
    /// If `now` falls into a newer interval slot than the last candle, a new
    /// candle opens at `price`; otherwise the in-progress candle absorbs the
    /// tick. Observations older than the current candle are ignored.
    pub fn observe(&mut self, price: f64, now: i64) {
        let slot = slot_for(now, self.interval_secs);
        match self.candles.last_mut() {
            Some(last) if last.open_time >= slot => last.absorb(price),
            _ => {
                self.candles.push(Candle::from_tick(slot, price));
                if self.candles.len() > self.cap {
                    let excess = self.candles.len() - self.cap;
                    self.candles.drain(..excess);
                }
            }
        }
    }

    /// Replace the window wholesale with a fetched batch.
    ///
    /// Candles with non-positive timestamps or broken OHLC ordering are
    /// discarded; the rest are time-sorted and truncated to the newest `cap`.
    pub fn backfill(&mut self, batch: Vec<Candle>) {
        let mut batch: Vec<Candle> = batch.into_iter().filter(Candle::is_sane).collect();
        if batch.is_empty() {
            return;
        }
        batch.sort_by_key(|c| c.open_time);
        batch.dedup_by_key(|c| c.open_time);
        if batch.len() > self.cap {
            let excess = batch.len() - self.cap;
            batch.drain(..excess);
        }
        self.candles = batch;
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }
}
