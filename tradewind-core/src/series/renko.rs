//! Renko transformation — converts the raw price stream into bricks.
//!
//! Brick size is dynamic: ATR (over absolute one-step price changes, the only
//! True Range proxy a mid-price feed allows) times a multiplier, recomputed on
//! every observation. Until enough history exists — or whenever the computed
//! size would be non-positive — the size falls back to a small fraction of
//! price, so it can never reach zero.
//!
//! A closing brick's close snaps to `tracked_close ± brick_size`, one brick
//! per observation even if price jumped further. The snapped close (not the
//! raw tick) is appended to the price history, matching the brick-driven ATR
//! feedback loop.

use crate::domain::{BrickDirection, RenkoBrick};

/// Fallback brick size as a fraction of price.
const FALLBACK_FRACTION: f64 = 0.001;

#[derive(Debug, Clone)]
struct FormingBrick {
    open_time: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
}

/// Bounded series of completed Renko bricks plus the in-progress brick.
#[derive(Debug, Clone)]
pub struct RenkoSeries {
    atr_period: usize,
    multiplier: f64,
    cap: usize,
    price_history: Vec<f64>,
    bricks: Vec<RenkoBrick>,
    forming: Option<FormingBrick>,
    brick_size: Option<f64>,
}

impl RenkoSeries {
    pub fn new(atr_period: usize, multiplier: f64, cap: usize) -> Self {
        assert!(atr_period >= 1, "atr_period must be >= 1");
        assert!(multiplier > 0.0, "multiplier must be positive");
        assert!(cap >= 2, "cap must be >= 2");
        Self {
            atr_period,
            multiplier,
            cap,
            price_history: Vec::new(),
            bricks: Vec::new(),
            forming: None,
            brick_size: None,
        }
    }

    /// Fold one price observation in. Returns `true` when a brick completed.
    pub fn observe(&mut self, price: f64, now: i64) -> bool {
        self.push_price(price);
        self.brick_size = Some(self.next_brick_size(price));
        self.update_bricks(price, now)
    }

    /// Current dynamic brick size (absent before the first observation).
    pub fn brick_size(&self) -> Option<f64> {
        self.brick_size
    }

    pub fn bricks(&self) -> &[RenkoBrick] {
        &self.bricks
    }

    pub fn len(&self) -> usize {
        self.bricks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bricks.is_empty()
    }

    /// Replace brick history wholesale (startup recovery from the store).
    pub fn restore(&mut self, mut bricks: Vec<RenkoBrick>) {
        if bricks.len() > self.cap {
            let excess = bricks.len() - self.cap;
            bricks.drain(..excess);
        }
        for brick in &bricks {
            self.push_price(brick.close);
        }
        self.bricks = bricks;
    }

    fn push_price(&mut self, price: f64) {
        self.price_history.push(price);
        // ATR only ever looks at the newest period+1 samples
        let keep = self.atr_period + 1;
        if self.price_history.len() > keep {
            let excess = self.price_history.len() - keep;
            self.price_history.drain(..excess);
        }
    }

    fn next_brick_size(&self, price: f64) -> f64 {
        if self.price_history.len() > self.atr_period {
            let deltas: f64 = self
                .price_history
                .windows(2)
                .map(|pair| (pair[1] - pair[0]).abs())
                .sum();
            let atr = deltas / (self.price_history.len() - 1) as f64;
            let size = atr * self.multiplier;
            if size > 0.0 {
                return size;
            }
        }
        price * FALLBACK_FRACTION
    }

    fn update_bricks(&mut self, price: f64, now: i64) -> bool {
        let size = match self.brick_size {
            Some(size) if size > 0.0 => size,
            _ => return false,
        };

        let forming = match self.forming.as_mut() {
            None => {
                self.forming = Some(FormingBrick {
                    open_time: now,
                    open: price,
                    high: price,
                    low: price,
                    close: price,
                });
                return false;
            }
            Some(forming) => forming,
        };

        if (price - forming.close).abs() < size {
            forming.high = forming.high.max(price);
            forming.low = forming.low.min(price);
            forming.close = price;
            return false;
        }

        let (new_close, direction) = if price > forming.close {
            (forming.close + size, BrickDirection::Up)
        } else {
            (forming.close - size, BrickDirection::Down)
        };

        let completed = RenkoBrick {
            open_time: forming.open_time,
            open: forming.open,
            close: new_close,
            direction,
            high: forming.high.max(price),
            low: forming.low.min(price),
        };
        // the new brick opens at the snapped close, which the raw tick may
        // have jumped past; its extremes must cover both
        self.forming = Some(FormingBrick {
            open_time: now,
            open: new_close,
            high: price.max(new_close),
            low: price.min(new_close),
            close: new_close,
        });

        self.bricks.push(completed);
        if self.bricks.len() > self.cap {
            let excess = self.bricks.len() - self.cap;
            self.bricks.drain(..excess);
        }
        self.push_price(new_close);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_size_before_history() {
        let mut series = RenkoSeries::new(14, 1.0, 100);
        series.observe(100.0, 1);
        assert_eq!(series.brick_size(), Some(0.1)); // 100 * 0.001
        assert!(series.is_empty());
    }

    #[test]
    fn flat_prices_keep_fallback_size() {
        let mut series = RenkoSeries::new(3, 1.0, 100);
        for i in 0..10 {
            series.observe(100.0, i);
        }
        // ATR over identical prices is 0; size must not collapse to 0
        assert_eq!(series.brick_size(), Some(0.1));
    }

    #[test]
    fn brick_closes_snap_to_brick_size() {
        let mut series = RenkoSeries::new(14, 1.0, 100);
        series.observe(100.0, 1); // opens the forming brick
        let completed = series.observe(100.25, 2); // size 100.25 * 0.001, move 0.25
        assert!(completed);
        let brick = &series.bricks()[0];
        assert_eq!(brick.direction, BrickDirection::Up);
        // close snaps to tracked close + size, not to the raw tick
        assert!((brick.close - (100.0 + 100.25 * 0.001)).abs() < 1e-9);
        assert_eq!(brick.high, 100.25);
    }

    #[test]
    fn down_brick_direction() {
        let mut series = RenkoSeries::new(14, 1.0, 100);
        series.observe(100.0, 1);
        assert!(series.observe(99.5, 2));
        let brick = &series.bricks()[0];
        assert_eq!(brick.direction, BrickDirection::Down);
        assert!((brick.close - (100.0 - 99.5 * 0.001)).abs() < 1e-9);
    }

    #[test]
    fn small_moves_update_forming_only() {
        let mut series = RenkoSeries::new(14, 1.0, 100);
        series.observe(100.0, 1);
        assert!(!series.observe(100.05, 2)); // below 0.1 brick size
        assert!(series.is_empty());
    }

    #[test]
    fn one_brick_per_observation_even_on_jumps() {
        let mut series = RenkoSeries::new(14, 1.0, 100);
        series.observe(100.0, 1);
        // price jumps 5 brick sizes; still exactly one brick closes
        assert!(series.observe(100.5, 2));
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn brick_after_up_jump_keeps_ohlc_envelope() {
        let mut series = RenkoSeries::new(14, 1.0, 100);
        series.observe(100.0, 1);
        // jump past several brick sizes: the next brick opens at the snapped
        // close, below the raw tick
        series.observe(100.5, 2);
        series.observe(101.0, 3);
        let brick = &series.bricks()[1];
        assert!(brick.low <= brick.open.min(brick.close), "{brick:?}");
        assert!(brick.high >= brick.open.max(brick.close), "{brick:?}");
    }

    #[test]
    fn brick_after_down_jump_keeps_ohlc_envelope() {
        let mut series = RenkoSeries::new(14, 1.0, 100);
        series.observe(100.0, 1);
        series.observe(99.5, 2);
        series.observe(99.0, 3);
        let brick = &series.bricks()[1];
        assert!(brick.high >= brick.open.max(brick.close), "{brick:?}");
        assert!(brick.low <= brick.open.min(brick.close), "{brick:?}");
    }

    #[test]
    fn cap_evicts_oldest_brick() {
        let mut series = RenkoSeries::new(14, 1.0, 3);
        series.observe(100.0, 0);
        let mut price = 100.0;
        for i in 1..10 {
            price += 0.2;
            series.observe(price, i);
        }
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn restore_seeds_history() {
        let mut series = RenkoSeries::new(14, 1.0, 100);
        let bricks: Vec<RenkoBrick> = (0..5)
            .map(|i| RenkoBrick {
                open_time: i,
                open: 100.0 + i as f64 * 0.1,
                close: 100.1 + i as f64 * 0.1,
                direction: BrickDirection::Up,
                high: 100.2 + i as f64 * 0.1,
                low: 100.0 + i as f64 * 0.1,
            })
            .collect();
        series.restore(bricks);
        assert_eq!(series.len(), 5);
    }
}
