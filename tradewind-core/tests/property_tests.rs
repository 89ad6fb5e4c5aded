//! Property tests for engine invariants.
//!
//! Uses proptest to verify:
//! 1. Candle windows stay time-ordered with sane OHLC under any tick stream
//! 2. Renko bricks are internally consistent (direction, high/low envelope)
//! 3. Indicator outputs stay in their documented ranges
//! 4. Stop ratchet monotonicity — stops may only tighten, never loosen
//! 5. Scale-ins keep the weighted average inside the fill-price envelope

use proptest::prelude::*;
use tradewind_core::domain::{Position, Side, Signal};
use tradewind_core::indicators::{atr_candles, bollinger, ema, rsi, volatility_bps};
use tradewind_core::risk::ratchet_stop;
use tradewind_core::series::{CandleWindow, RenkoSeries};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_price() -> impl Strategy<Value = f64> {
    (10.0..1_000.0_f64).prop_map(|p| (p * 100.0).round() / 100.0)
}

fn arb_tick_stream() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(arb_price(), 2..200)
}

// ── 1. Candle window ordering and OHLC sanity ────────────────────────

proptest! {
    /// Any tick stream with non-decreasing timestamps yields strictly
    /// increasing slot-aligned open times and sane OHLC.
    #[test]
    fn candle_window_invariants(prices in arb_tick_stream(), interval in 1i64..3_600) {
        let mut window = CandleWindow::new(interval, 50);
        for (i, &price) in prices.iter().enumerate() {
            window.observe(price, 1_000_000 + i as i64 * 7);
        }

        let candles = window.candles();
        prop_assert!(!candles.is_empty());
        prop_assert!(candles.len() <= 50);
        for pair in candles.windows(2) {
            prop_assert!(pair[1].open_time > pair[0].open_time);
        }
        for candle in candles {
            prop_assert_eq!(candle.open_time % interval, 0);
            prop_assert!(candle.low <= candle.open && candle.open <= candle.high);
            prop_assert!(candle.low <= candle.close && candle.close <= candle.high);
        }
    }
}

// ── 2. Renko brick consistency ───────────────────────────────────────

proptest! {
    #[test]
    fn renko_bricks_are_consistent(prices in arb_tick_stream()) {
        let mut series = RenkoSeries::new(14, 1.0, 50);
        for (i, &price) in prices.iter().enumerate() {
            series.observe(price, i as i64);
        }

        prop_assert!(series.len() <= 50);
        for brick in series.bricks() {
            prop_assert_eq!(brick.is_up(), brick.close > brick.open);
            prop_assert!(brick.high >= brick.open.max(brick.close) - 1e-9);
            prop_assert!(brick.low <= brick.open.min(brick.close) + 1e-9);
        }
        if let Some(size) = series.brick_size() {
            prop_assert!(size > 0.0);
        }
    }
}

// ── 3. Indicator ranges ──────────────────────────────────────────────

proptest! {
    /// RSI is bounded by construction.
    #[test]
    fn rsi_stays_in_0_100(closes in arb_tick_stream(), period in 2usize..30) {
        let value = rsi(&closes, period);
        prop_assert!((0.0..=100.0).contains(&value));
    }

    /// Bollinger bands are ordered around the mean.
    #[test]
    fn bollinger_bands_ordered(closes in arb_tick_stream(), period in 2usize..30) {
        let (upper, middle, lower) = bollinger(&closes, period, 2.0);
        prop_assert!(lower <= middle + 1e-9);
        prop_assert!(middle <= upper + 1e-9);
    }

    /// EMA is a convex combination of window values, so it stays inside
    /// the observed range.
    #[test]
    fn ema_stays_in_range(closes in arb_tick_stream(), period in 1usize..30) {
        let value = ema(&closes, period);
        let min = closes.iter().cloned().fold(f64::MAX, f64::min);
        let max = closes.iter().cloned().fold(f64::MIN, f64::max);
        prop_assert!(value >= min - 1e-9);
        prop_assert!(value <= max + 1e-9);
    }

    /// ATR and realized volatility are never negative.
    #[test]
    fn atr_and_volatility_nonnegative(closes in arb_tick_stream()) {
        let candles: Vec<_> = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| tradewind_core::domain::Candle {
                open_time: 60 * (i as i64 + 1),
                open: close,
                high: close + 0.5,
                low: close - 0.5,
                close,
                volume: 0.0,
            })
            .collect();
        prop_assert!(atr_candles(&candles, 14) >= 0.0);
        prop_assert!(volatility_bps(&closes, 20) >= 0.0);
    }
}

// ── 4. Ratchet monotonicity ──────────────────────────────────────────

proptest! {
    /// Applying any proposal sequence through the ratchet produces a
    /// monotone stop series: non-decreasing for longs, non-increasing
    /// for shorts.
    #[test]
    fn ratchet_is_monotone(
        initial in arb_price(),
        proposals in prop::collection::vec(arb_price(), 1..50),
    ) {
        for side in [Side::Long, Side::Short] {
            let mut stop = initial;
            let mut history = vec![stop];
            for &proposal in &proposals {
                if let Some(new_stop) = ratchet_stop(side, stop, proposal) {
                    stop = new_stop;
                }
                history.push(stop);
            }
            for pair in history.windows(2) {
                match side {
                    Side::Long => prop_assert!(pair[1] >= pair[0]),
                    Side::Short => prop_assert!(pair[1] <= pair[0]),
                }
            }
        }
    }
}

// ── 5. Scale-in weighted average ─────────────────────────────────────

proptest! {
    /// The weighted-average entry always lies inside the envelope of fill
    /// prices, and total size is the sum of fills.
    #[test]
    fn scaling_keeps_average_in_envelope(
        entry in arb_price(),
        fills in prop::collection::vec((arb_price(), 0.001..0.1f64), 1..5),
    ) {
        let signal = Signal {
            side: Side::Long,
            strength: 1.0,
            entry_price: entry,
            stop_loss: entry * 0.99,
            take_profit: entry * 1.01,
            size: 0.05,
            reason: "prop".into(),
            breakout_level: None,
        };
        let mut pos = Position::open(&signal, 1, 0.0);
        let mut min_price = entry;
        let mut max_price = entry;
        let mut total = 0.05;
        for (i, &(price, size)) in fills.iter().enumerate() {
            pos.apply_scale(price, size, 60.0 * (i as f64 + 1.0), i as u64 + 2);
            min_price = min_price.min(price);
            max_price = max_price.max(price);
            total += size;
        }
        prop_assert!(pos.entry_price >= min_price - 1e-9);
        prop_assert!(pos.entry_price <= max_price + 1e-9);
        prop_assert!((pos.size - total).abs() < 1e-9);
        prop_assert_eq!(pos.scale_count(), fills.len());
        prop_assert!((pos.initial_size - 0.05).abs() < 1e-12);
    }
}
