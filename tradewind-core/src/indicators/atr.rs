//! Average True Range — simple mean of trailing True Range samples.
//!
//! Two variants: full OHLC True Range when candles are available, and the
//! mid-price degradation `|close[i] - close[i-1]|` when only closes exist
//! (Renko brick series, raw tick history).

use crate::domain::Candle;

/// True Range of candle `i` against the previous close.
fn true_range(candle: &Candle, prev_close: f64) -> f64 {
    let hl = candle.high - candle.low;
    let hc = (candle.high - prev_close).abs();
    let lc = (candle.low - prev_close).abs();
    hl.max(hc).max(lc)
}

/// ATR over the last `period` candles. Returns 0.0 when fewer than
/// `period + 1` candles exist (no previous close for the oldest sample).
pub fn atr_candles(candles: &[Candle], period: usize) -> f64 {
    if period == 0 || candles.len() < period + 1 {
        return 0.0;
    }
    let start = candles.len() - period;
    let sum: f64 = (start..candles.len())
        .map(|i| true_range(&candles[i], candles[i - 1].close))
        .sum();
    sum / period as f64
}

/// ATR over the last `period` absolute one-step deltas of a close-only
/// series. Returns 0.0 when fewer than `period + 1` values exist.
pub fn atr_deltas(closes: &[f64], period: usize) -> f64 {
    if period == 0 || closes.len() < period + 1 {
        return 0.0;
    }
    let window = &closes[closes.len() - (period + 1)..];
    let sum: f64 = window.windows(2).map(|pair| (pair[1] - pair[0]).abs()).sum();
    sum / period as f64
}
