//! MACD — EMA(fast) − EMA(slow), with a signal line over the MACD series.
//!
//! The signal line is an EMA of MACD values re-derived at each of the last
//! `signal` indices, each from its own trailing sub-window. This is more
//! expensive than an incremental EMA-of-MACD and gives slightly different
//! values; it is the engine's documented behavior. Windows are capped at
//! one to two hundred samples, so the cost stays trivial.

use super::ema::ema;

/// MACD line at the newest index.
pub fn macd_line(closes: &[f64], fast: usize, slow: usize) -> f64 {
    ema(closes, fast) - ema(closes, slow)
}

/// (macd, signal, histogram) at the newest index.
///
/// Callers gate on `closes.len() >= slow + signal` for fully warmed values;
/// shorter input degrades through `ema`'s short-window fallback.
pub fn macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> (f64, f64, f64) {
    let line = macd_line(closes, fast, slow);
    if signal == 0 || closes.len() < 2 {
        return (line, line, 0.0);
    }

    // EMA(signal) only reads the trailing `signal` values of the MACD
    // series, so only those indices need re-deriving.
    let first = closes.len().saturating_sub(signal).max(1);
    let series: Vec<f64> = (first..=closes.len())
        .map(|end| macd_line(&closes[..end], fast, slow))
        .collect();
    let signal_line = ema(&series, signal);
    (line, signal_line, line - signal_line)
}
