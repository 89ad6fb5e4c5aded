//! Exponential moving average.
//!
//! Seeded with the first value of the trailing period-length sub-window, then
//! iterated with α = 2/(period+1). This differs from an EMA carried over the
//! whole series — the sub-window seeding is part of the engine's behavioral
//! contract and must not be "improved".

/// EMA over the last `period` values.
///
/// Degrades gracefully on short input: returns the last value when fewer than
/// `period` samples exist, 0.0 on empty input. Callers that must not act on
/// degraded values gate on window length before calling.
pub fn ema(values: &[f64], period: usize) -> f64 {
    let last = match values.last() {
        Some(&v) => v,
        None => return 0.0,
    };
    if values.len() < period || period == 0 {
        return last;
    }

    let window = &values[values.len() - period..];
    let alpha = 2.0 / (period as f64 + 1.0);
    let mut ema = window[0];
    for &price in &window[1..] {
        ema = price * alpha + ema * (1.0 - alpha);
    }
    ema
}
