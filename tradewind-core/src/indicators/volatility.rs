//! Realized volatility in basis points.

/// Mean absolute one-step return over the trailing `lookback` closes,
/// scaled to basis points. Returns 0.0 with fewer than two samples.
pub fn volatility_bps(closes: &[f64], lookback: usize) -> f64 {
    if closes.len() < 2 || lookback < 2 {
        return 0.0;
    }
    let start = closes.len().saturating_sub(lookback);
    let window = &closes[start..];

    let mut sum = 0.0;
    let mut count = 0usize;
    for pair in window.windows(2) {
        if pair[0] > 0.0 {
            sum += ((pair[1] - pair[0]) / pair[0]).abs();
            count += 1;
        }
    }
    if count == 0 {
        return 0.0;
    }
    sum / count as f64 * 10_000.0
}
