//! Relative Strength Index.
//!
//! Simple (not Wilder-smoothed) averages of gains and losses over the last
//! `period` one-step deltas. A zero average loss is floored to a small
//! epsilon rather than dividing by literal zero, so an all-gains window reads
//! near 100 instead of erroring.

/// Denominator floor for the average loss.
const LOSS_EPSILON: f64 = 0.0001;

/// RSI over the last `period` deltas. Returns the neutral 50.0 when fewer
/// than `period + 1` samples exist.
pub fn rsi(closes: &[f64], period: usize) -> f64 {
    if period == 0 || closes.len() < period + 1 {
        return 50.0;
    }

    let window = &closes[closes.len() - (period + 1)..];
    let mut gain_sum = 0.0;
    let mut loss_sum = 0.0;
    for pair in window.windows(2) {
        let change = pair[1] - pair[0];
        if change > 0.0 {
            gain_sum += change;
        } else {
            loss_sum += -change;
        }
    }

    let avg_gain = gain_sum / period as f64;
    let avg_loss = (loss_sum / period as f64).max(LOSS_EPSILON);

    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}
