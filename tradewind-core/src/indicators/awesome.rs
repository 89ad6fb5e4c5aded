//! Awesome Oscillator — SMA(fast) − SMA(slow) of closes.
//!
//! The classic AO uses median prices; this engine runs it on closes (the
//! natural choice for Renko bricks, where the snapped close is the signal).

use super::sma::sma;

/// AO at the newest index. Callers gate on `closes.len() >= slow`.
pub fn awesome_oscillator(closes: &[f64], fast: usize, slow: usize) -> f64 {
    sma(closes, fast) - sma(closes, slow)
}
