//! Indicator math and the per-cycle snapshot pipeline.
//!
//! Individual indicators are free functions over plain slices; the
//! [`snapshot`] module assembles them into one [`IndicatorSnapshot`] per
//! cycle. Everything is recomputed from the full window each time — see the
//! snapshot module docs for why.

pub mod atr;
pub mod awesome;
pub mod divergence;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod snapshot;
pub mod volatility;

pub use atr::{atr_candles, atr_deltas};
pub use awesome::awesome_oscillator;
pub use divergence::{detect_divergence, Divergence, DivergenceKind};
pub use ema::ema;
pub use macd::{macd, macd_line};
pub use rsi::rsi;
pub use sma::{bollinger, sma, stddev};
pub use snapshot::{IndicatorConfig, IndicatorSnapshot, NotReady};
pub use volatility::volatility_bps;

#[cfg(test)]
pub(crate) const DEFAULT_EPSILON: f64 = 1e-10;

/// Build candles from closes: high = close + 1, low = close - 1,
/// open = previous close (or close for the first), 60-second slots.
#[cfg(test)]
pub(crate) fn make_candles(closes: &[f64]) -> Vec<crate::domain::Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| crate::domain::Candle {
            open_time: 60 * (i as i64 + 1),
            open: if i == 0 { close } else { closes[i - 1] },
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000.0,
        })
        .collect()
}

#[cfg(test)]
pub(crate) fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "expected {expected}, got {actual} (epsilon {epsilon})"
    );
}
