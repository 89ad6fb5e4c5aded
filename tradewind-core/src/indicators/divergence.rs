//! Price/oscillator divergence detection over local extrema.
//!
//! Scans the trailing `lookback` closes for strict local minima and maxima
//! (each neighbor strictly worse). Bullish divergence: the latest local low
//! undercuts the previous one while the oscillator is rising. Bearish is the
//! mirror on local highs with the oscillator falling. Strength is the
//! relative change between the two extremes, scaled by 100 and capped at 1.

use serde::{Deserialize, Serialize};

use crate::domain::Side;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DivergenceKind {
    Bullish,
    Bearish,
}

impl DivergenceKind {
    /// The entry side this divergence argues for.
    pub fn side(self) -> Side {
        match self {
            DivergenceKind::Bullish => Side::Long,
            DivergenceKind::Bearish => Side::Short,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DivergenceKind::Bullish => "bullish",
            DivergenceKind::Bearish => "bearish",
        }
    }
}

/// A detected divergence with its strength in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Divergence {
    pub kind: DivergenceKind,
    pub strength: f64,
}

/// Detect a divergence over the trailing `lookback` closes, given the
/// current and previous oscillator readings. Bullish is checked first.
pub fn detect_divergence(
    closes: &[f64],
    lookback: usize,
    ao: f64,
    ao_prev: f64,
) -> Option<Divergence> {
    if closes.len() < lookback || lookback < 3 {
        return None;
    }
    let window = &closes[closes.len() - lookback..];

    let mut lows: Vec<f64> = Vec::new();
    let mut highs: Vec<f64> = Vec::new();
    for i in 1..window.len() - 1 {
        if window[i] < window[i - 1] && window[i] < window[i + 1] {
            lows.push(window[i]);
        }
        if window[i] > window[i - 1] && window[i] > window[i + 1] {
            highs.push(window[i]);
        }
    }

    // price lower low + oscillator rising
    if lows.len() >= 2 {
        let latest = lows[lows.len() - 1];
        let prev = lows[lows.len() - 2];
        if latest < prev && ao > ao_prev && prev > 0.0 {
            let strength = (prev - latest) / prev;
            return Some(Divergence {
                kind: DivergenceKind::Bullish,
                strength: (strength * 100.0).min(1.0),
            });
        }
    }

    // price higher high + oscillator falling
    if highs.len() >= 2 {
        let latest = highs[highs.len() - 1];
        let prev = highs[highs.len() - 2];
        if latest > prev && ao < ao_prev && prev > 0.0 {
            let strength = (latest - prev) / prev;
            return Some(Divergence {
                kind: DivergenceKind::Bearish,
                strength: (strength * 100.0).min(1.0),
            });
        }
    }

    None
}
