//! Indicator pipeline — one value-typed snapshot per cycle.
//!
//! The snapshot is recomputed from scratch from the full available window
//! every cycle; no incremental indicator state survives between cycles.
//! That trades O(window) work (windows are capped at 100–200 samples) for
//! immunity to an entire class of stale/drifting-indicator bugs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Candle, RenkoBrick};

use super::atr::{atr_candles, atr_deltas};
use super::awesome::awesome_oscillator;
use super::divergence::{detect_divergence, Divergence};
use super::ema::ema;
use super::macd::macd;
use super::rsi::rsi;
use super::sma::{bollinger, sma};
use super::volatility::volatility_bps;

/// The window is shorter than the largest period the pipeline needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("insufficient data: have {have} samples, need {need}")]
pub struct NotReady {
    pub have: usize,
    pub need: usize,
}

/// Periods and lookbacks for every indicator in the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub ema_fast_period: usize,
    pub ema_slow_period: usize,
    pub bb_period: usize,
    pub bb_std: f64,
    pub rsi_period: usize,
    pub atr_period: usize,
    pub volume_ma_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub ao_fast_period: usize,
    pub ao_slow_period: usize,
    pub divergence_lookback: usize,
    pub volatility_lookback: usize,
    pub breakout_lookback: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            ema_fast_period: 8,
            ema_slow_period: 21,
            bb_period: 20,
            bb_std: 2.0,
            rsi_period: 14,
            atr_period: 14,
            volume_ma_period: 20,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            ao_fast_period: 5,
            ao_slow_period: 34,
            divergence_lookback: 20,
            volatility_lookback: 20,
            breakout_lookback: 30,
        }
    }
}

impl IndicatorConfig {
    /// Smallest window from which every indicator is fully warmed.
    pub fn required_samples(&self) -> usize {
        [
            self.ema_slow_period,
            self.bb_period,
            self.rsi_period + 1,
            self.atr_period + 1,
            self.volume_ma_period,
            self.macd_slow + self.macd_signal,
            self.ao_slow_period,
            self.divergence_lookback,
            self.volatility_lookback + 1,
            self.breakout_lookback + 1,
        ]
        .into_iter()
        .max()
        .unwrap_or(1)
    }
}

/// All indicator outputs for one cycle, derived from one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub bb_upper: f64,
    pub bb_middle: f64,
    pub bb_lower: f64,
    pub rsi: f64,
    pub atr: f64,
    /// ATR over a window twice as long — the expansion reference.
    pub atr_baseline: f64,
    pub volume_ma: f64,
    pub last_volume: f64,
    pub last_close: f64,
    pub volatility_bps: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_histogram: f64,
    pub ao: f64,
    pub ao_prev: f64,
    pub divergence: Option<Divergence>,
    /// Highest high over the breakout lookback, excluding the forming sample.
    pub recent_high: f64,
    /// Lowest low over the breakout lookback, excluding the forming sample.
    pub recent_low: f64,
}

impl IndicatorSnapshot {
    /// Compute from a time-based candle window.
    pub fn from_candles(candles: &[Candle], cfg: &IndicatorConfig) -> Result<Self, NotReady> {
        let need = cfg.required_samples();
        if candles.len() < need {
            return Err(NotReady {
                have: candles.len(),
                need,
            });
        }

        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();
        let last = &candles[candles.len() - 1];

        // breakout levels come from completed candles only
        let settled = &candles[..candles.len() - 1];
        let lookback_start = settled.len().saturating_sub(cfg.breakout_lookback);
        let lookback = &settled[lookback_start..];
        let recent_high = lookback.iter().map(|c| c.high).fold(f64::MIN, f64::max);
        let recent_low = lookback.iter().map(|c| c.low).fold(f64::MAX, f64::min);

        Ok(Self::build(
            &closes,
            atr_candles(candles, cfg.atr_period),
            atr_candles(candles, cfg.atr_period * 2),
            sma(&volumes, cfg.volume_ma_period),
            last.volume,
            recent_high,
            recent_low,
            cfg,
        ))
    }

    /// Compute from a Renko brick series. Bricks carry no volume; the ATR
    /// degrades to absolute close deltas.
    pub fn from_bricks(bricks: &[RenkoBrick], cfg: &IndicatorConfig) -> Result<Self, NotReady> {
        let need = cfg.required_samples();
        if bricks.len() < need {
            return Err(NotReady {
                have: bricks.len(),
                need,
            });
        }

        let closes: Vec<f64> = bricks.iter().map(|b| b.close).collect();
        let settled = &bricks[..bricks.len() - 1];
        let lookback_start = settled.len().saturating_sub(cfg.breakout_lookback);
        let lookback = &settled[lookback_start..];
        let recent_high = lookback.iter().map(|b| b.high).fold(f64::MIN, f64::max);
        let recent_low = lookback.iter().map(|b| b.low).fold(f64::MAX, f64::min);

        Ok(Self::build(
            &closes,
            atr_deltas(&closes, cfg.atr_period),
            atr_deltas(&closes, cfg.atr_period * 2),
            0.0,
            0.0,
            recent_high,
            recent_low,
            cfg,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        closes: &[f64],
        atr: f64,
        atr_baseline: f64,
        volume_ma: f64,
        last_volume: f64,
        recent_high: f64,
        recent_low: f64,
        cfg: &IndicatorConfig,
    ) -> Self {
        let (bb_upper, bb_middle, bb_lower) = bollinger(closes, cfg.bb_period, cfg.bb_std);
        let (macd_line, macd_signal, macd_histogram) =
            macd(closes, cfg.macd_fast, cfg.macd_slow, cfg.macd_signal);

        let ao = awesome_oscillator(closes, cfg.ao_fast_period, cfg.ao_slow_period);
        let ao_prev = if closes.len() > cfg.ao_slow_period {
            awesome_oscillator(
                &closes[..closes.len() - 1],
                cfg.ao_fast_period,
                cfg.ao_slow_period,
            )
        } else {
            ao
        };

        Self {
            ema_fast: ema(closes, cfg.ema_fast_period),
            ema_slow: ema(closes, cfg.ema_slow_period),
            bb_upper,
            bb_middle,
            bb_lower,
            rsi: rsi(closes, cfg.rsi_period),
            atr,
            atr_baseline,
            volume_ma,
            last_volume,
            last_close: closes[closes.len() - 1],
            volatility_bps: volatility_bps(closes, cfg.volatility_lookback),
            macd: macd_line,
            macd_signal,
            macd_histogram,
            ao,
            ao_prev,
            divergence: detect_divergence(closes, cfg.divergence_lookback, ao, ao_prev),
            recent_high,
            recent_low,
        }
    }

    /// Price location within the bands: 0 at the lower band, 1 at the upper.
    /// 0.5 when the bands have collapsed.
    pub fn bb_position(&self, price: f64) -> f64 {
        if self.bb_upper > self.bb_lower {
            (price - self.bb_lower) / (self.bb_upper - self.bb_lower)
        } else {
            0.5
        }
    }

    /// The oscillator's one-step direction.
    pub fn ao_rising(&self) -> bool {
        self.ao > self.ao_prev
    }

    pub fn ao_falling(&self) -> bool {
        self.ao < self.ao_prev
    }

    /// ATR expanding relative to its longer-window baseline.
    pub fn atr_expanding(&self, min_ratio: f64) -> bool {
        self.atr_baseline > 0.0 && self.atr >= self.atr_baseline * min_ratio
    }

    /// EMA fast-vs-slow divergence in bps of the slow EMA, signed
    /// (positive when fast is above slow).
    pub fn ema_divergence_bps(&self) -> f64 {
        if self.ema_slow > 0.0 {
            (self.ema_fast - self.ema_slow) / self.ema_slow * 10_000.0
        } else {
            0.0
        }
    }
}
