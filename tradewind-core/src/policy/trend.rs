//! Trend-following RSI + Bollinger policy on time-based candles.
//!
//! Entry gates, in order: realized volatility inside a tradable band, EMA
//! fast/slow divergence confirming an overextended move beyond a threshold,
//! volume above its moving average (skipped when the feed carries no
//! volume), then the trigger — RSI past a threshold with a momentum margin
//! while price sits in the outer region of the band span on the trade side.
//! Exits: fixed stop/target in bps, a time stop scaled by candle interval,
//! and RSI crossing to the opposite threshold.

use serde::{Deserialize, Serialize};

use crate::domain::{ExitReason, Position, Side, Signal};
use crate::indicators::{IndicatorConfig, IndicatorSnapshot};

use super::{clamp_size, SignalPolicy};

/// Configuration for [`TrendPolicy`]. Unknown keys in config files are
/// ignored; every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    pub candle_interval_secs: i64,
    pub ema_fast_period: usize,
    pub ema_slow_period: usize,
    pub bb_period: usize,
    pub bb_std: f64,
    pub rsi_period: usize,
    pub atr_period: usize,
    pub volume_ma_period: usize,
    /// Band-touch threshold: entry requires price within `1 - threshold` of
    /// the band on the trade side (0.95 = outer 5% of the half-span).
    pub bb_touch_threshold: f64,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    /// Extra RSI distance past the threshold required to enter.
    pub rsi_momentum_margin: f64,
    pub volume_multiplier: f64,
    pub min_volatility_bps: f64,
    pub max_volatility_bps: f64,
    /// Minimum EMA fast/slow divergence (bps of slow) confirming the move.
    pub ema_confirmation_bps: f64,
    pub take_profit_bps: f64,
    pub stop_loss_bps: f64,
    /// Time stop, in candle intervals.
    pub max_hold_intervals: u32,
    pub min_position_size: f64,
    pub max_position_size: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            candle_interval_secs: 60,
            ema_fast_period: 8,
            ema_slow_period: 21,
            bb_period: 20,
            bb_std: 2.0,
            rsi_period: 14,
            atr_period: 14,
            volume_ma_period: 20,
            bb_touch_threshold: 0.95,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            rsi_momentum_margin: 2.0,
            volume_multiplier: 1.2,
            min_volatility_bps: 4.0,
            max_volatility_bps: 25.0,
            ema_confirmation_bps: 15.0,
            take_profit_bps: 3.0,
            stop_loss_bps: 6.0,
            max_hold_intervals: 5,
            min_position_size: 0.01,
            max_position_size: 0.1,
        }
    }
}

/// Trend-following RSI + Bollinger policy.
#[derive(Debug, Clone)]
pub struct TrendPolicy {
    cfg: TrendConfig,
}

impl TrendPolicy {
    pub fn new(cfg: TrendConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &TrendConfig {
        &self.cfg
    }

    fn max_hold_secs(&self) -> f64 {
        (self.cfg.max_hold_intervals as i64 * self.cfg.candle_interval_secs) as f64
    }

    fn build_signal(&self, side: Side, price: f64, snapshot: &IndicatorSnapshot, strength: f64, reason: &str) -> Signal {
        let (stop_loss, take_profit) = match side {
            Side::Long => (
                price * (1.0 - self.cfg.stop_loss_bps / 10_000.0),
                price * (1.0 + self.cfg.take_profit_bps / 10_000.0),
            ),
            Side::Short => (
                price * (1.0 + self.cfg.stop_loss_bps / 10_000.0),
                price * (1.0 - self.cfg.take_profit_bps / 10_000.0),
            ),
        };
        let size = clamp_size(
            snapshot.atr * 0.5 / price,
            self.cfg.min_position_size,
            self.cfg.max_position_size,
        );
        Signal {
            side,
            strength: strength.clamp(0.0, 1.0),
            entry_price: price,
            stop_loss,
            take_profit,
            size,
            reason: reason.to_string(),
            breakout_level: None,
        }
    }
}

impl SignalPolicy for TrendPolicy {
    fn name(&self) -> &'static str {
        "trend_following"
    }

    fn indicator_config(&self) -> IndicatorConfig {
        IndicatorConfig {
            ema_fast_period: self.cfg.ema_fast_period,
            ema_slow_period: self.cfg.ema_slow_period,
            bb_period: self.cfg.bb_period,
            bb_std: self.cfg.bb_std,
            rsi_period: self.cfg.rsi_period,
            atr_period: self.cfg.atr_period,
            volume_ma_period: self.cfg.volume_ma_period,
            ..IndicatorConfig::default()
        }
    }

    fn check_entry(&self, price: f64, snapshot: &IndicatorSnapshot) -> Option<Signal> {
        let vol = snapshot.volatility_bps;
        if vol < self.cfg.min_volatility_bps || vol > self.cfg.max_volatility_bps {
            return None;
        }

        // volume gate, skipped when the tick-built candles carry no volume
        if snapshot.last_volume > 0.0
            && snapshot.last_volume < snapshot.volume_ma * self.cfg.volume_multiplier
        {
            return None;
        }

        let ema_div = snapshot.ema_divergence_bps();
        let tolerance = 1.0 - self.cfg.bb_touch_threshold;

        // long: overextended down-move (fast EMA below slow beyond the
        // confirmation threshold), price in the lower band region, RSI
        // past oversold with margin
        if ema_div <= -self.cfg.ema_confirmation_bps {
            let span = snapshot.bb_middle - snapshot.bb_lower;
            let bb_position = if span > 0.0 {
                (price - snapshot.bb_lower) / span
            } else {
                1.0
            };
            if bb_position <= tolerance
                && snapshot.rsi < self.cfg.rsi_oversold - self.cfg.rsi_momentum_margin
            {
                let strength = (self.cfg.rsi_oversold - snapshot.rsi) / self.cfg.rsi_oversold;
                return Some(self.build_signal(
                    Side::Long,
                    price,
                    snapshot,
                    strength,
                    "bb lower + rsi oversold",
                ));
            }
        }

        // short mirror
        if ema_div >= self.cfg.ema_confirmation_bps {
            let span = snapshot.bb_upper - snapshot.bb_middle;
            let bb_position = if span > 0.0 {
                (snapshot.bb_upper - price) / span
            } else {
                1.0
            };
            if bb_position <= tolerance
                && snapshot.rsi > self.cfg.rsi_overbought + self.cfg.rsi_momentum_margin
            {
                let strength =
                    (snapshot.rsi - self.cfg.rsi_overbought) / (100.0 - self.cfg.rsi_overbought);
                return Some(self.build_signal(
                    Side::Short,
                    price,
                    snapshot,
                    strength,
                    "bb upper + rsi overbought",
                ));
            }
        }

        None
    }

    fn check_exit(
        &self,
        price: f64,
        snapshot: &IndicatorSnapshot,
        position: &Position,
        now: f64,
    ) -> Option<ExitReason> {
        match position.side {
            Side::Long => {
                if price <= position.stop_loss {
                    return Some(ExitReason::StopLoss);
                }
                if price >= position.take_profit {
                    return Some(ExitReason::TakeProfit);
                }
            }
            Side::Short => {
                if price >= position.stop_loss {
                    return Some(ExitReason::StopLoss);
                }
                if price <= position.take_profit {
                    return Some(ExitReason::TakeProfit);
                }
            }
        }

        if position.held_secs(now) > self.max_hold_secs() {
            return Some(ExitReason::TimeStop);
        }

        // RSI crossing to the opposite threshold
        match position.side {
            Side::Long if snapshot.rsi > self.cfg.rsi_overbought => Some(ExitReason::TrendReversal),
            Side::Short if snapshot.rsi < self.cfg.rsi_oversold => Some(ExitReason::TrendReversal),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::Divergence;

    fn snapshot() -> IndicatorSnapshot {
        IndicatorSnapshot {
            ema_fast: 100.0,
            ema_slow: 100.0,
            bb_upper: 102.0,
            bb_middle: 100.0,
            bb_lower: 98.0,
            rsi: 50.0,
            atr: 0.1,
            atr_baseline: 0.1,
            volume_ma: 1000.0,
            last_volume: 0.0,
            last_close: 100.0,
            volatility_bps: 10.0,
            macd: 0.0,
            macd_signal: 0.0,
            macd_histogram: 0.0,
            ao: 0.0,
            ao_prev: 0.0,
            divergence: None::<Divergence>,
            recent_high: 102.0,
            recent_low: 98.0,
        }
    }

    fn policy() -> TrendPolicy {
        TrendPolicy::new(TrendConfig::default())
    }

    fn oversold_snapshot() -> IndicatorSnapshot {
        IndicatorSnapshot {
            rsi: 20.0,
            ema_fast: 99.0,
            ema_slow: 100.0, // -100 bps divergence
            ..snapshot()
        }
    }

    #[test]
    fn long_entry_fires_at_lower_band() {
        let snap = oversold_snapshot();
        let price = 98.05; // bb_position (98.05-98)/2 = 0.025 <= 0.05
        let signal = policy().check_entry(price, &snap).unwrap();
        assert_eq!(signal.side, Side::Long);
        assert!(signal.stop_loss < signal.entry_price);
        assert!(signal.take_profit > signal.entry_price);
        assert!((signal.strength - 10.0 / 30.0).abs() < 1e-9);
    }

    #[test]
    fn volatility_gate_blocks_entry() {
        let mut snap = oversold_snapshot();
        snap.volatility_bps = 1.0; // below min 4
        assert!(policy().check_entry(98.05, &snap).is_none());
        snap.volatility_bps = 30.0; // above max 25
        assert!(policy().check_entry(98.05, &snap).is_none());
    }

    #[test]
    fn ema_confirmation_required() {
        let mut snap = oversold_snapshot();
        snap.ema_fast = 100.0; // no divergence
        assert!(policy().check_entry(98.05, &snap).is_none());
        // divergence on the wrong side
        snap.ema_fast = 101.0;
        assert!(policy().check_entry(98.05, &snap).is_none());
    }

    #[test]
    fn volume_gate_skipped_without_volume() {
        let mut snap = oversold_snapshot();
        snap.last_volume = 0.0;
        assert!(policy().check_entry(98.05, &snap).is_some());
        // with volume present but thin, the gate applies
        snap.last_volume = 500.0; // < 1000 * 1.2
        assert!(policy().check_entry(98.05, &snap).is_none());
        snap.last_volume = 1500.0;
        assert!(policy().check_entry(98.05, &snap).is_some());
    }

    #[test]
    fn rsi_margin_enforced() {
        let mut snap = oversold_snapshot();
        snap.rsi = 29.0; // below threshold but within the 2-point margin
        assert!(policy().check_entry(98.05, &snap).is_none());
    }

    #[test]
    fn price_off_band_blocks_entry() {
        let snap = oversold_snapshot();
        // bb_position (99-98)/2 = 0.5 > 0.05
        assert!(policy().check_entry(99.0, &snap).is_none());
    }

    #[test]
    fn short_entry_mirror() {
        let snap = IndicatorSnapshot {
            rsi: 80.0,
            ema_fast: 101.0,
            ema_slow: 100.0,
            ..snapshot()
        };
        let signal = policy().check_entry(101.95, &snap).unwrap();
        assert_eq!(signal.side, Side::Short);
        assert!(signal.stop_loss > signal.entry_price);
        assert!(signal.take_profit < signal.entry_price);
    }

    #[test]
    fn size_clamped_to_bounds() {
        let mut snap = oversold_snapshot();
        snap.atr = 0.0001; // tiny atr -> below min size
        let signal = policy().check_entry(98.05, &snap).unwrap();
        assert_eq!(signal.size, 0.01);

        snap.atr = 1000.0;
        let signal = policy().check_entry(98.05, &snap).unwrap();
        assert_eq!(signal.size, 0.1);
    }

    fn open_long(entry: f64) -> Position {
        Position::open(
            &Signal {
                side: Side::Long,
                strength: 1.0,
                entry_price: entry,
                stop_loss: entry * (1.0 - 6.0 / 10_000.0),
                take_profit: entry * (1.0 + 3.0 / 10_000.0),
                size: 0.05,
                reason: "test".into(),
                breakout_level: None,
            },
            1,
            1_000.0,
        )
    }

    #[test]
    fn exit_priorities() {
        let p = policy();
        let snap = snapshot();
        let pos = open_long(100.0);

        assert_eq!(
            p.check_exit(pos.stop_loss - 0.001, &snap, &pos, 1_010.0),
            Some(ExitReason::StopLoss)
        );
        assert_eq!(
            p.check_exit(pos.take_profit + 0.001, &snap, &pos, 1_010.0),
            Some(ExitReason::TakeProfit)
        );
        assert_eq!(p.check_exit(100.0, &snap, &pos, 1_010.0), None);
    }

    #[test]
    fn time_stop_scales_with_interval() {
        let p = policy();
        let snap = snapshot();
        let pos = open_long(100.0);
        // 5 intervals of 60s = 300s
        assert_eq!(p.check_exit(100.0, &snap, &pos, 1_000.0 + 299.0), None);
        assert_eq!(
            p.check_exit(100.0, &snap, &pos, 1_000.0 + 301.0),
            Some(ExitReason::TimeStop)
        );
    }

    #[test]
    fn rsi_reversal_exit() {
        let p = policy();
        let snap = IndicatorSnapshot {
            rsi: 75.0,
            ..snapshot()
        };
        let pos = open_long(100.0);
        assert_eq!(
            p.check_exit(100.0, &snap, &pos, 1_010.0),
            Some(ExitReason::TrendReversal)
        );
    }
}
