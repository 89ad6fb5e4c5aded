//! Breakout policy on slower time-based candles with an ATR trailing stop.
//!
//! Entries require price to clear the recent range extreme while trend
//! (EMA alignment), momentum (RSI past a threshold, MACD on the right side
//! of its signal line) and volatility regime (ATR inside a band and
//! expanding versus its longer baseline) all agree. Stops and targets are
//! anchored at the broken level in ATR multiples; once the move has run far
//! enough the stop trails price at a fixed ATR distance.

use serde::{Deserialize, Serialize};

use crate::domain::{ExitReason, Position, Side, Signal};
use crate::indicators::{IndicatorConfig, IndicatorSnapshot};

use super::{clamp_size, SignalPolicy};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakoutConfig {
    pub candle_interval_secs: i64,
    pub ema_fast_period: usize,
    pub ema_slow_period: usize,
    pub rsi_period: usize,
    pub rsi_long_threshold: f64,
    pub rsi_short_threshold: f64,
    pub atr_period: usize,
    pub breakout_lookback: usize,
    pub min_atr_bps: f64,
    pub max_atr_bps: f64,
    /// ATR must be at least this multiple of its longer-window baseline.
    pub atr_expansion_ratio: f64,
    pub stop_atr_mult: f64,
    pub target_atr_mult: f64,
    /// Trailing activates once MFE reaches this many entry-ATRs.
    pub trail_activation_atr_mult: f64,
    pub trail_distance_atr_mult: f64,
    /// Abandon the trade if trailing never activates within this window.
    pub no_movement_secs: f64,
    pub max_hold_secs: f64,
    pub min_position_size: f64,
    pub max_position_size: f64,
}

impl Default for BreakoutConfig {
    fn default() -> Self {
        Self {
            candle_interval_secs: 900,
            ema_fast_period: 20,
            ema_slow_period: 50,
            rsi_period: 14,
            rsi_long_threshold: 60.0,
            rsi_short_threshold: 40.0,
            atr_period: 14,
            breakout_lookback: 30,
            min_atr_bps: 3.0,
            max_atr_bps: 15.0,
            atr_expansion_ratio: 1.1,
            stop_atr_mult: 1.5,
            target_atr_mult: 2.5,
            trail_activation_atr_mult: 1.0,
            trail_distance_atr_mult: 0.5,
            no_movement_secs: 1_800.0,
            max_hold_secs: 3_600.0,
            min_position_size: 0.01,
            max_position_size: 0.1,
        }
    }
}

/// Range-breakout policy.
#[derive(Debug, Clone)]
pub struct BreakoutPolicy {
    cfg: BreakoutConfig,
}

impl BreakoutPolicy {
    pub fn new(cfg: BreakoutConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &BreakoutConfig {
        &self.cfg
    }

    /// MFE threshold (bps of entry) at which trailing activates.
    fn activation_bps(&self, position: &Position) -> Option<f64> {
        let atr = position.entry_atr?;
        if position.entry_price <= 0.0 {
            return None;
        }
        Some(atr * self.cfg.trail_activation_atr_mult / position.entry_price * 10_000.0)
    }

    fn build_signal(&self, side: Side, price: f64, level: f64, snapshot: &IndicatorSnapshot) -> Signal {
        let atr = snapshot.atr;
        let (stop_loss, take_profit) = match side {
            Side::Long => (
                level - self.cfg.stop_atr_mult * atr,
                level + self.cfg.target_atr_mult * atr,
            ),
            Side::Short => (
                level + self.cfg.stop_atr_mult * atr,
                level - self.cfg.target_atr_mult * atr,
            ),
        };
        // strength grows with the breakout margin, saturating at 10 bps
        let margin_bps = ((price - level) / level).abs() * 10_000.0;
        let size = clamp_size(
            atr * 0.5 / price,
            self.cfg.min_position_size,
            self.cfg.max_position_size,
        );
        Signal {
            side,
            strength: (margin_bps / 10.0).clamp(0.0, 1.0),
            entry_price: price,
            stop_loss,
            take_profit,
            size,
            reason: match side {
                Side::Long => "range_breakout_up".to_string(),
                Side::Short => "range_breakout_down".to_string(),
            },
            breakout_level: Some(level),
        }
    }
}

impl SignalPolicy for BreakoutPolicy {
    fn name(&self) -> &'static str {
        "range_breakout"
    }

    fn indicator_config(&self) -> IndicatorConfig {
        IndicatorConfig {
            ema_fast_period: self.cfg.ema_fast_period,
            ema_slow_period: self.cfg.ema_slow_period,
            rsi_period: self.cfg.rsi_period,
            atr_period: self.cfg.atr_period,
            breakout_lookback: self.cfg.breakout_lookback,
            ..IndicatorConfig::default()
        }
    }

    fn check_entry(&self, price: f64, snapshot: &IndicatorSnapshot) -> Option<Signal> {
        if price <= 0.0 {
            return None;
        }
        let atr_bps = snapshot.atr / price * 10_000.0;
        if atr_bps < self.cfg.min_atr_bps || atr_bps > self.cfg.max_atr_bps {
            return None;
        }
        if !snapshot.atr_expanding(self.cfg.atr_expansion_ratio) {
            return None;
        }

        if price > snapshot.recent_high
            && snapshot.ema_fast > snapshot.ema_slow
            && snapshot.rsi >= self.cfg.rsi_long_threshold
            && snapshot.macd > snapshot.macd_signal
        {
            return Some(self.build_signal(Side::Long, price, snapshot.recent_high, snapshot));
        }

        if price < snapshot.recent_low
            && snapshot.ema_fast < snapshot.ema_slow
            && snapshot.rsi <= self.cfg.rsi_short_threshold
            && snapshot.macd < snapshot.macd_signal
        {
            return Some(self.build_signal(Side::Short, price, snapshot.recent_low, snapshot));
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
                    return Some(if position.trailing_active {
                        ExitReason::TrailingStop
                    } else {
                        ExitReason::StopLoss
                    });
                }
                if price >= position.take_profit {
                    return Some(ExitReason::TakeProfit);
                }
            }
            Side::Short => {
                if price >= position.stop_loss {
                    return Some(if position.trailing_active {
                        ExitReason::TrailingStop
                    } else {
                        ExitReason::StopLoss
                    });
                }
                if price <= position.take_profit {
                    return Some(ExitReason::TakeProfit);
                }
            }
        }

        // close back through the broken level invalidates the breakout
        if let Some(level) = position.breakout_level {
            let failed = match position.side {
                Side::Long => snapshot.last_close < level,
                Side::Short => snapshot.last_close > level,
            };
            if failed {
                return Some(ExitReason::BreakoutFailure);
            }
        }

        let held = position.held_secs(now);
        if held > self.cfg.no_movement_secs && !position.trailing_active {
            return Some(ExitReason::NoMovement);
        }
        if held > self.cfg.max_hold_secs {
            return Some(ExitReason::TimeStop);
        }

        None
    }

    fn propose_stop(
        &self,
        price: f64,
        _snapshot: &IndicatorSnapshot,
        position: &Position,
    ) -> Option<f64> {
        let activation = self.activation_bps(position)?;
        let atr = position.entry_atr?;
        if !position.trailing_active && position.mfe_bps < activation {
            return None;
        }
        let distance = self.cfg.trail_distance_atr_mult * atr;
        Some(match position.side {
            Side::Long => price - distance,
            Side::Short => price + distance,
        })
    }
}
