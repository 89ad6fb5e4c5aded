//! Divergence policy on Renko bricks, with scale-in averaging.
//!
//! Entries come from price/oscillator divergence on the brick series; the
//! signal is strengthened when the brick close also sits in the outer band
//! zone on the same side. Open positions may scale in against adverse moves
//! while a fresh divergence keeps arguing for the original side.

use serde::{Deserialize, Serialize};

use crate::domain::{ExitReason, Position, Side, Signal};
use crate::indicators::{DivergenceKind, IndicatorConfig, IndicatorSnapshot};

use super::{clamp_size, ScaleRequest, SignalPolicy};

/// Exchange-level floor on order size.
pub(crate) const MIN_ORDER_SIZE: f64 = 0.001;

/// Scale-in behavior for [`RenkoAoPolicy`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalingConfig {
    pub max_scale_ins: usize,
    /// Each scale order is this fraction of the initial size.
    pub scale_size_fraction: f64,
    /// Minimum seconds since the last fill before another scale.
    pub min_scale_interval_secs: f64,
    /// Adverse move from the average entry required before scaling, in bps.
    pub scale_threshold_bps: f64,
}

impl Default for ScalingConfig {
    fn default() -> Self {
        Self {
            max_scale_ins: 3,
            scale_size_fraction: 0.5,
            min_scale_interval_secs: 60.0,
            scale_threshold_bps: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenkoAoConfig {
    pub brick_atr_period: usize,
    pub brick_multiplier: f64,
    pub bb_period: usize,
    pub bb_std: f64,
    pub ao_fast_period: usize,
    pub ao_slow_period: usize,
    pub divergence_lookback: usize,
    pub min_divergence_strength: f64,
    /// Band zone (full-span position) that boosts bullish entries.
    pub bb_low_zone: f64,
    /// Band zone that boosts bearish entries.
    pub bb_high_zone: f64,
    pub strength_boost: f64,
    pub take_profit_bps: f64,
    pub stop_loss_bps: f64,
    pub max_hold_secs: f64,
    /// Sizing factor applied to the oscillator magnitude.
    pub size_ao_factor: f64,
    pub min_position_size: f64,
    pub max_position_size: f64,
    pub scaling: ScalingConfig,
}

impl Default for RenkoAoConfig {
    fn default() -> Self {
        Self {
            brick_atr_period: 14,
            brick_multiplier: 1.0,
            bb_period: 20,
            bb_std: 2.0,
            ao_fast_period: 5,
            ao_slow_period: 34,
            divergence_lookback: 20,
            min_divergence_strength: 0.05,
            bb_low_zone: 0.2,
            bb_high_zone: 0.8,
            strength_boost: 1.5,
            take_profit_bps: 12.0,
            stop_loss_bps: 7.0,
            max_hold_secs: 480.0,
            size_ao_factor: 0.1,
            min_position_size: 0.001,
            max_position_size: 0.1,
            scaling: ScalingConfig::default(),
        }
    }
}

/// Renko divergence policy.
#[derive(Debug, Clone)]
pub struct RenkoAoPolicy {
    cfg: RenkoAoConfig,
}

impl RenkoAoPolicy {
    pub fn new(cfg: RenkoAoConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &RenkoAoConfig {
        &self.cfg
    }
}

impl SignalPolicy for RenkoAoPolicy {
    fn name(&self) -> &'static str {
        "renko_divergence"
    }

    fn indicator_config(&self) -> IndicatorConfig {
        IndicatorConfig {
            bb_period: self.cfg.bb_period,
            bb_std: self.cfg.bb_std,
            ao_fast_period: self.cfg.ao_fast_period,
            ao_slow_period: self.cfg.ao_slow_period,
            divergence_lookback: self.cfg.divergence_lookback,
            atr_period: self.cfg.brick_atr_period,
            // macd is unused on bricks; keep its warmup under the oscillator's
            macd_fast: 5,
            macd_slow: 10,
            macd_signal: 3,
            ..IndicatorConfig::default()
        }
    }

    fn check_entry(&self, price: f64, snapshot: &IndicatorSnapshot) -> Option<Signal> {
        let divergence = snapshot.divergence?;
        if divergence.strength < self.cfg.min_divergence_strength {
            return None;
        }

        let side = divergence.kind.side();
        let bb_position = snapshot.bb_position(price);
        let boosted = match divergence.kind {
            DivergenceKind::Bullish => bb_position <= self.cfg.bb_low_zone,
            DivergenceKind::Bearish => bb_position >= self.cfg.bb_high_zone,
        };
        let strength = if boosted {
            (divergence.strength * self.cfg.strength_boost).min(1.0)
        } else {
            divergence.strength
        };

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
            snapshot.ao.abs() * self.cfg.size_ao_factor / price,
            self.cfg.min_position_size,
            self.cfg.max_position_size,
        )
        .max(MIN_ORDER_SIZE);

        Some(Signal {
            side,
            strength,
            entry_price: price,
            stop_loss,
            take_profit,
            size,
            reason: format!("{}_divergence", divergence.kind.as_str()),
            breakout_level: None,
        })
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

        if position.held_secs(now) > self.cfg.max_hold_secs {
            return Some(ExitReason::TimeStop);
        }

        // oscillator turned over and crossed zero against the position
        match position.side {
            Side::Long if snapshot.ao_falling() && snapshot.ao < 0.0 => {
                Some(ExitReason::AoReversal)
            }
            Side::Short if snapshot.ao_rising() && snapshot.ao > 0.0 => {
                Some(ExitReason::AoReversal)
            }
            _ => None,
        }
    }

    fn check_scale(
        &self,
        price: f64,
        snapshot: &IndicatorSnapshot,
        position: &Position,
        now: f64,
    ) -> Option<ScaleRequest> {
        let scaling = &self.cfg.scaling;
        if position.scale_count() >= scaling.max_scale_ins {
            return None;
        }

        let divergence = snapshot.divergence?;
        if divergence.kind.side() != position.side
            || divergence.strength < self.cfg.min_divergence_strength
        {
            return None;
        }

        if now - position.last_fill_time() < scaling.min_scale_interval_secs {
            return None;
        }

        // only average in against an adverse move
        let adverse_bps = -position.pnl_pct(price) * 100.0;
        if adverse_bps < scaling.scale_threshold_bps {
            return None;
        }

        let size = clamp_size(
            position.initial_size * scaling.scale_size_fraction,
            MIN_ORDER_SIZE,
            self.cfg.max_position_size,
        );
        let stop_multiplier = 1.5 + 0.5 * (position.scale_count() + 1) as f64;

        Some(ScaleRequest {
            size,
            stop_loss_bps: self.cfg.stop_loss_bps,
            stop_multiplier,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::Divergence;

    fn snapshot(divergence: Option<Divergence>) -> IndicatorSnapshot {
        IndicatorSnapshot {
            ema_fast: 100.0,
            ema_slow: 100.0,
            bb_upper: 102.0,
            bb_middle: 100.0,
            bb_lower: 98.0,
            rsi: 50.0,
            atr: 0.1,
            atr_baseline: 0.1,
            volume_ma: 0.0,
            last_volume: 0.0,
            last_close: 100.0,
            volatility_bps: 5.0,
            macd: 0.0,
            macd_signal: 0.0,
            macd_histogram: 0.0,
            ao: 2.0,
            ao_prev: 1.0,
            divergence,
            recent_high: 102.0,
            recent_low: 98.0,
        }
    }

    fn bullish(strength: f64) -> Option<Divergence> {
        Some(Divergence {
            kind: DivergenceKind::Bullish,
            strength,
        })
    }

    fn policy() -> RenkoAoPolicy {
        RenkoAoPolicy::new(RenkoAoConfig::default())
    }

    #[test]
    fn no_divergence_no_entry() {
        assert!(policy().check_entry(100.0, &snapshot(None)).is_none());
    }

    #[test]
    fn weak_divergence_rejected() {
        let snap = snapshot(bullish(0.04));
        assert!(policy().check_entry(100.0, &snap).is_none());
    }

    #[test]
    fn bullish_entry_basic() {
        let snap = snapshot(bullish(0.3));
        let signal = policy().check_entry(100.0, &snap).unwrap();
        assert_eq!(signal.side, Side::Long);
        assert!((signal.strength - 0.3).abs() < 1e-9);
        assert!(signal.stop_loss < 100.0);
        assert!(signal.take_profit > 100.0);
        assert_eq!(signal.reason, "bullish_divergence");
    }

    #[test]
    fn band_zone_boosts_strength() {
        let snap = snapshot(bullish(0.3));
        // bb_position (98.5 - 98) / 4 = 0.125 <= 0.2
        let signal = policy().check_entry(98.5, &snap).unwrap();
        assert!((signal.strength - 0.45).abs() < 1e-9);

        // boost is capped at 1.0
        let snap = snapshot(bullish(0.9));
        let signal = policy().check_entry(98.5, &snap).unwrap();
        assert!((signal.strength - 1.0).abs() < 1e-9);
    }

    #[test]
    fn size_from_oscillator_magnitude() {
        let mut snap = snapshot(bullish(0.3));
        snap.ao = 50.0; // 50 * 0.1 / 100 = 0.05
        let signal = policy().check_entry(100.0, &snap).unwrap();
        assert!((signal.size - 0.05).abs() < 1e-9);

        snap.ao = 0.001; // clamps to floor
        let signal = policy().check_entry(100.0, &snap).unwrap();
        assert_eq!(signal.size, MIN_ORDER_SIZE);

        snap.ao = 1_000.0; // clamps to max
        let signal = policy().check_entry(100.0, &snap).unwrap();
        assert_eq!(signal.size, 0.1);
    }

    fn open_long(entry: f64, entry_time: f64) -> Position {
        Position::open(
            &Signal {
                side: Side::Long,
                strength: 0.5,
                entry_price: entry,
                stop_loss: entry * (1.0 - 7.0 / 10_000.0),
                take_profit: entry * (1.0 + 12.0 / 10_000.0),
                size: 0.01,
                reason: "bullish_divergence".into(),
                breakout_level: None,
            },
            1,
            entry_time,
        )
    }

    #[test]
    fn ao_reversal_exit() {
        let p = policy();
        let pos = open_long(100.0, 1_000.0);

        let mut snap = snapshot(None);
        snap.ao = -0.5;
        snap.ao_prev = 0.5;
        assert_eq!(
            p.check_exit(100.0, &snap, &pos, 1_010.0),
            Some(ExitReason::AoReversal)
        );

        // falling but still positive: hold
        snap.ao = 0.5;
        snap.ao_prev = 1.0;
        assert_eq!(p.check_exit(100.0, &snap, &pos, 1_010.0), None);
    }

    #[test]
    fn time_stop_after_max_hold() {
        let p = policy();
        let pos = open_long(100.0, 1_000.0);
        let snap = snapshot(None);
        assert_eq!(p.check_exit(100.0, &snap, &pos, 1_000.0 + 479.0), None);
        assert_eq!(
            p.check_exit(100.0, &snap, &pos, 1_000.0 + 481.0),
            Some(ExitReason::TimeStop)
        );
    }

    #[test]
    fn scale_requires_matching_divergence_and_adverse_move() {
        let p = policy();
        let pos = open_long(100.0, 1_000.0);
        let now = 1_100.0; // past the 60s interval

        // adverse 10 bps, bullish divergence: scale
        let snap = snapshot(bullish(0.3));
        let req = p.check_scale(99.9, &snap, &pos, now).unwrap();
        assert!((req.size - 0.005).abs() < 1e-9);
        assert!((req.stop_multiplier - 2.0).abs() < 1e-9);
        assert_eq!(req.stop_loss_bps, 7.0);

        // adverse move too small
        assert!(p.check_scale(99.98, &snap, &pos, now).is_none());

        // divergence on the wrong side
        let snap = snapshot(Some(Divergence {
            kind: DivergenceKind::Bearish,
            strength: 0.3,
        }));
        assert!(p.check_scale(99.9, &snap, &pos, now).is_none());

        // no divergence at all
        assert!(p.check_scale(99.9, &snapshot(None), &pos, now).is_none());
    }

    #[test]
    fn scale_respects_interval_and_count() {
        let p = policy();
        let mut pos = open_long(100.0, 1_000.0);
        let snap = snapshot(bullish(0.3));

        // too soon after entry fill
        assert!(p.check_scale(99.9, &snap, &pos, 1_030.0).is_none());

        // exhaust the scale budget
        for i in 0..3 {
            let now = 1_100.0 + i as f64 * 100.0;
            let req = p.check_scale(99.9, &snap, &pos, now).unwrap();
            pos.apply_scale(99.9, req.size, now, 10 + i as u64);
        }
        assert_eq!(pos.scale_count(), 3);
        assert!(p.check_scale(99.0, &snap, &pos, 2_000.0).is_none());
    }

    #[test]
    fn stop_multiplier_widens_with_scale_count() {
        let p = policy();
        let mut pos = open_long(100.0, 1_000.0);
        let snap = snapshot(bullish(0.3));

        let req = p.check_scale(99.9, &snap, &pos, 1_100.0).unwrap();
        assert!((req.stop_multiplier - 2.0).abs() < 1e-9);
        pos.apply_scale(99.9, req.size, 1_100.0, 2);

        let req = p.check_scale(99.8, &snap, &pos, 1_200.0).unwrap();
        assert!((req.stop_multiplier - 2.5).abs() < 1e-9);
        pos.apply_scale(99.8, req.size, 1_200.0, 3);

        let req = p.check_scale(99.7, &snap, &pos, 1_300.0).unwrap();
        assert!((req.stop_multiplier - 3.0).abs() < 1e-9);
    }
}
