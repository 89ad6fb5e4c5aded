//! Strategy loop — one async task per enabled strategy.
//!
//! Fixed cadence, no cycle overlap: each iteration runs the whole
//! pipeline (price → series → snapshot → lifecycle) to completion before
//! the next sleep. Shutdown is cooperative through a `watch` channel,
//! checked at the loop top and across every sleep; an open position is
//! force-exited before the task returns.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, warn};

use tradewind_core::indicators::IndicatorSnapshot;
use tradewind_core::policy::SignalPolicy;
use tradewind_core::series::{CandleWindow, RenkoSeries};

use crate::lifecycle::PositionLifecycle;
use crate::price::PriceSource;
use crate::source::CandleSource;
use crate::store::TradeStore;

/// How the raw price stream is aggregated for the policy.
pub enum SeriesMode {
    Candles {
        window: CandleWindow,
    },
    Renko {
        series: RenkoSeries,
    },
}

pub struct StrategyRunner {
    market: String,
    policy: Arc<dyn SignalPolicy>,
    mode: SeriesMode,
    lifecycle: PositionLifecycle,
    price: Arc<dyn PriceSource>,
    candle_source: Option<Arc<dyn CandleSource>>,
    store: Arc<dyn TradeStore>,
    poll_interval: Duration,
    error_delay: Duration,
    backfill_interval_secs: f64,
    backfill_limit: usize,
    last_backfill: f64,
    shutdown: watch::Receiver<bool>,
}

impl StrategyRunner {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        market: impl Into<String>,
        policy: Arc<dyn SignalPolicy>,
        mode: SeriesMode,
        lifecycle: PositionLifecycle,
        price: Arc<dyn PriceSource>,
        candle_source: Option<Arc<dyn CandleSource>>,
        store: Arc<dyn TradeStore>,
        poll_interval_secs: f64,
        error_delay_secs: f64,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            market: market.into(),
            policy,
            mode,
            lifecycle,
            price,
            candle_source,
            store,
            poll_interval: Duration::from_secs_f64(poll_interval_secs),
            error_delay: Duration::from_secs_f64(error_delay_secs),
            backfill_interval_secs: 60.0,
            backfill_limit: 100,
            last_backfill: 0.0,
            shutdown,
        }
    }

    /// Run until the shutdown channel flips. Never returns early on cycle
    /// errors; those are logged and followed by the error delay.
    pub async fn run(mut self) {
        let strategy = self.policy.name();
        info!(strategy, market = %self.market, "strategy task starting");
        self.lifecycle.recover().await;

        if let SeriesMode::Renko { series } = &mut self.mode {
            match self.store.load_bricks(&self.market).await {
                Ok(bricks) if !bricks.is_empty() => {
                    info!(
                        strategy,
                        market = %self.market,
                        restored = bricks.len(),
                        "brick history restored"
                    );
                    series.restore(bricks);
                }
                Ok(_) => {}
                Err(error) => {
                    warn!(strategy, market = %self.market, %error, "brick recovery failed");
                }
            }
        }

        loop {
            if *self.shutdown.borrow() {
                break;
            }
            match self.cycle().await {
                Ok(()) => {
                    if self.sleep_or_shutdown(self.poll_interval).await {
                        break;
                    }
                }
                Err(error) => {
                    error!(strategy, market = %self.market, %error, "cycle failed");
                    if self.sleep_or_shutdown(self.error_delay).await {
                        break;
                    }
                }
            }
        }

        if let Some(price) = self.price.current_price(&self.market) {
            let now = unix_now();
            if let Err(error) = self.lifecycle.force_exit(price, now).await {
                error!(strategy, market = %self.market, %error, "shutdown force-exit failed");
            }
        } else if self.lifecycle.position().is_some() {
            warn!(
                strategy,
                market = %self.market,
                "shutting down with an open position and no price to exit at"
            );
        }
        info!(strategy, market = %self.market, "strategy task stopped");
    }

    /// One engine cycle. Missing price or a short window are normal early
    /// states, not errors.
    async fn cycle(&mut self) -> anyhow::Result<()> {
        let now = unix_now();
        let Some(price) = self.price.current_price(&self.market) else {
            debug!(market = %self.market, "no price yet");
            return Ok(());
        };

        self.maybe_backfill(now).await;

        let cfg = self.policy.indicator_config();
        let (snapshot, volatility_bps) = match &mut self.mode {
            SeriesMode::Candles { window } => {
                window.observe(price, now as i64);
                match IndicatorSnapshot::from_candles(window.candles(), &cfg) {
                    Ok(snapshot) => {
                        let vol = snapshot.volatility_bps;
                        (snapshot, vol)
                    }
                    Err(not_ready) => {
                        debug!(market = %self.market, %not_ready, "pipeline warming up");
                        return Ok(());
                    }
                }
            }
            SeriesMode::Renko { series } => {
                if series.observe(price, now as i64) {
                    if let Err(error) = self.store.save_bricks(&self.market, series.bricks()).await
                    {
                        warn!(market = %self.market, %error, "brick persistence failed");
                    }
                }
                match IndicatorSnapshot::from_bricks(series.bricks(), &cfg) {
                    Ok(snapshot) => {
                        // bricks have near-constant realized volatility by
                        // construction; the brick size itself is the proxy
                        let vol = series
                            .brick_size()
                            .map(|size| size / price * 10_000.0)
                            .unwrap_or(0.0);
                        (snapshot, vol)
                    }
                    Err(not_ready) => {
                        debug!(market = %self.market, %not_ready, "pipeline warming up");
                        return Ok(());
                    }
                }
            }
        };

        self.lifecycle
            .on_cycle(price, &snapshot, self.policy.as_ref(), volatility_bps, now)
            .await
    }

    async fn maybe_backfill(&mut self, now: f64) {
        let SeriesMode::Candles { window } = &mut self.mode else {
            return;
        };
        let Some(source) = self.candle_source.as_ref() else {
            return;
        };
        if now - self.last_backfill < self.backfill_interval_secs {
            return;
        }
        self.last_backfill = now;

        match source
            .fetch_candles(&self.market, window.interval_secs(), self.backfill_limit)
            .await
        {
            Ok(batch) if !batch.is_empty() => {
                debug!(market = %self.market, fetched = batch.len(), "candle backfill");
                window.backfill(batch);
                if let Err(error) = self.store.save_candles(&self.market, window.candles()).await {
                    warn!(market = %self.market, %error, "candle persistence failed");
                }
            }
            Ok(_) => {}
            Err(error) => {
                warn!(market = %self.market, %error, "candle backfill failed");
            }
        }
    }

    /// Sleep for `duration`, returning `true` if shutdown fired first.
    async fn sleep_or_shutdown(&mut self, duration: Duration) -> bool {
        tokio::select! {
            _ = sleep(duration) => false,
            changed = self.shutdown.changed() => {
                changed.is_err() || *self.shutdown.borrow()
            }
        }
    }
}

fn unix_now() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1_000.0
}
