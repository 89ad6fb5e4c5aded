//! Position lifecycle — the state machine driving one position at a time.
//!
//! Flat → Entering → Open → {Scaling, Exiting} → Flat. The lifecycle owns
//! the position, talks to the order router with a bounded retry policy,
//! keeps the risk state fed, persists snapshots for crash recovery, and
//! emits exactly one trade record per closed position.
//!
//! An exit whose order submission hard-fails is NOT treated as closed:
//! the position stays `Open` and the error propagates to the loop
//! boundary for the operator to see.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use rand::Rng;
use tracing::{debug, info, warn};

use tradewind_core::domain::{ExitReason, Position, Side, Signal, TradeRecord};
use tradewind_core::indicators::IndicatorSnapshot;
use tradewind_core::policy::SignalPolicy;
use tradewind_core::risk::{ratchet_stop, EngineState, RiskConfig};

use crate::router::{OrderError, OrderRouter, PlacedOrder};
use crate::store::TradeStore;
use crate::telemetry::Telemetry;

/// Venue-level minimum order size.
const VENUE_MIN_SIZE: f64 = 0.001;
/// Total submission attempts for rate-limited orders.
const MAX_SUBMIT_ATTEMPTS: u32 = 3;
/// Wait before the single invalid-nonce retry.
const NONCE_RETRY_SECS: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleConfig {
    /// Simulate fills instead of calling the router.
    pub dry_run: bool,
    pub post_only: bool,
    /// Entries whose computed size falls below this are skipped.
    pub min_position_size: f64,
    /// Resting orders older than this are swept before new placements.
    pub order_timeout_secs: f64,
    /// Relative limit-price nudge across the spread (1e-4 = 1 bp).
    pub price_nudge: f64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            dry_run: true,
            post_only: false,
            min_position_size: VENUE_MIN_SIZE,
            order_timeout_secs: 30.0,
            price_nudge: 1e-4,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct RestingOrder {
    order_id: u64,
    placed_at: f64,
}

/// Lifecycle manager for one strategy instance. Owns at most one position.
pub struct PositionLifecycle {
    strategy: &'static str,
    market: String,
    cfg: LifecycleConfig,
    router: Arc<dyn OrderRouter>,
    store: Arc<dyn TradeStore>,
    telemetry: Arc<dyn Telemetry>,
    state: EngineState,
    position: Option<Position>,
    open_orders: Vec<RestingOrder>,
    synthetic_index: u64,
}

impl PositionLifecycle {
    pub fn new(
        strategy: &'static str,
        market: impl Into<String>,
        cfg: LifecycleConfig,
        risk: RiskConfig,
        router: Arc<dyn OrderRouter>,
        store: Arc<dyn TradeStore>,
        telemetry: Arc<dyn Telemetry>,
    ) -> Self {
        Self {
            strategy,
            market: market.into(),
            cfg,
            router,
            store,
            telemetry,
            state: EngineState::new(risk),
            position: None,
            open_orders: Vec::new(),
            synthetic_index: chrono::Utc::now().timestamp_millis().max(1) as u64,
        }
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn risk_state(&self) -> &EngineState {
        &self.state
    }

    /// Resume a saved position from a previous run, if the store has one.
    pub async fn recover(&mut self) {
        match self.store.load_position(self.strategy).await {
            Ok(Some(mut position)) => {
                position.recovered = true;
                info!(
                    strategy = self.strategy,
                    market = %self.market,
                    side = %position.side,
                    entry_price = position.entry_price,
                    size = position.size,
                    "resuming recovered position"
                );
                self.position = Some(position);
            }
            Ok(None) => {}
            Err(error) => {
                warn!(strategy = self.strategy, %error, "position recovery failed");
            }
        }
    }

    /// One engine cycle: sweep, mark, exit/trail/scale while open, or look
    /// for an entry while flat. `now` is unix seconds; `volatility_bps`
    /// drives the adaptive cooldown.
    pub async fn on_cycle(
        &mut self,
        price: f64,
        snapshot: &IndicatorSnapshot,
        policy: &dyn SignalPolicy,
        volatility_bps: f64,
        now: f64,
    ) -> anyhow::Result<()> {
        self.sweep_stale(now).await;
        self.state.update_cooldown(volatility_bps);
        self.telemetry
            .gauge(&format!("{}.price", self.strategy), price);

        if self.position.is_some() {
            self.manage_open(price, snapshot, policy, now).await
        } else {
            self.seek_entry(price, snapshot, policy, now).await
        }
    }

    /// Force-close any open position (shutdown path).
    pub async fn force_exit(&mut self, price: f64, now: f64) -> anyhow::Result<()> {
        if self.position.is_some() {
            info!(strategy = self.strategy, market = %self.market, "forcing exit on shutdown");
            self.execute_exit(price, ExitReason::Shutdown, now)
                .await
                .context("forced exit failed, position snapshot remains saved")?;
        }
        Ok(())
    }

    async fn manage_open(
        &mut self,
        price: f64,
        snapshot: &IndicatorSnapshot,
        policy: &dyn SignalPolicy,
        now: f64,
    ) -> anyhow::Result<()> {
        let Some(position) = self.position.as_mut() else {
            return Ok(());
        };
        position.mark(price);
        self.telemetry.gauge(
            &format!("{}.position_size", self.strategy),
            position.side.sign() * position.size,
        );

        if let Some(reason) = policy.check_exit(price, snapshot, position, now) {
            return self
                .execute_exit(price, reason, now)
                .await
                .context("exit order failed, position remains open");
        }

        // trailing stop: policy proposes, the ratchet only ever tightens
        if let Some(proposal) = policy.propose_stop(price, snapshot, position) {
            let Some(position) = self.position.as_mut() else {
                return Ok(());
            };
            if !position.trailing_active {
                position.trailing_active = true;
                info!(
                    strategy = self.strategy,
                    market = %self.market,
                    "trailing stop activated"
                );
            }
            if let Some(stop) = ratchet_stop(position.side, position.stop_loss, proposal) {
                debug!(
                    strategy = self.strategy,
                    old_stop = position.stop_loss,
                    new_stop = stop,
                    "trailing stop tightened"
                );
                position.stop_loss = stop;
                let snapshot_pos = position.clone();
                if let Err(error) = self.store.save_position(self.strategy, &snapshot_pos).await {
                    warn!(strategy = self.strategy, %error, "position snapshot save failed");
                }
            }
        }

        let Some(position) = self.position.as_ref() else {
            return Ok(());
        };
        if let Some(request) = policy.check_scale(price, snapshot, position, now) {
            self.execute_scale(price, request, now)
                .await
                .context("scale-in order failed")?;
        }

        Ok(())
    }

    async fn seek_entry(
        &mut self,
        price: f64,
        snapshot: &IndicatorSnapshot,
        policy: &dyn SignalPolicy,
        now: f64,
    ) -> anyhow::Result<()> {
        if !self.state.can_enter(now) {
            debug!(strategy = self.strategy, "entry gated by cooldown or pause");
            return Ok(());
        }
        let Some(signal) = policy.check_entry(price, snapshot) else {
            return Ok(());
        };

        let floor = self.cfg.min_position_size.max(VENUE_MIN_SIZE);
        if signal.size < floor {
            warn!(
                strategy = self.strategy,
                size = signal.size,
                floor,
                "entry skipped: size below minimum"
            );
            return Ok(());
        }

        self.execute_entry(signal, snapshot.atr, now)
            .await
            .context("entry order failed")
    }

    async fn execute_entry(
        &mut self,
        signal: Signal,
        atr: f64,
        now: f64,
    ) -> anyhow::Result<()> {
        let limit_price = self.nudged_price(signal.side, signal.entry_price);
        let order_id = if self.cfg.dry_run {
            self.next_synthetic_id()
        } else {
            let placed = self
                .submit_with_retry(signal.side, limit_price, signal.size)
                .await?;
            self.open_orders.push(RestingOrder {
                order_id: placed.order_id,
                placed_at: now,
            });
            placed.order_id
        };

        let mut position = Position::open(&signal, order_id, now);
        position.entry_atr = Some(atr);
        info!(
            strategy = self.strategy,
            market = %self.market,
            side = %signal.side,
            entry_price = signal.entry_price,
            stop_loss = signal.stop_loss,
            take_profit = signal.take_profit,
            size = signal.size,
            strength = signal.strength,
            reason = %signal.reason,
            dry_run = self.cfg.dry_run,
            "entered position"
        );
        if let Err(error) = self.store.save_position(self.strategy, &position).await {
            warn!(strategy = self.strategy, %error, "position snapshot save failed");
        }
        self.position = Some(position);
        Ok(())
    }

    async fn execute_exit(
        &mut self,
        price: f64,
        reason: ExitReason,
        now: f64,
    ) -> anyhow::Result<()> {
        let Some(position) = self.position.as_mut() else {
            return Ok(());
        };
        position.mark(price);
        let exit_side = position.side.opposite();
        let exit_size = position.size;
        let limit_price = self.nudged_price(exit_side, price);

        if !self.cfg.dry_run {
            // clear every resting order (entry, scales, strays) first
            let resting: Vec<RestingOrder> = self.open_orders.drain(..).collect();
            for order in resting {
                if let Err(error) = self.router.cancel_order(&self.market, order.order_id).await {
                    warn!(
                        strategy = self.strategy,
                        order_id = order.order_id,
                        %error,
                        "cancel before exit failed"
                    );
                }
            }
            // a failed exit leaves the position open
            self.submit_with_retry(exit_side, limit_price, exit_size)
                .await?;
        }

        let Some(position) = self.position.take() else {
            return Ok(());
        };
        let trade = TradeRecord::from_close(self.strategy, &self.market, &position, price, now, reason);
        info!(
            strategy = self.strategy,
            market = %self.market,
            side = %trade.side,
            exit_reason = %reason,
            entry_price = trade.entry_price,
            exit_price = price,
            pnl_pct = trade.pnl_pct,
            mfe_bps = trade.mfe_bps,
            mae_bps = trade.mae_bps,
            scale_count = trade.scale_count,
            recovered = trade.recovered,
            "closed position"
        );
        if let Err(error) = self.store.record_trade(&trade).await {
            warn!(strategy = self.strategy, %error, "trade record save failed");
        }
        if let Err(error) = self.store.clear_position(self.strategy).await {
            warn!(strategy = self.strategy, %error, "position snapshot clear failed");
        }
        self.state.record_exit(reason, trade.pnl_pct, now);
        self.open_orders.clear();
        Ok(())
    }

    async fn execute_scale(
        &mut self,
        price: f64,
        request: tradewind_core::policy::ScaleRequest,
        now: f64,
    ) -> anyhow::Result<()> {
        let Some(side) = self.position.as_ref().map(|position| position.side) else {
            return Ok(());
        };
        let size = request.size.max(VENUE_MIN_SIZE);
        let limit_price = self.nudged_price(side, price);

        let order_id = if self.cfg.dry_run {
            self.next_synthetic_id()
        } else {
            let placed = self.submit_with_retry(side, limit_price, size).await?;
            self.open_orders.push(RestingOrder {
                order_id: placed.order_id,
                placed_at: now,
            });
            placed.order_id
        };

        let Some(position) = self.position.as_mut() else {
            return Ok(());
        };
        position.apply_scale(price, size, now, order_id);
        // re-anchor the stop around the new average, widened by the multiplier
        let widened = request.stop_loss_bps * request.stop_multiplier / 10_000.0;
        position.stop_loss = match side {
            Side::Long => position.entry_price * (1.0 - widened),
            Side::Short => position.entry_price * (1.0 + widened),
        };
        info!(
            strategy = self.strategy,
            market = %self.market,
            scale_count = position.scale_count(),
            size,
            avg_entry = position.entry_price,
            new_stop = position.stop_loss,
            "scaled into position"
        );
        let snapshot_pos = position.clone();
        if let Err(error) = self.store.save_position(self.strategy, &snapshot_pos).await {
            warn!(strategy = self.strategy, %error, "position snapshot save failed");
        }
        Ok(())
    }

    /// Cancel resting orders older than the order timeout.
    async fn sweep_stale(&mut self, now: f64) {
        if self.cfg.dry_run || self.open_orders.is_empty() {
            return;
        }
        let timeout = self.cfg.order_timeout_secs;
        let (stale, fresh): (Vec<RestingOrder>, Vec<RestingOrder>) = self
            .open_orders
            .drain(..)
            .partition(|order| now - order.placed_at > timeout);
        self.open_orders = fresh;
        for order in stale {
            match self.router.cancel_order(&self.market, order.order_id).await {
                Ok(()) => {
                    info!(
                        strategy = self.strategy,
                        order_id = order.order_id,
                        age_secs = now - order.placed_at,
                        "cancelled stale order"
                    );
                }
                Err(error) => {
                    warn!(
                        strategy = self.strategy,
                        order_id = order.order_id,
                        %error,
                        "stale order cancel failed"
                    );
                }
            }
        }
    }

    /// Bounded submission retries: exponential backoff for rate limits,
    /// exactly one retry for an invalid nonce, everything else aborts.
    async fn submit_with_retry(
        &self,
        side: Side,
        price: f64,
        size: f64,
    ) -> Result<PlacedOrder, OrderError> {
        let mut nonce_retried = false;
        let mut attempt: u32 = 0;
        loop {
            match self
                .router
                .submit_limit_order(&self.market, side, price, size, self.cfg.post_only)
                .await
            {
                Ok(placed) => return Ok(placed),
                Err(OrderError::RateLimited) if attempt + 1 < MAX_SUBMIT_ATTEMPTS => {
                    let delay = f64::powi(2.0, attempt as i32)
                        + rand::thread_rng().gen_range(0.0..0.25);
                    warn!(
                        strategy = self.strategy,
                        attempt,
                        delay_secs = delay,
                        "rate limited, backing off"
                    );
                    tokio::time::sleep(Duration::from_secs_f64(delay)).await;
                    attempt += 1;
                }
                Err(OrderError::InvalidNonce) if !nonce_retried => {
                    warn!(strategy = self.strategy, "invalid nonce, retrying once");
                    tokio::time::sleep(Duration::from_secs_f64(NONCE_RETRY_SECS)).await;
                    nonce_retried = true;
                }
                Err(error) => return Err(error),
            }
        }
    }

    /// Limit price nudged across the spread so resting orders actually fill.
    fn nudged_price(&self, side: Side, price: f64) -> f64 {
        match side {
            Side::Long => price * (1.0 + self.cfg.price_nudge),
            Side::Short => price * (1.0 - self.cfg.price_nudge),
        }
    }

    fn next_synthetic_id(&mut self) -> u64 {
        self.synthetic_index += 1;
        self.synthetic_index
    }
}
