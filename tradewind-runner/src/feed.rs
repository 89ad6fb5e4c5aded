//! Synthetic price feed — a dry-run stand-in for the real transport.
//!
//! Publishes a bounded random walk onto the price board so the full
//! pipeline can be exercised without a venue connection. Never used in
//! live mode; the real feed transport is an external collaborator.

use std::time::Duration;

use rand::Rng;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::info;

use crate::price::PriceBoard;

pub struct SyntheticFeed {
    board: PriceBoard,
    market: String,
    price: f64,
    step_bps: f64,
    tick_interval: Duration,
}

impl SyntheticFeed {
    pub fn new(board: PriceBoard, market: impl Into<String>, start_price: f64) -> Self {
        Self {
            board,
            market: market.into(),
            price: start_price,
            step_bps: 5.0,
            tick_interval: Duration::from_millis(500),
        }
    }

    /// Publish ticks until shutdown fires.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(market = %self.market, start_price = self.price, "synthetic feed starting");
        loop {
            if *shutdown.borrow() {
                break;
            }
            let step = rand::thread_rng().gen_range(-self.step_bps..self.step_bps) / 10_000.0;
            self.price *= 1.0 + step;
            self.board.publish(&self.market, self.price);

            tokio::select! {
                _ = sleep(self.tick_interval) => {}
                _ = shutdown.changed() => {}
            }
        }
        info!(market = %self.market, "synthetic feed stopped");
    }
}
