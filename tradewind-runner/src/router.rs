//! Order routing contract and the dry-run stand-in.
//!
//! The real router wraps an exchange client with signing and nonce
//! management; the engine only sees this trait. Rate limits and invalid
//! nonces must stay distinguishable — the lifecycle's retry policy
//! branches on them.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use thiserror::Error;

use tradewind_core::domain::Side;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// Venue rate limit. Retried with exponential backoff.
    #[error("rate limited")]
    RateLimited,
    /// Stale signing nonce. Retried exactly once after a short wait.
    #[error("invalid nonce")]
    InvalidNonce,
    /// The venue rejected the order outright. Never retried.
    #[error("order rejected: {0}")]
    Rejected(String),
    /// Transport-level failure. Never retried.
    #[error("transport: {0}")]
    Transport(String),
}

/// A successfully submitted order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOrder {
    /// Client order index, unique per submission.
    pub order_id: u64,
    /// Venue transaction reference, when the venue returns one.
    pub tx_ref: Option<String>,
}

#[async_trait]
pub trait OrderRouter: Send + Sync {
    async fn submit_limit_order(
        &self,
        market: &str,
        side: Side,
        price: f64,
        size: f64,
        post_only: bool,
    ) -> Result<PlacedOrder, OrderError>;

    async fn cancel_order(&self, market: &str, order_id: u64) -> Result<(), OrderError>;
}

/// Router that accepts everything without touching a venue.
///
/// Order indices are seeded from epoch milliseconds so ids stay unique
/// across process restarts, then increment monotonically.
#[derive(Debug)]
pub struct DryRunRouter {
    next_index: AtomicU64,
}

impl DryRunRouter {
    pub fn new() -> Self {
        let seed = chrono::Utc::now().timestamp_millis().max(1) as u64;
        Self {
            next_index: AtomicU64::new(seed),
        }
    }
}

impl Default for DryRunRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderRouter for DryRunRouter {
    async fn submit_limit_order(
        &self,
        _market: &str,
        _side: Side,
        _price: f64,
        _size: f64,
        _post_only: bool,
    ) -> Result<PlacedOrder, OrderError> {
        Ok(PlacedOrder {
            order_id: self.next_index.fetch_add(1, Ordering::Relaxed),
            tx_ref: None,
        })
    }

    async fn cancel_order(&self, _market: &str, _order_id: u64) -> Result<(), OrderError> {
        Ok(())
    }
}
