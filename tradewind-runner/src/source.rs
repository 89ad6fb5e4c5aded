//! Historical candle source — periodic backfill to correct tick drift.

use async_trait::async_trait;
use thiserror::Error;

use tradewind_core::domain::Candle;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("transport: {0}")]
    Transport(String),
    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Pull-side historical candle fetch. Polled periodically, never on the
/// hot path of a cycle.
#[async_trait]
pub trait CandleSource: Send + Sync {
    /// Fetch up to `limit` most recent candles, oldest first.
    async fn fetch_candles(
        &self,
        market: &str,
        interval_secs: i64,
        limit: usize,
    ) -> Result<Vec<Candle>, SourceError>;
}
