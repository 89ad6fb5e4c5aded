//! Durability contract: trades, position snapshots, candle and brick
//! batches.
//!
//! The engine writes at most once per completed transition and never
//! depends on reading its own writes, except for the startup position
//! recovery path. `NoopStore` stands in when persistence is absent;
//! `MemoryStore` backs tests and exposes simple PnL aggregation.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

use tradewind_core::domain::{Candle, Position, RenkoBrick, TradeRecord};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store backend: {0}")]
    Backend(String),
}

#[async_trait]
pub trait TradeStore: Send + Sync {
    async fn record_trade(&self, trade: &TradeRecord) -> Result<(), StoreError>;

    /// Persist the open position snapshot under the strategy's name.
    async fn save_position(&self, strategy: &str, position: &Position) -> Result<(), StoreError>;

    async fn clear_position(&self, strategy: &str) -> Result<(), StoreError>;

    /// Saved position from a previous run, if any.
    async fn load_position(&self, strategy: &str) -> Result<Option<Position>, StoreError>;

    async fn save_candles(&self, market: &str, candles: &[Candle]) -> Result<(), StoreError>;

    async fn save_bricks(&self, market: &str, bricks: &[RenkoBrick]) -> Result<(), StoreError>;

    /// Saved brick history from a previous run; empty when there is none.
    async fn load_bricks(&self, market: &str) -> Result<Vec<RenkoBrick>, StoreError>;
}

/// Persistence stand-in: accepts everything, remembers nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStore;

#[async_trait]
impl TradeStore for NoopStore {
    async fn record_trade(&self, _trade: &TradeRecord) -> Result<(), StoreError> {
        Ok(())
    }

    async fn save_position(&self, _strategy: &str, _position: &Position) -> Result<(), StoreError> {
        Ok(())
    }

    async fn clear_position(&self, _strategy: &str) -> Result<(), StoreError> {
        Ok(())
    }

    async fn load_position(&self, _strategy: &str) -> Result<Option<Position>, StoreError> {
        Ok(None)
    }

    async fn save_candles(&self, _market: &str, _candles: &[Candle]) -> Result<(), StoreError> {
        Ok(())
    }

    async fn save_bricks(&self, _market: &str, _bricks: &[RenkoBrick]) -> Result<(), StoreError> {
        Ok(())
    }

    async fn load_bricks(&self, _market: &str) -> Result<Vec<RenkoBrick>, StoreError> {
        Ok(Vec::new())
    }
}

/// Aggregate statistics over recorded trades.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TradeStats {
    pub total: usize,
    pub winners: usize,
    pub losers: usize,
    pub total_pnl_pct: f64,
    pub total_pnl_usd: f64,
}

#[derive(Debug, Default)]
struct MemoryInner {
    trades: Vec<TradeRecord>,
    positions: HashMap<String, Position>,
    candles: HashMap<String, Vec<Candle>>,
    bricks: HashMap<String, Vec<RenkoBrick>>,
}

/// In-memory store for tests and throwaway runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a saved position, as a previous run would have left it.
    pub async fn seed_position(&self, strategy: &str, position: Position) {
        self.inner
            .lock()
            .await
            .positions
            .insert(strategy.to_string(), position);
    }

    pub async fn trades(&self) -> Vec<TradeRecord> {
        self.inner.lock().await.trades.clone()
    }

    pub async fn position(&self, strategy: &str) -> Option<Position> {
        self.inner.lock().await.positions.get(strategy).cloned()
    }

    pub async fn candles(&self, market: &str) -> Vec<Candle> {
        self.inner
            .lock()
            .await
            .candles
            .get(market)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn bricks(&self, market: &str) -> Vec<RenkoBrick> {
        self.inner
            .lock()
            .await
            .bricks
            .get(market)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn stats(&self) -> TradeStats {
        let inner = self.inner.lock().await;
        let mut stats = TradeStats {
            total: inner.trades.len(),
            ..TradeStats::default()
        };
        for trade in &inner.trades {
            if trade.is_winner() {
                stats.winners += 1;
            } else if trade.pnl_pct < 0.0 {
                stats.losers += 1;
            }
            stats.total_pnl_pct += trade.pnl_pct;
            stats.total_pnl_usd += trade.pnl_usd;
        }
        stats
    }
}

#[async_trait]
impl TradeStore for MemoryStore {
    async fn record_trade(&self, trade: &TradeRecord) -> Result<(), StoreError> {
        self.inner.lock().await.trades.push(trade.clone());
        Ok(())
    }

    async fn save_position(&self, strategy: &str, position: &Position) -> Result<(), StoreError> {
        self.inner
            .lock()
            .await
            .positions
            .insert(strategy.to_string(), position.clone());
        Ok(())
    }

    async fn clear_position(&self, strategy: &str) -> Result<(), StoreError> {
        self.inner.lock().await.positions.remove(strategy);
        Ok(())
    }

    async fn load_position(&self, strategy: &str) -> Result<Option<Position>, StoreError> {
        Ok(self.inner.lock().await.positions.get(strategy).cloned())
    }

    async fn save_candles(&self, market: &str, candles: &[Candle]) -> Result<(), StoreError> {
        self.inner
            .lock()
            .await
            .candles
            .insert(market.to_string(), candles.to_vec());
        Ok(())
    }

    async fn save_bricks(&self, market: &str, bricks: &[RenkoBrick]) -> Result<(), StoreError> {
        self.inner
            .lock()
            .await
            .bricks
            .insert(market.to_string(), bricks.to_vec());
        Ok(())
    }

    async fn load_bricks(&self, market: &str) -> Result<Vec<RenkoBrick>, StoreError> {
        Ok(self
            .inner
            .lock()
            .await
            .bricks
            .get(market)
            .cloned()
            .unwrap_or_default())
    }
}
