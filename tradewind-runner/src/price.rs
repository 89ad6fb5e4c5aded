//! Shared last-value price board.
//!
//! One writer (the feed transport) publishes; every strategy task reads.
//! Last-known-value semantics only — the engine never needs the tick
//! history, just "what is the price right now".

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Read side of the price feed.
pub trait PriceSource: Send + Sync {
    /// Last known price for `market`, absent until the feed has published.
    fn current_price(&self, market: &str) -> Option<f64>;
}

/// Single-writer/multi-reader price map shared across strategy instances.
#[derive(Debug, Clone, Default)]
pub struct PriceBoard {
    inner: Arc<RwLock<HashMap<String, f64>>>,
}

impl PriceBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a fresh price. Non-finite or non-positive values are dropped.
    pub fn publish(&self, market: &str, price: f64) {
        if !price.is_finite() || price <= 0.0 {
            return;
        }
        if let Ok(mut map) = self.inner.write() {
            map.insert(market.to_string(), price);
        }
    }
}

impl PriceSource for PriceBoard {
    fn current_price(&self, market: &str) -> Option<f64> {
        self.inner.read().ok()?.get(market).copied()
    }
}
