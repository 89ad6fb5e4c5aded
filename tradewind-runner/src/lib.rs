//! Tradewind Runner — live orchestration on top of `tradewind-core`.
//!
//! This crate owns everything with a clock or a wire:
//! - Collaborator contracts: price board, candle source, order router,
//!   trade store, telemetry — each with no-op or dry-run stand-ins
//! - The position lifecycle (order submission with bounded retries,
//!   stale-order sweep, trade recording, persistence and recovery)
//! - The async strategy loop, one task per enabled policy
//! - Typed TOML configuration with per-strategy sections

pub mod config;
pub mod feed;
pub mod lifecycle;
pub mod price;
pub mod router;
pub mod runner;
pub mod source;
pub mod store;
pub mod telemetry;

pub use config::{AppConfig, StrategySection};
pub use feed::SyntheticFeed;
pub use lifecycle::{LifecycleConfig, PositionLifecycle};
pub use price::{PriceBoard, PriceSource};
pub use router::{DryRunRouter, OrderError, OrderRouter, PlacedOrder};
pub use runner::{SeriesMode, StrategyRunner};
pub use source::{CandleSource, SourceError};
pub use store::{MemoryStore, NoopStore, StoreError, TradeStats, TradeStore};
pub use telemetry::{MemoryTelemetry, NoopTelemetry, Telemetry};
