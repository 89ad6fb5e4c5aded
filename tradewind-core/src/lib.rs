//! Tradewind Core — domain types, aggregation, indicators, policies, risk.
//!
//! This crate is the pure heart of the trading engine:
//! - Domain types (candles, bricks, signals, positions, trade records)
//! - Price-stream aggregation into time candles and Renko bricks
//! - The per-cycle indicator snapshot pipeline
//! - Three signal policies behind one trait
//! - Risk state: stop ratchet, adaptive cooldown, losing-streak pauses
//!
//! Nothing here does I/O or touches a clock; the runner crate owns the
//! async loop, order routing, and persistence.

pub mod domain;
pub mod indicators;
pub mod policy;
pub mod risk;
pub mod series;
