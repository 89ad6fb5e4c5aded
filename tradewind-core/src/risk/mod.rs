//! Risk state shared by every strategy: stop ratcheting, cooldowns, pauses.

pub mod ratchet;
pub mod state;

pub use ratchet::ratchet_stop;
pub use state::{EngineState, RiskConfig};
