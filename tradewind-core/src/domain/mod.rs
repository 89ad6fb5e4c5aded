//! Domain types shared across the engine.

pub mod brick;
pub mod candle;
pub mod position;
pub mod signal;
pub mod trade;

pub use brick::{BrickDirection, RenkoBrick};
pub use candle::{slot_for, Candle};
pub use position::{Position, ScaledEntry};
pub use signal::{ExitReason, Side, Signal};
pub use trade::TradeRecord;
