//! Price-stream aggregation: time-based candles and displacement-based bricks.

pub mod candles;
pub mod renko;

pub use candles::CandleWindow;
pub use renko::RenkoSeries;
