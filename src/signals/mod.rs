//! Signal decision, session gating and the signal log.

pub mod decision;
pub mod engine;
pub mod log;
pub mod session;

pub use decision::*;
pub use engine::SignalEngine;
pub use log::SignalLog;
pub use session::{SessionBlock, TradingSession};
