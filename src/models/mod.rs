//! Shared data models spanning the engine layers.

pub mod indicators;
pub mod market;
pub mod signal;

pub use indicators::{BollingerBands, IndicatorSnapshot};
pub use market::{Bar, Quote, TimeFrame, TradingPair, VenueStatus};
pub use signal::{Signal, SignalDirection, SignalStrength};
