//! External collaborators: market data backends and notifiers

pub mod alphavantage;
pub mod market_data;
pub mod notifier;
pub mod simulated;

use std::sync::Arc;

use crate::config::{Config, MarketDataBackend};
use crate::core::clock::Clock;
use crate::error::MarketDataError;

pub use market_data::{resolve_pair, MarketDataProvider};
pub use notifier::{BroadcastNotifier, LogNotifier, NotificationMessage, Notifier, NotifierSet};

/// Instantiate the backend selected by configuration.
pub fn build_provider(
    config: &Config,
    clock: Arc<dyn Clock>,
) -> Result<Arc<dyn MarketDataProvider>, MarketDataError> {
    Ok(match config.backend {
        MarketDataBackend::AlphaVantage => Arc::new(alphavantage::AlphaVantageProvider::new(
            &config.alphavantage,
        )?),
        MarketDataBackend::Simulated => Arc::new(simulated::SimulatedProvider::new(clock)),
    })
}
