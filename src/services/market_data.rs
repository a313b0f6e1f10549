//! Market data collaborator interface.
//!
//! Backends are interchangeable; the runtime only sees this trait.

use async_trait::async_trait;

use crate::error::MarketDataError;
use crate::models::market::{Bar, Quote, TimeFrame, TradingPair, VenueStatus};

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Up to `count` bars, oldest first, most recent last.
    async fn get_bars(
        &self,
        symbol: &str,
        timeframe: TimeFrame,
        count: usize,
    ) -> Result<Vec<Bar>, MarketDataError>;

    /// Latest bid/ask. Used when no bars are available.
    async fn get_latest_quote(&self, symbol: &str) -> Result<Quote, MarketDataError>;

    /// Whether the trading venue is open for business.
    async fn get_venue_status(&self) -> Result<VenueStatus, MarketDataError>;

    fn name(&self) -> &'static str;
}

/// Map a symbol to a supported pair, or fail with the non-retryable
/// `UnsupportedSymbol`.
pub fn resolve_pair(symbol: &str) -> Result<TradingPair, MarketDataError> {
    symbol
        .parse::<TradingPair>()
        .map_err(MarketDataError::UnsupportedSymbol)
}
