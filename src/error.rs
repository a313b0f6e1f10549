//! Error types for market data access and configuration.

use thiserror::Error;

/// Errors raised by a market-data collaborator.
#[derive(Debug, Error)]
pub enum MarketDataError {
    /// No provider mapping exists for the symbol. Never retried.
    #[error("unsupported symbol: {0}")]
    UnsupportedSymbol(String),

    #[error("rate limited by upstream: {0}")]
    RateLimited(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned HTTP {status}")]
    Status { status: u16 },

    #[error("malformed upstream payload: {0}")]
    Malformed(String),

    #[error("upstream error: {0}")]
    Upstream(String),
}

impl MarketDataError {
    /// Transient failures are recovered locally and retried on the next tick.
    pub fn is_transient(&self) -> bool {
        !matches!(self, MarketDataError::UnsupportedSymbol(_))
    }

    /// Whether the same request is worth retrying immediately with backoff.
    pub fn is_retryable(&self) -> bool {
        match self {
            MarketDataError::RateLimited(_) => true,
            MarketDataError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            MarketDataError::Status { status } => *status == 429 || *status >= 500,
            MarketDataError::UnsupportedSymbol(_)
            | MarketDataError::Malformed(_)
            | MarketDataError::Upstream(_) => false,
        }
    }
}

impl From<serde_json::Error> for MarketDataError {
    fn from(e: serde_json::Error) -> Self {
        MarketDataError::Malformed(e.to_string())
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unsupported symbol: {0}")]
    UnsupportedSymbol(String),

    #[error("unsupported timeframe: {0}")]
    UnsupportedTimeFrame(String),

    #[error("invalid value for {key}: {value}")]
    Invalid { key: String, value: String },

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Errors raised while delivering a notification. Never reach the scheduler.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("no subscribers listening")]
    NoSubscribers,

    #[error("delivery failed: {0}")]
    Delivery(String),
}
