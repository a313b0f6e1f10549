//! Environment-driven configuration.
//!
//! Every setting has a default so the service starts with an empty
//! environment; values that are present but unparsable are rejected.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::core::runtime::RuntimeConfig;
use crate::error::ConfigError;
use crate::models::market::{TimeFrame, TradingPair};
use crate::signals::session::DEFAULT_UTC_OFFSET_HOURS;

pub const DEFAULT_TRADE_URL: &str = "https://jp.theoption.com/trading";
pub const DEFAULT_ALPHAVANTAGE_URL: &str = "https://www.alphavantage.co";

/// Deployment environment name (`APP_ENV`), `sandbox` when unset.
pub fn get_environment() -> String {
    env::var("APP_ENV").unwrap_or_else(|_| "sandbox".to_string())
}

/// Which market-data collaborator backs the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketDataBackend {
    AlphaVantage,
    Simulated,
}

impl FromStr for MarketDataBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "alphavantage" | "alpha_vantage" => Ok(MarketDataBackend::AlphaVantage),
            "simulated" | "simulation" => Ok(MarketDataBackend::Simulated),
            _ => Err(s.to_string()),
        }
    }
}

impl fmt::Display for MarketDataBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketDataBackend::AlphaVantage => f.write_str("alphavantage"),
            MarketDataBackend::Simulated => f.write_str("simulated"),
        }
    }
}

/// Venue state assumed when the liveness check itself fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VenueFallback {
    AssumeActive,
    AssumeInactive,
}

impl VenueFallback {
    pub fn is_active(&self) -> bool {
        matches!(self, VenueFallback::AssumeActive)
    }
}

impl FromStr for VenueFallback {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(VenueFallback::AssumeActive),
            "inactive" => Ok(VenueFallback::AssumeInactive),
            _ => Err(s.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AlphaVantageConfig {
    pub base_url: String,
    pub api_key: String,
    /// Minimum spacing between two upstream requests.
    pub min_request_interval: Duration,
    pub timeout: Duration,
    pub max_retries: usize,
    pub retry_min_delay: Duration,
}

impl Default for AlphaVantageConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ALPHAVANTAGE_URL.to_string(),
            api_key: "demo".to_string(),
            min_request_interval: Duration::from_millis(12_000),
            timeout: Duration::from_secs(10),
            max_retries: 3,
            retry_min_delay: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: String,
    pub port: u16,
    pub symbol: TradingPair,
    pub timeframe: TimeFrame,
    pub bar_count: usize,
    pub backend: MarketDataBackend,
    pub alphavantage: AlphaVantageConfig,
    pub precision_mode: bool,
    pub venue_fallback: VenueFallback,
    pub notifications_enabled: bool,
    pub trade_url: String,
    pub session_utc_offset_hours: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "sandbox".to_string(),
            port: 8080,
            symbol: TradingPair::UsdJpy,
            timeframe: TimeFrame::M1,
            bar_count: 100,
            backend: MarketDataBackend::Simulated,
            alphavantage: AlphaVantageConfig::default(),
            precision_mode: true,
            venue_fallback: VenueFallback::AssumeActive,
            notifications_enabled: true,
            trade_url: DEFAULT_TRADE_URL.to_string(),
            session_utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
        }
    }
}

impl Config {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (used by tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let symbol = match lookup("SYMBOL") {
            Some(raw) => raw
                .parse::<TradingPair>()
                .map_err(ConfigError::UnsupportedSymbol)?,
            None => defaults.symbol,
        };

        let timeframe = match lookup("TIMEFRAME") {
            Some(raw) => raw
                .parse::<TimeFrame>()
                .map_err(ConfigError::UnsupportedTimeFrame)?,
            None => defaults.timeframe,
        };

        let base_url = match lookup("ALPHAVANTAGE_BASE_URL") {
            Some(raw) => {
                Url::parse(&raw)?;
                raw
            }
            None => defaults.alphavantage.base_url.clone(),
        };

        let alphavantage = AlphaVantageConfig {
            base_url,
            api_key: lookup("ALPHAVANTAGE_API_KEY").unwrap_or(defaults.alphavantage.api_key),
            min_request_interval: Duration::from_millis(parse_or(
                &lookup,
                "ALPHAVANTAGE_MIN_REQUEST_INTERVAL_MS",
                defaults.alphavantage.min_request_interval.as_millis() as u64,
            )?),
            timeout: Duration::from_secs(parse_or(
                &lookup,
                "ALPHAVANTAGE_TIMEOUT_SECONDS",
                defaults.alphavantage.timeout.as_secs(),
            )?),
            max_retries: parse_or(&lookup, "ALPHAVANTAGE_MAX_RETRIES", defaults.alphavantage.max_retries)?,
            retry_min_delay: defaults.alphavantage.retry_min_delay,
        };

        Ok(Self {
            environment: lookup("APP_ENV").unwrap_or(defaults.environment),
            port: parse_or(&lookup, "PORT", defaults.port)?,
            symbol,
            timeframe,
            bar_count: parse_or(&lookup, "BAR_COUNT", defaults.bar_count)?,
            backend: parse_or(&lookup, "MARKET_DATA_BACKEND", defaults.backend)?,
            alphavantage,
            precision_mode: parse_or(&lookup, "PRECISION_MODE", defaults.precision_mode)?,
            venue_fallback: parse_or(&lookup, "VENUE_FALLBACK", defaults.venue_fallback)?,
            notifications_enabled: parse_or(
                &lookup,
                "NOTIFICATIONS_ENABLED",
                defaults.notifications_enabled,
            )?,
            trade_url: lookup("TRADE_URL").unwrap_or(defaults.trade_url),
            session_utc_offset_hours: parse_or(
                &lookup,
                "SESSION_UTC_OFFSET_HOURS",
                defaults.session_utc_offset_hours,
            )?,
        })
    }

    /// Scheduler settings derived from this configuration.
    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            symbol: self.symbol,
            timeframe: self.timeframe,
            bar_count: self.bar_count,
            precision_mode: self.precision_mode,
            venue_fallback: self.venue_fallback,
            notifications_enabled: self.notifications_enabled,
            ..RuntimeConfig::default()
        }
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse::<T>().map_err(|_| ConfigError::Invalid {
            key: key.to_string(),
            value: raw,
        }),
        None => Ok(default),
    }
}
