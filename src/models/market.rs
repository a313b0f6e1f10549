//! Market data primitives: bars, quotes, pairs and timeframes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One OHLC interval. Timestamps are epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bar {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

impl Bar {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume: None,
        }
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    /// True when the bar carries a strictly positive traded volume.
    pub fn has_volume(&self) -> bool {
        self.volume.is_some_and(|v| v > 0.0)
    }
}

/// Latest bid/ask for a pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub bid: f64,
    pub ask: f64,
    pub timestamp: i64,
}

impl Quote {
    pub fn mid(&self) -> f64 {
        (self.bid + self.ask) / 2.0
    }

    pub fn spread(&self) -> f64 {
        self.ask - self.bid
    }
}

/// Liveness of the trading venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueStatus {
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl VenueStatus {
    pub fn active() -> Self {
        Self {
            is_active: true,
            message: None,
        }
    }

    pub fn inactive(message: impl Into<String>) -> Self {
        Self {
            is_active: false,
            message: Some(message.into()),
        }
    }
}

/// Supported currency pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradingPair {
    UsdJpy,
    EurUsd,
    GbpJpy,
    EurJpy,
    AudUsd,
    GbpUsd,
    UsdCad,
    UsdChf,
    NzdUsd,
    EurGbp,
}

impl TradingPair {
    pub const ALL: [TradingPair; 10] = [
        TradingPair::UsdJpy,
        TradingPair::EurUsd,
        TradingPair::GbpJpy,
        TradingPair::EurJpy,
        TradingPair::AudUsd,
        TradingPair::GbpUsd,
        TradingPair::UsdCad,
        TradingPair::UsdChf,
        TradingPair::NzdUsd,
        TradingPair::EurGbp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TradingPair::UsdJpy => "USDJPY",
            TradingPair::EurUsd => "EURUSD",
            TradingPair::GbpJpy => "GBPJPY",
            TradingPair::EurJpy => "EURJPY",
            TradingPair::AudUsd => "AUDUSD",
            TradingPair::GbpUsd => "GBPUSD",
            TradingPair::UsdCad => "USDCAD",
            TradingPair::UsdChf => "USDCHF",
            TradingPair::NzdUsd => "NZDUSD",
            TradingPair::EurGbp => "EURGBP",
        }
    }

    /// Base and quote currency codes, e.g. `("USD", "JPY")`.
    pub fn currencies(&self) -> (&'static str, &'static str) {
        let s = self.as_str();
        (&s[..3], &s[3..])
    }

    /// Human-readable name, e.g. `USD/JPY`.
    pub fn display_name(&self) -> String {
        let (from, to) = self.currencies();
        format!("{}/{}", from, to)
    }

    /// JPY crosses quote to 3 decimals, everything else to 5.
    pub fn price_decimals(&self) -> usize {
        if self.currencies().1 == "JPY" {
            3
        } else {
            5
        }
    }

    pub fn format_price(&self, price: f64) -> String {
        format!("{:.*}", self.price_decimals(), price)
    }

    /// Size of one pip in price units.
    pub fn pip(&self) -> f64 {
        if self.currencies().1 == "JPY" {
            0.01
        } else {
            0.0001
        }
    }
}

impl fmt::Display for TradingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradingPair {
    type Err = String;

    /// Accepts `USDJPY`, `usdjpy` and `USD/JPY`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_uppercase())
            .collect();
        TradingPair::ALL
            .iter()
            .copied()
            .find(|pair| pair.as_str() == normalized)
            .ok_or_else(|| s.to_string())
    }
}

/// Bar timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeFrame {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
}

impl TimeFrame {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFrame::M1 => "1m",
            TimeFrame::M5 => "5m",
            TimeFrame::M15 => "15m",
            TimeFrame::M30 => "30m",
            TimeFrame::H1 => "1h",
            TimeFrame::H4 => "4h",
            TimeFrame::D1 => "1d",
        }
    }

    pub fn duration_ms(&self) -> i64 {
        const MINUTE: i64 = 60_000;
        match self {
            TimeFrame::M1 => MINUTE,
            TimeFrame::M5 => 5 * MINUTE,
            TimeFrame::M15 => 15 * MINUTE,
            TimeFrame::M30 => 30 * MINUTE,
            TimeFrame::H1 => 60 * MINUTE,
            TimeFrame::H4 => 240 * MINUTE,
            TimeFrame::D1 => 1440 * MINUTE,
        }
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeFrame {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1m" => Ok(TimeFrame::M1),
            "5m" => Ok(TimeFrame::M5),
            "15m" => Ok(TimeFrame::M15),
            "30m" => Ok(TimeFrame::M30),
            "1h" => Ok(TimeFrame::H1),
            "4h" => Ok(TimeFrame::H4),
            "1d" => Ok(TimeFrame::D1),
            _ => Err(s.to_string()),
        }
    }
}
