use serde::{Deserialize, Serialize};
use std::fmt;

use super::indicators::IndicatorSnapshot;
use super::market::{TimeFrame, TradingPair};

/// Binary-option direction: HIGH expects the price to finish above entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalDirection {
    High,
    Low,
}

impl fmt::Display for SignalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalDirection::High => f.write_str("HIGH"),
            SignalDirection::Low => f.write_str("LOW"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalStrength {
    Weak,
    Medium,
    Strong,
}

impl SignalStrength {
    pub fn from_confidence(confidence: u8) -> Self {
        if confidence >= 85 {
            SignalStrength::Strong
        } else if confidence >= 75 {
            SignalStrength::Medium
        } else {
            SignalStrength::Weak
        }
    }
}

/// An emitted trading recommendation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    pub id: String,
    pub symbol: TradingPair,
    pub timeframe: TimeFrame,
    pub direction: SignalDirection,
    pub strength: SignalStrength,
    pub entry_price: f64,
    pub confidence: u8,
    /// Expiry in minutes.
    pub expiry_time: u32,
    pub indicators: IndicatorSnapshot,
    pub analysis: String,
    pub timestamp: i64,
    pub created_at: i64,
}
