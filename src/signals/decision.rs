//! Rule-based signal decision
//!
//! Band/RSI rules pick a direction, confirmations add confidence, and a hard
//! floor of 70 gates emission.

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::indicators::trend::ema_distance;
use crate::models::indicators::IndicatorSnapshot;
use crate::models::market::{Bar, TimeFrame, TradingPair};
use crate::models::signal::{Signal, SignalDirection, SignalStrength};

/// Signals below this confidence are never emitted.
pub const MIN_SIGNAL_CONFIDENCE: u8 = 70;
/// Binary-option expiry attached to every signal, in minutes.
pub const SIGNAL_EXPIRY_MINUTES: u32 = 1;

const BASE_CONFIDENCE: u32 = 35;
const EXTREME_BAND_BONUS: u32 = 25;
const BAND_BONUS: u32 = 15;
const EMA_FLAT_BONUS: u32 = 20;
const VOLUME_BONUS: u32 = 15;

const EXTREME_OVERSOLD_RSI: f64 = 30.0;
const OVERSOLD_RSI: f64 = 35.0;
const EXTREME_OVERBOUGHT_RSI: f64 = 70.0;
const OVERBOUGHT_RSI: f64 = 65.0;
const EMA_FLAT_THRESHOLD: f64 = 0.001;

/// Outcome of the rules, before a `Signal` is stamped with id and time.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub direction: SignalDirection,
    pub confidence: u8,
    pub strength: SignalStrength,
    pub reasons: Vec<String>,
}

pub struct SignalDecision;

impl SignalDecision {
    /// Apply the band/RSI rules and confidence adjustments to the latest bar.
    ///
    /// Returns `None` when no rule matches or the final confidence is below
    /// [`MIN_SIGNAL_CONFIDENCE`].
    pub fn evaluate(latest: &Bar, indicators: &IndicatorSnapshot) -> Option<Decision> {
        let price = latest.close;
        let rsi = indicators.rsi;

        let (direction, bonus, trigger) = match Self::analyze_bands(price, indicators) {
            BandAnalysis::ExtremeOversold => (
                SignalDirection::High,
                EXTREME_BAND_BONUS,
                format!("Close below lower 3σ band, RSI {:.1}", rsi),
            ),
            BandAnalysis::Oversold => (
                SignalDirection::High,
                BAND_BONUS,
                format!("Close below lower 2σ band, RSI {:.1}", rsi),
            ),
            BandAnalysis::ExtremeOverbought => (
                SignalDirection::Low,
                EXTREME_BAND_BONUS,
                format!("Close above upper 3σ band, RSI {:.1}", rsi),
            ),
            BandAnalysis::Overbought => (
                SignalDirection::Low,
                BAND_BONUS,
                format!("Close above upper 2σ band, RSI {:.1}", rsi),
            ),
            BandAnalysis::Neutral => return None,
        };

        let mut confidence = BASE_CONFIDENCE + bonus;
        let mut reasons = vec![trigger];

        if ema_distance(price, indicators.ema20) < EMA_FLAT_THRESHOLD {
            confidence += EMA_FLAT_BONUS;
            reasons.push("EMA20 flat, trend confirmed".to_string());
        }

        if latest.has_volume() {
            confidence += VOLUME_BONUS;
            reasons.push("Sufficient volume".to_string());
        }

        // Max reachable is 95; the clamp only guards future constant changes.
        let confidence = confidence.min(100) as u8;
        if confidence < MIN_SIGNAL_CONFIDENCE {
            return None;
        }

        Some(Decision {
            direction,
            confidence,
            strength: SignalStrength::from_confidence(confidence),
            reasons,
        })
    }

    /// Build a `Signal` for `symbol` if the rules fire on the latest bar.
    pub fn decide(
        symbol: TradingPair,
        timeframe: TimeFrame,
        latest: &Bar,
        indicators: &IndicatorSnapshot,
        at: DateTime<Utc>,
    ) -> Option<Signal> {
        let decision = Self::evaluate(latest, indicators)?;
        let created_at = at.timestamp_millis();

        Some(Signal {
            id: generate_signal_id(created_at),
            symbol,
            timeframe,
            direction: decision.direction,
            strength: decision.strength,
            entry_price: latest.close,
            confidence: decision.confidence,
            expiry_time: SIGNAL_EXPIRY_MINUTES,
            indicators: *indicators,
            analysis: decision.reasons.join(", "),
            timestamp: created_at,
            created_at,
        })
    }

    fn analyze_bands(price: f64, indicators: &IndicatorSnapshot) -> BandAnalysis {
        let bands = &indicators.bollinger;
        let rsi = indicators.rsi;

        if bands.is_collapsed() {
            return BandAnalysis::Neutral;
        }

        if price <= bands.lower_extreme && rsi <= EXTREME_OVERSOLD_RSI {
            BandAnalysis::ExtremeOversold
        } else if price <= bands.lower && rsi <= OVERSOLD_RSI {
            BandAnalysis::Oversold
        } else if price >= bands.upper_extreme && rsi >= EXTREME_OVERBOUGHT_RSI {
            BandAnalysis::ExtremeOverbought
        } else if price >= bands.upper && rsi >= OVERBOUGHT_RSI {
            BandAnalysis::Overbought
        } else {
            BandAnalysis::Neutral
        }
    }
}

/// `signal_<epoch ms>_<9 random alphanumerics>`
pub fn generate_signal_id(created_at_ms: i64) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|c| (c as char).to_ascii_lowercase())
        .collect();
    format!("signal_{}_{}", created_at_ms, suffix)
}

enum BandAnalysis {
    ExtremeOversold,
    Oversold,
    ExtremeOverbought,
    Overbought,
    Neutral,
}
