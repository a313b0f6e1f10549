//! Alpha Vantage response payloads and their conversion to market models

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::MarketDataError;
use crate::models::market::{Bar, Quote};

/// Half-pip style spread applied when the upstream omits bid/ask.
const SYNTHETIC_SPREAD_RATIO: f64 = 0.0001;

#[derive(Debug, Clone, Deserialize)]
pub struct SeriesPoint {
    #[serde(rename = "1. open")]
    pub open: String,
    #[serde(rename = "2. high")]
    pub high: String,
    #[serde(rename = "3. low")]
    pub low: String,
    #[serde(rename = "4. close")]
    pub close: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeRate {
    #[serde(rename = "1. From_Currency Code")]
    pub from_currency: Option<String>,
    #[serde(rename = "3. To_Currency Code")]
    pub to_currency: Option<String>,
    #[serde(rename = "5. Exchange Rate")]
    pub exchange_rate: String,
    #[serde(rename = "6. Last Refreshed")]
    pub last_refreshed: String,
    #[serde(rename = "8. Bid Price")]
    pub bid_price: Option<String>,
    #[serde(rename = "9. Ask Price")]
    pub ask_price: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeRateResponse {
    #[serde(rename = "Realtime Currency Exchange Rate")]
    pub rate: ExchangeRate,
}

/// Alpha Vantage reports throttling and bad requests with HTTP 200 and a
/// marker key in the body.
pub fn check_api_error(body: &Value) -> Result<(), MarketDataError> {
    if let Some(note) = body.get("Note").and_then(Value::as_str) {
        return Err(MarketDataError::RateLimited(note.to_string()));
    }
    if let Some(info) = body.get("Information").and_then(Value::as_str) {
        // Also carries premium-endpoint and API key notices.
        return Err(if mentions_rate_limit(info) {
            MarketDataError::RateLimited(info.to_string())
        } else {
            MarketDataError::Upstream(info.to_string())
        });
    }
    if let Some(message) = body.get("Error Message").and_then(Value::as_str) {
        return Err(MarketDataError::Upstream(message.to_string()));
    }
    Ok(())
}

fn mentions_rate_limit(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("frequency") || message.contains("limit")
}

/// Extract the newest `count` bars from a `Time Series FX (...)` payload,
/// oldest first.
pub fn parse_time_series(body: &Value, count: usize) -> Result<Vec<Bar>, MarketDataError> {
    check_api_error(body)?;

    let series = body
        .as_object()
        .and_then(|obj| {
            obj.iter()
                .find(|(key, _)| key.starts_with("Time Series"))
                .map(|(_, value)| value.clone())
        })
        .ok_or_else(|| MarketDataError::Malformed("missing time series".to_string()))?;

    let points: BTreeMap<String, SeriesPoint> = serde_json::from_value(series)?;

    let mut bars = points
        .iter()
        .map(|(time, point)| {
            Ok(Bar::new(
                parse_timestamp(time)?,
                parse_price(&point.open)?,
                parse_price(&point.high)?,
                parse_price(&point.low)?,
                parse_price(&point.close)?,
            ))
        })
        .collect::<Result<Vec<Bar>, MarketDataError>>()?;

    bars.sort_by_key(|bar| bar.timestamp);
    if bars.len() > count {
        bars.drain(..bars.len() - count);
    }
    Ok(bars)
}

/// Convert a `CURRENCY_EXCHANGE_RATE` payload into a quote.
pub fn parse_exchange_rate(body: &Value) -> Result<Quote, MarketDataError> {
    check_api_error(body)?;

    let response: ExchangeRateResponse = serde_json::from_value(body.clone())?;
    let rate = parse_price(&response.rate.exchange_rate)?;
    let timestamp = parse_timestamp(&response.rate.last_refreshed)?;

    let bid = optional_price(response.rate.bid_price.as_deref())
        .unwrap_or(rate * (1.0 - SYNTHETIC_SPREAD_RATIO));
    let ask = optional_price(response.rate.ask_price.as_deref())
        .unwrap_or(rate * (1.0 + SYNTHETIC_SPREAD_RATIO));

    Ok(Quote {
        bid,
        ask,
        timestamp,
    })
}

fn parse_price(raw: &str) -> Result<f64, MarketDataError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| MarketDataError::Malformed(format!("invalid price '{}'", raw)))
}

fn optional_price(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
}

/// Upstream times are UTC, either `YYYY-MM-DD HH:MM:SS` or a bare date.
fn parse_timestamp(raw: &str) -> Result<i64, MarketDataError> {
    let raw = raw.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.and_utc().timestamp_millis());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
        .ok_or_else(|| MarketDataError::Malformed(format!("invalid timestamp '{}'", raw)))
}
