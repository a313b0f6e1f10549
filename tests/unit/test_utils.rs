//! Shared fixtures for unit tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use fxsignal::error::MarketDataError;
use fxsignal::models::market::{Bar, Quote, TimeFrame, VenueStatus};
use fxsignal::services::market_data::{resolve_pair, MarketDataProvider};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

pub const MINUTE_MS: i64 = 60_000;

/// Wednesday 2024-01-10 09:30 in Tokyo: inside the morning window, clear of
/// every blackout.
pub fn trading_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 10, 0, 30, 0).unwrap()
}

pub fn bars_from_closes(closes: &[f64], with_volume: bool) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let bar = Bar::new(i as i64 * MINUTE_MS, close, close, close, close);
            if with_volume {
                bar.with_volume(100.0)
            } else {
                bar
            }
        })
        .collect()
}

/// Closes alternating around 1.1000 for 29 bars.
pub fn choppy_closes() -> Vec<f64> {
    (0..29).map(|i| 1.1000 + (i % 2) as f64 * 0.0002).collect()
}

/// Choppy series ending with a sharp drop below the lower 3σ band.
pub fn oversold_bars(with_volume: bool) -> Vec<Bar> {
    let mut closes = choppy_closes();
    closes.push(1.0950);
    bars_from_closes(&closes, with_volume)
}

/// Choppy series ending with a sharp spike above the upper 3σ band.
pub fn overbought_bars(with_volume: bool) -> Vec<Bar> {
    let mut closes = choppy_closes();
    closes.push(1.1050);
    bars_from_closes(&closes, with_volume)
}

pub fn flat_bars(count: usize, close: f64) -> Vec<Bar> {
    bars_from_closes(&vec![close; count], true)
}

/// Scriptable in-memory market data collaborator.
pub struct MockProvider {
    pub bars: Mutex<Vec<Bar>>,
    /// `None` makes the venue check fail.
    pub venue: Mutex<Option<bool>>,
    pub fail_bars: AtomicBool,
    pub bar_calls: AtomicUsize,
    pub quote: Quote,
}

impl MockProvider {
    pub fn new(bars: Vec<Bar>) -> Self {
        Self {
            bars: Mutex::new(bars),
            venue: Mutex::new(Some(true)),
            fail_bars: AtomicBool::new(false),
            bar_calls: AtomicUsize::new(0),
            quote: Quote {
                bid: 1.0999,
                ask: 1.1001,
                timestamp: 0,
            },
        }
    }

    pub fn set_bars(&self, bars: Vec<Bar>) {
        *self.bars.lock().unwrap() = bars;
    }

    pub fn set_venue(&self, venue: Option<bool>) {
        *self.venue.lock().unwrap() = venue;
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_bars.store(failing, Ordering::SeqCst);
    }

    pub fn bar_calls(&self) -> usize {
        self.bar_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataProvider for MockProvider {
    async fn get_bars(
        &self,
        symbol: &str,
        _timeframe: TimeFrame,
        count: usize,
    ) -> Result<Vec<Bar>, MarketDataError> {
        resolve_pair(symbol)?;
        self.bar_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_bars.load(Ordering::SeqCst) {
            return Err(MarketDataError::RateLimited("slow down".to_string()));
        }
        let bars = self.bars.lock().unwrap().clone();
        let start = bars.len().saturating_sub(count);
        Ok(bars[start..].to_vec())
    }

    async fn get_latest_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        resolve_pair(symbol)?;
        Ok(self.quote)
    }

    async fn get_venue_status(&self) -> Result<VenueStatus, MarketDataError> {
        match *self.venue.lock().unwrap() {
            Some(true) => Ok(VenueStatus::active()),
            Some(false) => Ok(VenueStatus::inactive("maintenance")),
            None => Err(MarketDataError::Upstream("venue probe failed".to_string())),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
