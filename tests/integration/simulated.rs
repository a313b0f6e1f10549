//! Integration tests for the offline simulated backend

use chrono::Duration as ChronoDuration;
use fxsignal::core::clock::ManualClock;
use fxsignal::error::MarketDataError;
use fxsignal::indicators::compute_indicators;
use fxsignal::models::market::{TimeFrame, TradingPair};
use fxsignal::services::market_data::MarketDataProvider;
use fxsignal::services::simulated::{reference_rate, SimulatedProvider};
use std::sync::Arc;

use crate::test_utils::trading_time;

fn provider(seed: u64) -> (SimulatedProvider, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(trading_time()));
    (SimulatedProvider::with_seed(seed, clock.clone()), clock)
}

#[test]
fn reference_rates_cross_through_usd() {
    assert!((reference_rate(TradingPair::UsdJpy) - 147.0).abs() < 1e-9);
    assert!((reference_rate(TradingPair::EurUsd) - 1.0 / 0.85).abs() < 1e-9);
    assert!((reference_rate(TradingPair::EurJpy) - 147.0 / 0.85).abs() < 1e-9);
}

#[tokio::test]
async fn bars_are_aligned_ordered_and_current() {
    let (sim, _) = provider(7);
    let bars = sim.get_bars("USDJPY", TimeFrame::M5, 50).await.unwrap();

    assert_eq!(bars.len(), 50);
    for pair in bars.windows(2) {
        assert_eq!(pair[1].timestamp - pair[0].timestamp, 300_000);
    }
    let last = bars.last().unwrap();
    assert_eq!(last.timestamp % 300_000, 0);
    assert!(last.timestamp <= trading_time().timestamp_millis());
    assert!(bars.iter().all(|b| b.low <= b.open.min(b.close)));
    assert!(bars.iter().all(|b| b.high >= b.open.max(b.close)));
    assert!(bars.iter().all(|b| b.has_volume()));
    assert!((bars[0].open - 147.0).abs() < 5.0);
}

#[tokio::test]
async fn same_seed_same_series() {
    let (a, _) = provider(42);
    let (b, _) = provider(42);
    assert_eq!(
        a.get_bars("EURUSD", TimeFrame::M1, 30).await.unwrap(),
        b.get_bars("EURUSD", TimeFrame::M1, 30).await.unwrap()
    );
}

#[tokio::test]
async fn series_extends_as_time_passes() {
    let (sim, clock) = provider(3);
    let first = sim.get_bars("GBPUSD", TimeFrame::M1, 100).await.unwrap();

    clock.advance(ChronoDuration::minutes(3));
    let second = sim.get_bars("GBPUSD", TimeFrame::M1, 100).await.unwrap();

    assert_eq!(second.len(), 100);
    assert_eq!(
        second.last().unwrap().timestamp - first.last().unwrap().timestamp,
        180_000
    );
    // Earlier bars are stable.
    assert_eq!(second[96], first[99]);
}

#[tokio::test]
async fn short_first_request_backfills_on_demand() {
    let (sim, _) = provider(9);
    let quote = sim.get_latest_quote("AUDUSD").await.unwrap();
    assert!(quote.ask > quote.bid);

    let bars = sim.get_bars("AUDUSD", TimeFrame::M1, 60).await.unwrap();
    assert_eq!(bars.len(), 60);
    assert!((quote.mid() - bars.last().unwrap().close).abs() < 1e-12);
    let snapshot = compute_indicators(&bars);
    assert!(snapshot.rsi.is_finite());
}

#[tokio::test]
async fn venue_is_always_active_and_unknown_pairs_fail() {
    let (sim, _) = provider(1);
    assert!(sim.get_venue_status().await.unwrap().is_active);
    assert!(matches!(
        sim.get_bars("XAUUSD", TimeFrame::M1, 10).await,
        Err(MarketDataError::UnsupportedSymbol(_))
    ));
    assert_eq!(sim.name(), "simulated");
}
