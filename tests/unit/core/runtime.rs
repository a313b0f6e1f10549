//! Unit tests for the signal runtime tick and refresh logic

use crate::test_utils::{
    bars_from_closes, choppy_closes, flat_bars, oversold_bars, trading_time, MockProvider,
};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use fxsignal::config::VenueFallback;
use fxsignal::core::clock::ManualClock;
use fxsignal::core::runtime::{RuntimeConfig, SignalRuntime, SkipReason, TickOutcome};
use fxsignal::error::NotifyError;
use fxsignal::indicators::compute_indicators;
use fxsignal::metrics::Metrics;
use fxsignal::models::market::TradingPair;
use fxsignal::models::signal::{Signal, SignalDirection};
use fxsignal::services::notifier::{BroadcastNotifier, Notifier, NotifierSet};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::assert_ok;

struct Harness {
    provider: Arc<MockProvider>,
    clock: Arc<ManualClock>,
    runtime: SignalRuntime,
}

fn config() -> RuntimeConfig {
    RuntimeConfig {
        symbol: TradingPair::EurUsd,
        ..RuntimeConfig::default()
    }
}

fn harness_with(config: RuntimeConfig, bars: Vec<fxsignal::models::market::Bar>) -> Harness {
    let provider = Arc::new(MockProvider::new(bars));
    let clock = Arc::new(ManualClock::new(trading_time()));
    let runtime = SignalRuntime::new(config, provider.clone(), clock.clone());
    Harness {
        provider,
        clock,
        runtime,
    }
}

fn harness(bars: Vec<fxsignal::models::market::Bar>) -> Harness {
    harness_with(config(), bars)
}

#[test]
fn runtime_config_defaults() {
    let config = RuntimeConfig::default();
    assert_eq!(config.symbol, TradingPair::UsdJpy);
    assert_eq!(config.bar_count, 100);
    assert_eq!(config.signal_interval(), Duration::from_secs(60));
    assert_eq!(config.venue_fallback, VenueFallback::AssumeActive);
}

#[tokio::test]
async fn emits_signal_and_enters_countdown() {
    let h = harness(oversold_bars(true));
    assert_ok!(h.runtime.refresh_market_data().await);

    let outcome = h.runtime.generate_signal().await;
    let signal = outcome.signal().expect("signal emitted").clone();
    assert_eq!(signal.direction, SignalDirection::High);
    assert_eq!(signal.confidence, 75);

    let state = h.runtime.scheduler_state().await;
    assert_eq!(state.last_signal_time, trading_time().timestamp_millis());
    assert!(state.countdown_active);
    assert_eq!(h.runtime.recent_signals(10).await, vec![signal]);
}

#[tokio::test]
async fn enforces_two_minute_gap() {
    let h = harness(oversold_bars(true));
    assert_ok!(h.runtime.refresh_market_data().await);
    assert!(matches!(h.runtime.generate_signal().await, TickOutcome::Emitted(_)));

    h.clock.advance(ChronoDuration::seconds(60));
    assert_eq!(
        h.runtime.generate_signal().await,
        TickOutcome::Skipped(SkipReason::SignalGap)
    );

    h.clock.advance(ChronoDuration::seconds(59));
    assert_eq!(
        h.runtime.generate_signal().await,
        TickOutcome::Skipped(SkipReason::SignalGap)
    );

    h.clock.advance(ChronoDuration::seconds(1));
    assert!(matches!(h.runtime.generate_signal().await, TickOutcome::Emitted(_)));

    let signals = h.runtime.recent_signals(10).await;
    assert_eq!(signals.len(), 2);
    assert!(signals[1].created_at - signals[0].created_at >= 120_000);
}

#[tokio::test]
async fn inactive_venue_blocks_even_a_strong_setup() {
    let h = harness(oversold_bars(true));
    assert_ok!(h.runtime.refresh_market_data().await);
    h.provider.set_venue(Some(false));

    assert!(!h.runtime.check_venue_status().await);
    assert_eq!(
        h.runtime.generate_signal().await,
        TickOutcome::Skipped(SkipReason::VenueInactive)
    );
    assert_eq!(h.runtime.signal_count().await, 0);
}

#[tokio::test]
async fn failed_venue_check_applies_fallback() {
    let h = harness(oversold_bars(true));
    h.provider.set_venue(None);
    assert!(h.runtime.check_venue_status().await);
    assert!(h.runtime.market_state().await.venue_active);

    let strict = harness_with(
        RuntimeConfig {
            venue_fallback: VenueFallback::AssumeInactive,
            ..config()
        },
        oversold_bars(true),
    );
    strict.provider.set_venue(None);
    assert!(!strict.runtime.check_venue_status().await);
    assert!(!strict.runtime.market_state().await.venue_active);
}

#[tokio::test]
async fn session_gates_are_checked_in_order() {
    let h = harness(oversold_bars(true));
    assert_ok!(h.runtime.refresh_market_data().await);

    // Saturday 09:30 Tokyo
    h.clock.set(Utc.with_ymd_and_hms(2024, 1, 13, 0, 30, 0).unwrap());
    assert_eq!(
        h.runtime.generate_signal().await,
        TickOutcome::Skipped(SkipReason::Weekend)
    );

    // Wednesday 10:15 Tokyo, 15 minutes before a release
    h.clock.set(Utc.with_ymd_and_hms(2024, 1, 10, 1, 15, 0).unwrap());
    assert_eq!(
        h.runtime.generate_signal().await,
        TickOutcome::Skipped(SkipReason::NewsBlackout)
    );

    // Wednesday 12:00 Tokyo
    h.clock.set(Utc.with_ymd_and_hms(2024, 1, 10, 3, 0, 0).unwrap());
    assert_eq!(
        h.runtime.generate_signal().await,
        TickOutcome::Skipped(SkipReason::OutsideSession)
    );

    assert_eq!(h.runtime.signal_count().await, 0);
}

#[tokio::test]
async fn empty_cache_triggers_refresh_and_skips() {
    let h = harness(oversold_bars(true));
    assert_eq!(h.provider.bar_calls(), 0);

    assert_eq!(
        h.runtime.generate_signal().await,
        TickOutcome::Skipped(SkipReason::NoMarketData)
    );
    assert_eq!(h.provider.bar_calls(), 1);
    assert_eq!(h.runtime.market_state().await.bars.len(), 30);

    assert!(matches!(h.runtime.generate_signal().await, TickOutcome::Emitted(_)));
}

#[tokio::test]
async fn short_series_is_insufficient() {
    let closes: Vec<f64> = (0..10).map(|i| 1.1 + i as f64 * 0.0001).collect();
    let h = harness(bars_from_closes(&closes, true));
    assert_ok!(h.runtime.refresh_market_data().await);
    assert_eq!(
        h.runtime.generate_signal().await,
        TickOutcome::Skipped(SkipReason::InsufficientData)
    );
}

#[tokio::test]
async fn flat_market_yields_no_signal() {
    let h = harness(flat_bars(25, 1.1));
    assert_ok!(h.runtime.refresh_market_data().await);
    assert_eq!(h.runtime.generate_signal().await, TickOutcome::NoSignal);
    assert_eq!(h.runtime.scheduler_state().await.last_signal_time, 0);
}

#[tokio::test]
async fn refresh_failure_keeps_last_known_good_data() {
    let h = harness(oversold_bars(true));
    assert_ok!(h.runtime.refresh_market_data().await);
    let before = h.runtime.market_state().await;
    assert!(before.is_connected);
    assert_eq!(before.current_price, Some(1.0950));

    h.provider.set_failing(true);
    assert!(h.runtime.refresh_market_data().await.is_err());

    let after = h.runtime.market_state().await;
    assert!(!after.is_connected);
    assert!(after.last_error.unwrap().contains("rate limited"));
    assert_eq!(after.bars, before.bars);

    // Cached bars still drive the tick.
    assert!(matches!(h.runtime.generate_signal().await, TickOutcome::Emitted(_)));

    h.provider.set_failing(false);
    assert_ok!(h.runtime.refresh_market_data().await);
    let recovered = h.runtime.market_state().await;
    assert!(recovered.is_connected);
    assert!(recovered.last_error.is_none());
}

#[tokio::test]
async fn zero_bars_fall_back_to_quote() {
    let h = harness(Vec::new());
    assert_ok!(h.runtime.refresh_market_data().await);
    let market = h.runtime.market_state().await;
    assert!(market.bars.is_empty());
    let price = market.current_price.unwrap();
    assert!((price - 1.1).abs() < 1e-9);
}

#[tokio::test]
async fn unsupported_symbol_is_reported_distinctly() {
    let provider = Arc::new(MockProvider::new(oversold_bars(true)));
    let err = fxsignal::services::market_data::MarketDataProvider::get_bars(
        provider.as_ref(),
        "XAUUSD",
        fxsignal::models::market::TimeFrame::M1,
        10,
    )
    .await
    .unwrap_err();
    assert!(!err.is_transient());
}

#[tokio::test]
async fn notifications_follow_the_toggle() {
    let events = BroadcastNotifier::new(8);
    let mut receiver = events.subscribe();

    let h = harness(oversold_bars(true));
    let runtime = h
        .runtime
        .with_notifiers(NotifierSet::new().with(Arc::new(events.clone())));
    runtime.refresh_market_data().await.unwrap();
    let signal = runtime.generate_signal().await.signal().cloned().unwrap();
    assert_eq!(receiver.try_recv().unwrap().id, signal.id);

    let muted = harness_with(
        RuntimeConfig {
            notifications_enabled: false,
            ..config()
        },
        oversold_bars(true),
    );
    let muted_runtime = muted
        .runtime
        .with_notifiers(NotifierSet::new().with(Arc::new(events.clone())));
    muted_runtime.refresh_market_data().await.unwrap();
    assert!(muted_runtime.generate_signal().await.signal().is_some());
    assert!(receiver.try_recv().is_err());
    assert_eq!(muted_runtime.signal_count().await, 1);
}

#[tokio::test]
async fn countdown_clears_after_window() {
    let h = harness_with(
        RuntimeConfig {
            countdown: Duration::from_millis(50),
            ..config()
        },
        oversold_bars(true),
    );
    assert_ok!(h.runtime.refresh_market_data().await);
    assert!(h.runtime.generate_signal().await.signal().is_some());
    assert!(h.runtime.scheduler_state().await.countdown_active);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!h.runtime.scheduler_state().await.countdown_active);
}

#[tokio::test]
async fn metrics_count_ticks_and_skips() {
    let metrics = Arc::new(Metrics::new().unwrap());
    let h = harness(oversold_bars(true));
    let runtime = h.runtime.with_metrics(metrics.clone());

    runtime.refresh_market_data().await.unwrap();
    runtime.generate_signal().await;
    h.clock.advance(ChronoDuration::seconds(10));
    runtime.generate_signal().await;

    assert_eq!(metrics.signal_ticks_total.get(), 2);
    assert_eq!(metrics.signals_emitted_total.get(), 1);
    assert_eq!(
        metrics
            .signal_ticks_skipped_total
            .with_label_values(&["signal_gap"])
            .get(),
        1
    );
    assert_eq!(metrics.market_data_connected.get(), 1.0);
    let text = metrics.export().unwrap();
    assert!(text.contains("signal_ticks_skipped_total"));
}

struct RejectingNotifier;

#[async_trait]
impl Notifier for RejectingNotifier {
    async fn notify(&self, _signal: &Signal) -> Result<(), NotifyError> {
        Err(NotifyError::Delivery("push service unavailable".to_string()))
    }

    fn name(&self) -> &'static str {
        "rejecting"
    }
}

#[tokio::test]
async fn failing_notifier_does_not_affect_emission() {
    let events = BroadcastNotifier::new(8);
    let mut receiver = events.subscribe();

    let h = harness(oversold_bars(true));
    let runtime = h.runtime.with_notifiers(
        NotifierSet::new()
            .with(Arc::new(RejectingNotifier))
            .with(Arc::new(events.clone())),
    );
    assert_ok!(runtime.refresh_market_data().await);

    let outcome = runtime.generate_signal().await;
    let signal = match outcome {
        TickOutcome::Emitted(signal) => signal,
        other => panic!("expected a signal, got {:?}", other),
    };

    let state = runtime.scheduler_state().await;
    assert_eq!(state.last_signal_time, trading_time().timestamp_millis());
    assert!(state.countdown_active);
    assert_eq!(runtime.recent_signals(10).await, vec![signal.clone()]);
    // Later notifiers still receive the signal.
    assert_eq!(receiver.try_recv().unwrap().id, signal.id);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 3)]
async fn ticks_never_mix_indicators_with_other_bars() {
    let first = bars_from_closes(&choppy_closes(), true);
    let shifted: Vec<f64> = choppy_closes().iter().map(|c| c + 0.0010).collect();
    let second = bars_from_closes(&shifted, true);

    let provider = Arc::new(MockProvider::new(first.clone()));
    let clock = Arc::new(ManualClock::new(trading_time()));
    let runtime = Arc::new(SignalRuntime::new(
        RuntimeConfig {
            min_signal_gap: Duration::ZERO,
            ..config()
        },
        provider.clone(),
        clock,
    ));
    assert_ok!(runtime.refresh_market_data().await);

    let refresher = {
        let runtime = runtime.clone();
        let provider = provider.clone();
        tokio::spawn(async move {
            for i in 0..2_000 {
                provider.set_bars(if i % 2 == 0 { second.clone() } else { first.clone() });
                let _ = runtime.refresh_market_data().await;
            }
        })
    };
    let ticker = {
        let runtime = runtime.clone();
        tokio::spawn(async move {
            for _ in 0..2_000 {
                assert_eq!(runtime.generate_signal().await, TickOutcome::NoSignal);
            }
        })
    };

    let mut mismatches = 0;
    for _ in 0..5_000 {
        let market = runtime.market_state().await;
        if market.indicators != compute_indicators(&market.bars) {
            mismatches += 1;
        }
        tokio::task::yield_now().await;
    }

    refresher.await.unwrap();
    ticker.await.unwrap();
    assert_eq!(mismatches, 0);

    let market = runtime.market_state().await;
    assert_eq!(market.indicators, compute_indicators(&market.bars));
}
