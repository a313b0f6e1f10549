//! Signal runtime: owns scheduler state and the market cache, and implements
//! the bodies of the three periodic activities.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::config::VenueFallback;
use crate::core::clock::Clock;
use crate::error::MarketDataError;
use crate::indicators::{compute_indicators, MIN_BARS};
use crate::metrics::Metrics;
use crate::models::indicators::IndicatorSnapshot;
use crate::models::market::{Bar, TimeFrame, TradingPair};
use crate::models::signal::Signal;
use crate::services::market_data::MarketDataProvider;
use crate::services::notifier::NotifierSet;
use crate::signals::engine::SignalEngine;
use crate::signals::log::SignalLog;
use crate::signals::session::{SessionBlock, TradingSession};

/// Configuration for the signal runtime
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub symbol: TradingPair,
    pub timeframe: TimeFrame,
    pub bar_count: usize,
    pub market_refresh_interval: Duration,
    pub venue_check_interval: Duration,
    /// 60 s signal ticks when set, 180 s otherwise.
    pub precision_mode: bool,
    pub min_signal_gap: Duration,
    pub countdown: Duration,
    pub venue_fallback: VenueFallback,
    pub notifications_enabled: bool,
}

impl RuntimeConfig {
    pub fn signal_interval(&self) -> Duration {
        if self.precision_mode {
            Duration::from_secs(60)
        } else {
            Duration::from_secs(180)
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            symbol: TradingPair::UsdJpy,
            timeframe: TimeFrame::M1,
            bar_count: 100,
            market_refresh_interval: Duration::from_secs(1),
            venue_check_interval: Duration::from_secs(300),
            precision_mode: true,
            min_signal_gap: Duration::from_secs(120),
            countdown: Duration::from_secs(15),
            venue_fallback: VenueFallback::AssumeActive,
            notifications_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerState {
    /// Epoch ms of the last emitted signal, 0 before the first one.
    pub last_signal_time: i64,
    pub is_running: bool,
    pub countdown_active: bool,
}

/// Last-known-good market data plus connectivity flags.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketState {
    pub bars: Vec<Bar>,
    pub indicators: IndicatorSnapshot,
    pub current_price: Option<f64>,
    pub is_connected: bool,
    pub last_error: Option<String>,
    pub venue_active: bool,
    pub last_update: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    VenueInactive,
    SignalGap,
    OutsideSession,
    NewsBlackout,
    Weekend,
    NoMarketData,
    InsufficientData,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::VenueInactive => "venue_inactive",
            SkipReason::SignalGap => "signal_gap",
            SkipReason::OutsideSession => "outside_session",
            SkipReason::NewsBlackout => "news_blackout",
            SkipReason::Weekend => "weekend",
            SkipReason::NoMarketData => "no_market_data",
            SkipReason::InsufficientData => "insufficient_data",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<SessionBlock> for SkipReason {
    fn from(block: SessionBlock) -> Self {
        match block {
            SessionBlock::OutsideWindow => SkipReason::OutsideSession,
            SessionBlock::NewsBlackout => SkipReason::NewsBlackout,
            SessionBlock::Weekend => SkipReason::Weekend,
        }
    }
}

/// Result of one signal-generation tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Skipped(SkipReason),
    NoSignal,
    Emitted(Signal),
}

impl TickOutcome {
    pub fn signal(&self) -> Option<&Signal> {
        match self {
            TickOutcome::Emitted(signal) => Some(signal),
            _ => None,
        }
    }
}

/// Controller shared by the scheduler tasks and the HTTP API.
pub struct SignalRuntime {
    config: RuntimeConfig,
    provider: Arc<dyn MarketDataProvider>,
    clock: Arc<dyn Clock>,
    session: TradingSession,
    notifiers: NotifierSet,
    metrics: Option<Arc<Metrics>>,
    scheduler: Arc<RwLock<SchedulerState>>,
    market: RwLock<MarketState>,
    signals: RwLock<SignalLog>,
}

impl SignalRuntime {
    pub fn new(
        config: RuntimeConfig,
        provider: Arc<dyn MarketDataProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let market = MarketState {
            venue_active: config.venue_fallback.is_active(),
            ..MarketState::default()
        };
        Self {
            config,
            provider,
            clock,
            session: TradingSession::default(),
            notifiers: NotifierSet::new(),
            metrics: None,
            scheduler: Arc::new(RwLock::new(SchedulerState::default())),
            market: RwLock::new(market),
            signals: RwLock::new(SignalLog::new()),
        }
    }

    pub fn with_session(mut self, session: TradingSession) -> Self {
        self.session = session;
        self
    }

    pub fn with_notifiers(mut self, notifiers: NotifierSet) -> Self {
        self.notifiers = notifiers;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        metrics
            .venue_active
            .set(if self.config.venue_fallback.is_active() { 1.0 } else { 0.0 });
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn session(&self) -> &TradingSession {
        &self.session
    }

    pub fn provider(&self) -> &Arc<dyn MarketDataProvider> {
        &self.provider
    }

    pub async fn scheduler_state(&self) -> SchedulerState {
        self.scheduler.read().await.clone()
    }

    pub async fn market_state(&self) -> MarketState {
        self.market.read().await.clone()
    }

    pub async fn recent_signals(&self, limit: usize) -> Vec<Signal> {
        self.signals.read().await.recent(limit)
    }

    pub async fn signal_count(&self) -> usize {
        self.signals.read().await.len()
    }

    pub async fn clear_signals(&self) {
        self.signals.write().await.clear();
    }

    pub(crate) async fn set_running(&self, running: bool) {
        self.scheduler.write().await.is_running = running;
    }

    /// Fetch bars for the selected pair and replace the cache.
    ///
    /// On failure the previous bars are kept and the connection is flagged
    /// as lost; the error is returned for the caller to log or ignore.
    pub async fn refresh_market_data(&self) -> Result<(), MarketDataError> {
        let symbol = self.config.symbol.as_str();
        let fetched = self
            .provider
            .get_bars(symbol, self.config.timeframe, self.config.bar_count)
            .await;

        let bars = match fetched {
            Ok(bars) => bars,
            Err(e) => {
                self.record_failure(&e).await;
                return Err(e);
            }
        };

        let (indicators, current_price) = if bars.is_empty() {
            // No bars yet: fall back to the quote for a current price.
            match self.provider.get_latest_quote(symbol).await {
                Ok(quote) => (IndicatorSnapshot::default(), Some(quote.mid())),
                Err(e) => {
                    self.record_failure(&e).await;
                    return Err(e);
                }
            }
        } else {
            (compute_indicators(&bars), bars.last().map(|b| b.close))
        };

        let now = self.clock.now_millis();
        {
            let mut market = self.market.write().await;
            debug!(
                symbol = %self.config.symbol,
                bars = bars.len(),
                "Market data refreshed"
            );
            market.bars = bars;
            market.indicators = indicators;
            market.current_price = current_price;
            market.is_connected = true;
            market.last_error = None;
            market.last_update = Some(now);
        }

        if let Some(metrics) = &self.metrics {
            metrics.market_data_connected.set(1.0);
        }
        Ok(())
    }

    async fn record_failure(&self, e: &MarketDataError) {
        if e.is_transient() {
            warn!(symbol = %self.config.symbol, error = %e, "Market data refresh failed");
        } else {
            error!(symbol = %self.config.symbol, error = %e, "Market data request rejected");
        }

        {
            let mut market = self.market.write().await;
            market.is_connected = false;
            market.last_error = Some(e.to_string());
        }

        if let Some(metrics) = &self.metrics {
            metrics.market_data_failures_total.inc();
            metrics.market_data_connected.set(0.0);
        }
    }

    /// Ask the provider whether the venue is open, applying the configured
    /// fallback when the check itself fails. Returns the stored flag.
    pub async fn check_venue_status(&self) -> bool {
        let active = match self.provider.get_venue_status().await {
            Ok(status) => {
                if !status.is_active {
                    info!(message = ?status.message, "Venue reported inactive");
                }
                status.is_active
            }
            Err(e) => {
                let fallback = self.config.venue_fallback.is_active();
                warn!(error = %e, fallback, "Venue check failed, using fallback");
                fallback
            }
        };

        self.market.write().await.venue_active = active;
        if let Some(metrics) = &self.metrics {
            metrics.venue_active.set(if active { 1.0 } else { 0.0 });
        }
        active
    }

    /// One signal-generation tick. Gates are checked in order and the first
    /// failing one short-circuits.
    pub async fn generate_signal(&self) -> TickOutcome {
        if let Some(metrics) = &self.metrics {
            metrics.signal_ticks_total.inc();
        }

        let outcome = self.run_tick().await;
        match &outcome {
            TickOutcome::Skipped(reason) => {
                debug!(reason = %reason, "Signal tick skipped");
                if let Some(metrics) = &self.metrics {
                    metrics
                        .signal_ticks_skipped_total
                        .with_label_values(&[reason.as_str()])
                        .inc();
                }
            }
            TickOutcome::NoSignal => debug!("Signal tick produced no signal"),
            TickOutcome::Emitted(_) => {}
        }
        outcome
    }

    async fn run_tick(&self) -> TickOutcome {
        let now = self.clock.now();
        let now_ms = now.timestamp_millis();
        let min_gap = self.config.min_signal_gap.as_millis() as i64;

        if !self.market.read().await.venue_active {
            return TickOutcome::Skipped(SkipReason::VenueInactive);
        }

        let last_signal_time = self.scheduler.read().await.last_signal_time;
        if now_ms - last_signal_time < min_gap {
            return TickOutcome::Skipped(SkipReason::SignalGap);
        }

        if let Err(block) = self.session.check(now) {
            return TickOutcome::Skipped(block.into());
        }

        let bars = self.market.read().await.bars.clone();
        if bars.is_empty() {
            if let Err(e) = self.refresh_market_data().await {
                debug!(error = %e, "Refresh triggered by empty cache failed");
            }
            return TickOutcome::Skipped(SkipReason::NoMarketData);
        }
        if bars.len() < MIN_BARS {
            return TickOutcome::Skipped(SkipReason::InsufficientData);
        }

        // The cached snapshot is owned by the refresh, which replaces it
        // together with the bars.
        let (_, signal) =
            SignalEngine::evaluate(self.config.symbol, self.config.timeframe, &bars, now);

        let Some(signal) = signal else {
            return TickOutcome::NoSignal;
        };

        {
            let mut scheduler = self.scheduler.write().await;
            let mut log = self.signals.write().await;
            if now_ms - scheduler.last_signal_time < min_gap {
                return TickOutcome::Skipped(SkipReason::SignalGap);
            }
            log.push(signal.clone());
            scheduler.last_signal_time = now_ms;
            scheduler.countdown_active = true;
        }
        self.spawn_countdown_reset(now_ms);

        info!(
            id = %signal.id,
            symbol = %signal.symbol,
            direction = %signal.direction,
            confidence = signal.confidence,
            entry_price = signal.entry_price,
            "Signal emitted: {}",
            signal.analysis
        );
        if let Some(metrics) = &self.metrics {
            metrics.signals_emitted_total.inc();
        }

        if self.config.notifications_enabled {
            self.notifiers.notify_all(&signal).await;
        }

        TickOutcome::Emitted(signal)
    }

    /// Clear the countdown flag once the window elapses, unless a newer
    /// signal has restarted it.
    fn spawn_countdown_reset(&self, signal_time: i64) {
        let scheduler = self.scheduler.clone();
        let countdown = self.config.countdown;
        tokio::spawn(async move {
            tokio::time::sleep(countdown).await;
            let mut state = scheduler.write().await;
            if state.last_signal_time == signal_time {
                state.countdown_active = false;
            }
        });
    }
}
