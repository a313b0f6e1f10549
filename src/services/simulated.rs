//! Offline market data: a seeded random walk around reference FX rates.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::core::clock::Clock;
use crate::error::MarketDataError;
use crate::models::market::{Bar, Quote, TimeFrame, TradingPair, VenueStatus};
use crate::services::market_data::{resolve_pair, MarketDataProvider};

/// Bars kept per series.
const MAX_HISTORY: usize = 1_000;
/// Per-bar volatility as a fraction of price.
const BAR_VOLATILITY: f64 = 0.0003;

/// Units of each currency per US dollar.
fn usd_rate(currency: &str) -> f64 {
    match currency {
        "EUR" => 0.85,
        "GBP" => 0.74,
        "JPY" => 147.0,
        "AUD" => 1.52,
        "CAD" => 1.36,
        "CHF" => 0.79,
        "NZD" => 1.66,
        _ => 1.0,
    }
}

/// Starting price for a pair, derived from the USD cross rates.
pub fn reference_rate(pair: TradingPair) -> f64 {
    let (from, to) = pair.currencies();
    usd_rate(to) / usd_rate(from)
}

struct SimState {
    rng: StdRng,
    series: HashMap<(TradingPair, TimeFrame), Vec<Bar>>,
}

pub struct SimulatedProvider {
    clock: Arc<dyn Clock>,
    state: Mutex<SimState>,
}

impl SimulatedProvider {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_rng(StdRng::from_entropy(), clock)
    }

    /// Same seed and clock readings produce the same bars.
    pub fn with_seed(seed: u64, clock: Arc<dyn Clock>) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), clock)
    }

    fn with_rng(rng: StdRng, clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: Mutex::new(SimState {
                rng,
                series: HashMap::new(),
            }),
        }
    }

    async fn series(
        &self,
        pair: TradingPair,
        timeframe: TimeFrame,
        count: usize,
    ) -> Vec<Bar> {
        let step = timeframe.duration_ms();
        let now = self.clock.now_millis();
        let aligned_now = now - now.rem_euclid(step);
        let history = count.clamp(1, MAX_HISTORY);

        let mut guard = self.state.lock().await;
        let SimState { rng, series } = &mut *guard;
        let bars = series.entry((pair, timeframe)).or_default();

        let last = bars.last().map(|b| (b.timestamp + step, b.close));
        let earliest = aligned_now - (history as i64 - 1) * step;
        let (mut ts, mut price) = match last {
            Some((next, close)) if next >= earliest => (next, close),
            Some((_, close)) => {
                bars.clear();
                (earliest, close)
            }
            None => (earliest, reference_rate(pair)),
        };

        while ts <= aligned_now {
            let bar = random_bar(rng, ts, price);
            price = bar.close;
            bars.push(bar);
            ts += step;
        }

        // Series first created by a short request get deeper history on demand.
        let missing = history.saturating_sub(bars.len());
        if missing > 0 {
            let mut older = Vec::with_capacity(missing);
            let (mut ts, mut close) = match bars.first() {
                Some(first) => (first.timestamp - step, first.open),
                None => (aligned_now, reference_rate(pair)),
            };
            for _ in 0..missing {
                let bar = random_bar_before(rng, ts, close);
                close = bar.open;
                older.push(bar);
                ts -= step;
            }
            older.reverse();
            older.append(bars);
            *bars = older;
        }

        if bars.len() > MAX_HISTORY {
            bars.drain(..bars.len() - MAX_HISTORY);
        }

        let start = bars.len().saturating_sub(count);
        bars[start..].to_vec()
    }
}

fn random_bar(rng: &mut StdRng, timestamp: i64, open: f64) -> Bar {
    let sigma = open * BAR_VOLATILITY;
    let close = open + rng.gen_range(-1.0..1.0) * sigma;
    let high = open.max(close) + rng.gen_range(0.0..0.5) * sigma;
    let low = open.min(close) - rng.gen_range(0.0..0.5) * sigma;
    let volume = rng.gen_range(50.0..500.0_f64).round();
    Bar::new(timestamp, open, high, low, close).with_volume(volume)
}

/// A bar that ends at `close`, for extending a series into the past.
fn random_bar_before(rng: &mut StdRng, timestamp: i64, close: f64) -> Bar {
    let sigma = close * BAR_VOLATILITY;
    let open = close + rng.gen_range(-1.0..1.0) * sigma;
    let high = open.max(close) + rng.gen_range(0.0..0.5) * sigma;
    let low = open.min(close) - rng.gen_range(0.0..0.5) * sigma;
    let volume = rng.gen_range(50.0..500.0_f64).round();
    Bar::new(timestamp, open, high, low, close).with_volume(volume)
}

#[async_trait]
impl MarketDataProvider for SimulatedProvider {
    async fn get_bars(
        &self,
        symbol: &str,
        timeframe: TimeFrame,
        count: usize,
    ) -> Result<Vec<Bar>, MarketDataError> {
        let pair = resolve_pair(symbol)?;
        if count == 0 {
            return Ok(Vec::new());
        }
        Ok(self.series(pair, timeframe, count).await)
    }

    async fn get_latest_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        let pair = resolve_pair(symbol)?;
        let last = self
            .series(pair, TimeFrame::M1, 1)
            .await
            .last()
            .map_or_else(|| reference_rate(pair), |b| b.close);
        let half_spread = pair.pip() / 2.0;
        Ok(Quote {
            bid: last - half_spread,
            ask: last + half_spread,
            timestamp: self.clock.now_millis(),
        })
    }

    async fn get_venue_status(&self) -> Result<VenueStatus, MarketDataError> {
        Ok(VenueStatus::active())
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}
