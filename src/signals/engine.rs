//! Bars in, indicator snapshot and optional signal out.

use chrono::{DateTime, Utc};

use crate::indicators::compute_indicators;
use crate::models::indicators::IndicatorSnapshot;
use crate::models::market::{Bar, TimeFrame, TradingPair};
use crate::models::signal::Signal;
use crate::signals::decision::SignalDecision;

pub struct SignalEngine;

impl SignalEngine {
    /// Recompute indicators over `bars` and run the decision on the newest bar.
    pub fn evaluate(
        symbol: TradingPair,
        timeframe: TimeFrame,
        bars: &[Bar],
        at: DateTime<Utc>,
    ) -> (IndicatorSnapshot, Option<Signal>) {
        let indicators = compute_indicators(bars);
        let signal = bars
            .last()
            .and_then(|latest| SignalDecision::decide(symbol, timeframe, latest, &indicators, at));
        (indicators, signal)
    }
}
