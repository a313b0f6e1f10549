//! Indicator engine: Bollinger Bands, EMA20 and RSI14 over a bar series.

pub mod momentum;
pub mod trend;
pub mod volatility;

use crate::models::indicators::IndicatorSnapshot;
use crate::models::market::Bar;

/// Bars needed before the 20-period windows are fully populated.
pub const MIN_BARS: usize = volatility::BOLLINGER_PERIOD;

/// Compute a fresh indicator snapshot from bars ordered oldest to newest.
///
/// An empty series yields `IndicatorSnapshot::default()`. Shorter series are
/// still evaluated over truncated windows.
pub fn compute_indicators(bars: &[Bar]) -> IndicatorSnapshot {
    if bars.is_empty() {
        return IndicatorSnapshot::default();
    }

    IndicatorSnapshot {
        bollinger: volatility::calculate_bollinger_bands_default(bars),
        ema20: trend::calculate_ema_default(bars).unwrap_or_default(),
        rsi: momentum::calculate_rsi_default(bars).unwrap_or_default(),
    }
}
