//! EMA (Exponential Moving Average) indicator

use crate::common::math;
use crate::models::market::Bar;

pub const EMA_PERIOD: usize = 20;

/// Calculate the EMA of closes for a specific period
///
/// The recurrence runs over every available bar, not just the last `period`,
/// seeded with the oldest close.
pub fn calculate_ema(bars: &[Bar], period: usize) -> Option<f64> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    math::ema(&closes, period)
}

/// Calculate EMA with default period (20)
pub fn calculate_ema_default(bars: &[Bar]) -> Option<f64> {
    calculate_ema(bars, EMA_PERIOD)
}

/// Relative distance between price and EMA, `|price - ema| / price`
pub fn ema_distance(price: f64, ema: f64) -> f64 {
    if price == 0.0 {
        return f64::INFINITY;
    }
    (price - ema).abs() / price
}
