//! RSI (Relative Strength Index) indicator

use crate::common::math;
use crate::models::market::Bar;

pub const RSI_PERIOD: usize = 14;

/// Calculate RSI indicator
///
/// RSI = 100 - (100 / (1 + RS))
/// RS = Average Gain / Average Loss
///
/// Averages are simple means over the last `period` deltas. A zero average
/// loss is replaced by 1, so a series with no losses reads as
/// `100 - 100 / (1 + avg_gain)` rather than 100.
pub fn calculate_rsi(bars: &[Bar], period: usize) -> Option<f64> {
    if bars.is_empty() {
        return None;
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let (avg_gain, avg_loss) = math::average_gain_loss(&closes, period);
    let avg_loss = if avg_loss == 0.0 { 1.0 } else { avg_loss };

    let rs = avg_gain / avg_loss;
    Some(100.0 - (100.0 / (1.0 + rs)))
}

/// Calculate RSI with default period (14)
pub fn calculate_rsi_default(bars: &[Bar]) -> Option<f64> {
    calculate_rsi(bars, RSI_PERIOD)
}
