//! Bollinger Bands indicator

use crate::common::math;
use crate::models::indicators::BollingerBands;
use crate::models::market::Bar;

pub const BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_STD_DEV: f64 = 2.0;
pub const BOLLINGER_EXTREME_STD_DEV: f64 = 3.0;

/// Calculate Bollinger Bands with an extra extreme envelope
///
/// Middle Band = SMA(period)
/// Upper/Lower Band = Middle ± (std_dev * σ)
/// Upper/Lower Extreme = Middle ± (extreme_std_dev * σ)
///
/// σ is the population standard deviation of the same window.
pub fn calculate_bollinger_bands(
    bars: &[Bar],
    period: usize,
    std_dev: f64,
    extreme_std_dev: f64,
) -> BollingerBands {
    if bars.is_empty() {
        return BollingerBands::default();
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let middle = math::trailing_mean(&closes, period);
    let sigma = math::trailing_std_dev(&closes, period, middle);

    BollingerBands {
        upper: middle + std_dev * sigma,
        middle,
        lower: middle - std_dev * sigma,
        upper_extreme: middle + extreme_std_dev * sigma,
        lower_extreme: middle - extreme_std_dev * sigma,
    }
}

/// Calculate Bollinger Bands with default parameters (20 SMA, 2σ, 3σ extreme)
pub fn calculate_bollinger_bands_default(bars: &[Bar]) -> BollingerBands {
    calculate_bollinger_bands(
        bars,
        BOLLINGER_PERIOD,
        BOLLINGER_STD_DEV,
        BOLLINGER_EXTREME_STD_DEV,
    )
}
