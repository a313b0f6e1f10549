//! Window arithmetic used by the indicators.
//!
//! Every trailing-window helper divides by the nominal `period`, even when the
//! series is shorter than the window. Short series therefore yield damped
//! values instead of an error.

/// The last `period` values (or all of them when fewer are available).
pub fn trailing_window(values: &[f64], period: usize) -> &[f64] {
    let start = values.len().saturating_sub(period);
    &values[start..]
}

/// Simple moving average over the trailing window.
///
/// Computed relative to the first sample of the window so a flat window
/// returns that sample exactly.
pub fn trailing_mean(values: &[f64], period: usize) -> f64 {
    let window = trailing_window(values, period);
    let Some(&anchor) = window.first() else {
        return 0.0;
    };
    if period == 0 {
        return 0.0;
    }

    let period = period as f64;
    let offset: f64 = window.iter().map(|v| v - anchor).sum::<f64>() / period;
    anchor * (window.len() as f64 / period) + offset
}

/// Population standard deviation of the trailing window around `mean`.
pub fn trailing_std_dev(values: &[f64], period: usize, mean: f64) -> f64 {
    if period == 0 {
        return 0.0;
    }
    let window = trailing_window(values, period);
    let variance = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / period as f64;
    variance.sqrt()
}

/// Smoothing factor `2 / (period + 1)`.
pub fn ema_multiplier(period: usize) -> f64 {
    2.0 / (period as f64 + 1.0)
}

/// Exponential moving average over the whole series, seeded with the first value.
pub fn ema(values: &[f64], period: usize) -> Option<f64> {
    let (&seed, rest) = values.split_first()?;
    let k = ema_multiplier(period);
    Some(rest.iter().fold(seed, |prev, &v| v * k + prev * (1.0 - k)))
}

/// Average gain and average loss over the trailing `period` one-step deltas.
pub fn average_gain_loss(values: &[f64], period: usize) -> (f64, f64) {
    if period == 0 || values.len() < 2 {
        return (0.0, 0.0);
    }

    let deltas: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
    let window = trailing_window(&deltas, period);

    let gains: f64 = window.iter().filter(|d| **d > 0.0).sum();
    let losses: f64 = window.iter().filter(|d| **d < 0.0).map(|d| d.abs()).sum();

    (gains / period as f64, losses / period as f64)
}
