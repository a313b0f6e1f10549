//! Unit tests for Bollinger Bands

use crate::test_utils::{bars_from_closes, flat_bars, oversold_bars};
use fxsignal::indicators::volatility::{
    calculate_bollinger_bands, calculate_bollinger_bands_default,
};

#[test]
fn constant_closes_collapse_every_band() {
    let bands = calculate_bollinger_bands_default(&flat_bars(25, 146.9));
    assert_eq!(bands.middle, 146.9);
    assert_eq!(bands.upper, 146.9);
    assert_eq!(bands.lower, 146.9);
    assert_eq!(bands.upper_extreme, 146.9);
    assert_eq!(bands.lower_extreme, 146.9);
    assert!(bands.is_collapsed());
}

#[test]
fn bands_are_symmetric_around_middle() {
    let bands = calculate_bollinger_bands_default(&oversold_bars(false));
    assert!(!bands.is_collapsed());
    assert!((bands.upper - bands.middle - (bands.middle - bands.lower)).abs() < 1e-12);
    assert!(bands.lower_extreme < bands.lower);
    assert!(bands.upper_extreme > bands.upper);

    let sigma = (bands.upper - bands.middle) / 2.0;
    assert!((bands.upper_extreme - bands.middle - 3.0 * sigma).abs() < 1e-12);
}

#[test]
fn only_last_period_closes_count() {
    let mut closes = vec![500.0; 10];
    closes.extend(vec![1.0, 3.0]);
    let bands = calculate_bollinger_bands(&bars_from_closes(&closes, false), 2, 2.0, 3.0);
    assert!((bands.middle - 2.0).abs() < 1e-12);
    assert!((bands.upper - 4.0).abs() < 1e-12);
    assert!((bands.lower - 0.0).abs() < 1e-12);
    assert!((bands.lower_extreme + 1.0).abs() < 1e-12);
}

#[test]
fn empty_series_yields_default() {
    let bands = calculate_bollinger_bands_default(&[]);
    assert_eq!(bands.middle, 0.0);
    assert!(bands.is_collapsed());
}
