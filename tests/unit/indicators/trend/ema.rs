//! Unit tests for EMA indicator

use crate::test_utils::{bars_from_closes, flat_bars};
use fxsignal::indicators::trend::{calculate_ema, calculate_ema_default, ema_distance};

#[test]
fn ema_of_empty_series_is_none() {
    assert!(calculate_ema_default(&[]).is_none());
}

#[test]
fn ema_of_constant_series_is_the_constant() {
    let ema = calculate_ema_default(&flat_bars(30, 146.9)).unwrap();
    assert!((ema - 146.9).abs() < 1e-9);
}

#[test]
fn ema_runs_over_all_bars_not_just_period() {
    // A large early close still pulls the EMA long after it leaves a 20-bar window.
    let mut closes = vec![200.0];
    closes.extend(vec![100.0; 30]);
    let ema = calculate_ema(&bars_from_closes(&closes, false), 20).unwrap();

    let k: f64 = 2.0 / 21.0;
    let expected = 100.0 + 100.0 * (1.0 - k).powi(30);
    assert!((ema - expected).abs() < 1e-9);
    assert!(ema > 100.0);
}

#[test]
fn ema_lags_a_rising_series() {
    let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
    let ema = calculate_ema_default(&bars_from_closes(&closes, false)).unwrap();
    assert!(ema < 139.0);
    assert!(ema > 100.0);
}

#[test]
fn ema_distance_is_relative_to_price() {
    assert!((ema_distance(100.0, 99.95) - 0.0005).abs() < 1e-12);
    assert_eq!(ema_distance(0.0, 1.0), f64::INFINITY);
}
