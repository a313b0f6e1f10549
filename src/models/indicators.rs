use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    pub upper_extreme: f64,
    pub lower_extreme: f64,
}

impl BollingerBands {
    /// Envelope width between the 2σ bands.
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// A zero-variance window collapses every band onto the mean.
    pub fn is_collapsed(&self) -> bool {
        let width = self.width();
        width.is_nan() || width <= 0.0
    }
}

/// Indicator values derived from one bar series. Empty input yields the
/// all-zero default, which callers treat as "insufficient data".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorSnapshot {
    pub bollinger: BollingerBands,
    pub ema20: f64,
    pub rsi: f64,
}
