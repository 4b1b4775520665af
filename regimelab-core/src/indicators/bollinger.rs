//! Bollinger Bands: rolling mean +/- `num_std` sample standard deviations.
//!
//! Lookback: window - 1.

use crate::indicators::rolling::{mean, rolling_mean, rolling_std, sample_std};

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerBands {
    pub middle: Vec<f64>,
    pub upper: Vec<f64>,
    pub lower: Vec<f64>,
}

pub fn bollinger(values: &[f64], window: usize, num_std: f64) -> BollingerBands {
    let middle = rolling_mean(values, window);
    let std = rolling_std(values, window);
    let upper = middle
        .iter()
        .zip(&std)
        .map(|(m, s)| m + num_std * s)
        .collect();
    let lower = middle
        .iter()
        .zip(&std)
        .map(|(m, s)| m - num_std * s)
        .collect();
    BollingerBands {
        middle,
        upper,
        lower,
    }
}

/// Z-score of the last value against its trailing `window`.
///
/// `None` when fewer than `window` values are available; 0.0 when the window
/// has zero dispersion.
pub fn latest_z_score(values: &[f64], window: usize) -> Option<f64> {
    if window < 2 || values.len() < window {
        return None;
    }
    let tail = &values[values.len() - window..];
    let std = sample_std(tail);
    let last = *tail.last()?;
    if std > 0.0 {
        Some((last - mean(tail)) / std)
    } else {
        Some(0.0)
    }
}
