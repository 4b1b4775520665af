//! Indicator math over price/volume series.
//!
//! Every function takes plain slices and returns a series aligned to its input.
//! Warmup positions are NaN; callers read the last value through
//! [`rolling::last_valid`] or check lengths up front.

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod rolling;

pub use adx::{directional_index, DirectionalIndex};
pub use atr::{atr, latest_atr, true_range};
pub use bollinger::{bollinger, latest_z_score, BollingerBands};
pub use ema::{ema_of_series, macd, Macd};

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::Bar> {
    let data: Vec<(f64, f64, f64, f64)> = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            (open, open.max(close) + 1.0, open.min(close) - 1.0, close)
        })
        .collect();
    make_ohlc_bars(&data)
}

/// Create bars from explicit (open, high, low, close) tuples, one day apart.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<crate::domain::Bar> {
    use crate::domain::Bar;
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| Bar {
            timestamp: base + chrono::Duration::days(i as i64),
            open,
            high,
            low,
            close,
            volume: 1000.0,
        })
        .collect()
}

/// Assert two f64 values are approximately equal.
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "expected {expected}, got {actual} (diff = {})",
        (actual - expected).abs()
    );
}
