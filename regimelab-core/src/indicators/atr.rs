//! True Range and simple-mean ATR.
//!
//! TR[0] = high - low (no previous close).
//! TR[t] = max(high - low, |high - close[t-1]|, |low - close[t-1]|).
//! ATR = rolling mean of TR over `period`; first valid index is period - 1.

use crate::domain::Bar;
use crate::indicators::rolling::{last_valid, rolling_mean};

/// Compute the True Range series from bars.
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    let mut tr = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        let range = bar.high - bar.low;
        if i == 0 {
            tr.push(range);
            continue;
        }
        let pc = bars[i - 1].close;
        tr.push(range.max((bar.high - pc).abs()).max((bar.low - pc).abs()));
    }
    tr
}

/// ATR series (simple rolling mean of True Range).
pub fn atr(bars: &[Bar], period: usize) -> Vec<f64> {
    rolling_mean(&true_range(bars), period)
}

/// ATR at the last bar, or `None` when fewer than `period` bars are available.
pub fn latest_atr(bars: &[Bar], period: usize) -> Option<f64> {
    last_valid(&atr(bars, period))
}
