//! Directional movement: +DI, -DI and ADX over simple rolling means.
//!
//! Steps:
//! 1. +DM = high[t] - high[t-1] when it exceeds the down move and is positive, else 0
//! 2. -DM = low[t-1] - low[t] when positive and +DM was not taken, else 0
//!    (an equal up and down move counts as -DM)
//! 3. ATR = mean(TR, period); +DI = 100 * mean(+DM, period) / ATR (same for -DI)
//! 4. DX = 100 * |+DI - -DI| / (+DI + -DI)
//! 5. ADX = mean(DX, period)
//!
//! Degenerate divisions resolve to 0 instead of NaN: a zero ATR gives DI = 0 and
//! a zero DI sum gives DX = 0. The first valid ADX is at index 2 * period - 2.

use crate::domain::Bar;
use crate::indicators::atr::true_range;
use crate::indicators::rolling::rolling_mean;

/// Aligned directional-movement series.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalIndex {
    pub atr: Vec<f64>,
    pub plus_di: Vec<f64>,
    pub minus_di: Vec<f64>,
    pub adx: Vec<f64>,
}

/// Raw +DM / -DM series. Index 0 is 0.0 for both.
pub fn directional_movement(bars: &[Bar]) -> (Vec<f64>, Vec<f64>) {
    let n = bars.len();
    let mut plus_dm = vec![0.0; n];
    let mut minus_dm = vec![0.0; n];
    for i in 1..n {
        let up = bars[i].high - bars[i - 1].high;
        let down = bars[i - 1].low - bars[i].low;
        if up > down && up > 0.0 {
            plus_dm[i] = up;
        } else if down > 0.0 {
            minus_dm[i] = down;
        }
    }
    (plus_dm, minus_dm)
}

/// Compute ATR, +DI, -DI and ADX for `period`.
pub fn directional_index(bars: &[Bar], period: usize) -> DirectionalIndex {
    let n = bars.len();
    let atr = rolling_mean(&true_range(bars), period);
    let (plus_dm, minus_dm) = directional_movement(bars);
    let smooth_plus = rolling_mean(&plus_dm, period);
    let smooth_minus = rolling_mean(&minus_dm, period);

    let mut plus_di = vec![f64::NAN; n];
    let mut minus_di = vec![f64::NAN; n];
    let mut dx = vec![f64::NAN; n];
    for i in 0..n {
        if atr[i].is_nan() || smooth_plus[i].is_nan() || smooth_minus[i].is_nan() {
            continue;
        }
        let (p, m) = if atr[i] > 0.0 {
            (
                100.0 * smooth_plus[i] / atr[i],
                100.0 * smooth_minus[i] / atr[i],
            )
        } else {
            (0.0, 0.0)
        };
        plus_di[i] = p;
        minus_di[i] = m;
        let sum = p + m;
        dx[i] = if sum > 0.0 {
            100.0 * (p - m).abs() / sum
        } else {
            0.0
        };
    }

    let adx = rolling_mean(&dx, period);
    DirectionalIndex {
        atr,
        plus_di,
        minus_di,
        adx,
    }
}
