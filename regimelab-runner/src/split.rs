//! Chronological train/test splitting.

use regimelab_core::{EngineError, OhlcvSeries};

pub const DEFAULT_TRAIN_RATIO: f64 = 0.7;

/// Split at `floor(len * train_ratio)`: the first part trains, the rest tests.
///
/// Both halves must be non-empty.
pub fn split_train_test(
    series: &OhlcvSeries,
    train_ratio: f64,
) -> Result<(OhlcvSeries, OhlcvSeries), EngineError> {
    if !(train_ratio > 0.0 && train_ratio < 1.0) {
        return Err(EngineError::config(format!(
            "train_ratio must be in (0, 1), got {train_ratio}"
        )));
    }
    let n = series.len();
    let cut = (n as f64 * train_ratio).floor() as usize;
    if cut == 0 || cut >= n {
        return Err(EngineError::InsufficientHistory {
            required: 2,
            available: n,
        });
    }
    Ok((series.slice(0..cut)?, series.slice(cut..n)?))
}
