//! Bar: the fundamental market data unit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single symbol at a single timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Returns true if any OHLCV field is NaN or infinite.
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite())
    }

    /// Describe the first OHLCV sanity violation, if any.
    ///
    /// Checks: finite fields, positive prices, non-negative volume, and
    /// open/close inside the [low, high] range.
    pub fn sanity_violation(&self) -> Option<String> {
        if self.is_void() {
            return Some("non-finite OHLCV field".into());
        }
        if self.open <= 0.0 || self.high <= 0.0 || self.low <= 0.0 || self.close <= 0.0 {
            return Some("prices must be positive".into());
        }
        if self.volume < 0.0 {
            return Some(format!("negative volume {}", self.volume));
        }
        if self.high < self.low {
            return Some(format!("high {} below low {}", self.high, self.low));
        }
        if self.close > self.high || self.close < self.low {
            return Some(format!(
                "close {} outside [{}, {}]",
                self.close, self.low, self.high
            ));
        }
        if self.open > self.high || self.open < self.low {
            return Some(format!(
                "open {} outside [{}, {}]",
                self.open, self.low, self.high
            ));
        }
        None
    }

    /// Basic OHLCV sanity check.
    pub fn is_sane(&self) -> bool {
        self.sanity_violation().is_none()
    }
}
