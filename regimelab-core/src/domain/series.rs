//! Validated, time-ordered OHLCV series.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

use super::Bar;

/// A non-empty OHLCV series with sane bars and strictly increasing timestamps.
///
/// Construction is the only validation point: every downstream component may
/// assume the invariants hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Bar>", into = "Vec<Bar>")]
pub struct OhlcvSeries {
    bars: Vec<Bar>,
}

impl OhlcvSeries {
    /// Validate and wrap a bar vector.
    pub fn new(bars: Vec<Bar>) -> Result<Self, EngineError> {
        if bars.is_empty() {
            return Err(EngineError::EmptySeries);
        }
        for (index, bar) in bars.iter().enumerate() {
            if let Some(reason) = bar.sanity_violation() {
                return Err(EngineError::InvalidBar { index, reason });
            }
            if index > 0 && bar.timestamp <= bars[index - 1].timestamp {
                return Err(EngineError::NonMonotonicTimestamp { index });
            }
        }
        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always false; kept for API symmetry with slices.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Copy out a sub-range as a new validated series.
    pub fn slice(&self, range: Range<usize>) -> Result<Self, EngineError> {
        let end = range.end.min(self.bars.len());
        let start = range.start.min(end);
        Self::new(self.bars[start..end].to_vec())
    }

    pub fn into_bars(self) -> Vec<Bar> {
        self.bars
    }
}

impl TryFrom<Vec<Bar>> for OhlcvSeries {
    type Error = EngineError;

    fn try_from(bars: Vec<Bar>) -> Result<Self, Self::Error> {
        Self::new(bars)
    }
}

impl From<OhlcvSeries> for Vec<Bar> {
    fn from(series: OhlcvSeries) -> Self {
        series.bars
    }
}

impl AsRef<[Bar]> for OhlcvSeries {
    fn as_ref(&self) -> &[Bar] {
        &self.bars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn bars(n: usize) -> Vec<Bar> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        (0..n)
            .map(|i| Bar {
                timestamp: base + Duration::hours(4 * i as i64),
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.5,
                volume: 1_000.0,
            })
            .collect()
    }

    #[test]
    fn empty_series_rejected() {
        assert_eq!(OhlcvSeries::new(vec![]), Err(EngineError::EmptySeries));
    }

    #[test]
    fn invalid_bar_reports_index() {
        let mut b = bars(5);
        b[3].close = f64::NAN;
        match OhlcvSeries::new(b) {
            Err(EngineError::InvalidBar { index, .. }) => assert_eq!(index, 3),
            other => panic!("expected InvalidBar, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_timestamp_rejected() {
        let mut b = bars(4);
        b[2].timestamp = b[1].timestamp;
        assert_eq!(
            OhlcvSeries::new(b),
            Err(EngineError::NonMonotonicTimestamp { index: 2 })
        );
    }

    #[test]
    fn slice_clamps_and_validates() {
        let series = OhlcvSeries::new(bars(10)).unwrap();
        assert_eq!(series.slice(2..6).unwrap().len(), 4);
        assert_eq!(series.slice(8..50).unwrap().len(), 2);
        assert_eq!(series.slice(10..12), Err(EngineError::EmptySeries));
    }

    #[test]
    fn deserialization_validates() {
        let mut b = bars(3);
        b[0].high = 50.0;
        let json = serde_json::to_string(&b).unwrap();
        assert!(serde_json::from_str::<OhlcvSeries>(&json).is_err());
    }
}
