//! OHLCV loading from CSV.
//!
//! Expected header: `timestamp,open,high,low,close,volume` (capitalized names
//! and `date` for the timestamp column are accepted). Timestamps may be
//! RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` or `YYYY-MM-DD`.
//! The parsed bars go through [`OhlcvSeries::new`], so empty files, broken
//! bars and out-of-order rows fail here rather than downstream.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regimelab_core::{Bar, EngineError, OhlcvSeries};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: unrecognized timestamp '{value}'")]
    Timestamp { row: usize, value: String },

    #[error("invalid series: {0}")]
    Invalid(#[from] EngineError),
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "Timestamp", alias = "date", alias = "Date")]
    timestamp: String,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close")]
    close: f64,
    #[serde(alias = "Volume")]
    volume: f64,
}

/// Load and validate an OHLCV series from a CSV file.
pub fn load_csv(path: impl AsRef<Path>) -> Result<OhlcvSeries, LoadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let series = read_csv(file)?;
    debug!(path = %path.display(), bars = series.len(), "loaded csv");
    Ok(series)
}

/// Parse and validate an OHLCV series from any CSV reader.
pub fn read_csv<R: Read>(reader: R) -> Result<OhlcvSeries, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut bars = Vec::new();
    for (row, record) in csv_reader.deserialize::<CsvRow>().enumerate() {
        let record = record?;
        let timestamp = parse_timestamp(&record.timestamp).ok_or_else(|| LoadError::Timestamp {
            row,
            value: record.timestamp.clone(),
        })?;
        bars.push(Bar {
            timestamp,
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
            volume: record.volume,
        });
    }
    Ok(OhlcvSeries::new(bars)?)
}

/// Parse the supported timestamp formats. RFC 3339 values are converted to UTC.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
