//! Domain types for RegimeLab

pub mod bar;
pub mod record;
pub mod series;

pub use bar::Bar;
pub use record::{SignalRecord, SignalSeries};
pub use series::OhlcvSeries;
