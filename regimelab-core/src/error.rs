//! Engine error taxonomy.
//!
//! Input problems and short histories fail fast before any computation.
//! Degenerate metrics (zero variance, no losing bars) are never errors; they
//! resolve to bounded values in the code that computes them.

use thiserror::Error;

/// Errors raised by the core engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("input series is empty")]
    EmptySeries,

    #[error("invalid bar at index {index}: {reason}")]
    InvalidBar { index: usize, reason: String },

    #[error("timestamp at index {index} is not strictly after the previous bar")]
    NonMonotonicTimestamp { index: usize },

    #[error("insufficient history: {required} bars required, {available} available")]
    InsufficientHistory { required: usize, available: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl EngineError {
    /// Shorthand for building an `InvalidConfig` error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
