//! Fitness function: weighted sum of normalized metric components.
//!
//! Each component is mapped into [0, 1] before weighting, so fitness with
//! non-negative weights summing to 1 is bounded in [0, 1]. Higher is better.

use regimelab_core::EngineError;
use serde::{Deserialize, Serialize};

use crate::metrics::PerformanceMetrics;

/// Component weights. Defaults sum to 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessWeights {
    pub sharpe: f64,
    pub sortino: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub profit_factor: f64,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            sharpe: 0.3,
            sortino: 0.2,
            max_drawdown: 0.2,
            win_rate: 0.15,
            profit_factor: 0.15,
        }
    }
}

impl FitnessWeights {
    pub fn total(&self) -> f64 {
        self.sharpe + self.sortino + self.max_drawdown + self.win_rate + self.profit_factor
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        let all = [
            self.sharpe,
            self.sortino,
            self.max_drawdown,
            self.win_rate,
            self.profit_factor,
        ];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(EngineError::config(
                "fitness weights must be non-negative and finite",
            ));
        }
        if self.total() <= 0.0 {
            return Err(EngineError::config("fitness weights must not all be zero"));
        }
        Ok(())
    }
}

/// Per-component normalized scores, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedScores {
    pub sharpe: f64,
    pub sortino: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub profit_factor: f64,
}

impl NormalizedScores {
    /// sharpe/3, sortino/4, 1 + drawdown, win rate, profit_factor/3; each clipped to [0, 1].
    pub fn from_metrics(m: &PerformanceMetrics) -> Self {
        let unit = |v: f64| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
        Self {
            sharpe: unit(m.sharpe / 3.0),
            sortino: unit(m.sortino / 4.0),
            max_drawdown: unit(1.0 + m.max_drawdown.clamp(-1.0, 0.0)),
            win_rate: unit(m.win_rate),
            profit_factor: unit(m.profit_factor / 3.0),
        }
    }
}

/// Scalar fitness of a metrics record.
pub fn fitness(metrics: &PerformanceMetrics, weights: &FitnessWeights) -> f64 {
    let n = NormalizedScores::from_metrics(metrics);
    n.sharpe * weights.sharpe
        + n.sortino * weights.sortino
        + n.max_drawdown * weights.max_drawdown
        + n.win_rate * weights.win_rate
        + n.profit_factor * weights.profit_factor
}
