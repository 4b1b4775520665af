//! Simulation output rows.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One row of a simulated signal series.
///
/// `signal` is the net position change on this bar, `position` the exposure
/// held after this bar, and `strategy_returns` the return earned on this bar by
/// the position held after the *previous* bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub timestamp: NaiveDateTime,
    pub price: f64,
    pub signal: f64,
    pub position: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub returns: f64,
    pub strategy_returns: f64,
}

impl SignalRecord {
    /// A flat row: no exposure, stop and target pinned to price.
    pub fn flat(timestamp: NaiveDateTime, price: f64) -> Self {
        Self {
            timestamp,
            price,
            signal: 0.0,
            position: 0.0,
            stop_loss: price,
            take_profit: price,
            returns: 0.0,
            strategy_returns: 0.0,
        }
    }
}

/// Time-indexed result table produced by the simulation loop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalSeries {
    rows: Vec<SignalRecord>,
}

impl SignalSeries {
    pub fn new(rows: Vec<SignalRecord>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[SignalRecord] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [SignalRecord] {
        &mut self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn positions(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.position).collect()
    }

    /// Market returns, excluding the first row (which has no prior price).
    pub fn returns(&self) -> Vec<f64> {
        self.rows.iter().skip(1).map(|r| r.returns).collect()
    }

    /// Strategy returns, excluding the first row (which has no prior position).
    pub fn strategy_returns(&self) -> Vec<f64> {
        self.rows.iter().skip(1).map(|r| r.strategy_returns).collect()
    }

    /// Number of bars on which the position changed.
    pub fn trade_count(&self) -> usize {
        self.rows.iter().filter(|r| r.signal != 0.0).count()
    }

    /// Recompute `returns` (percent change) and `strategy_returns`
    /// (previous position times current return) for every row.
    pub fn recompute_returns(&mut self) {
        for i in 0..self.rows.len() {
            if i == 0 {
                self.rows[0].returns = 0.0;
                self.rows[0].strategy_returns = 0.0;
                continue;
            }
            let prev_price = self.rows[i - 1].price;
            let ret = if prev_price > 0.0 {
                (self.rows[i].price - prev_price) / prev_price
            } else {
                0.0
            };
            self.rows[i].returns = ret;
            self.rows[i].strategy_returns = self.rows[i - 1].position * ret;
        }
    }

    /// Recompute `signal` as the net position change on every row.
    pub fn recompute_signals(&mut self) {
        let mut prev = 0.0;
        for row in &mut self.rows {
            row.signal = row.position - prev;
            prev = row.position;
        }
    }
}

impl From<Vec<SignalRecord>> for SignalSeries {
    fn from(rows: Vec<SignalRecord>) -> Self {
        Self::new(rows)
    }
}
