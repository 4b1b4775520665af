//! Signal simulation loop: the sequential, path-dependent core.
//!
//! Per step t:
//! 1. Refresh the market context every `context_refresh_interval` steps from
//!    the trailing window (reuse the previous context otherwise)
//! 2. Ask the raw-signal source for a view on the trailing window
//! 3. Size the candidate position and derive candidate stop/target levels
//! 4. If the previous position was open and price crossed the previous stop
//!    or target, force the position flat regardless of the new view
//! 5. Record the net position change as the signal
//!
//! Strategy returns use the previous bar's position (one-bar lag).

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::{MarketContext, MarketContextClassifier};
use crate::domain::{OhlcvSeries, SignalRecord, SignalSeries};
use crate::error::EngineError;
use crate::indicators::latest_atr;
use crate::signals::RawSignalSource;
use crate::sizing::PositionSizer;
use crate::stops::{AdaptiveStopCalculator, StopLevels};

/// Loop tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Steps between market context refreshes.
    pub context_refresh_interval: usize,
    /// Trailing bars (excluding the current bar) visible to the classifier and source.
    pub window: usize,
    /// True-range ATR period for stop distances.
    pub atr_period: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            context_refresh_interval: 5,
            window: 100,
            atr_period: 14,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.context_refresh_interval == 0 {
            return Err(EngineError::config("context_refresh_interval must be >= 1"));
        }
        if self.window == 0 {
            return Err(EngineError::config("window must be >= 1"));
        }
        if self.atr_period == 0 {
            return Err(EngineError::config("atr_period must be >= 1"));
        }
        Ok(())
    }
}

/// Step-wise simulator wiring classifier, sizer and stop calculator together.
#[derive(Debug, Clone, Default)]
pub struct SignalSimulator {
    classifier: MarketContextClassifier,
    sizer: PositionSizer,
    stops: AdaptiveStopCalculator,
    config: SimulationConfig,
}

impl SignalSimulator {
    pub fn new(
        classifier: MarketContextClassifier,
        sizer: PositionSizer,
        config: SimulationConfig,
    ) -> Self {
        Self {
            classifier,
            sizer,
            stops: AdaptiveStopCalculator::new(),
            config,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn classifier(&self) -> &MarketContextClassifier {
        &self.classifier
    }

    /// Index of the first simulated step for `source`.
    pub fn first_step(&self, source: &dyn RawSignalSource) -> usize {
        self.classifier.min_bars().max(source.warmup_bars())
    }

    /// Run the loop over the whole series.
    ///
    /// Rows before the first step are flat with stop = target = price.
    pub fn run(
        &self,
        series: &OhlcvSeries,
        source: &dyn RawSignalSource,
    ) -> Result<SignalSeries, EngineError> {
        self.config.validate()?;
        let required = self.classifier.min_bars();
        if self.config.window + 1 < required {
            return Err(EngineError::config(format!(
                "simulation window {} is shorter than the classifier lookback {required}",
                self.config.window
            )));
        }

        let bars = series.bars();
        let n = bars.len();
        let start = self.first_step(source);
        if start >= n {
            return Err(EngineError::InsufficientHistory {
                required: start + 1,
                available: n,
            });
        }

        let mut rows: Vec<SignalRecord> = bars
            .iter()
            .map(|b| SignalRecord::flat(b.timestamp, b.close))
            .collect();

        let window_at = |i: usize| &bars[i.saturating_sub(self.config.window)..=i];
        let mut context: MarketContext = self.classifier.classify(window_at(start))?;
        let mut refreshes = 1usize;
        let mut forced_exits = 0usize;

        for i in start..n {
            let window = window_at(i);
            if i > start && (i - start) % self.config.context_refresh_interval == 0 {
                context = self.classifier.classify(window)?;
                refreshes += 1;
                debug!(step = i, regime = %context.regime, "context refreshed");
            }

            let raw = source.raw_signal(window, &context);
            let raw = if raw.is_finite() {
                raw.clamp(-1.0, 1.0)
            } else {
                0.0
            };
            let mut position = self.sizer.size(raw, &context);

            let price = bars[i].close;
            let prev = &rows[i - 1];
            let prev_position = prev.position;
            let prev_levels = StopLevels {
                stop_loss: prev.stop_loss,
                take_profit: prev.take_profit,
            };
            if prev_levels.is_triggered(prev_position, price) {
                position = 0.0;
                forced_exits += 1;
            }

            let atr = latest_atr(window, self.config.atr_period).unwrap_or(context.atr);
            let levels = self.stops.levels(price, atr, position, &context);

            let row = &mut rows[i];
            row.signal = position - prev_position;
            row.position = position;
            row.stop_loss = levels.stop_loss;
            row.take_profit = levels.take_profit;
        }

        let mut out = SignalSeries::new(rows);
        out.recompute_returns();
        debug!(
            source = source.name(),
            bars = n,
            first_step = start,
            refreshes,
            forced_exits,
            trades = out.trade_count(),
            "simulation complete"
        );
        Ok(out)
    }
}
