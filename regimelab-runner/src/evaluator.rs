//! StrategyEvaluator: simulate a candidate and score its returns.
//!
//! A candidate is simulated as a [`ParamStrategy`] whose exposure is capped by
//! its own `position_size`, then its `stop_loss` / `take_profit` fractions are
//! enforced bar by bar before metrics and fitness are computed.

use regimelab_core::risk::enforce_exits;
use regimelab_core::{
    ClassifierConfig, EngineError, MarketContextClassifier, OhlcvSeries, PositionConfig,
    PositionSizer, SignalSeries, SignalSimulator, SimulationConfig,
};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::fitness::{fitness, FitnessWeights};
use crate::metrics::PerformanceMetrics;
use crate::params::StrategyParams;
use crate::strategy::ParamStrategy;

/// Everything the evaluator needs besides the candidate itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    pub classifier: ClassifierConfig,
    pub simulation: SimulationConfig,
    /// Volatility bounds and base limits; position caps come from the candidate.
    pub limits: PositionConfig,
    pub fitness: FitnessWeights,
}

impl EvaluatorConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        self.classifier.validate()?;
        self.simulation.validate()?;
        self.limits.validate()?;
        self.fitness.validate()
    }
}

/// Metrics and scalar fitness of one evaluated series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub metrics: PerformanceMetrics,
    pub fitness: f64,
}

#[derive(Debug, Clone, Default)]
pub struct StrategyEvaluator {
    config: EvaluatorConfig,
}

impl StrategyEvaluator {
    pub fn new(config: EvaluatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Simulate `params` over `series`, with the candidate's exits applied.
    pub fn simulate(
        &self,
        series: &OhlcvSeries,
        params: &StrategyParams,
    ) -> Result<SignalSeries, EngineError> {
        params.validate()?;
        let limits = PositionConfig {
            max_position_size: params.position_size,
            max_portfolio_heat: params.position_size,
            ..self.config.limits.clone()
        };
        let simulator = SignalSimulator::new(
            MarketContextClassifier::new(self.config.classifier.clone(), limits.clone()),
            PositionSizer::new(limits),
            self.config.simulation.clone(),
        );
        let mut signals = simulator.run(series, &ParamStrategy::new(params.clone()))?;
        let exits = enforce_exits(&mut signals, params.stop_loss, params.take_profit);
        trace!(exits, "candidate exits enforced");
        Ok(signals)
    }

    /// Simulate and score a candidate.
    pub fn evaluate(
        &self,
        series: &OhlcvSeries,
        params: &StrategyParams,
    ) -> Result<Evaluation, EngineError> {
        let signals = self.simulate(series, params)?;
        Ok(self.score(&signals))
    }

    /// Metrics and fitness of an already simulated series.
    pub fn score(&self, signals: &SignalSeries) -> Evaluation {
        let metrics = PerformanceMetrics::compute(&signals.strategy_returns(), signals.trade_count());
        let fitness = fitness(&metrics, &self.config.fitness);
        Evaluation { metrics, fitness }
    }
}
