//! Genetic optimizer over [`StrategyParams`].
//!
//! Per generation:
//! 1. Evaluate every candidate on the training split (parallel, read-only data)
//! 2. Rank by fitness, descending (stable, so ties keep population order)
//! 3. Track the best-ever candidate and a stagnation counter
//! 4. Stop on stagnation or when best-ever fitness exceeds the target
//! 5. Breed: elites carried verbatim, the rest from top-half parents by
//!    crossover (probability `crossover_probability`) or mutation
//!
//! The best-ever candidate is then re-evaluated on the test split and accepted
//! only if it passes the [`AcceptancePolicy`]. Otherwise, including when the
//! test split is too short for the candidate's warmup, the outcome carries a
//! fresh random candidate and no test metrics.
//!
//! All randomness flows from [`RngHierarchy`] streams: `init` for the first
//! population, `breed` indexed by generation, `fallback` for the rejected case.

use rand::Rng;
use rayon::prelude::*;
use regimelab_core::rng::RngHierarchy;
use regimelab_core::{EngineError, OhlcvSeries};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::evaluator::StrategyEvaluator;
use crate::metrics::PerformanceMetrics;
use crate::parallel::in_pool;
use crate::params::StrategyParams;

// ─── Configuration ──────────────────────────────────────────────────

/// Out-of-sample gate for the best training candidate. Both bounds are strict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcceptancePolicy {
    pub min_sharpe: f64,
    /// Max drawdown (a non-positive fraction) must stay above this.
    pub min_max_drawdown: f64,
}

impl Default for AcceptancePolicy {
    fn default() -> Self {
        Self {
            min_sharpe: 0.0,
            min_max_drawdown: -0.5,
        }
    }
}

impl AcceptancePolicy {
    pub fn accepts(&self, metrics: &PerformanceMetrics) -> bool {
        metrics.sharpe > self.min_sharpe && metrics.max_drawdown > self.min_max_drawdown
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub population_size: usize,
    pub generations: usize,
    /// Per-field mutation probability.
    pub mutation_rate: f64,
    /// Probability that a non-elite child comes from crossover rather than mutation.
    pub crossover_probability: f64,
    /// Generations without improvement before stopping.
    pub stagnation_limit: usize,
    /// Stop once best-ever fitness exceeds this.
    pub target_fitness: f64,
    pub seed: u64,
    /// Evaluation threads; 0 uses the global rayon pool.
    pub threads: usize,
    pub acceptance: AcceptancePolicy,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            generations: 20,
            mutation_rate: 0.2,
            crossover_probability: 0.7,
            stagnation_limit: 15,
            target_fitness: 0.75,
            seed: 42,
            threads: 0,
            acceptance: AcceptancePolicy::default(),
        }
    }
}

impl OptimizerConfig {
    pub fn validate(&self) -> Result<(), OptimizerError> {
        if self.population_size == 0 {
            return Err(OptimizerError::InvalidConfig(
                "population_size must be >= 1".into(),
            ));
        }
        if self.generations == 0 {
            return Err(OptimizerError::InvalidConfig("generations must be >= 1".into()));
        }
        for (name, p) in [
            ("mutation_rate", self.mutation_rate),
            ("crossover_probability", self.crossover_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(OptimizerError::InvalidConfig(format!(
                    "{name} must be in [0, 1], got {p}"
                )));
            }
        }
        if self.stagnation_limit == 0 {
            return Err(OptimizerError::InvalidConfig(
                "stagnation_limit must be >= 1".into(),
            ));
        }
        if !self.target_fitness.is_finite() {
            return Err(OptimizerError::InvalidConfig(
                "target_fitness must be finite".into(),
            ));
        }
        Ok(())
    }
}

/// Number of top candidates carried unchanged into the next generation.
pub fn elite_size(population_size: usize) -> usize {
    (population_size / 10).max(2).min(population_size)
}

/// Number of top candidates eligible as parents.
pub fn parent_pool_size(population_size: usize) -> usize {
    (population_size / 2).max(1)
}

// ─── Errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum OptimizerError {
    #[error("invalid optimizer config: {0}")]
    InvalidConfig(String),

    #[error("failed to build evaluation thread pool: {0}")]
    ThreadPool(String),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

// ─── Population ─────────────────────────────────────────────────────

/// A scored candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    pub params: StrategyParams,
    pub fitness: f64,
    pub metrics: PerformanceMetrics,
}

/// An unscored generation of candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct Population {
    members: Vec<StrategyParams>,
}

impl Population {
    pub fn new(members: Vec<StrategyParams>) -> Self {
        Self { members }
    }

    pub fn random<R: Rng>(size: usize, rng: &mut R) -> Self {
        Self::new((0..size).map(|_| StrategyParams::random(rng)).collect())
    }

    pub fn members(&self) -> &[StrategyParams] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Score every member on `data` in parallel and rank by fitness, descending.
    ///
    /// Fails on the first evaluation error.
    pub fn evaluate(
        &self,
        evaluator: &StrategyEvaluator,
        data: &OhlcvSeries,
    ) -> Result<Vec<Individual>, EngineError> {
        let mut ranked: Vec<Individual> = self
            .members
            .par_iter()
            .map(|params| {
                evaluator.evaluate(data, params).map(|eval| Individual {
                    params: params.clone(),
                    fitness: eval.fitness,
                    metrics: eval.metrics,
                })
            })
            .collect::<Result<_, _>>()?;
        ranked.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
        Ok(ranked)
    }

    /// Next generation from a ranked population of the same size.
    ///
    /// The first `elite_size` members are the elites, unchanged. Fails if
    /// `config` does not validate.
    pub fn breed<R: Rng>(
        ranked: &[Individual],
        config: &OptimizerConfig,
        rng: &mut R,
    ) -> Result<Self, OptimizerError> {
        config.validate()?;
        let size = ranked.len();
        let elites = elite_size(size);
        let parents = &ranked[..parent_pool_size(size).min(size)];
        let mut members: Vec<StrategyParams> =
            ranked.iter().take(elites).map(|ind| ind.params.clone()).collect();

        if parents.is_empty() {
            return Ok(Self::new(members));
        }
        while members.len() < size {
            let first = &parents[rng.gen_range(0..parents.len())].params;
            let child = if rng.gen_bool(config.crossover_probability) {
                let second = &parents[rng.gen_range(0..parents.len())].params;
                first.crossover(second, rng)
            } else {
                first.mutate(config.mutation_rate, rng)
            };
            members.push(child);
        }
        Ok(Self::new(members))
    }
}

// ─── Outcome ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Ran every configured generation.
    Completed,
    Stagnation,
    TargetReached,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub generation: usize,
    pub best_fitness: f64,
    pub mean_fitness: f64,
    pub best_ever_fitness: f64,
    /// Consecutive generations without a new best, after this one.
    pub stagnation: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationOutcome {
    /// Accepted candidate, or a random fallback when `test_metrics` is `None`.
    pub params: StrategyParams,
    /// Out-of-sample metrics of the accepted candidate.
    ///
    /// `None` means no candidate passed acceptance; `params` is then a fresh
    /// random draw, not a validated strategy.
    pub test_metrics: Option<PerformanceMetrics>,
    /// Best training candidate, accepted or not.
    pub best_candidate: Individual,
    pub history: Vec<GenerationSummary>,
    pub stop_reason: StopReason,
}

impl OptimizationOutcome {
    pub fn accepted(&self) -> bool {
        self.test_metrics.is_some()
    }

    pub fn best_train_fitness(&self) -> f64 {
        self.best_candidate.fitness
    }
}

// ─── Optimizer ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct GeneticOptimizer {
    config: OptimizerConfig,
    evaluator: StrategyEvaluator,
}

impl GeneticOptimizer {
    pub fn new(config: OptimizerConfig, evaluator: StrategyEvaluator) -> Self {
        Self { config, evaluator }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn evaluator(&self) -> &StrategyEvaluator {
        &self.evaluator
    }

    /// Search with the given size, generation count and mutation rate,
    /// other settings from the optimizer's config.
    pub fn optimize_with(
        &self,
        train: &OhlcvSeries,
        test: &OhlcvSeries,
        population_size: usize,
        generations: usize,
        mutation_rate: f64,
    ) -> Result<OptimizationOutcome, OptimizerError> {
        let config = OptimizerConfig {
            population_size,
            generations,
            mutation_rate,
            ..self.config.clone()
        };
        Self::new(config, self.evaluator.clone()).optimize(train, test)
    }

    /// Evolve on `train`, validate the winner on `test`.
    pub fn optimize(
        &self,
        train: &OhlcvSeries,
        test: &OhlcvSeries,
    ) -> Result<OptimizationOutcome, OptimizerError> {
        self.config.validate()?;
        self.evaluator.config().validate()?;

        in_pool(self.config.threads, || self.run(train, test))
            .map_err(|e| OptimizerError::ThreadPool(e.to_string()))?
    }

    fn run(
        &self,
        train: &OhlcvSeries,
        test: &OhlcvSeries,
    ) -> Result<OptimizationOutcome, OptimizerError> {
        let cfg = &self.config;
        let rng = RngHierarchy::new(cfg.seed);
        let mut population = Population::random(cfg.population_size, &mut rng.rng_for("init", 0));

        let mut best: Option<Individual> = None;
        let mut stagnation = 0usize;
        let mut history = Vec::with_capacity(cfg.generations);
        let mut stop_reason = StopReason::Completed;

        for generation in 0..cfg.generations {
            let ranked = population.evaluate(&self.evaluator, train)?;
            let Some(leader) = ranked.first() else {
                break;
            };

            let improved = best.as_ref().map_or(true, |b| leader.fitness > b.fitness);
            if improved {
                best = Some(leader.clone());
                stagnation = 0;
            } else {
                stagnation += 1;
            }
            let best_ever_fitness = best.as_ref().map_or(leader.fitness, |b| b.fitness);

            let mean_fitness =
                ranked.iter().map(|ind| ind.fitness).sum::<f64>() / ranked.len() as f64;
            history.push(GenerationSummary {
                generation,
                best_fitness: leader.fitness,
                mean_fitness,
                best_ever_fitness,
                stagnation,
            });
            debug!(
                generation,
                best = leader.fitness,
                mean = mean_fitness,
                best_ever = best_ever_fitness,
                stagnation,
                "generation evaluated"
            );

            if stagnation >= cfg.stagnation_limit {
                stop_reason = StopReason::Stagnation;
                break;
            }
            if best_ever_fitness > cfg.target_fitness {
                stop_reason = StopReason::TargetReached;
                break;
            }
            if generation + 1 < cfg.generations {
                population = Population::breed(
                    &ranked,
                    cfg,
                    &mut rng.rng_for("breed", generation as u64),
                )?;
            }
        }

        let best_candidate = best.ok_or_else(|| {
            OptimizerError::InvalidConfig("no generation was evaluated".into())
        })?;

        let test_metrics = match self.evaluator.evaluate(test, &best_candidate.params) {
            Ok(eval) if cfg.acceptance.accepts(&eval.metrics) => Some(eval.metrics),
            Ok(eval) => {
                warn!(
                    train_fitness = best_candidate.fitness,
                    test_sharpe = eval.metrics.sharpe,
                    test_max_drawdown = eval.metrics.max_drawdown,
                    "no candidate passed out-of-sample acceptance; returning random fallback"
                );
                None
            }
            Err(e) => {
                warn!(
                    train_fitness = best_candidate.fitness,
                    error = %e,
                    "out-of-sample evaluation failed; returning random fallback"
                );
                None
            }
        };

        let outcome = match test_metrics {
            Some(metrics) => {
                info!(
                    train_fitness = best_candidate.fitness,
                    test_sharpe = metrics.sharpe,
                    test_max_drawdown = metrics.max_drawdown,
                    generations = history.len(),
                    ?stop_reason,
                    "optimizer accepted candidate"
                );
                OptimizationOutcome {
                    params: best_candidate.params.clone(),
                    test_metrics: Some(metrics),
                    best_candidate,
                    history,
                    stop_reason,
                }
            }
            None => OptimizationOutcome {
                params: StrategyParams::random(&mut rng.rng_for("fallback", 0)),
                test_metrics: None,
                best_candidate,
                history,
                stop_reason,
            },
        };
        Ok(outcome)
    }
}
