//! RegimeLab Runner: strategy evaluation, genetic search and batch runs.
//!
//! This crate builds on `regimelab-core` to provide:
//! - Performance metrics and the weighted fitness function
//! - The `StrategyParams` genome and its raw-signal source
//! - Strategy evaluation and the genetic optimizer with out-of-sample acceptance
//! - Chronological train/test splits and CSV loading
//! - TOML configuration
//! - A parallel multi-symbol batch driver with per-job results

pub mod batch;
pub mod config;
pub mod data_loader;
pub mod evaluator;
pub mod fitness;
pub mod metrics;
pub mod optimizer;
mod parallel;
pub mod params;
pub mod split;
pub mod strategy;

pub use batch::{run_batch, run_jobs, BatchConfig, BatchItem, BatchJob, BatchReport, JobOutcome};
pub use config::{ConfigError, RegimeLabConfig};
pub use data_loader::{load_csv, read_csv, LoadError};
pub use evaluator::{Evaluation, EvaluatorConfig, StrategyEvaluator};
pub use fitness::{fitness, FitnessWeights, NormalizedScores};
pub use metrics::PerformanceMetrics;
pub use optimizer::{
    AcceptancePolicy, GenerationSummary, GeneticOptimizer, Individual, OptimizationOutcome,
    OptimizerConfig, OptimizerError, Population, StopReason,
};
pub use params::{EntryThresholds, ExitThresholds, StrategyParams};
pub use split::split_train_test;
pub use strategy::{ParamStrategy, SourceConfig};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn metrics_and_params_are_send_sync() {
        assert_send::<PerformanceMetrics>();
        assert_sync::<PerformanceMetrics>();
        assert_send::<StrategyParams>();
        assert_sync::<StrategyParams>();
    }

    #[test]
    fn evaluator_and_optimizer_are_send_sync() {
        assert_send::<StrategyEvaluator>();
        assert_sync::<StrategyEvaluator>();
        assert_send::<GeneticOptimizer>();
        assert_sync::<GeneticOptimizer>();
        assert_send::<OptimizationOutcome>();
        assert_sync::<OptimizationOutcome>();
    }

    #[test]
    fn batch_types_are_send_sync() {
        assert_send::<BatchJob>();
        assert_sync::<BatchJob>();
        assert_send::<BatchReport>();
        assert_sync::<BatchReport>();
    }

    #[test]
    fn error_types_are_send_sync() {
        assert_send::<OptimizerError>();
        assert_sync::<OptimizerError>();
        assert_send::<LoadError>();
        assert_sync::<LoadError>();
        assert_send::<ConfigError>();
        assert_sync::<ConfigError>();
    }
}
