//! Multi-symbol batch driver.
//!
//! Jobs are independent: each simulates one (symbol, series, source) triple,
//! runs the risk overlay on the result and scores both versions. Jobs run in
//! parallel and every job reports its own `Result`; a failing symbol never
//! hides or aborts the others.

use rayon::prelude::*;
use regimelab_core::{
    ClassifierConfig, EngineError, MarketContextClassifier, OhlcvSeries, PositionConfig,
    PositionSizer, RiskConfig, RiskMetrics, RiskOverlayManager, SignalSimulator,
    SimulationConfig,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::metrics::PerformanceMetrics;
use crate::parallel::in_pool;
use crate::strategy::SourceConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub position: PositionConfig,
    pub classifier: ClassifierConfig,
    pub simulation: SimulationConfig,
    pub risk: RiskConfig,
    /// Worker threads; 0 uses the global rayon pool.
    pub threads: usize,
}

impl BatchConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        self.position.validate()?;
        self.classifier.validate()?;
        self.simulation.validate()?;
        self.risk.validate()
    }
}

#[derive(Debug, Clone)]
pub struct BatchJob {
    pub symbol: String,
    pub series: OhlcvSeries,
    pub source: SourceConfig,
}

/// Result of one successful job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    pub symbol: String,
    pub source: String,
    pub bars: usize,
    pub risk: RiskMetrics,
    /// Metrics of the simulated series.
    pub raw: PerformanceMetrics,
    /// Metrics after the risk overlay.
    pub overlaid: PerformanceMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchFailure {
    pub symbol: String,
    pub error: String,
}

/// Per-job outcome, in job order.
#[derive(Debug, Clone, PartialEq)]
pub struct JobOutcome {
    pub symbol: String,
    pub result: Result<BatchItem, EngineError>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn from_outcomes(outcomes: Vec<JobOutcome>) -> Self {
        let mut report = Self::default();
        for outcome in outcomes {
            match outcome.result {
                Ok(item) => report.items.push(item),
                Err(e) => report.failures.push(BatchFailure {
                    symbol: outcome.symbol,
                    error: e.to_string(),
                }),
            }
        }
        report
    }

    pub fn success_count(&self) -> usize {
        self.items.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }
}

/// Run a single job.
pub fn run_job(job: &BatchJob, config: &BatchConfig) -> Result<BatchItem, EngineError> {
    let simulator = SignalSimulator::new(
        MarketContextClassifier::new(config.classifier.clone(), config.position.clone()),
        PositionSizer::new(config.position.clone()),
        config.simulation.clone(),
    );
    let source = job.source.build();
    let signals = simulator.run(&job.series, source.as_ref())?;
    let overlay = RiskOverlayManager::new(config.risk.clone());
    let (risk, adjusted) = overlay.assess_and_apply(&signals);
    Ok(BatchItem {
        symbol: job.symbol.clone(),
        source: source.name().to_string(),
        bars: signals.len(),
        risk,
        raw: PerformanceMetrics::compute(&signals.strategy_returns(), signals.trade_count()),
        overlaid: PerformanceMetrics::compute(&adjusted.strategy_returns(), adjusted.trade_count()),
    })
}

/// Run every job in parallel, returning one outcome per job in input order.
pub fn run_jobs(jobs: &[BatchJob], config: &BatchConfig) -> Result<Vec<JobOutcome>, EngineError> {
    config.validate()?;
    let outcomes = in_pool(config.threads, || {
        jobs.par_iter()
            .map(|job| JobOutcome {
                symbol: job.symbol.clone(),
                result: run_job(job, config),
            })
            .collect::<Vec<_>>()
    })
    .map_err(|e| EngineError::config(format!("failed to build thread pool: {e}")))?;

    for outcome in &outcomes {
        if let Err(e) = &outcome.result {
            warn!(symbol = %outcome.symbol, error = %e, "batch job failed");
        }
    }
    Ok(outcomes)
}

/// Run every job and aggregate successes and failures.
pub fn run_batch(jobs: &[BatchJob], config: &BatchConfig) -> Result<BatchReport, EngineError> {
    let report = BatchReport::from_outcomes(run_jobs(jobs, config)?);
    info!(
        jobs = jobs.len(),
        succeeded = report.success_count(),
        failed = report.failure_count(),
        "batch complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use regimelab_core::Bar;

    fn series(n: usize) -> OhlcvSeries {
        let base = NaiveDate::from_ymd_opt(2022, 1, 3)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let bars = (0..n)
            .map(|i| {
                let close = 100.0 + (i as f64 * 0.2).sin() * 5.0 + i as f64 * 0.1;
                Bar {
                    timestamp: base + Duration::days(i as i64),
                    open: close,
                    high: close * 1.01,
                    low: close * 0.99,
                    close,
                    volume: 1000.0 + (i % 7) as f64 * 50.0,
                }
            })
            .collect();
        OhlcvSeries::new(bars).unwrap()
    }

    fn job(symbol: &str, n: usize) -> BatchJob {
        BatchJob {
            symbol: symbol.to_string(),
            series: series(n),
            source: SourceConfig::default(),
        }
    }

    #[test]
    fn failures_are_reported_not_suppressed() {
        let jobs = vec![job("AAA", 150), job("SHORT", 10), job("BBB", 120)];
        let report = run_batch(&jobs, &BatchConfig::default()).unwrap();
        assert_eq!(report.success_count(), 2);
        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.failures[0].symbol, "SHORT");
        assert!(report.failures[0].error.contains("insufficient history"));
    }

    #[test]
    fn outcomes_keep_job_order() {
        let jobs = vec![job("A", 100), job("B", 5), job("C", 100)];
        let outcomes = run_jobs(&jobs, &BatchConfig::default()).unwrap();
        let symbols: Vec<&str> = outcomes.iter().map(|o| o.symbol.as_str()).collect();
        assert_eq!(symbols, ["A", "B", "C"]);
        assert!(outcomes[0].result.is_ok());
        assert!(matches!(
            outcomes[1].result,
            Err(EngineError::InsufficientHistory { .. })
        ));
    }

    #[test]
    fn item_carries_overlay_metrics() {
        let item = run_job(&job("X", 200), &BatchConfig::default()).unwrap();
        assert_eq!(item.bars, 200);
        assert_eq!(item.source, "adaptive_macd");
        assert!(item.risk.volatility_factor >= 0.5 && item.risk.volatility_factor <= 2.0);
        assert!(item.risk.kelly_fraction >= 0.0 && item.risk.kelly_fraction <= 1.0);
    }

    #[test]
    fn dedicated_pool_matches_global_pool() {
        let jobs = vec![job("A", 120), job("B", 140)];
        let global = run_batch(&jobs, &BatchConfig::default()).unwrap();
        let pooled = run_batch(
            &jobs,
            &BatchConfig {
                threads: 2,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(global, pooled);
    }
}
