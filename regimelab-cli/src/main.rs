//! RegimeLab CLI: backtest, optimize and batch commands over CSV price data.
//!
//! Commands:
//! - `backtest`: simulate one source on one CSV file, optionally with the risk overlay
//! - `optimize`: genetic search on the training split, validated on the test split
//! - `batch`: run one source over many CSV files in parallel
//!
//! Results are printed to stdout as JSON. Logs go to stderr and are filtered
//! through `RUST_LOG` (default `info`).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use regimelab_core::signals::{AdaptiveBollingerParams, AdaptiveMacdParams};
use regimelab_core::{
    MarketContextClassifier, PositionSizer, RiskOverlayManager, SignalSimulator,
};
use regimelab_runner::batch::BatchFailure;
use regimelab_runner::{
    load_csv, run_batch, split_train_test, BatchJob, GeneticOptimizer, PerformanceMetrics,
    RegimeLabConfig, SourceConfig, StrategyEvaluator,
};
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "regimelab",
    about = "RegimeLab CLI: regime-aware signal simulation, risk overlay and genetic search"
)]
struct Cli {
    /// Path to a TOML config file. Missing sections use defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Worker threads (0 = all cores). Overrides the config file.
    #[arg(long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a raw-signal source over one CSV file.
    Backtest {
        /// CSV with timestamp,open,high,low,close,volume columns.
        data: PathBuf,

        /// Source to simulate. Defaults to the config file's [source].
        #[arg(long, value_enum)]
        source: Option<SourceKind>,

        /// Apply the Kelly / volatility risk overlay after simulation.
        #[arg(long, default_value_t = false)]
        overlay: bool,

        /// Include the per-bar signal rows in the output.
        #[arg(long, default_value_t = false)]
        rows: bool,
    },
    /// Search strategy parameters with the genetic optimizer.
    Optimize {
        /// CSV with timestamp,open,high,low,close,volume columns.
        data: PathBuf,

        #[arg(long)]
        population: Option<usize>,

        #[arg(long)]
        generations: Option<usize>,

        #[arg(long)]
        mutation_rate: Option<f64>,

        #[arg(long)]
        seed: Option<u64>,

        /// Fraction of bars used for training.
        #[arg(long)]
        train_ratio: Option<f64>,
    },
    /// Run one source over many CSV files; the file stem is the symbol.
    Batch {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[arg(long, value_enum)]
        source: Option<SourceKind>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceKind {
    Macd,
    Bollinger,
}

impl SourceKind {
    fn config(self) -> SourceConfig {
        match self {
            Self::Macd => SourceConfig::AdaptiveMacd(AdaptiveMacdParams::default()),
            Self::Bollinger => SourceConfig::AdaptiveBollinger(AdaptiveBollingerParams::default()),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => RegimeLabConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RegimeLabConfig::default(),
    };
    if let Some(threads) = cli.threads {
        config.threads = threads;
    }

    match cli.command {
        Commands::Backtest {
            data,
            source,
            overlay,
            rows,
        } => run_backtest(config, &data, source, overlay, rows),
        Commands::Optimize {
            data,
            population,
            generations,
            mutation_rate,
            seed,
            train_ratio,
        } => {
            if let Some(v) = population {
                config.optimizer.population_size = v;
            }
            if let Some(v) = generations {
                config.optimizer.generations = v;
            }
            if let Some(v) = mutation_rate {
                config.optimizer.mutation_rate = v;
            }
            if let Some(v) = seed {
                config.optimizer.seed = v;
            }
            if let Some(v) = train_ratio {
                config.train_ratio = v;
            }
            config.validate()?;
            run_optimize(config, &data)
        }
        Commands::Batch { files, source } => run_batch_cmd(config, files, source),
    }
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_backtest(
    config: RegimeLabConfig,
    data: &Path,
    source: Option<SourceKind>,
    overlay: bool,
    rows: bool,
) -> Result<()> {
    let series = load_csv(data).with_context(|| format!("loading {}", data.display()))?;
    let source_config = source.map_or_else(|| config.source.clone(), SourceKind::config);
    let source = source_config.build();

    let simulator = SignalSimulator::new(
        MarketContextClassifier::new(config.classifier.clone(), config.position.clone()),
        PositionSizer::new(config.position.clone()),
        config.simulation.clone(),
    );
    let signals = simulator.run(&series, source.as_ref())?;
    let metrics = PerformanceMetrics::compute(&signals.strategy_returns(), signals.trade_count());
    info!(
        source = source.name(),
        bars = signals.len(),
        trades = metrics.trade_count,
        sharpe = metrics.sharpe,
        "backtest complete"
    );

    let mut output = json!({
        "fingerprint": config.fingerprint()?,
        "source": source.name(),
        "bars": signals.len(),
        "metrics": metrics,
    });
    let final_signals = if overlay {
        let (risk, adjusted) = RiskOverlayManager::new(config.risk.clone()).assess_and_apply(&signals);
        let overlaid =
            PerformanceMetrics::compute(&adjusted.strategy_returns(), adjusted.trade_count());
        output["risk"] = serde_json::to_value(&risk)?;
        output["overlaid_metrics"] = serde_json::to_value(&overlaid)?;
        adjusted
    } else {
        signals
    };
    if rows {
        output["rows"] = serde_json::to_value(final_signals.rows())?;
    }
    print_json(&output)
}

fn run_optimize(config: RegimeLabConfig, data: &Path) -> Result<()> {
    let series = load_csv(data).with_context(|| format!("loading {}", data.display()))?;
    let (train, test) = split_train_test(&series, config.train_ratio)?;
    info!(train = train.len(), test = test.len(), "split data");

    let optimizer = GeneticOptimizer::new(
        config.optimizer_config(),
        StrategyEvaluator::new(config.evaluator_config()),
    );
    let outcome = optimizer.optimize(&train, &test)?;
    if !outcome.accepted() {
        warn!("no strategy passed out-of-sample validation; params are a random fallback");
    }
    print_json(&json!({
        "fingerprint": config.fingerprint()?,
        "accepted": outcome.accepted(),
        "outcome": outcome,
    }))
}

fn run_batch_cmd(
    config: RegimeLabConfig,
    files: Vec<PathBuf>,
    source: Option<SourceKind>,
) -> Result<()> {
    let source_config = source.map_or_else(|| config.source.clone(), SourceKind::config);
    let mut jobs = Vec::with_capacity(files.len());
    let mut load_failures = Vec::new();
    for path in &files {
        let symbol = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        match load_csv(path) {
            Ok(series) => jobs.push(BatchJob {
                symbol,
                series,
                source: source_config.clone(),
            }),
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "failed to load data");
                load_failures.push(BatchFailure {
                    symbol,
                    error: e.to_string(),
                });
            }
        }
    }

    let mut report = run_batch(&jobs, &config.batch_config())?;
    report.failures.extend(load_failures);
    print_json(&json!({
        "fingerprint": config.fingerprint()?,
        "succeeded": report.success_count(),
        "failed": report.failure_count(),
        "report": report,
    }))
}
