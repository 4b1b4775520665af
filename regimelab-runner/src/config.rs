//! TOML configuration for engine, optimizer and batch runs.
//!
//! Every section is optional; missing sections and fields take their defaults.
//!
//! ```toml
//! train_ratio = 0.7
//! threads = 4
//!
//! [position]
//! max_portfolio_heat = 0.5
//!
//! [optimizer]
//! population_size = 30
//! generations = 10
//!
//! [source]
//! type = "adaptive_bollinger"
//! base_window = 20
//! ```

use std::path::{Path, PathBuf};

use regimelab_core::{ClassifierConfig, PositionConfig, RiskConfig, SimulationConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::batch::BatchConfig;
use crate::evaluator::EvaluatorConfig;
use crate::fitness::FitnessWeights;
use crate::optimizer::OptimizerConfig;
use crate::split::DEFAULT_TRAIN_RATIO;
use crate::strategy::SourceConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("config serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Complete configuration of a RegimeLab run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeLabConfig {
    pub position: PositionConfig,
    pub classifier: ClassifierConfig,
    pub simulation: SimulationConfig,
    pub risk: RiskConfig,
    pub fitness: FitnessWeights,
    pub optimizer: OptimizerConfig,
    /// Source used by backtest and batch runs.
    pub source: SourceConfig,
    /// Fraction of bars used for training in optimize runs.
    pub train_ratio: f64,
    /// Worker threads for batch and optimizer runs; 0 uses the global pool.
    /// Overrides `optimizer.threads` when non-zero.
    pub threads: usize,
}

impl Default for RegimeLabConfig {
    fn default() -> Self {
        Self {
            position: PositionConfig::default(),
            classifier: ClassifierConfig::default(),
            simulation: SimulationConfig::default(),
            risk: RiskConfig::default(),
            fitness: FitnessWeights::default(),
            optimizer: OptimizerConfig::default(),
            source: SourceConfig::default(),
            train_ratio: DEFAULT_TRAIN_RATIO,
            threads: 0,
        }
    }
}

impl RegimeLabConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |e: &dyn std::fmt::Display| ConfigError::Invalid(e.to_string());
        self.position.validate().map_err(|e| invalid(&e))?;
        self.classifier.validate().map_err(|e| invalid(&e))?;
        self.simulation.validate().map_err(|e| invalid(&e))?;
        self.risk.validate().map_err(|e| invalid(&e))?;
        self.fitness.validate().map_err(|e| invalid(&e))?;
        self.optimizer.validate().map_err(|e| invalid(&e))?;
        if let SourceConfig::Param(params) = &self.source {
            params.validate().map_err(|e| invalid(&e))?;
        }
        if !(self.train_ratio > 0.0 && self.train_ratio < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "train_ratio must be in (0, 1), got {}",
                self.train_ratio
            )));
        }
        Ok(())
    }

    pub fn evaluator_config(&self) -> EvaluatorConfig {
        EvaluatorConfig {
            classifier: self.classifier.clone(),
            simulation: self.simulation.clone(),
            limits: self.position.clone(),
            fitness: self.fitness.clone(),
        }
    }

    pub fn optimizer_config(&self) -> OptimizerConfig {
        let mut config = self.optimizer.clone();
        if self.threads != 0 {
            config.threads = self.threads;
        }
        config
    }

    pub fn batch_config(&self) -> BatchConfig {
        BatchConfig {
            position: self.position.clone(),
            classifier: self.classifier.clone(),
            simulation: self.simulation.clone(),
            risk: self.risk.clone(),
            threads: self.threads,
        }
    }

    /// Content hash of the configuration.
    ///
    /// Identical configurations share a fingerprint, so outputs can be
    /// matched to the settings that produced them.
    pub fn fingerprint(&self) -> Result<String, ConfigError> {
        let json = serde_json::to_vec(self)?;
        Ok(blake3::hash(&json).to_hex().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_is_default() {
        let config = RegimeLabConfig::from_toml_str("").unwrap();
        assert_eq!(config, RegimeLabConfig::default());
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let text = r#"
            train_ratio = 0.6

            [position]
            max_portfolio_heat = 0.25

            [optimizer]
            population_size = 8

            [source]
            type = "adaptive_bollinger"
            base_window = 30
        "#;
        let config = RegimeLabConfig::from_toml_str(text).unwrap();
        assert_eq!(config.train_ratio, 0.6);
        assert_eq!(config.position.max_portfolio_heat, 0.25);
        assert_eq!(config.position.max_position_size, 1.0);
        assert_eq!(config.optimizer.population_size, 8);
        assert_eq!(config.optimizer.generations, 20);
        match &config.source {
            SourceConfig::AdaptiveBollinger(p) => {
                assert_eq!(p.base_window, 30);
                assert_eq!(p.base_num_std, 2.0);
            }
            other => panic!("unexpected source {other:?}"),
        }
    }

    #[test]
    fn invalid_values_rejected() {
        assert!(matches!(
            RegimeLabConfig::from_toml_str("train_ratio = 1.5"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            RegimeLabConfig::from_toml_str("[optimizer]\nmutation_rate = 2.0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            RegimeLabConfig::from_toml_str("train_ratio = \"high\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "threads = 3\n[simulation]\nwindow = 80").unwrap();
        let config = RegimeLabConfig::load(file.path()).unwrap();
        assert_eq!(config.simulation.window, 80);
        assert_eq!(config.optimizer_config().threads, 3);
        assert_eq!(config.batch_config().threads, 3);
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            RegimeLabConfig::load("/nonexistent/regimelab.toml"),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = RegimeLabConfig::default();
        let mut b = a.clone();
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
        b.optimizer.seed = 7;
        assert_ne!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
        assert_eq!(a.fingerprint().unwrap().len(), 64);
    }
}
