//! Position and risk limits shared by the classifier, sizer and stop calculator.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Position configuration. Immutable for the life of a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionConfig {
    /// Scale applied to a raw signal before regime adjustments.
    pub max_position_size: f64,
    /// Hard absolute bound on the sized position.
    pub max_portfolio_heat: f64,
    pub base_risk_per_trade: f64,
    pub max_correlation: f64,
    /// Annualized volatility below which the regime is forced to LOW_VOL.
    pub min_volatility: f64,
    /// Annualized volatility above which the regime is forced to HIGH_VOL.
    pub max_volatility: f64,
}

impl Default for PositionConfig {
    fn default() -> Self {
        Self {
            max_position_size: 1.0,
            max_portfolio_heat: 0.5,
            base_risk_per_trade: 0.02,
            max_correlation: 0.7,
            min_volatility: 0.01,
            max_volatility: 0.5,
        }
    }
}

impl PositionConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        let fields = [
            ("max_position_size", self.max_position_size),
            ("max_portfolio_heat", self.max_portfolio_heat),
            ("base_risk_per_trade", self.base_risk_per_trade),
            ("max_correlation", self.max_correlation),
            ("min_volatility", self.min_volatility),
            ("max_volatility", self.max_volatility),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(EngineError::config(format!("{name} must be finite")));
            }
        }
        if self.max_position_size <= 0.0 {
            return Err(EngineError::config("max_position_size must be > 0"));
        }
        if self.max_portfolio_heat <= 0.0 {
            return Err(EngineError::config("max_portfolio_heat must be > 0"));
        }
        if !(0.0..=1.0).contains(&self.base_risk_per_trade) {
            return Err(EngineError::config("base_risk_per_trade must be in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.max_correlation) {
            return Err(EngineError::config("max_correlation must be in [0, 1]"));
        }
        if self.min_volatility < 0.0 {
            return Err(EngineError::config("min_volatility must be >= 0"));
        }
        if self.max_volatility <= self.min_volatility {
            return Err(EngineError::config(
                "max_volatility must be greater than min_volatility",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(PositionConfig::default().validate().is_ok());
    }

    #[test]
    fn inverted_volatility_band_rejected() {
        let cfg = PositionConfig {
            min_volatility: 0.5,
            max_volatility: 0.1,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn non_finite_rejected() {
        let cfg = PositionConfig {
            max_portfolio_heat: f64::INFINITY,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_deserialization_uses_defaults() {
        let cfg: PositionConfig = serde_json::from_str(r#"{"max_volatility": 0.8}"#).unwrap();
        assert_eq!(cfg.max_volatility, 0.8);
        assert_eq!(cfg.max_portfolio_heat, 0.5);
    }
}
