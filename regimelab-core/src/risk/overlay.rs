//! RiskOverlayManager: post-hoc Kelly sizing, volatility scaling and
//! return-based exits on a completed signal series.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::SignalSeries;
use crate::error::EngineError;
use crate::indicators::rolling::rolling_std;

use super::exits::enforce_exits;
use super::kelly::{clamp_volatility_factor, kelly_from_returns};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub base_position_size: f64,
    pub max_position_size: f64,
    pub min_position_size: f64,
    /// Base stop-loss as a fraction of price.
    pub base_stop_loss: f64,
    /// Base take-profit as a fraction of price.
    pub base_take_profit: f64,
    pub lookback_period: usize,
    pub volatility_scaling: bool,
    /// Multiplier on the full Kelly fraction (0.5 = half-Kelly).
    pub kelly_fraction: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            base_position_size: 1.0,
            max_position_size: 2.0,
            min_position_size: 0.1,
            base_stop_loss: 0.02,
            base_take_profit: 0.04,
            lookback_period: 20,
            volatility_scaling: true,
            kelly_fraction: 0.5,
        }
    }
}

impl RiskConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        let fields = [
            ("base_position_size", self.base_position_size),
            ("max_position_size", self.max_position_size),
            ("min_position_size", self.min_position_size),
            ("base_stop_loss", self.base_stop_loss),
            ("base_take_profit", self.base_take_profit),
            ("kelly_fraction", self.kelly_fraction),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::config(format!(
                    "{name} must be a non-negative finite number"
                )));
            }
        }
        if self.min_position_size > self.max_position_size {
            return Err(EngineError::config(
                "min_position_size must not exceed max_position_size",
            ));
        }
        if self.base_stop_loss == 0.0 || self.base_take_profit == 0.0 {
            return Err(EngineError::config("base stop/take-profit must be > 0"));
        }
        if self.lookback_period < 2 {
            return Err(EngineError::config("lookback_period must be >= 2"));
        }
        Ok(())
    }
}

/// Risk assessment derived from a returns history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// Scaled Kelly fraction, in [0, 1].
    pub kelly_fraction: f64,
    pub position_size: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    /// take_profit / stop_loss.
    pub risk_ratio: f64,
    /// In [0.5, 2.0].
    pub volatility_factor: f64,
}

#[derive(Debug, Clone, Default)]
pub struct RiskOverlayManager {
    config: RiskConfig,
}

impl RiskOverlayManager {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    pub fn kelly_fraction(&self, returns: &[f64]) -> f64 {
        kelly_from_returns(returns, self.config.kelly_fraction)
    }

    /// Mean rolling volatility over current rolling volatility, clamped.
    ///
    /// 1.0 when scaling is disabled or the history is shorter than the lookback.
    pub fn volatility_factor(&self, returns: &[f64]) -> f64 {
        let lookback = self.config.lookback_period;
        if !self.config.volatility_scaling || returns.len() < lookback {
            return 1.0;
        }
        let vol: Vec<f64> = rolling_std(returns, lookback)
            .into_iter()
            .filter(|v| !v.is_nan())
            .collect();
        let Some(&current) = vol.last() else {
            return 1.0;
        };
        let avg = vol.iter().sum::<f64>() / vol.len() as f64;
        clamp_volatility_factor(avg, current)
    }

    /// Base stop/take-profit scaled by (1 + range proxy) * volatility factor,
    /// each clamped to [0.5x, 2x] of its base.
    ///
    /// The range proxy is the mean rolling (max - min) of returns.
    pub fn dynamic_levels(&self, returns: &[f64], volatility_factor: f64) -> (f64, f64) {
        let cfg = &self.config;
        let lookback = cfg.lookback_period;
        if lookback == 0 || returns.len() < lookback {
            return (cfg.base_stop_loss, cfg.base_take_profit);
        }
        let ranges: Vec<f64> = returns
            .windows(lookback)
            .map(|w| {
                let (lo, hi) = w
                    .iter()
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
                        (lo.min(r), hi.max(r))
                    });
                hi - lo
            })
            .collect();
        let range_proxy = ranges.iter().sum::<f64>() / ranges.len() as f64;
        let scale = (1.0 + range_proxy) * volatility_factor;
        let stop = (cfg.base_stop_loss * scale)
            .clamp(cfg.base_stop_loss * 0.5, cfg.base_stop_loss * 2.0);
        let target = (cfg.base_take_profit * scale)
            .clamp(cfg.base_take_profit * 0.5, cfg.base_take_profit * 2.0);
        (stop, target)
    }

    /// base * kelly * volatility_factor * sqrt(risk_ratio), clamped to
    /// [min_position_size, max_position_size].
    pub fn position_size(&self, kelly: f64, volatility_factor: f64, risk_ratio: f64) -> f64 {
        let cfg = &self.config;
        let mut size = cfg.base_position_size * kelly * volatility_factor;
        if risk_ratio > 0.0 {
            size *= risk_ratio.sqrt();
        }
        size.clamp(cfg.min_position_size, cfg.max_position_size)
    }

    /// Assess the series' own strategy returns.
    pub fn assess(&self, series: &SignalSeries) -> RiskMetrics {
        self.assess_returns(&series.strategy_returns())
    }

    pub fn assess_returns(&self, returns: &[f64]) -> RiskMetrics {
        let kelly = self.kelly_fraction(returns);
        let volatility_factor = self.volatility_factor(returns);
        let (stop_loss, take_profit) = self.dynamic_levels(returns, volatility_factor);
        let risk_ratio = if stop_loss > 0.0 {
            take_profit / stop_loss
        } else {
            0.0
        };
        let position_size = self.position_size(kelly, volatility_factor, risk_ratio);
        RiskMetrics {
            kelly_fraction: kelly,
            position_size,
            stop_loss,
            take_profit,
            risk_ratio,
            volatility_factor,
        }
    }

    /// Scale positions by `metrics.position_size` and enforce the overlay's
    /// stop/take-profit levels bar by bar.
    pub fn apply(&self, series: &SignalSeries, metrics: &RiskMetrics) -> SignalSeries {
        let mut out = series.clone();
        for row in out.rows_mut() {
            row.position *= metrics.position_size;
        }
        let exits = enforce_exits(&mut out, metrics.stop_loss, metrics.take_profit);
        debug!(
            position_size = metrics.position_size,
            stop_loss = metrics.stop_loss,
            take_profit = metrics.take_profit,
            exits,
            "risk overlay applied"
        );
        out
    }

    /// Assess then apply in one pass.
    pub fn assess_and_apply(&self, series: &SignalSeries) -> (RiskMetrics, SignalSeries) {
        let metrics = self.assess(series);
        let adjusted = self.apply(series, &metrics);
        (metrics, adjusted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SignalRecord;
    use crate::indicators::assert_approx;
    use chrono::{Duration, NaiveDate};

    fn series(prices: &[f64], positions: &[f64]) -> SignalSeries {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let rows = prices
            .iter()
            .zip(positions)
            .enumerate()
            .map(|(i, (&p, &pos))| {
                let mut r = SignalRecord::flat(base + Duration::days(i as i64), p);
                r.position = pos;
                r
            })
            .collect();
        let mut s = SignalSeries::new(rows);
        s.recompute_returns();
        s.recompute_signals();
        s
    }

    #[test]
    fn default_config_is_valid() {
        assert!(RiskConfig::default().validate().is_ok());
        let bad = RiskConfig {
            min_position_size: 3.0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn short_history_uses_neutral_factor_and_base_levels() {
        let m = RiskOverlayManager::default();
        let returns = [0.01, -0.01, 0.02];
        assert_eq!(m.volatility_factor(&returns), 1.0);
        assert_eq!(m.dynamic_levels(&returns, 1.0), (0.02, 0.04));
    }

    #[test]
    fn volatility_factor_rises_when_current_vol_is_low() {
        let m = RiskOverlayManager::new(RiskConfig {
            lookback_period: 5,
            ..Default::default()
        });
        let mut returns: Vec<f64> = (0..20)
            .map(|i| if i % 2 == 0 { 0.05 } else { -0.05 })
            .collect();
        returns.extend((0..5).map(|i| if i % 2 == 0 { 0.001 } else { -0.001 }));
        let vf = m.volatility_factor(&returns);
        assert_eq!(vf, 2.0);
    }

    #[test]
    fn dynamic_levels_clamped() {
        let m = RiskOverlayManager::new(RiskConfig {
            lookback_period: 2,
            ..Default::default()
        });
        let (stop, target) = m.dynamic_levels(&[0.0, 0.0, 0.0], 0.1);
        assert_approx(stop, 0.01, 1e-12);
        assert_approx(target, 0.02, 1e-12);
        let (stop, target) = m.dynamic_levels(&[0.5, -0.5, 0.5], 2.0);
        assert_approx(stop, 0.04, 1e-12);
        assert_approx(target, 0.08, 1e-12);
    }

    #[test]
    fn position_size_clamped_to_bounds() {
        let m = RiskOverlayManager::default();
        assert_eq!(m.position_size(0.0, 1.0, 2.0), 0.1);
        assert_eq!(m.position_size(1.0, 2.0, 4.0), 2.0);
        assert_approx(m.position_size(0.5, 1.0, 4.0), 1.0, 1e-12);
    }

    #[test]
    fn apply_caps_loss_at_stop() {
        let s = series(&[100.0, 100.0, 97.0], &[0.0, 1.0, 1.0]);
        let metrics = RiskMetrics {
            kelly_fraction: 0.5,
            position_size: 1.0,
            stop_loss: 0.02,
            take_profit: 0.04,
            risk_ratio: 2.0,
            volatility_factor: 1.0,
        };
        let out = RiskOverlayManager::default().apply(&s, &metrics);
        assert_eq!(out.rows()[2].position, 0.0);
        assert_eq!(out.rows()[2].strategy_returns, -0.02);
        // input untouched
        assert_eq!(s.rows()[2].position, 1.0);
    }

    #[test]
    fn assess_flat_history_is_minimum_size() {
        let s = series(&[100.0; 30], &[0.0; 30]);
        let metrics = RiskOverlayManager::default().assess(&s);
        assert_eq!(metrics.kelly_fraction, 0.0);
        assert_eq!(metrics.volatility_factor, 1.0);
        assert_eq!(metrics.position_size, 0.1);
        assert_approx(metrics.risk_ratio, 2.0, 1e-12);
    }
}
