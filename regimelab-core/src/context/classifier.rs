//! MarketContextClassifier: regime plus continuous risk descriptors from a
//! trailing OHLCV window.
//!
//! Regime assignment, later rules overriding earlier ones:
//! 1. ADX above `adx_threshold`: bull when +DI > -DI, bear otherwise; strong
//!    when the leading DI exceeds `strong_di_threshold`.
//! 2. Otherwise SIDEWAYS.
//! 3. Volatility above `max_volatility` forces HIGH_VOL, below
//!    `min_volatility` forces LOW_VOL.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::PositionConfig;
use crate::context::MarketRegime;
use crate::domain::Bar;
use crate::error::EngineError;
use crate::indicators::rolling::{last_valid, pct_change, rolling_mean, rolling_std};
use crate::indicators::directional_index;

/// Lookback periods for the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub adx_period: usize,
    pub adx_threshold: f64,
    pub strong_di_threshold: f64,
    /// Window for the rolling standard deviation of returns.
    pub volatility_window: usize,
    /// Window for the volume moving average.
    pub volume_window: usize,
    /// Window for smoothing the volume ratio.
    pub volume_smoothing: usize,
    /// Annualization factor for volatility (252 for daily bars).
    pub periods_per_year: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            adx_period: 14,
            adx_threshold: 25.0,
            strong_di_threshold: 30.0,
            volatility_window: 20,
            volume_window: 20,
            volume_smoothing: 5,
            periods_per_year: 252.0,
        }
    }
}

impl ClassifierConfig {
    /// Minimum number of bars needed for every descriptor to be defined.
    pub fn min_bars(&self) -> usize {
        (2 * self.adx_period)
            .max(self.volatility_window + 1)
            .max(self.volume_window + self.volume_smoothing.saturating_sub(1))
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.adx_period == 0 {
            return Err(EngineError::config("adx_period must be >= 1"));
        }
        if self.volatility_window < 2 {
            return Err(EngineError::config("volatility_window must be >= 2"));
        }
        if self.volume_window == 0 || self.volume_smoothing == 0 {
            return Err(EngineError::config(
                "volume_window and volume_smoothing must be >= 1",
            ));
        }
        if !(self.periods_per_year.is_finite() && self.periods_per_year > 0.0) {
            return Err(EngineError::config("periods_per_year must be > 0"));
        }
        if !self.adx_threshold.is_finite() || !self.strong_di_threshold.is_finite() {
            return Err(EngineError::config("ADX/DI thresholds must be finite"));
        }
        Ok(())
    }
}

/// Immutable market snapshot computed from a lookback window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketContext {
    pub regime: MarketRegime,
    /// ADX / 100, in [0, 1].
    pub trend_strength: f64,
    /// Annualized volatility of returns.
    pub volatility: f64,
    pub volume_trend: f64,
    /// Volatility normalized between the configured bounds, in [0, 1].
    pub risk_level: f64,
    pub adx: f64,
    pub plus_di: f64,
    pub minus_di: f64,
    pub atr: f64,
}

/// Apply the regime rules to already-computed descriptors.
pub fn decide_regime(
    adx: f64,
    plus_di: f64,
    minus_di: f64,
    volatility: f64,
    classifier: &ClassifierConfig,
    limits: &PositionConfig,
) -> MarketRegime {
    let mut regime = if adx > classifier.adx_threshold {
        if plus_di > minus_di {
            if plus_di > classifier.strong_di_threshold {
                MarketRegime::StrongBull
            } else {
                MarketRegime::WeakBull
            }
        } else if minus_di > classifier.strong_di_threshold {
            MarketRegime::StrongBear
        } else {
            MarketRegime::WeakBear
        }
    } else {
        MarketRegime::Sideways
    };

    if volatility > limits.max_volatility {
        regime = MarketRegime::HighVol;
    } else if volatility < limits.min_volatility {
        regime = MarketRegime::LowVol;
    }
    regime
}

/// Linear position of `volatility` between the configured bounds, clamped to [0, 1].
pub fn risk_level(volatility: f64, limits: &PositionConfig) -> f64 {
    let span = limits.max_volatility - limits.min_volatility;
    if span <= 0.0 {
        return 0.0;
    }
    ((volatility - limits.min_volatility) / span).clamp(0.0, 1.0)
}

/// Stateless classifier over trailing windows.
#[derive(Debug, Clone, Default)]
pub struct MarketContextClassifier {
    config: ClassifierConfig,
    limits: PositionConfig,
}

impl MarketContextClassifier {
    pub fn new(config: ClassifierConfig, limits: PositionConfig) -> Self {
        Self { config, limits }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn min_bars(&self) -> usize {
        self.config.min_bars()
    }

    /// Classify the window ending at its last bar.
    ///
    /// Fails with `InsufficientHistory` when the window is shorter than
    /// [`ClassifierConfig::min_bars`].
    pub fn classify(&self, window: &[Bar]) -> Result<MarketContext, EngineError> {
        let required = self.min_bars();
        if window.len() < required {
            return Err(EngineError::InsufficientHistory {
                required,
                available: window.len(),
            });
        }
        let cfg = &self.config;
        let insufficient = || EngineError::InsufficientHistory {
            required,
            available: window.len(),
        };

        let di = directional_index(window, cfg.adx_period);
        let adx = last_valid(&di.adx).ok_or_else(insufficient)?;
        let plus_di = last_valid(&di.plus_di).ok_or_else(insufficient)?;
        let minus_di = last_valid(&di.minus_di).ok_or_else(insufficient)?;
        let atr = last_valid(&di.atr).ok_or_else(insufficient)?;

        let closes: Vec<f64> = window.iter().map(|b| b.close).collect();
        let returns = pct_change(&closes);
        let volatility = last_valid(&rolling_std(&returns, cfg.volatility_window))
            .ok_or_else(insufficient)?
            * cfg.periods_per_year.sqrt();

        let volume_trend = volume_trend(window, cfg.volume_window, cfg.volume_smoothing)
            .ok_or_else(insufficient)?;

        let regime = decide_regime(adx, plus_di, minus_di, volatility, cfg, &self.limits);
        let context = MarketContext {
            regime,
            trend_strength: (adx / 100.0).clamp(0.0, 1.0),
            volatility,
            volume_trend,
            risk_level: risk_level(volatility, &self.limits),
            adx,
            plus_di,
            minus_di,
            atr,
        };
        debug!(
            regime = %context.regime,
            adx,
            volatility,
            "classified market context"
        );
        Ok(context)
    }
}

/// Smoothed ratio of volume to its moving average, minus one.
fn volume_trend(window: &[Bar], ma_window: usize, smoothing: usize) -> Option<f64> {
    let volumes: Vec<f64> = window.iter().map(|b| b.volume).collect();
    let ma = rolling_mean(&volumes, ma_window);
    let ratio: Vec<f64> = volumes
        .iter()
        .zip(&ma)
        .map(|(v, m)| {
            if m.is_nan() {
                f64::NAN
            } else if *m > 0.0 {
                v / m - 1.0
            } else {
                0.0
            }
        })
        .collect();
    last_valid(&rolling_mean(&ratio, smoothing))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars};

    fn ramp(n: usize, start: f64, step: f64) -> Vec<f64> {
        (0..n).map(|i| start + step * i as f64).collect()
    }

    #[test]
    fn min_bars_defaults() {
        assert_eq!(ClassifierConfig::default().min_bars(), 28);
    }

    #[test]
    fn short_window_fails_fast() {
        let classifier = MarketContextClassifier::default();
        let bars = make_bars(&ramp(10, 100.0, 1.0));
        assert_eq!(
            classifier.classify(&bars),
            Err(EngineError::InsufficientHistory {
                required: 28,
                available: 10
            })
        );
    }

    #[test]
    fn strong_uptrend_classifies_bull() {
        let limits = PositionConfig {
            min_volatility: 0.0,
            max_volatility: 10.0,
            ..Default::default()
        };
        let classifier = MarketContextClassifier::new(ClassifierConfig::default(), limits);
        let bars = make_bars(&ramp(60, 100.0, 2.0));
        let ctx = classifier.classify(&bars).unwrap();
        assert_eq!(ctx.regime, MarketRegime::StrongBull);
        assert!(ctx.trend_strength > 0.25 && ctx.trend_strength <= 1.0);
        assert!(ctx.plus_di > ctx.minus_di);
        assert!(ctx.atr > 0.0);
    }

    #[test]
    fn high_volatility_overrides_trend() {
        let limits = PositionConfig {
            max_volatility: 0.001,
            min_volatility: 0.0,
            ..Default::default()
        };
        let classifier = MarketContextClassifier::new(ClassifierConfig::default(), limits);
        let bars = make_bars(&ramp(60, 100.0, 2.0));
        let ctx = classifier.classify(&bars).unwrap();
        assert_eq!(ctx.regime, MarketRegime::HighVol);
        assert_eq!(ctx.risk_level, 1.0);
    }

    #[test]
    fn decide_regime_rules() {
        let cfg = ClassifierConfig::default();
        let limits = PositionConfig::default();
        assert_eq!(
            decide_regime(30.0, 35.0, 10.0, 0.2, &cfg, &limits),
            MarketRegime::StrongBull
        );
        assert_eq!(
            decide_regime(30.0, 25.0, 10.0, 0.2, &cfg, &limits),
            MarketRegime::WeakBull
        );
        assert_eq!(
            decide_regime(30.0, 10.0, 35.0, 0.2, &cfg, &limits),
            MarketRegime::StrongBear
        );
        assert_eq!(
            decide_regime(30.0, 10.0, 20.0, 0.2, &cfg, &limits),
            MarketRegime::WeakBear
        );
        assert_eq!(
            decide_regime(20.0, 40.0, 10.0, 0.2, &cfg, &limits),
            MarketRegime::Sideways
        );
        assert_eq!(
            decide_regime(20.0, 40.0, 10.0, 0.001, &cfg, &limits),
            MarketRegime::LowVol
        );
    }

    #[test]
    fn risk_level_is_clamped() {
        let limits = PositionConfig::default();
        assert_eq!(risk_level(0.0, &limits), 0.0);
        assert_eq!(risk_level(5.0, &limits), 1.0);
        assert_approx(risk_level(0.255, &limits), 0.5, 1e-12);
    }

    #[test]
    fn constant_volume_has_zero_trend() {
        let classifier = MarketContextClassifier::default();
        let bars = make_bars(&ramp(40, 100.0, 0.5));
        let ctx = classifier.classify(&bars).unwrap();
        assert_approx(ctx.volume_trend, 0.0, 1e-12);
    }
}
