//! Adaptive MACD source.
//!
//! The MACD histogram is normalized by twice its rolling standard deviation
//! and clipped to [-1, 1]. EMA periods speed up or slow down with volatility
//! and regime. Strong trends amplify the view, sideways markets halve it and
//! HIGH_VOL silences it.

use serde::{Deserialize, Serialize};

use crate::context::{MarketContext, MarketRegime};
use crate::domain::Bar;
use crate::indicators::macd;
use crate::indicators::rolling::{last_valid, rolling_std};

use super::{closes, volatility_period_factor, RawSignalSource};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveMacdParams {
    pub base_fast_period: usize,
    pub base_slow_period: usize,
    pub base_signal_period: usize,
    pub volatility_adjustment: bool,
    /// Window of the histogram standard deviation used for normalization.
    pub normalization_window: usize,
}

impl Default for AdaptiveMacdParams {
    fn default() -> Self {
        Self {
            base_fast_period: 12,
            base_slow_period: 26,
            base_signal_period: 9,
            volatility_adjustment: true,
            normalization_window: 20,
        }
    }
}

/// Effective EMA periods after context adaptation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacdPeriods {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

#[derive(Debug, Clone, Default)]
pub struct AdaptiveMacd {
    params: AdaptiveMacdParams,
}

impl AdaptiveMacd {
    pub fn new(params: AdaptiveMacdParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &AdaptiveMacdParams {
        &self.params
    }

    pub fn periods(&self, context: &MarketContext) -> MacdPeriods {
        let p = &self.params;
        if !p.volatility_adjustment {
            return MacdPeriods {
                fast: p.base_fast_period,
                slow: p.base_slow_period,
                signal: p.base_signal_period,
            };
        }
        let factor = volatility_period_factor(context) * regime_period_factor(context.regime);
        let scale = |base: usize, floor: usize| -> usize {
            let scaled = (base as f64 * factor).floor();
            if scaled.is_finite() && scaled > floor as f64 {
                scaled as usize
            } else {
                floor
            }
        };
        MacdPeriods {
            fast: scale(p.base_fast_period, 5),
            slow: scale(p.base_slow_period, 10),
            signal: scale(p.base_signal_period, 3),
        }
    }
}

fn regime_period_factor(regime: MarketRegime) -> f64 {
    match regime {
        MarketRegime::StrongBull | MarketRegime::StrongBear => 0.8,
        MarketRegime::WeakBull | MarketRegime::WeakBear => 0.9,
        MarketRegime::Sideways => 1.2,
        MarketRegime::HighVol => 1.3,
        MarketRegime::LowVol => 0.7,
    }
}

impl RawSignalSource for AdaptiveMacd {
    fn name(&self) -> &str {
        "adaptive_macd"
    }

    fn warmup_bars(&self) -> usize {
        self.params
            .base_slow_period
            .max(self.params.normalization_window)
    }

    fn raw_signal(&self, window: &[Bar], context: &MarketContext) -> f64 {
        if context.regime == MarketRegime::HighVol {
            return 0.0;
        }
        let periods = self.periods(context);
        let m = macd(&closes(window), periods.fast, periods.slow, periods.signal);
        let hist_std = last_valid(&rolling_std(&m.histogram, self.params.normalization_window));
        let strength = match (hist_std, m.histogram.last()) {
            (Some(std), Some(&hist)) if std > 0.0 => (hist / (2.0 * std)).clamp(-1.0, 1.0),
            _ => 0.0,
        };
        let scaled = match context.regime {
            MarketRegime::StrongBull | MarketRegime::StrongBear => strength * 1.2,
            MarketRegime::Sideways => strength * 0.5,
            _ => strength,
        };
        scaled.clamp(-1.0, 1.0)
    }
}
