//! Adaptive Bollinger source.
//!
//! Strong trends trade breakouts in the direction of the band excursion;
//! every other regime fades excursions back toward the mean. Window and band
//! width adapt to volatility and regime.

use serde::{Deserialize, Serialize};

use crate::context::{MarketContext, MarketRegime};
use crate::domain::Bar;
use crate::indicators::bollinger::bollinger;

use super::{closes, volatility_period_factor, RawSignalSource};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveBollingerParams {
    pub base_window: usize,
    pub base_num_std: f64,
    /// Band excursion beyond which a mean-reversion view is taken.
    pub mean_reversion_threshold: f64,
    /// Band excursion beyond which a trend-following view is taken.
    pub trend_following_threshold: f64,
    pub adaptive_bands: bool,
}

impl Default for AdaptiveBollingerParams {
    fn default() -> Self {
        Self {
            base_window: 20,
            base_num_std: 2.0,
            mean_reversion_threshold: 0.8,
            trend_following_threshold: 1.2,
            adaptive_bands: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AdaptiveBollinger {
    params: AdaptiveBollingerParams,
}

impl AdaptiveBollinger {
    pub fn new(params: AdaptiveBollingerParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &AdaptiveBollingerParams {
        &self.params
    }

    /// Effective (window, num_std) after context adaptation.
    pub fn bands(&self, context: &MarketContext) -> (usize, f64) {
        let p = &self.params;
        if !p.adaptive_bands {
            return (p.base_window, p.base_num_std);
        }
        let vol = volatility_period_factor(context);
        let (window_factor, std_factor) = match context.regime {
            MarketRegime::StrongBull | MarketRegime::StrongBear => (0.8, 1.2),
            MarketRegime::WeakBull | MarketRegime::WeakBear => (0.9, 1.1),
            MarketRegime::Sideways => (1.0, 1.0),
            MarketRegime::HighVol => (1.3, 1.5),
            MarketRegime::LowVol => (0.7, 0.8),
        };
        let scaled = (p.base_window as f64 * vol * window_factor).floor();
        let window = if scaled.is_finite() && scaled > 10.0 {
            scaled as usize
        } else {
            10
        };
        let num_std = (p.base_num_std * vol * std_factor).max(1.0);
        (window, num_std)
    }
}

impl RawSignalSource for AdaptiveBollinger {
    fn name(&self) -> &str {
        "adaptive_bollinger"
    }

    fn warmup_bars(&self) -> usize {
        self.params.base_window + 1
    }

    fn raw_signal(&self, window: &[Bar], context: &MarketContext) -> f64 {
        let (period, num_std) = self.bands(context);
        let closes = closes(window);
        if period < 2 || closes.len() < period {
            return 0.0;
        }
        let bands = bollinger(&closes, period, num_std);
        let (Some(&price), Some(&middle), Some(&upper)) =
            (closes.last(), bands.middle.last(), bands.upper.last())
        else {
            return 0.0;
        };
        let half_width = upper - middle;
        if half_width.is_nan() || half_width <= 0.0 {
            return 0.0;
        }
        let relative = (price - middle) / half_width;

        let trend_direction = if closes.len() > period {
            let change = price - closes[closes.len() - 1 - period];
            if change > 0.0 {
                1.0
            } else if change < 0.0 {
                -1.0
            } else {
                0.0
            }
        } else {
            0.0
        };

        let p = &self.params;
        let mut signal = if context.regime.is_strong_trend() {
            if relative.abs() > p.trend_following_threshold {
                relative.signum()
            } else {
                0.0
            }
        } else if relative.abs() > p.mean_reversion_threshold {
            -relative.signum()
        } else {
            0.0
        };

        signal *= (relative.abs() / 2.0).min(1.0);
        if context.regime == MarketRegime::HighVol {
            signal *= 0.5;
        }
        if signal != 0.0 && signal.signum() == trend_direction {
            signal *= 1.2;
        }
        signal.clamp(-1.0, 1.0)
    }
}
