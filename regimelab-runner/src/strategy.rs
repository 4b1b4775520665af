//! ParamStrategy: the raw-signal source parametrized by a [`StrategyParams`].
//!
//! Score = w_macd * (MACD line / price * 100) + w_bollinger * z-position of
//! the close within its `lookback_period` window. Below the oversold threshold
//! the view is long, above overbought it is short, flat otherwise.

use regimelab_core::indicators::{latest_z_score, macd};
use regimelab_core::signals::{
    AdaptiveBollinger, AdaptiveBollingerParams, AdaptiveMacd, AdaptiveMacdParams,
};
use regimelab_core::{Bar, MarketContext, RawSignalSource};
use serde::{Deserialize, Serialize};

use crate::params::{StrategyParams, BOLLINGER_WEIGHT, MACD_WEIGHT};

const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;
const MACD_SIGNAL: usize = 9;

#[derive(Debug, Clone)]
pub struct ParamStrategy {
    params: StrategyParams,
}

impl ParamStrategy {
    pub fn new(params: StrategyParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &StrategyParams {
        &self.params
    }

    /// Weighted indicator score at the last bar of `window`.
    pub fn score(&self, window: &[Bar]) -> f64 {
        let Some(last) = window.last() else {
            return 0.0;
        };
        let closes: Vec<f64> = window.iter().map(|b| b.close).collect();

        let macd_component = macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL)
            .line
            .last()
            .filter(|_| last.close > 0.0)
            .map(|line| line / last.close * 100.0)
            .unwrap_or(0.0);
        let z = latest_z_score(&closes, self.params.lookback_period).unwrap_or(0.0);

        self.params.weight(MACD_WEIGHT) * macd_component + self.params.weight(BOLLINGER_WEIGHT) * z
    }
}

impl RawSignalSource for ParamStrategy {
    fn name(&self) -> &str {
        "param_strategy"
    }

    fn warmup_bars(&self) -> usize {
        self.params.lookback_period.max(MACD_SLOW)
    }

    fn raw_signal(&self, window: &[Bar], _context: &MarketContext) -> f64 {
        let score = self.score(window);
        let thresholds = &self.params.entry_thresholds;
        if score < thresholds.oversold {
            1.0
        } else if score > thresholds.overbought {
            -1.0
        } else {
            0.0
        }
    }
}

/// Serializable choice of raw-signal source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    AdaptiveMacd(AdaptiveMacdParams),
    AdaptiveBollinger(AdaptiveBollingerParams),
    Param(StrategyParams),
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::AdaptiveMacd(AdaptiveMacdParams::default())
    }
}

impl SourceConfig {
    pub fn build(&self) -> Box<dyn RawSignalSource> {
        match self {
            Self::AdaptiveMacd(p) => Box::new(AdaptiveMacd::new(p.clone())),
            Self::AdaptiveBollinger(p) => Box::new(AdaptiveBollinger::new(p.clone())),
            Self::Param(p) => Box::new(ParamStrategy::new(p.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use regimelab_core::MarketRegime;

    fn make_bars(closes: &[f64]) -> Vec<Bar> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: base + Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    fn context() -> MarketContext {
        MarketContext {
            regime: MarketRegime::Sideways,
            trend_strength: 0.2,
            volatility: 0.2,
            volume_trend: 0.0,
            risk_level: 0.4,
            adx: 20.0,
            plus_di: 20.0,
            minus_di: 20.0,
            atr: 2.0,
        }
    }

    fn bollinger_only(lookback: usize) -> StrategyParams {
        let mut params = StrategyParams {
            lookback_period: lookback,
            ..Default::default()
        };
        params.indicator_weights.insert(MACD_WEIGHT.to_string(), 0.0);
        params.indicator_weights.insert(BOLLINGER_WEIGHT.to_string(), 1.0);
        params
    }

    #[test]
    fn flat_prices_score_zero() {
        let strategy = ParamStrategy::new(StrategyParams::default());
        let bars = make_bars(&[100.0; 60]);
        assert_eq!(strategy.score(&bars), 0.0);
        assert_eq!(strategy.raw_signal(&bars, &context()), 0.0);
    }

    #[test]
    fn spike_above_band_goes_short() {
        let mut closes = vec![100.0; 40];
        closes.push(110.0);
        let strategy = ParamStrategy::new(bollinger_only(20));
        let bars = make_bars(&closes);
        assert!(strategy.score(&bars) > 1.0);
        assert_eq!(strategy.raw_signal(&bars, &context()), -1.0);
    }

    #[test]
    fn drop_below_band_goes_long() {
        let mut closes = vec![100.0; 40];
        closes.push(90.0);
        let strategy = ParamStrategy::new(bollinger_only(20));
        let bars = make_bars(&closes);
        assert!(strategy.score(&bars) < -1.0);
        assert_eq!(strategy.raw_signal(&bars, &context()), 1.0);
    }

    #[test]
    fn macd_component_follows_trend() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let mut params = StrategyParams::default();
        params.indicator_weights.insert(BOLLINGER_WEIGHT.to_string(), 0.0);
        params.indicator_weights.insert(MACD_WEIGHT.to_string(), 1.0);
        let strategy = ParamStrategy::new(params);
        assert!(strategy.score(&make_bars(&closes)) > 0.0);
    }

    #[test]
    fn source_config_builds_named_sources() {
        assert_eq!(SourceConfig::default().build().name(), "adaptive_macd");
        let cfg: SourceConfig = toml::from_str("type = \"adaptive_bollinger\"").unwrap();
        assert_eq!(cfg.build().name(), "adaptive_bollinger");
        let cfg = SourceConfig::Param(StrategyParams::default());
        assert_eq!(cfg.build().name(), "param_strategy");
    }

    #[test]
    fn warmup_covers_slow_ema_and_lookback() {
        assert_eq!(ParamStrategy::new(bollinger_only(10)).warmup_bars(), 26);
        assert_eq!(ParamStrategy::new(bollinger_only(40)).warmup_bars(), 40);
    }
}
