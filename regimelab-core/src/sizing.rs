//! PositionSizer: raw signal plus market context to a bounded position.

use crate::config::PositionConfig;
use crate::context::MarketContext;

/// Regime-aware position sizer.
///
/// position = signal * max_position_size * regime_factor
///          * (0.5 + 0.5 * trend_strength) * (1 - 0.5 * risk_level),
/// clamped to [-max_portfolio_heat, max_portfolio_heat].
#[derive(Debug, Clone, Default)]
pub struct PositionSizer {
    config: PositionConfig,
}

impl PositionSizer {
    pub fn new(config: PositionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PositionConfig {
        &self.config
    }

    pub fn size(&self, raw_signal: f64, context: &MarketContext) -> f64 {
        if !raw_signal.is_finite() {
            return 0.0;
        }
        let heat = self.config.max_portfolio_heat;
        let position = raw_signal.clamp(-1.0, 1.0)
            * self.config.max_position_size
            * context.regime.sizing_factor()
            * (0.5 + 0.5 * context.trend_strength)
            * (1.0 - 0.5 * context.risk_level);
        position.clamp(-heat, heat)
    }
}

#[cfg(test)]
pub(crate) fn test_context(regime: crate::context::MarketRegime) -> MarketContext {
    MarketContext {
        regime,
        trend_strength: 0.4,
        volatility: 0.2,
        volume_trend: 0.0,
        risk_level: 0.2,
        adx: 40.0,
        plus_di: 30.0,
        minus_di: 10.0,
        atr: 2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::MarketRegime;
    use crate::indicators::assert_approx;

    #[test]
    fn size_applies_every_factor() {
        let sizer = PositionSizer::new(PositionConfig {
            max_portfolio_heat: 10.0,
            ..Default::default()
        });
        let ctx = test_context(MarketRegime::WeakBull);
        // 1.0 * 1.0 * 0.7 * (0.5 + 0.2) * (1 - 0.1)
        assert_approx(sizer.size(1.0, &ctx), 0.7 * 0.7 * 0.9, 1e-12);
        assert_approx(sizer.size(-1.0, &ctx), -0.7 * 0.7 * 0.9, 1e-12);
    }

    #[test]
    fn size_clamped_to_portfolio_heat() {
        let sizer = PositionSizer::new(PositionConfig {
            max_position_size: 5.0,
            max_portfolio_heat: 0.5,
            ..Default::default()
        });
        let ctx = test_context(MarketRegime::StrongBull);
        assert_eq!(sizer.size(1.0, &ctx), 0.5);
        assert_eq!(sizer.size(-1.0, &ctx), -0.5);
    }

    #[test]
    fn zero_and_non_finite_signals_are_flat() {
        let sizer = PositionSizer::default();
        let ctx = test_context(MarketRegime::Sideways);
        assert_eq!(sizer.size(0.0, &ctx), 0.0);
        assert_eq!(sizer.size(f64::NAN, &ctx), 0.0);
    }
}
