//! AdaptiveStopCalculator: stop-loss and take-profit price levels from ATR
//! and market context.

use serde::{Deserialize, Serialize};

use crate::context::MarketContext;

/// Take-profit distance as a multiple of the stop distance.
pub const REWARD_TO_RISK: f64 = 1.5;

/// Stop-loss and take-profit price levels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopLevels {
    pub stop_loss: f64,
    pub take_profit: f64,
}

impl StopLevels {
    /// No exposure: both levels at price.
    pub fn flat(price: f64) -> Self {
        Self {
            stop_loss: price,
            take_profit: price,
        }
    }

    /// Whether `price` has crossed the stop or the target for a position of
    /// sign `position`. A flat position never triggers.
    pub fn is_triggered(&self, position: f64, price: f64) -> bool {
        if position > 0.0 {
            price <= self.stop_loss || price >= self.take_profit
        } else if position < 0.0 {
            price >= self.stop_loss || price <= self.take_profit
        } else {
            false
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AdaptiveStopCalculator;

impl AdaptiveStopCalculator {
    pub fn new() -> Self {
        Self
    }

    /// stop_distance = atr * stop_factor(regime) * (1 + |position|) * (1 + risk_level).
    pub fn stop_distance(&self, atr: f64, position: f64, context: &MarketContext) -> f64 {
        let atr = if atr.is_finite() { atr.max(0.0) } else { 0.0 };
        atr * context.regime.stop_factor() * (1.0 + position.abs()) * (1.0 + context.risk_level)
    }

    pub fn levels(
        &self,
        price: f64,
        atr: f64,
        position: f64,
        context: &MarketContext,
    ) -> StopLevels {
        if position == 0.0 {
            return StopLevels::flat(price);
        }
        let stop = self.stop_distance(atr, position, context);
        let target = stop * REWARD_TO_RISK;
        if position > 0.0 {
            StopLevels {
                stop_loss: price - stop,
                take_profit: price + target,
            }
        } else {
            StopLevels {
                stop_loss: price + stop,
                take_profit: price - target,
            }
        }
    }
}
