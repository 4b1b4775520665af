//! Raw-signal sources: pluggable directional views in [-1, 1].
//!
//! Sources see the trailing bar window and the current market context, never
//! position or stop state. Sources clip their own output to [-1, 1]; the
//! simulation loop clamps again for third-party sources and treats non-finite
//! values as flat.

pub mod bollinger;
pub mod macd;

pub use bollinger::{AdaptiveBollinger, AdaptiveBollingerParams};
pub use macd::{AdaptiveMacd, AdaptiveMacdParams};

use crate::context::MarketContext;
use crate::domain::Bar;

/// A strategy-specific raw signal function.
///
/// # Invariants
/// - `raw_signal()` only reads `window`, whose last bar is the current bar
/// - `raw_signal()` is deterministic for the same window and context
/// - `raw_signal()` returns a value in [-1, 1] (or NaN for "no view")
pub trait RawSignalSource: Send + Sync {
    /// Name for logs and reports (e.g. "adaptive_macd").
    fn name(&self) -> &str;

    /// Number of bars needed before this source produces meaningful output.
    fn warmup_bars(&self) -> usize;

    /// Directional view at the last bar of `window`, in [-1, 1].
    fn raw_signal(&self, window: &[Bar], context: &MarketContext) -> f64;
}

impl<T: RawSignalSource + ?Sized> RawSignalSource for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn warmup_bars(&self) -> usize {
        (**self).warmup_bars()
    }

    fn raw_signal(&self, window: &[Bar], context: &MarketContext) -> f64 {
        (**self).raw_signal(window, context)
    }
}

/// Period multiplier from volatility: 1 + (volatility - 0.2) * 2.
pub(crate) fn volatility_period_factor(context: &MarketContext) -> f64 {
    1.0 + (context.volatility - 0.2) * 2.0
}

pub(crate) fn closes(window: &[Bar]) -> Vec<f64> {
    window.iter().map(|b| b.close).collect()
}
