//! RegimeLab Core: regime classification, sizing, stops, simulation and risk overlay.
//!
//! This crate contains the sequential decision engine:
//! - Domain types (bars, validated OHLCV series, signal rows)
//! - Indicator math (true range, directional index, EMA/MACD, Bollinger)
//! - Market context classifier with seven regimes
//! - Regime-aware position sizer and ATR stop calculator
//! - Pluggable raw-signal sources
//! - Step-wise simulation loop with path-dependent exits
//! - Kelly / volatility risk overlay
//! - Deterministic RNG streams for stochastic search

pub mod config;
pub mod context;
pub mod domain;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod risk;
pub mod rng;
pub mod signals;
pub mod sizing;
pub mod stops;

pub use config::PositionConfig;
pub use context::{ClassifierConfig, MarketContext, MarketContextClassifier, MarketRegime};
pub use domain::{Bar, OhlcvSeries, SignalRecord, SignalSeries};
pub use engine::{SignalSimulator, SimulationConfig};
pub use error::EngineError;
pub use risk::{RiskConfig, RiskMetrics, RiskOverlayManager};
pub use signals::RawSignalSource;
pub use sizing::PositionSizer;
pub use stops::{AdaptiveStopCalculator, StopLevels};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: public types can cross thread boundaries.
    ///
    /// The optimizer and batch driver evaluate candidates on rayon workers.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<Bar>();
        require_sync::<Bar>();
        require_send::<OhlcvSeries>();
        require_sync::<OhlcvSeries>();
        require_send::<SignalSeries>();
        require_sync::<SignalSeries>();

        // Context and configuration
        require_send::<MarketContext>();
        require_sync::<MarketContext>();
        require_send::<PositionConfig>();
        require_sync::<PositionConfig>();
        require_send::<MarketContextClassifier>();
        require_sync::<MarketContextClassifier>();

        // Engine
        require_send::<SignalSimulator>();
        require_sync::<SignalSimulator>();
        require_send::<RiskOverlayManager>();
        require_sync::<RiskOverlayManager>();
        require_send::<RiskMetrics>();
        require_sync::<RiskMetrics>();
        require_send::<EngineError>();
        require_sync::<EngineError>();

        // Sources
        require_send::<signals::AdaptiveMacd>();
        require_sync::<signals::AdaptiveMacd>();
        require_send::<signals::AdaptiveBollinger>();
        require_sync::<signals::AdaptiveBollinger>();
        require_send::<Box<dyn RawSignalSource>>();
        require_sync::<Box<dyn RawSignalSource>>();

        // RNG
        require_send::<rng::RngHierarchy>();
        require_sync::<rng::RngHierarchy>();
    }

    /// Architecture contract: raw-signal sources never see position state.
    #[test]
    fn raw_signal_source_has_no_position_parameter() {
        fn _check_trait_object_builds(
            source: &dyn RawSignalSource,
            bars: &[Bar],
            context: &MarketContext,
        ) -> f64 {
            source.raw_signal(bars, context)
        }
    }
}
