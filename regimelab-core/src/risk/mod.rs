//! Post-hoc risk overlay: Kelly sizing, volatility scaling and return-based
//! exit enforcement applied to an already simulated series.

pub mod exits;
pub mod kelly;
pub mod overlay;

pub use exits::enforce_exits;
pub use kelly::{clamp_volatility_factor, kelly_criterion, kelly_from_returns, win_rate};
pub use overlay::{RiskConfig, RiskMetrics, RiskOverlayManager};
