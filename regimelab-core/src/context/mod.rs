//! Market context: regime labels and the classifier that assigns them.

pub mod classifier;
pub mod regime;

pub use classifier::{
    decide_regime, risk_level, ClassifierConfig, MarketContext, MarketContextClassifier,
};
pub use regime::MarketRegime;
