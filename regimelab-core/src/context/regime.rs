//! Market regime labels and their per-regime control constants.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Discrete summary of directional and volatility conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketRegime {
    StrongBull,
    WeakBull,
    Sideways,
    WeakBear,
    StrongBear,
    #[serde(rename = "high_volatility")]
    HighVol,
    #[serde(rename = "low_volatility")]
    LowVol,
}

impl MarketRegime {
    pub const ALL: [MarketRegime; 7] = [
        MarketRegime::StrongBull,
        MarketRegime::WeakBull,
        MarketRegime::Sideways,
        MarketRegime::WeakBear,
        MarketRegime::StrongBear,
        MarketRegime::HighVol,
        MarketRegime::LowVol,
    ];

    /// Multiplier applied to the raw position in this regime.
    pub fn sizing_factor(self) -> f64 {
        match self {
            MarketRegime::StrongBull => 1.0,
            MarketRegime::WeakBull => 0.7,
            MarketRegime::Sideways => 0.5,
            MarketRegime::WeakBear => 0.3,
            MarketRegime::StrongBear => 0.2,
            MarketRegime::HighVol => 0.3,
            MarketRegime::LowVol => 0.4,
        }
    }

    /// ATR multiple used for the stop distance in this regime.
    pub fn stop_factor(self) -> f64 {
        match self {
            MarketRegime::StrongBull => 3.0,
            MarketRegime::WeakBull => 2.5,
            MarketRegime::Sideways => 2.0,
            MarketRegime::WeakBear => 1.5,
            MarketRegime::StrongBear => 1.0,
            MarketRegime::HighVol => 4.0,
            MarketRegime::LowVol => 1.5,
        }
    }

    pub fn is_strong_trend(self) -> bool {
        matches!(self, MarketRegime::StrongBull | MarketRegime::StrongBear)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MarketRegime::StrongBull => "strong_bull",
            MarketRegime::WeakBull => "weak_bull",
            MarketRegime::Sideways => "sideways",
            MarketRegime::WeakBear => "weak_bear",
            MarketRegime::StrongBear => "strong_bear",
            MarketRegime::HighVol => "high_volatility",
            MarketRegime::LowVol => "low_volatility",
        }
    }
}

impl fmt::Display for MarketRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_factor_widest_in_high_vol() {
        let widest = MarketRegime::ALL
            .iter()
            .max_by(|a, b| a.stop_factor().total_cmp(&b.stop_factor()))
            .copied();
        assert_eq!(widest, Some(MarketRegime::HighVol));
        assert!(MarketRegime::ALL
            .iter()
            .all(|r| (1.0..=4.0).contains(&r.stop_factor())));
    }

    #[test]
    fn serde_names_match_display() {
        for regime in MarketRegime::ALL {
            let json = serde_json::to_string(&regime).unwrap();
            assert_eq!(json, format!("\"{regime}\""));
        }
    }
}
