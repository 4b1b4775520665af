//! StrategyParams: the genome searched by the genetic optimizer.
//!
//! One instance fully parametrizes a candidate strategy. Random sampling,
//! mutation and crossover all draw from a caller-supplied RNG so a seeded
//! `StdRng` reproduces the same search.

use std::collections::BTreeMap;

use rand::Rng;
use regimelab_core::EngineError;
use serde::{Deserialize, Serialize};

/// Weight key for the MACD component of the score.
pub const MACD_WEIGHT: &str = "macd";
/// Weight key for the Bollinger component of the score.
pub const BOLLINGER_WEIGHT: &str = "bollinger";

/// Lookback bounds enforced on sampling and mutation.
pub const LOOKBACK_BOUNDS: (usize, usize) = (5, 50);

const POSITION_SIZE_BOUNDS: (f64, f64) = (0.01, 1.0);
const STOP_LOSS_MAX: f64 = 0.2;
const TAKE_PROFIT_MAX: f64 = 0.4;
const MUTATION_FACTOR: (f64, f64) = (0.8, 1.2);

/// Score thresholds that open a position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntryThresholds {
    /// Score below this goes long.
    pub oversold: f64,
    /// Score above this goes short.
    pub overbought: f64,
}

/// Return thresholds carried by the genome.
///
/// Recombined and serialized with the rest of the candidate; exits are
/// driven by `stop_loss` and `take_profit`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExitThresholds {
    pub profit: f64,
    pub loss: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyParams {
    pub indicator_weights: BTreeMap<String, f64>,
    pub entry_thresholds: EntryThresholds,
    pub exit_thresholds: ExitThresholds,
    /// Maximum absolute exposure, in (0, 1].
    pub position_size: f64,
    /// Per-bar loss fraction that forces an exit.
    pub stop_loss: f64,
    /// Per-bar gain fraction that forces an exit.
    pub take_profit: f64,
    /// Bollinger window for the z-position component.
    pub lookback_period: usize,
}

impl Default for StrategyParams {
    fn default() -> Self {
        let mut indicator_weights = BTreeMap::new();
        indicator_weights.insert(MACD_WEIGHT.to_string(), 0.5);
        indicator_weights.insert(BOLLINGER_WEIGHT.to_string(), 0.5);
        Self {
            indicator_weights,
            entry_thresholds: EntryThresholds {
                oversold: -1.0,
                overbought: 1.0,
            },
            exit_thresholds: ExitThresholds {
                profit: 0.02,
                loss: -0.02,
            },
            position_size: 0.5,
            stop_loss: 0.05,
            take_profit: 0.1,
            lookback_period: 20,
        }
    }
}

impl StrategyParams {
    /// Sample a fresh candidate.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        let mut indicator_weights = BTreeMap::new();
        indicator_weights.insert(MACD_WEIGHT.to_string(), rng.gen::<f64>());
        indicator_weights.insert(BOLLINGER_WEIGHT.to_string(), rng.gen::<f64>());
        Self {
            indicator_weights,
            entry_thresholds: EntryThresholds {
                oversold: -rng.gen::<f64>() * 2.0,
                overbought: rng.gen::<f64>() * 2.0,
            },
            exit_thresholds: ExitThresholds {
                profit: rng.gen::<f64>() * 0.05,
                loss: -rng.gen::<f64>() * 0.05,
            },
            position_size: rng.gen_range(0.1..=1.0),
            stop_loss: rng.gen_range(0.02..=0.1),
            take_profit: rng.gen_range(0.02..=0.2),
            lookback_period: rng.gen_range(LOOKBACK_BOUNDS.0..=LOOKBACK_BOUNDS.1),
        }
    }

    /// Weight for `indicator`, 0.0 when absent.
    pub fn weight(&self, indicator: &str) -> f64 {
        self.indicator_weights.get(indicator).copied().unwrap_or(0.0)
    }

    /// Perturb each numeric field with probability `rate` by a factor drawn
    /// from [0.8, 1.2], then clamp to its domain.
    pub fn mutate<R: Rng>(&self, rate: f64, rng: &mut R) -> Self {
        let mut out = self.clone();
        let perturb = |value: f64, rng: &mut R| {
            if rng.gen_bool(rate.clamp(0.0, 1.0)) {
                value * rng.gen_range(MUTATION_FACTOR.0..=MUTATION_FACTOR.1)
            } else {
                value
            }
        };

        for weight in out.indicator_weights.values_mut() {
            *weight = perturb(*weight, rng);
        }
        out.entry_thresholds.oversold = perturb(out.entry_thresholds.oversold, rng);
        out.entry_thresholds.overbought = perturb(out.entry_thresholds.overbought, rng);
        out.exit_thresholds.profit = perturb(out.exit_thresholds.profit, rng);
        out.exit_thresholds.loss = perturb(out.exit_thresholds.loss, rng);
        out.position_size = perturb(out.position_size, rng)
            .clamp(POSITION_SIZE_BOUNDS.0, POSITION_SIZE_BOUNDS.1);
        out.stop_loss = perturb(out.stop_loss, rng).min(STOP_LOSS_MAX);
        out.take_profit = perturb(out.take_profit, rng).min(TAKE_PROFIT_MAX);
        let lookback = perturb(out.lookback_period as f64, rng) as usize;
        out.lookback_period = lookback.clamp(LOOKBACK_BOUNDS.0, LOOKBACK_BOUNDS.1);
        out
    }

    /// Uniform crossover: every field, and every weight entry, comes from
    /// either parent with equal probability.
    pub fn crossover<R: Rng>(&self, other: &Self, rng: &mut R) -> Self {
        let mut indicator_weights = BTreeMap::new();
        let keys: std::collections::BTreeSet<&String> = self
            .indicator_weights
            .keys()
            .chain(other.indicator_weights.keys())
            .collect();
        for key in keys {
            let value = match (self.indicator_weights.get(key), other.indicator_weights.get(key)) {
                (Some(a), Some(b)) => {
                    if rng.gen_bool(0.5) {
                        *a
                    } else {
                        *b
                    }
                }
                (Some(v), None) | (None, Some(v)) => *v,
                (None, None) => continue,
            };
            indicator_weights.insert(key.clone(), value);
        }

        fn pick<T: Copy, R: Rng>(a: T, b: T, rng: &mut R) -> T {
            if rng.gen_bool(0.5) {
                a
            } else {
                b
            }
        }

        Self {
            indicator_weights,
            entry_thresholds: EntryThresholds {
                oversold: pick(
                    self.entry_thresholds.oversold,
                    other.entry_thresholds.oversold,
                    rng,
                ),
                overbought: pick(
                    self.entry_thresholds.overbought,
                    other.entry_thresholds.overbought,
                    rng,
                ),
            },
            exit_thresholds: ExitThresholds {
                profit: pick(self.exit_thresholds.profit, other.exit_thresholds.profit, rng),
                loss: pick(self.exit_thresholds.loss, other.exit_thresholds.loss, rng),
            },
            position_size: pick(self.position_size, other.position_size, rng),
            stop_loss: pick(self.stop_loss, other.stop_loss, rng),
            take_profit: pick(self.take_profit, other.take_profit, rng),
            lookback_period: pick(self.lookback_period, other.lookback_period, rng),
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        for (name, weight) in &self.indicator_weights {
            if !weight.is_finite() {
                return Err(EngineError::config(format!(
                    "indicator weight '{name}' must be finite"
                )));
            }
        }
        let fields = [
            ("entry_thresholds.oversold", self.entry_thresholds.oversold),
            ("entry_thresholds.overbought", self.entry_thresholds.overbought),
            ("exit_thresholds.profit", self.exit_thresholds.profit),
            ("exit_thresholds.loss", self.exit_thresholds.loss),
            ("position_size", self.position_size),
            ("stop_loss", self.stop_loss),
            ("take_profit", self.take_profit),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(EngineError::config(format!("{name} must be finite")));
            }
        }
        if self.position_size <= 0.0 {
            return Err(EngineError::config("position_size must be > 0"));
        }
        if self.stop_loss <= 0.0 || self.take_profit <= 0.0 {
            return Err(EngineError::config("stop_loss and take_profit must be > 0"));
        }
        if self.lookback_period < 2 {
            return Err(EngineError::config("lookback_period must be >= 2"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn in_random_ranges(p: &StrategyParams) -> bool {
        let w = (0.0..1.0).contains(&p.weight(MACD_WEIGHT))
            && (0.0..1.0).contains(&p.weight(BOLLINGER_WEIGHT));
        let t = p.entry_thresholds.oversold <= 0.0
            && p.entry_thresholds.oversold > -2.0
            && (0.0..2.0).contains(&p.entry_thresholds.overbought);
        let e = (0.0..0.05).contains(&p.exit_thresholds.profit)
            && p.exit_thresholds.loss <= 0.0
            && p.exit_thresholds.loss > -0.05;
        let s = (0.1..=1.0).contains(&p.position_size)
            && (0.02..=0.1).contains(&p.stop_loss)
            && (0.02..=0.2).contains(&p.take_profit)
            && (5..=50).contains(&p.lookback_period);
        w && t && e && s
    }

    #[test]
    fn random_params_within_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let p = StrategyParams::random(&mut rng);
            assert!(in_random_ranges(&p), "{p:?}");
            assert!(p.validate().is_ok());
        }
    }

    #[test]
    fn random_is_seed_deterministic() {
        let a = StrategyParams::random(&mut StdRng::seed_from_u64(1));
        let b = StrategyParams::random(&mut StdRng::seed_from_u64(1));
        assert_eq!(a, b);
    }

    #[test]
    fn zero_rate_mutation_is_identity() {
        let mut rng = StdRng::seed_from_u64(3);
        let p = StrategyParams::random(&mut rng);
        assert_eq!(p.mutate(0.0, &mut rng), p);
    }

    #[test]
    fn full_rate_mutation_respects_clamps() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut p = StrategyParams {
            position_size: 1.0,
            stop_loss: 0.2,
            take_profit: 0.4,
            lookback_period: 50,
            ..Default::default()
        };
        for _ in 0..100 {
            p = p.mutate(1.0, &mut rng);
            assert!(p.position_size <= 1.0 && p.position_size >= 0.01);
            assert!(p.stop_loss <= 0.2);
            assert!(p.take_profit <= 0.4);
            assert!((5..=50).contains(&p.lookback_period));
        }
    }

    #[test]
    fn crossover_takes_each_field_from_a_parent() {
        let mut rng = StdRng::seed_from_u64(5);
        let a = StrategyParams::random(&mut rng);
        let b = StrategyParams::random(&mut rng);
        for _ in 0..50 {
            let c = a.crossover(&b, &mut rng);
            for key in [MACD_WEIGHT, BOLLINGER_WEIGHT] {
                assert!(c.weight(key) == a.weight(key) || c.weight(key) == b.weight(key));
            }
            assert!(c.position_size == a.position_size || c.position_size == b.position_size);
            assert!(
                c.lookback_period == a.lookback_period || c.lookback_period == b.lookback_period
            );
            assert!(c.stop_loss == a.stop_loss || c.stop_loss == b.stop_loss);
        }
    }

    #[test]
    fn crossover_keeps_one_sided_weights() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut a = StrategyParams::default();
        a.indicator_weights.insert("rsi".to_string(), 0.3);
        let b = StrategyParams::default();
        let c = a.crossover(&b, &mut rng);
        assert_eq!(c.weight("rsi"), 0.3);
        assert_eq!(c.indicator_weights.len(), 3);
    }

    #[test]
    fn validate_rejects_non_finite() {
        let mut p = StrategyParams::default();
        p.indicator_weights.insert(MACD_WEIGHT.to_string(), f64::NAN);
        assert!(p.validate().is_err());
        let p = StrategyParams {
            stop_loss: f64::INFINITY,
            ..Default::default()
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn serde_uses_named_fields() {
        let json = serde_json::to_value(StrategyParams::default()).unwrap();
        assert_eq!(json["entry_thresholds"]["oversold"], -1.0);
        assert_eq!(json["indicator_weights"]["macd"], 0.5);
        assert_eq!(json["lookback_period"], 20);
    }
}
