//! Performance metrics: pure functions over a per-bar strategy returns series.
//!
//! Every metric is a pure function of the returns slice. Degenerate inputs
//! (empty, zero variance, no losing bars) resolve to bounded values, never
//! NaN or infinity.

use serde::{Deserialize, Serialize};

/// Bars per year used for annualization.
pub const PERIODS_PER_YEAR: f64 = 252.0;

/// Profit factor ceiling for series without losing bars.
pub const PROFIT_FACTOR_CAP: f64 = 1000.0;

/// Aggregate performance metrics for one evaluated series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub annualized_return: f64,
    pub volatility: f64,
    pub sharpe: f64,
    pub sortino: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub trade_count: usize,
}

impl PerformanceMetrics {
    /// Compute all metrics from strategy returns and the number of trades.
    pub fn compute(returns: &[f64], trade_count: usize) -> Self {
        let total = total_return(returns);
        Self {
            total_return: total,
            annualized_return: annualized_return(total, returns.len()),
            volatility: volatility(returns),
            sharpe: sharpe_ratio(returns),
            sortino: sortino_ratio(returns),
            max_drawdown: max_drawdown(returns),
            win_rate: win_rate(returns),
            profit_factor: profit_factor(returns),
            trade_count,
        }
    }

    /// All-zero metrics, as produced by an empty returns series.
    pub fn zero() -> Self {
        Self::compute(&[], 0)
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Compounded total return: prod(1 + r) - 1.
pub fn total_return(returns: &[f64]) -> f64 {
    returns.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
}

/// (1 + total)^(252 / n) - 1; -1.0 when the series is wiped out.
pub fn annualized_return(total_return: f64, bars: usize) -> f64 {
    if bars == 0 {
        return 0.0;
    }
    let growth = 1.0 + total_return;
    if growth <= 0.0 {
        return -1.0;
    }
    let annualized = growth.powf(PERIODS_PER_YEAR / bars as f64) - 1.0;
    if annualized.is_finite() {
        annualized
    } else {
        f64::MAX
    }
}

/// Annualized volatility: sample std * sqrt(252).
pub fn volatility(returns: &[f64]) -> f64 {
    std_dev(returns) * PERIODS_PER_YEAR.sqrt()
}

/// Annualized Sharpe ratio: mean / std * sqrt(252).
///
/// Returns 0.0 if variance is zero or fewer than 2 bars.
pub fn sharpe_ratio(returns: &[f64]) -> f64 {
    let std = std_dev(returns);
    if std < 1e-15 {
        return 0.0;
    }
    mean_f64(returns) / std * PERIODS_PER_YEAR.sqrt()
}

/// Annualized Sortino ratio: mean * sqrt(252) / std of losing bars.
///
/// Returns 0.0 with fewer than two losing bars or zero downside dispersion.
pub fn sortino_ratio(returns: &[f64]) -> f64 {
    let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    let downside_std = std_dev(&downside);
    if downside_std < 1e-15 {
        return 0.0;
    }
    mean_f64(returns) * PERIODS_PER_YEAR.sqrt() / downside_std
}

/// Maximum drawdown of the compounded curve as a negative fraction
/// (e.g., -0.15 = 15% drawdown). The running peak starts at the first bar.
///
/// Returns 0.0 if the curve never falls below its running peak.
pub fn max_drawdown(returns: &[f64]) -> f64 {
    let mut equity = 1.0;
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for r in returns {
        equity *= 1.0 + r;
        if equity > peak {
            peak = equity;
        }
        if peak > 0.0 {
            let dd = (equity - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Fraction of bars with a strictly positive return.
pub fn win_rate(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    returns.iter().filter(|r| **r > 0.0).count() as f64 / returns.len() as f64
}

/// Gross gains / gross losses, capped at 1000.
///
/// No losing bars gives the cap when there are gains and 0.0 when the series
/// is entirely flat.
pub fn profit_factor(returns: &[f64]) -> f64 {
    let gains: f64 = returns.iter().filter(|r| **r > 0.0).sum();
    let losses: f64 = returns.iter().filter(|r| **r < 0.0).map(|r| r.abs()).sum();
    if losses == 0.0 {
        return if gains > 0.0 { PROFIT_FACTOR_CAP } else { 0.0 };
    }
    (gains / losses).min(PROFIT_FACTOR_CAP)
}

// ─── Helpers ────────────────────────────────────────────────────────

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Total / annualized return ──

    #[test]
    fn total_return_compounds() {
        assert!((total_return(&[0.1, 0.1]) - 0.21).abs() < 1e-12);
        assert!((total_return(&[0.1, -0.1]) - (-0.01)).abs() < 1e-12);
        assert_eq!(total_return(&[]), 0.0);
    }

    #[test]
    fn annualized_return_one_year() {
        let total = 0.1;
        assert!((annualized_return(total, 252) - 0.1).abs() < 1e-12);
        assert_eq!(annualized_return(-1.0, 10), -1.0);
        assert_eq!(annualized_return(0.5, 0), 0.0);
    }

    // ── Sharpe / Sortino ──

    #[test]
    fn sharpe_zero_variance_is_zero() {
        assert_eq!(sharpe_ratio(&[0.01; 50]), 0.0);
        assert_eq!(sharpe_ratio(&[0.0; 50]), 0.0);
        assert_eq!(sharpe_ratio(&[0.01]), 0.0);
    }

    #[test]
    fn sharpe_sign_follows_mean() {
        let returns = [0.01, -0.005, 0.012, -0.002, 0.008];
        assert!(sharpe_ratio(&returns) > 0.0);
        let neg: Vec<f64> = returns.iter().map(|r| -r).collect();
        assert!(sharpe_ratio(&neg) < 0.0);
    }

    #[test]
    fn sortino_needs_downside_dispersion() {
        assert_eq!(sortino_ratio(&[0.01, 0.02, 0.03]), 0.0);
        assert_eq!(sortino_ratio(&[0.01, -0.02, 0.03]), 0.0);
        let s = sortino_ratio(&[0.03, -0.01, 0.02, -0.02]);
        assert!(s > 0.0);
    }

    // ── Drawdown ──

    #[test]
    fn max_drawdown_from_peak() {
        // equity: 1.1, 0.88, 0.968
        let dd = max_drawdown(&[0.1, -0.2, 0.1]);
        assert!((dd - (-0.2)).abs() < 1e-12);
        assert_eq!(max_drawdown(&[0.01, 0.02]), 0.0);
        assert_eq!(max_drawdown(&[]), 0.0);
    }

    // ── Win rate / profit factor ──

    #[test]
    fn win_rate_counts_strict_gains() {
        assert!((win_rate(&[0.1, 0.0, -0.1, 0.2]) - 0.5).abs() < 1e-12);
        assert_eq!(win_rate(&[]), 0.0);
    }

    #[test]
    fn profit_factor_capped() {
        assert_eq!(profit_factor(&[0.01, 0.02]), PROFIT_FACTOR_CAP);
        assert_eq!(profit_factor(&[0.0, 0.0]), 0.0);
        assert!((profit_factor(&[0.03, -0.01]) - 3.0).abs() < 1e-12);
        assert_eq!(profit_factor(&[1.0, -1e-6]), PROFIT_FACTOR_CAP);
    }

    #[test]
    fn compute_on_flat_series() {
        let m = PerformanceMetrics::compute(&[0.0; 30], 0);
        assert_eq!(m.total_return, 0.0);
        assert_eq!(m.sharpe, 0.0);
        assert_eq!(m.sortino, 0.0);
        assert_eq!(m.max_drawdown, 0.0);
        assert_eq!(m.win_rate, 0.0);
        assert_eq!(m.profit_factor, 0.0);
        assert_eq!(m, PerformanceMetrics {
            trade_count: 0,
            ..PerformanceMetrics::zero()
        });
    }
}
