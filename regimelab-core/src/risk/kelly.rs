//! Kelly criterion and volatility-ratio scaling.

/// Lower and upper bound of the volatility scaling factor.
pub const VOLATILITY_FACTOR_BOUNDS: (f64, f64) = (0.5, 2.0);

/// Fraction of strictly positive values; 0.0 for an empty slice.
pub fn win_rate(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    returns.iter().filter(|r| **r > 0.0).count() as f64 / returns.len() as f64
}

/// Unscaled Kelly fraction f = (p/q)(w/l) - q/p.
///
/// Returns 0.0 when p <= 0 or the average loss is not a positive finite
/// number, and 1.0 when p >= 1 (no losing probability mass).
pub fn kelly_criterion(win_rate: f64, avg_win: f64, avg_loss: f64) -> f64 {
    if !(win_rate > 0.0) || !(avg_loss > 0.0) || !avg_loss.is_finite() || !avg_win.is_finite() {
        return 0.0;
    }
    if win_rate >= 1.0 {
        return 1.0;
    }
    let q = 1.0 - win_rate;
    (win_rate / q) * (avg_win / avg_loss) - q / win_rate
}

/// Kelly fraction estimated from a returns history, scaled by `fraction`
/// and clamped to [0, 1].
///
/// No returns, no winning bars or no losing bars all give 0.0.
pub fn kelly_from_returns(returns: &[f64], fraction: f64) -> f64 {
    let p = win_rate(returns);
    if returns.is_empty() || p == 0.0 {
        return 0.0;
    }
    let wins: Vec<f64> = returns.iter().copied().filter(|r| *r > 0.0).collect();
    let losses: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    if losses.is_empty() {
        return 0.0;
    }
    let avg_win = wins.iter().sum::<f64>() / wins.len() as f64;
    let avg_loss = (losses.iter().sum::<f64>() / losses.len() as f64).abs();
    let kelly = kelly_criterion(p, avg_win, avg_loss) * fraction;
    if kelly.is_finite() {
        kelly.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// avg / current volatility, clamped to [0.5, 2.0].
///
/// A zero (or non-finite) average gives 1.0; a zero current volatility with a
/// positive average saturates at 2.0.
pub fn clamp_volatility_factor(avg_volatility: f64, current_volatility: f64) -> f64 {
    let (lo, hi) = VOLATILITY_FACTOR_BOUNDS;
    if !(avg_volatility.is_finite() && avg_volatility > 0.0) {
        return 1.0;
    }
    if !(current_volatility > 0.0) {
        return hi;
    }
    let factor = avg_volatility / current_volatility;
    if factor.is_nan() {
        return 1.0;
    }
    factor.clamp(lo, hi)
}
