//! Fixed-fraction stop-loss / take-profit enforcement on a signal series.

use crate::domain::SignalSeries;

/// Enforce return-based exits bar by bar.
///
/// For each bar with an open previous position, the bar's strategy return is
/// `prev_position * return`. At or below `-stop_loss` the bar is forced flat
/// and its strategy return is floored to `-stop_loss`; at or above
/// `take_profit` it is forced flat and capped to `take_profit`. Other bars get
/// their strategy return recomputed from the (possibly rescaled) previous
/// position. Signals are recomputed as net position changes.
///
/// Returns the number of forced exits.
pub fn enforce_exits(series: &mut SignalSeries, stop_loss: f64, take_profit: f64) -> usize {
    let rows = series.rows_mut();
    let mut exits = 0;
    if let Some(first) = rows.first_mut() {
        first.strategy_returns = 0.0;
    }
    for i in 1..rows.len() {
        let prev_position = rows[i - 1].position;
        let pnl = prev_position * rows[i].returns;
        rows[i].strategy_returns = pnl;
        if prev_position == 0.0 {
            continue;
        }
        if pnl <= -stop_loss {
            rows[i].position = 0.0;
            rows[i].strategy_returns = -stop_loss;
            exits += 1;
        } else if pnl >= take_profit {
            rows[i].position = 0.0;
            rows[i].strategy_returns = take_profit;
            exits += 1;
        }
    }
    series.recompute_signals();
    exits
}
