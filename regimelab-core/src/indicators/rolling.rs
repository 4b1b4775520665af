//! Rolling window statistics over `f64` series.
//!
//! Conventions shared by every indicator in this crate:
//! - Output has the same length as the input.
//! - Positions before the first complete window are NaN.
//! - A NaN anywhere inside a window makes that window's output NaN.
//!
//! Standard deviation is the sample estimator (divide by n - 1).

/// Arithmetic mean; 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1); 0.0 when fewer than two values.
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64;
    var.sqrt()
}

/// Rolling mean over a trailing window.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(values, window, mean)
}

/// Rolling sample standard deviation over a trailing window.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(values, window, sample_std)
}

fn rolling_apply(values: &[f64], window: usize, f: impl Fn(&[f64]) -> f64) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if window == 0 || n < window {
        return result;
    }
    for i in (window - 1)..n {
        let slice = &values[i + 1 - window..=i];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        result[i] = f(slice);
    }
    result
}

/// Simple percent change. Index 0 is NaN; a zero previous value yields 0.0.
pub fn pct_change(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    for i in 1..n {
        let prev = values[i - 1];
        result[i] = if prev == 0.0 {
            0.0
        } else {
            (values[i] - prev) / prev
        };
    }
    result
}

/// Last element of a series if it is a valid (non-NaN) number.
pub fn last_valid(values: &[f64]) -> Option<f64> {
    values.last().copied().filter(|v| !v.is_nan())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    #[test]
    fn mean_and_std_basics() {
        assert_eq!(mean(&[]), 0.0);
        assert_approx(mean(&[1.0, 2.0, 3.0]), 2.0, 1e-12);
        assert_eq!(sample_std(&[5.0]), 0.0);
        // sample std of 2,4,4,4,5,5,7,9 = sqrt(32/7)
        assert_approx(
            sample_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]),
            (32.0_f64 / 7.0).sqrt(),
            1e-12,
        );
    }

    #[test]
    fn rolling_mean_warmup_is_nan() {
        let r = rolling_mean(&[1.0, 2.0, 3.0, 4.0], 3);
        assert!(r[0].is_nan());
        assert!(r[1].is_nan());
        assert_approx(r[2], 2.0, 1e-12);
        assert_approx(r[3], 3.0, 1e-12);
    }

    #[test]
    fn rolling_window_with_nan_is_nan() {
        let r = rolling_std(&[f64::NAN, 1.0, 2.0, 3.0], 2);
        assert!(r[1].is_nan());
        assert_approx(r[2], (0.5_f64).sqrt(), 1e-12);
    }

    #[test]
    fn window_longer_than_series_is_all_nan() {
        assert!(rolling_mean(&[1.0, 2.0], 5).iter().all(|v| v.is_nan()));
        assert!(rolling_mean(&[1.0, 2.0], 0).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn pct_change_handles_zero_base() {
        let r = pct_change(&[0.0, 1.0, 1.5]);
        assert!(r[0].is_nan());
        assert_eq!(r[1], 0.0);
        assert_approx(r[2], 0.5, 1e-12);
        assert_eq!(last_valid(&r), Some(0.5));
        assert_eq!(last_valid(&[f64::NAN]), None);
    }
}
