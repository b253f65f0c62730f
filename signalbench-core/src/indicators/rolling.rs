//! Window primitives over plain `f64` series.
//!
//! A window containing NaN yields NaN. Means are taken per window as an
//! offset from the window's first value, so a constant input gives an exactly
//! constant output.

/// Rolling mean requiring a full window.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    rolling_mean_min_periods(values, window, window)
}

/// Rolling mean over up to `window` values, defined once `min_periods` are available.
pub fn rolling_mean_min_periods(values: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    assert!(window >= 1, "window must be >= 1");
    let min_periods = min_periods.clamp(1, window);
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let slice = &values[start..=i];
            if slice.len() < min_periods || slice.iter().any(|v| v.is_nan()) {
                f64::NAN
            } else {
                shifted_mean(slice)
            }
        })
        .collect()
}

fn shifted_mean(slice: &[f64]) -> f64 {
    let base = slice[0];
    base + slice.iter().map(|v| v - base).sum::<f64>() / slice.len() as f64
}

/// Rolling sample standard deviation (n-1 denominator).
pub fn rolling_sample_std(values: &[f64], window: usize) -> Vec<f64> {
    assert!(window >= 2, "sample std window must be >= 2");
    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                return f64::NAN;
            }
            let slice = &values[i + 1 - window..=i];
            if slice.iter().any(|v| v.is_nan()) {
                return f64::NAN;
            }
            let mean = shifted_mean(slice);
            let ss: f64 = slice.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (window - 1) as f64).sqrt()
        })
        .collect()
}

/// Simple percentage change over `periods` bars (as a fraction).
pub fn pct_change(values: &[f64], periods: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            if i < periods {
                f64::NAN
            } else {
                values[i] / values[i - periods] - 1.0
            }
        })
        .collect()
}

/// Shift a series forward by `k` bars, filling the head with NaN.
pub fn shift(values: &[f64], k: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| if i < k { f64::NAN } else { values[i - k] })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn rolling_mean_full_window() {
        let r = rolling_mean(&[1.0, 2.0, 3.0, 4.0], 3);
        assert!(r[0].is_nan() && r[1].is_nan());
        assert_approx(r[2], 2.0, DEFAULT_EPSILON);
        assert_approx(r[3], 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rolling_mean_partial_windows() {
        let r = rolling_mean_min_periods(&[2.0, 4.0, 6.0, 8.0], 3, 1);
        assert_approx(r[0], 2.0, DEFAULT_EPSILON);
        assert_approx(r[1], 3.0, DEFAULT_EPSILON);
        assert_approx(r[2], 4.0, DEFAULT_EPSILON);
        assert_approx(r[3], 6.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rolling_mean_constant_is_exact() {
        let values = vec![0.1; 300];
        let r = rolling_mean_min_periods(&values, 50, 1);
        assert!(r.iter().all(|v| *v == r[0]));
    }

    #[test]
    fn sample_std_uses_n_minus_one() {
        // mean 2, squared deviations 1 + 0 + 1 = 2, / (3-1) = 1
        let r = rolling_sample_std(&[1.0, 2.0, 3.0], 3);
        assert_approx(r[2], 1.0, DEFAULT_EPSILON);
    }

    #[test]
    fn nan_in_window_propagates() {
        let r = rolling_mean(&[1.0, f64::NAN, 3.0, 4.0, 5.0], 2);
        assert!(r[1].is_nan() && r[2].is_nan());
        assert_approx(r[3], 3.5, DEFAULT_EPSILON);
    }

    #[test]
    fn pct_change_and_shift() {
        let p = pct_change(&[100.0, 110.0, 99.0], 1);
        assert!(p[0].is_nan());
        assert_approx(p[1], 0.10, 1e-12);
        assert_approx(p[2], -0.10, 1e-12);

        let s = shift(&[1.0, 2.0, 3.0], 2);
        assert!(s[0].is_nan() && s[1].is_nan());
        assert_eq!(s[2], 1.0);
    }
}
