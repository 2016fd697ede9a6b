//! Differencing utilities for SARIMAX models.
//!
//! Non-seasonal and seasonal differencing are combined into one lag
//! polynomial `δ(B) = (1 - B)^d (1 - B^s)^D`, so the same coefficients both
//! difference the history and integrate forecasts back.

use crate::utils::stats::variance;

/// Apply differencing to a time series.
///
/// # Arguments
/// * `series` - The input series
/// * `d` - Differencing order (number of times to difference)
///
/// # Returns
/// The differenced series.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    if d == 0 || series.is_empty() {
        return series.to_vec();
    }

    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            break;
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Apply seasonal differencing to a time series.
///
/// # Arguments
/// * `series` - The input series
/// * `d` - Seasonal differencing order
/// * `period` - Seasonal period
///
/// # Returns
/// The seasonally differenced series.
pub fn seasonal_difference(series: &[f64], d: usize, period: usize) -> Vec<f64> {
    if d == 0 || period == 0 || series.len() <= period {
        return series.to_vec();
    }

    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= period {
            break;
        }
        result = result
            .iter()
            .skip(period)
            .zip(result.iter())
            .map(|(curr, prev)| curr - prev)
            .collect();
    }
    result
}

/// Multiply two lag polynomials given as coefficient vectors (index = lag).
pub fn poly_mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return vec![];
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        if x == 0.0 {
            continue;
        }
        for (j, &y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// Coefficients of `(1 - B)^d (1 - B^period)^cap_d`.
///
/// The leading coefficient is always 1. A period of 0 disables the seasonal
/// factor.
pub fn differencing_polynomial(d: usize, cap_d: usize, period: usize) -> Vec<f64> {
    let mut poly = vec![1.0];
    for _ in 0..d {
        poly = poly_mul(&poly, &[1.0, -1.0]);
    }
    if period > 0 {
        let mut seasonal = vec![0.0; period + 1];
        seasonal[0] = 1.0;
        seasonal[period] = -1.0;
        for _ in 0..cap_d {
            poly = poly_mul(&poly, &seasonal);
        }
    }
    poly
}

/// Apply a differencing polynomial: `w_t = Σ δ_k y_{t+L-k}`.
///
/// The output is `L = poly.len() - 1` observations shorter than the input.
pub fn apply_polynomial(series: &[f64], poly: &[f64]) -> Vec<f64> {
    let lag = poly.len().saturating_sub(1);
    if series.len() <= lag {
        return vec![];
    }
    (lag..series.len())
        .map(|t| {
            poly.iter()
                .enumerate()
                .map(|(k, c)| c * series[t - k])
                .sum()
        })
        .collect()
}

/// Integrate forecasts made on the differenced scale back to levels.
///
/// # Arguments
/// * `forecast_diff` - Forecasts of the differenced series
/// * `history` - The original (undifferenced) observations
/// * `poly` - The differencing polynomial used in fitting
pub fn integrate_polynomial(forecast_diff: &[f64], history: &[f64], poly: &[f64]) -> Vec<f64> {
    let lag = poly.len().saturating_sub(1);
    if lag == 0 {
        return forecast_diff.to_vec();
    }

    let mut levels = history.to_vec();
    let mut out = Vec::with_capacity(forecast_diff.len());
    for &w in forecast_diff {
        let n = levels.len();
        let mut y = w;
        for k in 1..=lag.min(n) {
            y -= poly[k] * levels[n - k];
        }
        levels.push(y);
        out.push(y);
    }
    out
}

/// Check if a series needs differencing using a simple variance ratio test.
///
/// # Returns
/// Suggested differencing order (0, 1, or 2).
pub fn suggest_differencing(series: &[f64]) -> usize {
    if series.len() < 3 {
        return 0;
    }

    let var_0 = variance(series);
    let diff_1 = difference(series, 1);

    if diff_1.len() < 2 {
        return 0;
    }

    let var_1 = variance(&diff_1);

    // If variance decreases significantly after differencing, difference is needed
    if var_0 > 0.0 && var_1 / var_0 < 0.9 {
        let diff_2 = difference(&diff_1, 1);
        if diff_2.len() >= 2 {
            let var_2 = variance(&diff_2);
            if var_2 / var_1 < 0.9 && var_2 < var_0 {
                return 2;
            }
        }
        return 1;
    }

    0
}

/// Suggest a seasonal differencing order from the variance reduction of one
/// seasonal difference.
pub fn suggest_seasonal_differencing(values: &[f64], period: usize) -> usize {
    if period < 2 || values.len() < 2 * period {
        return 0;
    }

    let seasonal_diffs = seasonal_difference(values, 1, period);
    let orig_var = variance(values);
    let diff_var = variance(&seasonal_diffs);

    if diff_var < orig_var * 0.7 {
        1
    } else {
        0
    }
}
