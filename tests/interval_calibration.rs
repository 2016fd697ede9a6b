//! Interval calibration tests for SARIMAX prediction intervals.
//!
//! These tests check that prediction intervals reach roughly their stated
//! coverage using rolling origin evaluation.

use chrono::{Months, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use saidi_forecast::core::TimeSeries;
use saidi_forecast::models::{Forecaster, ModelSpec, Sarimax};

fn make_timestamps(n: usize) -> Vec<chrono::DateTime<Utc>> {
    let base = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
    (0..n)
        .map(|i| base.checked_add_months(Months::new(i as u32)).unwrap())
        .collect()
}

/// Proportion of actuals that fall within the intervals.
fn calculate_coverage(actuals: &[f64], lower: &[f64], upper: &[f64]) -> f64 {
    if actuals.is_empty() {
        return 0.0;
    }
    let inside = actuals
        .iter()
        .zip(lower.iter().zip(upper.iter()))
        .filter(|(&actual, (&lo, &up))| actual >= lo && actual <= up)
        .count();
    inside as f64 / actuals.len() as f64
}

/// Mean Winkler score; lower is better.
fn winkler_score(actuals: &[f64], lower: &[f64], upper: &[f64], alpha: f64) -> f64 {
    let total: f64 = actuals
        .iter()
        .zip(lower.iter().zip(upper.iter()))
        .map(|(&actual, (&lo, &up))| {
            let width = up - lo;
            if actual < lo {
                width + (2.0 / alpha) * (lo - actual)
            } else if actual > up {
                width + (2.0 / alpha) * (actual - up)
            } else {
                width
            }
        })
        .sum();
    total / actuals.len() as f64
}

/// Rolling origin evaluation returning (coverage, mean Winkler score).
fn rolling_interval_evaluation(
    spec: ModelSpec,
    series: &TimeSeries,
    horizon: usize,
    level: f64,
    n_origins: usize,
) -> (f64, f64) {
    let n = series.len();
    let min_train = n / 2;

    let mut all_actuals = Vec::new();
    let mut all_lower = Vec::new();
    let mut all_upper = Vec::new();

    for i in 0..n_origins {
        let train_end = min_train + i;
        if train_end + horizon > n {
            break;
        }
        let train = series.slice(0, train_end).unwrap();

        let mut model = Sarimax::new(spec);
        if model.fit(&train).is_err() {
            continue;
        }
        let forecast = model.predict_with_intervals(horizon, level).unwrap();
        let (Some(lower), Some(upper)) = (forecast.lower(), forecast.upper()) else {
            continue;
        };

        all_actuals.extend_from_slice(&series.primary_values()[train_end..train_end + horizon]);
        all_lower.extend_from_slice(lower);
        all_upper.extend_from_slice(upper);
    }

    assert!(!all_actuals.is_empty(), "no origin produced a forecast");
    let coverage = calculate_coverage(&all_actuals, &all_lower, &all_upper);
    let winkler = winkler_score(&all_actuals, &all_lower, &all_upper, 1.0 - level);
    (coverage, winkler)
}

fn random_walk(n: usize, seed: u64) -> TimeSeries {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut values = vec![100.0];
    for i in 1..n {
        values.push(values[i - 1] + rng.gen_range(-5.0..5.0));
    }
    TimeSeries::univariate(make_timestamps(n), values).unwrap()
}

fn ar1(n: usize, phi: f64, seed: u64) -> TimeSeries {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut values = vec![50.0];
    for i in 1..n {
        let deviation = values[i - 1] - 50.0;
        values.push(50.0 + phi * deviation + rng.gen_range(-3.0..3.0));
    }
    TimeSeries::univariate(make_timestamps(n), values).unwrap()
}

#[test]
fn coverage_random_walk_95() {
    let series = random_walk(200, 42);
    let (coverage, _) =
        rolling_interval_evaluation(ModelSpec::arima(0, 1, 0), &series, 5, 0.95, 20);
    assert!(
        coverage >= 0.80,
        "random walk 95% coverage too low: {coverage:.3}"
    );
}

#[test]
fn coverage_ar1_95() {
    let series = ar1(160, 0.6, 7);
    let (coverage, _) =
        rolling_interval_evaluation(ModelSpec::arima(1, 0, 0), &series, 3, 0.95, 20);
    assert!(coverage >= 0.80, "AR(1) 95% coverage too low: {coverage:.3}");
}

#[test]
fn wider_level_gives_higher_coverage() {
    let series = ar1(160, 0.5, 13);
    let spec = ModelSpec::arima(1, 0, 0);
    let (cov_80, winkler_80) = rolling_interval_evaluation(spec, &series, 3, 0.80, 20);
    let (cov_95, winkler_95) = rolling_interval_evaluation(spec, &series, 3, 0.95, 20);
    assert!(cov_95 >= cov_80);
    assert!(winkler_80.is_finite() && winkler_95.is_finite());
}

#[test]
fn seasonal_model_intervals_cover_repeating_pattern() {
    let mut rng = StdRng::seed_from_u64(3);
    let n = 96;
    let values: Vec<f64> = (0..n)
        .map(|i| {
            let season = 2.0 * std::f64::consts::PI * (i % 12) as f64 / 12.0;
            30.0 + 8.0 * season.sin() + rng.gen_range(-1.0..1.0)
        })
        .collect();
    let series = TimeSeries::univariate(make_timestamps(n), values).unwrap();
    let spec = ModelSpec::new((0, 0, 0), (0, 1, 0, 12));

    let (coverage, _) = rolling_interval_evaluation(spec, &series, 6, 0.95, 12);
    assert!(coverage >= 0.80, "seasonal 95% coverage too low: {coverage:.3}");
}
