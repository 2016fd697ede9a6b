//! Train/validation evaluation of a single SARIMAX configuration.

use crate::core::TimeSeries;
use crate::error::ForecastError;
use crate::models::{Forecaster, Interrupt, ModelSpec, Sarimax};
use crate::utils::metrics::{calculate_metrics, PrecisionBreakdown};
use log::debug;
use thiserror::Error;

/// Weight of the complexity penalty in the composite score.
pub const COMPLEXITY_PENALTY: f64 = 0.1;

/// Minimum validation window length.
pub const MIN_VALIDATION_WINDOW: usize = 6;

/// Parameter count reported by a sentinel scorecard.
pub const SENTINEL_PARAMS: usize = 999;

/// Multi-metric result of evaluating one configuration on a validation window.
#[derive(Debug, Clone, PartialEq)]
pub struct Scorecard {
    pub rmse: f64,
    pub mae: f64,
    /// Mean absolute percentage error, in percent.
    pub mape: f64,
    pub r2: f64,
    pub aic: f64,
    pub bic: f64,
    pub precision: PrecisionBreakdown,
    /// `rmse + 0.1 * complexity`; lower is better.
    pub composite_score: f64,
    /// Sum of the six orders, or [`SENTINEL_PARAMS`] for a failed fit.
    pub n_params: usize,
    /// Validation window length, 0 for a failed fit.
    pub n_test: usize,
}

impl Scorecard {
    /// The scorecard recorded for a configuration that failed to fit or
    /// forecast.
    pub fn sentinel() -> Self {
        Self {
            rmse: f64::INFINITY,
            mae: f64::INFINITY,
            mape: 100.0,
            r2: -1.0,
            aic: f64::INFINITY,
            bic: f64::INFINITY,
            precision: PrecisionBreakdown::zero(),
            composite_score: f64::INFINITY,
            n_params: SENTINEL_PARAMS,
            n_test: 0,
        }
    }

    /// Composite precision in `[0, 100]`.
    pub fn precision_final(&self) -> f64 {
        self.precision.precision_final
    }

    /// Whether the configuration produced a usable fit.
    pub fn is_usable(&self) -> bool {
        self.composite_score.is_finite()
    }
}

/// Why an evaluation produced no scorecard of its own.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    /// Fitting or forecasting failed; the caller records a sentinel.
    #[error("model failed: {0}")]
    Model(ForecastError),

    /// Cancellation was requested before or during the fit.
    #[error("evaluation interrupted")]
    Interrupted,
}

impl From<ForecastError> for FitError {
    fn from(err: ForecastError) -> Self {
        match err {
            ForecastError::Interrupted => FitError::Interrupted,
            other => FitError::Model(other),
        }
    }
}

/// Length of the trailing validation window for a series of `n` points.
///
/// 30% when `n >= 60`, 25% when `n >= 36`, 20% otherwise, never below 6.
///
/// ```
/// use saidi_forecast::search::validation_window;
///
/// assert_eq!(validation_window(80), 24);
/// assert_eq!(validation_window(40), 10);
/// assert_eq!(validation_window(20), 6);
/// ```
pub fn validation_window(n: usize) -> usize {
    let fraction = if n >= 60 {
        0.30
    } else if n >= 36 {
        0.25
    } else {
        0.20
    };
    MIN_VALIDATION_WINDOW.max((n as f64 * fraction).floor() as usize)
}

/// Fits a configuration on the training slice and scores its forecast of the
/// validation slice.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsEvaluator;

impl MetricsEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate `spec`, returning the raw outcome.
    pub fn try_evaluate(
        &self,
        series: &TimeSeries,
        spec: ModelSpec,
        interrupt: &dyn Interrupt,
    ) -> Result<Scorecard, FitError> {
        if interrupt.is_interrupted() {
            return Err(FitError::Interrupted);
        }

        let n_test = validation_window(series.len());
        let (train, test) = series.split_tail(n_test)?;

        let mut model = Sarimax::new(spec)
            .with_enforce_stationarity(false)
            .with_enforce_invertibility(false);
        model.fit_with(&train, interrupt)?;

        let forecast = model.predict(n_test)?;
        if !forecast.is_finite() {
            return Err(FitError::Model(ForecastError::ComputationError(
                "forecast contains non-finite values".to_string(),
            )));
        }

        let metrics = calculate_metrics(test.primary_values(), forecast.primary())?;
        let precision = PrecisionBreakdown::from_metrics(&metrics);
        let complexity = spec.complexity();

        Ok(Scorecard {
            rmse: metrics.rmse,
            mae: metrics.mae,
            mape: metrics.mape,
            r2: metrics.r_squared,
            aic: model.aic().unwrap_or(f64::INFINITY),
            bic: model.bic().unwrap_or(f64::INFINITY),
            precision,
            composite_score: metrics.rmse + COMPLEXITY_PENALTY * complexity as f64,
            n_params: complexity,
            n_test,
        })
    }

    /// Evaluate `spec`, replacing any model failure with
    /// [`Scorecard::sentinel`].
    ///
    /// The only error returned is [`FitError::Interrupted`].
    pub fn evaluate(
        &self,
        series: &TimeSeries,
        spec: ModelSpec,
        interrupt: &dyn Interrupt,
    ) -> Result<Scorecard, FitError> {
        match self.try_evaluate(series, spec, interrupt) {
            Ok(card) => Ok(card),
            Err(FitError::Interrupted) => Err(FitError::Interrupted),
            Err(FitError::Model(err)) => {
                debug!("{spec} failed: {err}");
                Ok(Scorecard::sentinel())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NeverInterrupt;
    use approx::assert_relative_eq;
    use chrono::{Months, TimeZone, Utc};

    fn make_series(values: Vec<f64>) -> TimeSeries {
        let base = Utc.with_ymd_and_hms(2017, 1, 1, 0, 0, 0).unwrap();
        let timestamps = (0..values.len())
            .map(|i| base.checked_add_months(Months::new(i as u32)).unwrap())
            .collect();
        TimeSeries::univariate(timestamps, values).unwrap()
    }

    fn saidi_like(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let season = 2.0 * std::f64::consts::PI * (i % 12) as f64 / 12.0;
                12.0 + 3.0 * season.sin() + ((i * 3) % 4) as f64 * 0.2
            })
            .collect()
    }

    struct Cancelled;

    impl Interrupt for Cancelled {
        fn is_interrupted(&self) -> bool {
            true
        }
    }

    #[test]
    fn validation_window_fractions() {
        assert_eq!(validation_window(80), 24);
        assert_eq!(validation_window(60), 18);
        assert_eq!(validation_window(59), 14);
        assert_eq!(validation_window(40), 10);
        assert_eq!(validation_window(36), 9);
        assert_eq!(validation_window(35), 7);
        assert_eq!(validation_window(20), 6);
        assert_eq!(validation_window(5), 6);
    }

    #[test]
    fn sentinel_values() {
        let card = Scorecard::sentinel();
        assert!(card.rmse.is_infinite());
        assert!(card.mae.is_infinite());
        assert!(card.aic.is_infinite());
        assert!(card.bic.is_infinite());
        assert_eq!(card.mape, 100.0);
        assert_eq!(card.r2, -1.0);
        assert_eq!(card.precision_final(), 0.0);
        assert!(card.composite_score.is_infinite());
        assert_eq!(card.n_params, SENTINEL_PARAMS);
        assert!(!card.is_usable());
    }

    #[test]
    fn evaluate_scores_a_reasonable_model() {
        let series = make_series(saidi_like(48));
        let spec = ModelSpec::new((1, 0, 0), (1, 0, 0, 12));
        let card = MetricsEvaluator::new()
            .evaluate(&series, spec, &NeverInterrupt)
            .unwrap();

        assert!(card.is_usable());
        assert_eq!(card.n_test, 12);
        assert_eq!(card.n_params, 2);
        assert!(card.rmse.is_finite());
        assert!((0.0..=100.0).contains(&card.precision_final()));
        assert_relative_eq!(
            card.composite_score,
            card.rmse + 0.1 * 2.0,
            epsilon = 1e-12
        );
        assert!(card.aic.is_finite());
    }

    #[test]
    fn evaluate_failure_becomes_sentinel() {
        // Seasonal differencing at s=12 needs far more than 16 training points.
        let series = make_series(saidi_like(20));
        let spec = ModelSpec::new((2, 1, 2), (2, 1, 2, 12));
        let evaluator = MetricsEvaluator::new();

        assert!(matches!(
            evaluator.try_evaluate(&series, spec, &NeverInterrupt),
            Err(FitError::Model(ForecastError::InsufficientData { .. }))
        ));

        let card = evaluator.evaluate(&series, spec, &NeverInterrupt).unwrap();
        assert_eq!(card, Scorecard::sentinel());
    }

    #[test]
    fn evaluate_too_short_for_window() {
        let series = make_series(saidi_like(6));
        let card = MetricsEvaluator::new()
            .evaluate(&series, ModelSpec::arima(0, 0, 0), &NeverInterrupt)
            .unwrap();
        assert!(card.rmse.is_infinite());
        assert_eq!(card.precision_final(), 0.0);
    }

    #[test]
    fn evaluate_interrupted_is_distinguished() {
        let series = make_series(saidi_like(48));
        let result =
            MetricsEvaluator::new().evaluate(&series, ModelSpec::arima(1, 0, 1), &Cancelled);
        assert_eq!(result, Err(FitError::Interrupted));
    }

    #[test]
    fn fit_error_from_forecast_error() {
        assert_eq!(
            FitError::from(ForecastError::Interrupted),
            FitError::Interrupted
        );
        assert!(matches!(
            FitError::from(ForecastError::EmptyData),
            FitError::Model(ForecastError::EmptyData)
        ));
    }
}
