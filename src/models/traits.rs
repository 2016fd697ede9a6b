//! Forecaster trait defining the common interface for all models.

use crate::core::{Forecast, TimeSeries};
use crate::error::Result;

/// Common interface for forecasting models.
///
/// This trait is object-safe and can be used with `Box<dyn Forecaster>`.
pub trait Forecaster {
    /// Fit the model to the time series data.
    fn fit(&mut self, series: &TimeSeries) -> Result<()>;

    /// Generate predictions for the specified horizon.
    fn predict(&self, horizon: usize) -> Result<Forecast>;

    /// Generate predictions with confidence intervals.
    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        // Default implementation just returns point predictions
        let _ = level;
        self.predict(horizon)
    }

    /// Get the fitted values (in-sample predictions).
    fn fitted_values(&self) -> Option<&[f64]>;

    /// Get the residuals (actual - fitted).
    fn residuals(&self) -> Option<&[f64]>;

    /// Get the model name.
    fn name(&self) -> &str;

    /// Check if the model has been fitted.
    fn is_fitted(&self) -> bool {
        self.fitted_values().is_some()
    }
}

/// Type alias for boxed forecaster trait objects.
pub type BoxedForecaster = Box<dyn Forecaster>;

/// Cooperative interruption check polled by long-running fits.
///
/// Fitting code calls [`Interrupt::is_interrupted`] at entry and between
/// optimizer iterations, and returns
/// [`ForecastError::Interrupted`](crate::error::ForecastError::Interrupted)
/// once it reports true.
pub trait Interrupt {
    /// Whether the caller has asked the current operation to stop.
    fn is_interrupted(&self) -> bool;
}

/// An [`Interrupt`] that never fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverInterrupt;

impl Interrupt for NeverInterrupt {
    fn is_interrupted(&self) -> bool {
        false
    }
}

impl<T: Interrupt + ?Sized> Interrupt for &T {
    fn is_interrupted(&self) -> bool {
        (**self).is_interrupted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sarimax::Sarimax;
    use chrono::{Months, TimeZone, Utc};
    use std::cell::Cell;

    fn make_test_series(n: usize) -> TimeSeries {
        let base = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let timestamps = (0..n)
            .map(|i| base.checked_add_months(Months::new(i as u32)).unwrap())
            .collect();
        let values: Vec<f64> = (0..n).map(|i| 10.0 + (i as f64 * 0.7).sin()).collect();
        TimeSeries::univariate(timestamps, values).unwrap()
    }

    struct CountdownInterrupt {
        remaining: Cell<usize>,
    }

    impl Interrupt for CountdownInterrupt {
        fn is_interrupted(&self) -> bool {
            let left = self.remaining.get();
            if left == 0 {
                return true;
            }
            self.remaining.set(left - 1);
            false
        }
    }

    #[test]
    fn boxed_forecaster_fit_predict() {
        let mut model: BoxedForecaster = Box::new(Sarimax::arima(1, 0, 0));
        assert!(!model.is_fitted());

        model.fit(&make_test_series(30)).unwrap();
        assert!(model.is_fitted());
        assert_eq!(model.name(), "SARIMAX");
        assert_eq!(model.predict(4).unwrap().horizon(), 4);
    }

    #[test]
    fn boxed_forecaster_with_intervals() {
        let mut model: BoxedForecaster = Box::new(Sarimax::arima(0, 1, 1));
        model.fit(&make_test_series(30)).unwrap();

        let forecast = model.predict_with_intervals(5, 0.95).unwrap();
        assert_eq!(forecast.horizon(), 5);
        assert!(forecast.has_lower());
        assert!(forecast.has_upper());
    }

    #[test]
    fn never_interrupt_is_quiet() {
        assert!(!NeverInterrupt.is_interrupted());
        let by_ref: &dyn Interrupt = &NeverInterrupt;
        assert!(!(&by_ref).is_interrupted());
    }

    #[test]
    fn countdown_interrupt_fires() {
        let interrupt = CountdownInterrupt {
            remaining: Cell::new(2),
        };
        assert!(!interrupt.is_interrupted());
        assert!(!interrupt.is_interrupted());
        assert!(interrupt.is_interrupted());
        assert!(interrupt.is_interrupted());
    }
}
