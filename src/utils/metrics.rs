//! Accuracy metrics for validation-window evaluation.
//!
//! The composite precision blends three 0-100 components with fixed weights
//! (0.4 MAPE, 0.4 R², 0.2 RMSE). Top-k ranking depends on these exact
//! weights.

use crate::error::{ForecastError, Result};

/// Guard added to denominators of MAPE and R².
pub const EPSILON: f64 = 1e-8;

/// Weight of the MAPE component in the composite precision.
pub const WEIGHT_MAPE: f64 = 0.4;
/// Weight of the R² component in the composite precision.
pub const WEIGHT_R2: f64 = 0.4;
/// Weight of the RMSE component in the composite precision.
pub const WEIGHT_RMSE: f64 = 0.2;

/// Accuracy metrics for a forecast against held-out actuals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccuracyMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error, in percent.
    pub mape: f64,
    /// R-squared (coefficient of determination)
    pub r_squared: f64,
    /// Mean of the actual values.
    pub mean_actual: f64,
}

/// Calculate accuracy metrics between actual and predicted values.
///
/// MAPE divides by `actual + EPSILON` and R² by `SS_tot + EPSILON`, so zero
/// actuals and constant windows never divide by zero.
pub fn calculate_metrics(actual: &[f64], predicted: &[f64]) -> Result<AccuracyMetrics> {
    if actual.is_empty() || predicted.is_empty() {
        return Err(ForecastError::EmptyData);
    }

    if actual.len() != predicted.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: actual.len(),
            got: predicted.len(),
        });
    }

    let n = actual.len() as f64;

    let mae: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / n;

    let ss_res: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    let mse = ss_res / n;
    let rmse = mse.sqrt();

    let mape = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| ((a - p) / (a + EPSILON)).abs())
        .sum::<f64>()
        / n
        * 100.0;

    let mean_actual = actual.iter().sum::<f64>() / n;
    let ss_tot: f64 = actual.iter().map(|a| (a - mean_actual).powi(2)).sum();
    let r_squared = 1.0 - ss_res / (ss_tot + EPSILON);

    Ok(AccuracyMetrics {
        mae,
        mse,
        rmse,
        mape,
        r_squared,
        mean_actual,
    })
}

/// The three 0-100 precision components and their weighted blend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrecisionBreakdown {
    /// `max(0, 100 - mape)`
    pub precision_mape: f64,
    /// `max(0, r2 * 100)`
    pub precision_r2: f64,
    /// `max(0, (1 - rmse / mean_actual) * 100)`
    pub precision_rmse: f64,
    /// Weighted blend clamped to `[0, 100]`.
    pub precision_final: f64,
}

impl PrecisionBreakdown {
    /// All components at zero.
    pub fn zero() -> Self {
        Self {
            precision_mape: 0.0,
            precision_r2: 0.0,
            precision_rmse: 0.0,
            precision_final: 0.0,
        }
    }

    /// Build from already-normalized components.
    pub fn from_components(precision_mape: f64, precision_r2: f64, precision_rmse: f64) -> Self {
        Self {
            precision_mape,
            precision_r2,
            precision_rmse,
            precision_final: composite_precision(precision_mape, precision_r2, precision_rmse),
        }
    }

    /// Derive the components from validation metrics.
    pub fn from_metrics(metrics: &AccuracyMetrics) -> Self {
        // f64::max drops a NaN operand, so degenerate ratios collapse to 0.
        let precision_mape = 0.0_f64.max(100.0 - metrics.mape);
        let precision_r2 = 0.0_f64.max(metrics.r_squared * 100.0);
        let precision_rmse = 0.0_f64.max((1.0 - metrics.rmse / metrics.mean_actual) * 100.0);
        Self::from_components(precision_mape, precision_r2, precision_rmse)
    }
}

/// Weighted composite precision, clamped to `[0, 100]`.
///
/// # Example
/// ```
/// use saidi_forecast::utils::metrics::composite_precision;
///
/// assert!((composite_precision(80.0, 90.0, 70.0) - 82.0).abs() < 1e-12);
/// ```
pub fn composite_precision(precision_mape: f64, precision_r2: f64, precision_rmse: f64) -> f64 {
    let blended =
        WEIGHT_MAPE * precision_mape + WEIGHT_R2 * precision_r2 + WEIGHT_RMSE * precision_rmse;
    if blended.is_nan() {
        return 0.0;
    }
    blended.clamp(0.0, 100.0)
}

/// Calculate RMSE between two slices.
pub fn rmse(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    let sq: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    (sq / actual.len() as f64).sqrt()
}
