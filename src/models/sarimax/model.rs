//! Seasonal ARIMA model with intercept, fitted by conditional sum of squares.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::sarimax::diff::{
    apply_polynomial, differencing_polynomial, integrate_polynomial, poly_mul,
};
use crate::models::sarimax::spec::ModelSpec;
use crate::models::traits::{Forecaster, Interrupt, NeverInterrupt};
use crate::utils::optimization::{nelder_mead_until, NelderMeadConfig};
use crate::utils::stats::quantile_normal;
use log::debug;

/// Coefficient bound used when stationarity or invertibility is enforced.
const COEFFICIENT_BOUND: f64 = 0.99;

/// SARIMAX(p, d, q)(P, D, Q)\[s\] forecasting model.
///
/// The differenced series `w_t = δ(B) y_t` follows
///
/// ```text
/// φ(B) Φ(B^s) (w_t - μ) = θ(B) Θ(B^s) e_t
/// ```
///
/// where `δ(B) = (1 - B)^d (1 - B^s)^D`. Coefficients are estimated by
/// minimizing the conditional sum of squares with Nelder-Mead. Seasonal and
/// non-seasonal polynomials are multiplied out, so the recursions below work
/// with plain lag-indexed coefficient vectors.
#[derive(Debug, Clone)]
pub struct Sarimax {
    spec: ModelSpec,
    enforce_stationarity: bool,
    enforce_invertibility: bool,
    /// Non-seasonal AR coefficients (φ).
    ar_coefficients: Vec<f64>,
    /// Seasonal AR coefficients (Φ).
    seasonal_ar_coefficients: Vec<f64>,
    /// Non-seasonal MA coefficients (θ).
    ma_coefficients: Vec<f64>,
    /// Seasonal MA coefficients (Θ).
    seasonal_ma_coefficients: Vec<f64>,
    /// Mean of the differenced series.
    intercept: f64,
    /// Expanded AR weights on lagged deviations, index = lag.
    ar_weights: Vec<f64>,
    /// Expanded MA weights on lagged innovations, index = lag.
    ma_weights: Vec<f64>,
    diff_poly: Vec<f64>,
    original: Option<Vec<f64>>,
    differenced: Option<Vec<f64>>,
    innovations: Option<Vec<f64>>,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
    residual_variance: Option<f64>,
    aic: Option<f64>,
    bic: Option<f64>,
    n: usize,
}

impl Sarimax {
    /// Create a new SARIMAX model. Enforcement of stationarity and
    /// invertibility is on by default.
    pub fn new(spec: ModelSpec) -> Self {
        Self {
            spec,
            enforce_stationarity: true,
            enforce_invertibility: true,
            ar_coefficients: vec![],
            seasonal_ar_coefficients: vec![],
            ma_coefficients: vec![],
            seasonal_ma_coefficients: vec![],
            intercept: 0.0,
            ar_weights: vec![0.0],
            ma_weights: vec![1.0],
            diff_poly: vec![1.0],
            original: None,
            differenced: None,
            innovations: None,
            fitted: None,
            residuals: None,
            residual_variance: None,
            aic: None,
            bic: None,
            n: 0,
        }
    }

    /// Create a non-seasonal ARIMA(p, d, q) model.
    pub fn arima(p: usize, d: usize, q: usize) -> Self {
        Self::new(ModelSpec::arima(p, d, q))
    }

    /// Bound AR coefficients to `(-0.99, 0.99)` during estimation.
    pub fn with_enforce_stationarity(mut self, enforce: bool) -> Self {
        self.enforce_stationarity = enforce;
        self
    }

    /// Bound MA coefficients to `(-0.99, 0.99)` during estimation.
    pub fn with_enforce_invertibility(mut self, enforce: bool) -> Self {
        self.enforce_invertibility = enforce;
        self
    }

    /// Get the model specification.
    pub fn spec(&self) -> ModelSpec {
        self.spec
    }

    /// Get non-seasonal AR coefficients.
    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coefficients
    }

    /// Get seasonal AR coefficients.
    pub fn seasonal_ar_coefficients(&self) -> &[f64] {
        &self.seasonal_ar_coefficients
    }

    /// Get non-seasonal MA coefficients.
    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma_coefficients
    }

    /// Get seasonal MA coefficients.
    pub fn seasonal_ma_coefficients(&self) -> &[f64] {
        &self.seasonal_ma_coefficients
    }

    /// Get the intercept.
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Innovation variance estimate.
    pub fn sigma2(&self) -> Option<f64> {
        self.residual_variance
    }

    /// Get AIC.
    pub fn aic(&self) -> Option<f64> {
        self.aic
    }

    /// Get BIC.
    pub fn bic(&self) -> Option<f64> {
        self.bic
    }

    /// Number of observations the model was fitted on.
    pub fn n_obs(&self) -> usize {
        self.n
    }

    /// Fit the model, polling `interrupt` at entry and between optimizer
    /// iterations.
    ///
    /// Returns [`ForecastError::Interrupted`] when the interrupt fires.
    pub fn fit_with(&mut self, series: &TimeSeries, interrupt: &dyn Interrupt) -> Result<()> {
        if interrupt.is_interrupted() {
            return Err(ForecastError::Interrupted);
        }
        if self.spec.s == 0 {
            return Err(ForecastError::InvalidParameter(
                "seasonal period must be at least 1".to_string(),
            ));
        }

        let values = series.primary_values();
        let min_len = self.spec.min_observations();
        if values.len() < min_len {
            return Err(ForecastError::InsufficientData {
                needed: min_len,
                got: values.len(),
            });
        }

        self.diff_poly = differencing_polynomial(self.spec.d, self.spec.cap_d, self.spec.s);
        let diff_series = apply_polynomial(values, &self.diff_poly);

        self.estimate_parameters(&diff_series, interrupt)?;
        self.calculate_fitted(values, &diff_series)?;

        self.n = values.len();
        self.original = Some(values.to_vec());
        self.differenced = Some(diff_series);

        debug!(
            "fitted SARIMAX {} on {} observations: sigma2={:?} aic={:?}",
            self.spec, self.n, self.residual_variance, self.aic
        );
        Ok(())
    }

    /// First differenced-scale index with every AR and MA lag available.
    fn start_index(&self) -> usize {
        self.spec.max_ar_lag().max(self.spec.max_ma_lag())
    }

    /// Multiply out `(1 - Σφ_i B^i)(1 - ΣΦ_j B^{js})` and return the weights
    /// `a_k` of `w_t - μ = Σ a_k (w_{t-k} - μ) + ...`.
    fn expand_ar(phi: &[f64], seasonal_phi: &[f64], s: usize) -> Vec<f64> {
        let mut non_seasonal = vec![1.0];
        non_seasonal.extend(phi.iter().map(|c| -c));

        let mut seasonal = vec![0.0; seasonal_phi.len() * s + 1];
        seasonal[0] = 1.0;
        for (j, c) in seasonal_phi.iter().enumerate() {
            seasonal[(j + 1) * s] -= c;
        }

        let mut weights: Vec<f64> = poly_mul(&non_seasonal, &seasonal)
            .into_iter()
            .map(|c| -c)
            .collect();
        weights[0] = 0.0;
        weights
    }

    /// Multiply out `(1 + Σθ_i B^i)(1 + ΣΘ_j B^{js})`.
    fn expand_ma(theta: &[f64], seasonal_theta: &[f64], s: usize) -> Vec<f64> {
        let mut non_seasonal = vec![1.0];
        non_seasonal.extend_from_slice(theta);

        let mut seasonal = vec![0.0; seasonal_theta.len() * s + 1];
        seasonal[0] = 1.0;
        for (j, c) in seasonal_theta.iter().enumerate() {
            seasonal[(j + 1) * s] += c;
        }

        poly_mul(&non_seasonal, &seasonal)
    }

    /// One-step prediction of `w[t]` given history and past innovations.
    fn one_step(w: &[f64], e: &[f64], t: usize, ar: &[f64], ma: &[f64], mu: f64) -> f64 {
        let mut pred = mu;
        for (k, a) in ar.iter().enumerate().skip(1) {
            if *a != 0.0 && t >= k {
                pred += a * (w[t - k] - mu);
            }
        }
        for (k, b) in ma.iter().enumerate().skip(1) {
            if *b != 0.0 && t >= k {
                pred += b * e[t - k];
            }
        }
        pred
    }

    /// Conditional sum of squares; innovations before `start` are zero.
    fn calculate_css(diff_series: &[f64], start: usize, ar: &[f64], ma: &[f64], mu: f64) -> f64 {
        let n = diff_series.len();
        if n <= start {
            return f64::MAX;
        }

        let mut innovations = vec![0.0; n];
        let mut css = 0.0;
        for t in start..n {
            let error = diff_series[t] - Self::one_step(diff_series, &innovations, t, ar, ma, mu);
            innovations[t] = error;
            css += error * error;
        }

        if css.is_finite() {
            css
        } else {
            f64::MAX
        }
    }

    /// Split a packed parameter vector `[μ, φ, Φ, θ, Θ]`.
    fn unpack<'a>(&self, params: &'a [f64]) -> (f64, &'a [f64], &'a [f64], &'a [f64], &'a [f64]) {
        let ModelSpec {
            p, q, cap_p, cap_q, ..
        } = self.spec;
        let (mu, rest) = (params[0], &params[1..]);
        let (phi, rest) = rest.split_at(p);
        let (seasonal_phi, rest) = rest.split_at(cap_p);
        let (theta, seasonal_theta) = rest.split_at(q);
        debug_assert_eq!(seasonal_theta.len(), cap_q);
        (mu, phi, seasonal_phi, theta, seasonal_theta)
    }

    /// Estimate parameters using conditional least squares.
    fn estimate_parameters(
        &mut self,
        diff_series: &[f64],
        interrupt: &dyn Interrupt,
    ) -> Result<()> {
        let ModelSpec {
            p, q, cap_p, cap_q, s, ..
        } = self.spec;
        let mean = diff_series.iter().sum::<f64>() / diff_series.len() as f64;

        if p + q + cap_p + cap_q == 0 {
            // Just the mean
            self.set_coefficients(&[mean]);
            return Ok(());
        }

        let n_params = self.spec.num_params();
        let mut initial = vec![0.0; n_params];
        initial[0] = mean;
        for i in 0..p {
            initial[1 + i] = 0.1 / (i + 1) as f64;
        }
        for j in 0..cap_p {
            initial[1 + p + j] = 0.1 / (j + 1) as f64;
        }
        for i in 0..q {
            initial[1 + p + cap_p + i] = 0.1 / (i + 1) as f64;
        }
        for j in 0..cap_q {
            initial[1 + p + cap_p + q + j] = 0.1 / (j + 1) as f64;
        }

        let unbounded = (f64::NEG_INFINITY, f64::INFINITY);
        let ar_bound = if self.enforce_stationarity {
            (-COEFFICIENT_BOUND, COEFFICIENT_BOUND)
        } else {
            unbounded
        };
        let ma_bound = if self.enforce_invertibility {
            (-COEFFICIENT_BOUND, COEFFICIENT_BOUND)
        } else {
            unbounded
        };
        let mut bounds = vec![unbounded];
        bounds.extend(std::iter::repeat(ar_bound).take(p + cap_p));
        bounds.extend(std::iter::repeat(ma_bound).take(q + cap_q));

        let config = NelderMeadConfig {
            max_iter: 1000,
            tolerance: 1e-8,
            ..Default::default()
        };

        let start = self.start_index();
        let result = nelder_mead_until(
            |params| {
                let (mu, phi, seasonal_phi, theta, seasonal_theta) = self.unpack(params);
                let ar = Self::expand_ar(phi, seasonal_phi, s);
                let ma = Self::expand_ma(theta, seasonal_theta, s);
                Self::calculate_css(diff_series, start, &ar, &ma, mu)
            },
            &initial,
            Some(&bounds),
            config,
            || interrupt.is_interrupted(),
        );

        if result.interrupted {
            return Err(ForecastError::Interrupted);
        }
        if result.optimal_point.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::ComputationError(
                "optimizer produced non-finite coefficients".to_string(),
            ));
        }

        self.set_coefficients(&result.optimal_point);
        Ok(())
    }

    fn set_coefficients(&mut self, params: &[f64]) {
        let s = self.spec.s;
        let (mu, phi, seasonal_phi, theta, seasonal_theta) = self.unpack(params);
        self.intercept = mu;
        self.ar_coefficients = phi.to_vec();
        self.seasonal_ar_coefficients = seasonal_phi.to_vec();
        self.ma_coefficients = theta.to_vec();
        self.seasonal_ma_coefficients = seasonal_theta.to_vec();
        self.ar_weights = Self::expand_ar(phi, seasonal_phi, s);
        self.ma_weights = Self::expand_ma(theta, seasonal_theta, s);
    }

    /// Calculate innovations, fitted values, and information criteria.
    fn calculate_fitted(&mut self, values: &[f64], diff_series: &[f64]) -> Result<()> {
        let n = diff_series.len();
        let start = self.start_index();
        let offset = self.spec.differencing_loss();

        let mut innovations = vec![0.0; n];
        let mut fitted = vec![f64::NAN; values.len()];
        let mut residuals = vec![f64::NAN; values.len()];

        for t in start..n {
            let pred = Self::one_step(
                diff_series,
                &innovations,
                t,
                &self.ar_weights,
                &self.ma_weights,
                self.intercept,
            );
            let error = diff_series[t] - pred;
            innovations[t] = error;
            fitted[t + offset] = values[t + offset] - error;
            residuals[t + offset] = error;
        }

        let valid = &innovations[start..];
        if valid.is_empty() {
            return Err(ForecastError::InsufficientData {
                needed: self.spec.min_observations(),
                got: values.len(),
            });
        }

        let variance = valid.iter().map(|r| r * r).sum::<f64>() / valid.len() as f64;
        if !variance.is_finite() {
            return Err(ForecastError::ComputationError(
                "residual variance is not finite".to_string(),
            ));
        }
        self.residual_variance = Some(variance);

        // Calculate information criteria
        let n_eff = valid.len() as f64;
        let k = self.spec.num_params() as f64;
        let ll = -0.5
            * n_eff
            * (1.0 + variance.max(f64::MIN_POSITIVE).ln() + (2.0 * std::f64::consts::PI).ln());
        self.aic = Some(-2.0 * ll + 2.0 * k);
        self.bic = Some(-2.0 * ll + k * n_eff.ln());

        self.innovations = Some(innovations);
        self.fitted = Some(fitted);
        self.residuals = Some(residuals);
        Ok(())
    }

    /// MA(∞) weights of the integrated process, `ψ_0 = 1`.
    fn psi_weights(&self, horizon: usize) -> Vec<f64> {
        // Full AR side on the level scale: φ(B)Φ(B^s)δ(B)
        let mut ar_poly: Vec<f64> = self.ar_weights.iter().map(|a| -a).collect();
        ar_poly[0] = 1.0;
        let full_ar = poly_mul(&ar_poly, &self.diff_poly);

        let mut psi = vec![0.0; horizon];
        for j in 0..horizon {
            let mut value = if j == 0 {
                1.0
            } else {
                self.ma_weights.get(j).copied().unwrap_or(0.0)
            };
            for k in 1..=j.min(full_ar.len() - 1) {
                value -= full_ar[k] * psi[j - k];
            }
            psi[j] = value;
        }
        psi
    }
}

impl Forecaster for Sarimax {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        self.fit_with(series, &NeverInterrupt)
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let original = self.original.as_ref().ok_or(ForecastError::FitRequired)?;
        let diff_series = self
            .differenced
            .as_ref()
            .ok_or(ForecastError::FitRequired)?;
        let innovations = self
            .innovations
            .as_ref()
            .ok_or(ForecastError::FitRequired)?;

        if horizon == 0 {
            return Ok(Forecast::new());
        }

        // Forecast on differenced scale
        let mut extended_diff = diff_series.clone();
        let mut extended_innovations = innovations.clone();
        for _ in 0..horizon {
            let t = extended_diff.len();
            let pred = Self::one_step(
                &extended_diff,
                &extended_innovations,
                t,
                &self.ar_weights,
                &self.ma_weights,
                self.intercept,
            );
            extended_diff.push(pred);
            extended_innovations.push(0.0); // Future innovations are 0
        }

        let forecast_diff = &extended_diff[diff_series.len()..];
        let predictions = integrate_polynomial(forecast_diff, original, &self.diff_poly);

        Ok(Forecast::from_values(predictions))
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        if !(0.0..1.0).contains(&level) || level == 0.0 {
            return Err(ForecastError::InvalidParameter(format!(
                "confidence level must be in (0, 1), got {level}"
            )));
        }

        let forecast = self.predict(horizon)?;
        if horizon == 0 {
            return Ok(forecast);
        }

        let variance = self.residual_variance.unwrap_or(0.0);
        let z = quantile_normal((1.0 + level) / 2.0);
        let psi = self.psi_weights(horizon);
        let preds = forecast.primary();

        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);
        let mut cumulative = 0.0;
        for h in 0..horizon {
            cumulative += psi[h] * psi[h];
            let se = (variance * cumulative).sqrt();
            lower.push(preds[h] - z * se);
            upper.push(preds[h] + z * se);
        }

        Ok(Forecast::from_values_with_intervals(
            preds.to_vec(),
            lower,
            upper,
        ))
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        "SARIMAX"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Months, TimeZone, Utc};
    use std::cell::Cell;

    fn make_series(values: Vec<f64>) -> TimeSeries {
        let base = Utc.with_ymd_and_hms(2018, 1, 1, 0, 0, 0).unwrap();
        let timestamps = (0..values.len())
            .map(|i| base.checked_add_months(Months::new(i as u32)).unwrap())
            .collect();
        TimeSeries::univariate(timestamps, values).unwrap()
    }

    fn seasonal_values(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let season = 2.0 * std::f64::consts::PI * (i % 12) as f64 / 12.0;
                30.0 + 0.2 * i as f64 + 8.0 * season.sin() + ((i * 7) % 5) as f64 * 0.3
            })
            .collect()
    }

    struct AfterN(Cell<usize>);

    impl Interrupt for AfterN {
        fn is_interrupted(&self) -> bool {
            let left = self.0.get();
            if left == 0 {
                true
            } else {
                self.0.set(left - 1);
                false
            }
        }
    }

    #[test]
    fn expand_ar_multiplies_polynomials() {
        // (1 - 0.5B)(1 - 0.3B^4) = 1 - 0.5B - 0.3B^4 + 0.15B^5
        let weights = Sarimax::expand_ar(&[0.5], &[0.3], 4);
        assert_eq!(weights.len(), 6);
        assert_relative_eq!(weights[1], 0.5);
        assert_relative_eq!(weights[4], 0.3);
        assert_relative_eq!(weights[5], -0.15);
    }

    #[test]
    fn expand_ma_multiplies_polynomials() {
        // (1 + 0.4B)(1 + 0.2B^3) = 1 + 0.4B + 0.2B^3 + 0.08B^4
        let weights = Sarimax::expand_ma(&[0.4], &[0.2], 3);
        assert_eq!(weights, vec![1.0, 0.4, 0.0, 0.2, 0.4 * 0.2]);
    }

    #[test]
    fn sarimax_basic_fit() {
        let ts = make_series(seasonal_values(48));
        let mut model = Sarimax::new(ModelSpec::new((1, 1, 1), (1, 0, 0, 12)));
        model.fit(&ts).unwrap();

        assert_eq!(model.ar_coefficients().len(), 1);
        assert_eq!(model.ma_coefficients().len(), 1);
        assert_eq!(model.seasonal_ar_coefficients().len(), 1);
        assert!(model.seasonal_ma_coefficients().is_empty());
        assert!(model.aic().unwrap().is_finite());
        assert!(model.bic().unwrap() > model.aic().unwrap());

        let forecast = model.predict(6).unwrap();
        assert_eq!(forecast.horizon(), 6);
        assert!(forecast.is_finite());
    }

    #[test]
    fn sarimax_ar1_recovers_coefficient() {
        let mut values = vec![10.0];
        for i in 1..120 {
            values.push(0.7 * values[i - 1] + (i as f64 * 0.9).sin());
        }
        let mut model = Sarimax::arima(1, 0, 0);
        model.fit(&make_series(values)).unwrap();

        assert!(model.ar_coefficients()[0] > 0.3);
    }

    #[test]
    fn sarimax_enforcement_bounds_coefficients() {
        let mut values = vec![1.0];
        for i in 1..60 {
            values.push(1.02 * values[i - 1] + 0.1 * (i as f64).cos());
        }
        let ts = make_series(values);

        let mut bounded = Sarimax::arima(1, 0, 0);
        bounded.fit(&ts).unwrap();
        assert!(bounded.ar_coefficients()[0].abs() <= COEFFICIENT_BOUND);

        let mut free = Sarimax::arima(1, 0, 0)
            .with_enforce_stationarity(false)
            .with_enforce_invertibility(false);
        free.fit(&ts).unwrap();
        assert!(free.ar_coefficients()[0].is_finite());
    }

    #[test]
    fn sarimax_mean_only() {
        let values: Vec<f64> = (0..20).map(|i| 5.0 + (i % 2) as f64).collect();
        let mut model = Sarimax::arima(0, 0, 0);
        model.fit(&make_series(values)).unwrap();

        assert_relative_eq!(model.intercept(), 5.5, epsilon = 1e-12);
        let forecast = model.predict(3).unwrap();
        for v in forecast.primary() {
            assert_relative_eq!(*v, 5.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn sarimax_seasonal_difference_continues_pattern() {
        // Pure seasonal pattern: a seasonal difference leaves a constant 0.
        let pattern = [3.0, 5.0, 9.0, 4.0];
        let values: Vec<f64> = (0..24).map(|i| pattern[i % 4]).collect();
        let mut model = Sarimax::new(ModelSpec::new((0, 0, 0), (0, 1, 0, 4)));
        model.fit(&make_series(values)).unwrap();

        let forecast = model.predict(8).unwrap();
        for (h, v) in forecast.primary().iter().enumerate() {
            assert_relative_eq!(*v, pattern[(24 + h) % 4], epsilon = 1e-9);
        }
    }

    #[test]
    fn sarimax_fitted_values_align_with_original_index() {
        let values = seasonal_values(40);
        let ts = make_series(values.clone());
        let spec = ModelSpec::new((1, 1, 0), (0, 0, 0, 12));
        let mut model = Sarimax::new(spec);
        model.fit(&ts).unwrap();

        let fitted = model.fitted_values().unwrap();
        let residuals = model.residuals().unwrap();
        assert_eq!(fitted.len(), 40);

        let first = spec.differencing_loss() + spec.max_ar_lag();
        assert!(fitted[first - 1].is_nan());
        for t in first..40 {
            assert_relative_eq!(fitted[t] + residuals[t], values[t], epsilon = 1e-9);
        }
    }

    #[test]
    fn sarimax_intervals_widen() {
        let ts = make_series(seasonal_values(48));
        let mut model = Sarimax::new(ModelSpec::new((1, 1, 0), (0, 0, 0, 12)));
        model.fit(&ts).unwrap();

        let forecast = model.predict_with_intervals(6, 0.95).unwrap();
        let lower = forecast.lower().unwrap();
        let upper = forecast.upper().unwrap();
        let width: Vec<f64> = upper.iter().zip(lower).map(|(u, l)| u - l).collect();

        for (i, p) in forecast.primary().iter().enumerate() {
            assert!(lower[i] <= *p && *p <= upper[i]);
        }
        for w in width.windows(2) {
            assert!(w[1] >= w[0] - 1e-12);
        }
    }

    #[test]
    fn psi_weights_random_walk() {
        let values: Vec<f64> = (0..30).map(|i| i as f64 + (i as f64).sin()).collect();
        let mut model = Sarimax::arima(0, 1, 0);
        model.fit(&make_series(values)).unwrap();

        // (1 - B) y = e  =>  ψ_j = 1 for every j
        for psi in model.psi_weights(5) {
            assert_relative_eq!(psi, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn sarimax_insufficient_data() {
        let ts = make_series(seasonal_values(20));
        let mut model = Sarimax::new(ModelSpec::new((1, 1, 1), (1, 1, 1, 12)));
        assert!(matches!(
            model.fit(&ts),
            Err(ForecastError::InsufficientData { .. })
        ));
        assert!(!model.is_fitted());
    }

    #[test]
    fn sarimax_rejects_zero_period() {
        let ts = make_series(seasonal_values(30));
        let mut model = Sarimax::new(ModelSpec::new((1, 0, 0), (0, 0, 0, 0)));
        assert!(matches!(
            model.fit(&ts),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn sarimax_predict_requires_fit() {
        let model = Sarimax::arima(1, 0, 0);
        assert!(matches!(model.predict(3), Err(ForecastError::FitRequired)));
    }

    #[test]
    fn sarimax_interrupt_at_entry() {
        let ts = make_series(seasonal_values(40));
        let mut model = Sarimax::arima(1, 0, 1);
        let result = model.fit_with(&ts, &AfterN(Cell::new(0)));
        assert!(matches!(result, Err(ForecastError::Interrupted)));
        assert!(!model.is_fitted());
    }

    #[test]
    fn sarimax_interrupt_during_optimization() {
        let ts = make_series(seasonal_values(40));
        let mut model = Sarimax::arima(2, 0, 2);
        // Passes the entry check, then stops after a few optimizer iterations.
        let result = model.fit_with(&ts, &AfterN(Cell::new(5)));
        assert!(matches!(result, Err(ForecastError::Interrupted)));
    }
}
