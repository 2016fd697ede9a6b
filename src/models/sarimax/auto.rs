//! Automatic SARIMAX order selection.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::sarimax::diff::{suggest_differencing, suggest_seasonal_differencing};
use crate::models::sarimax::model::Sarimax;
use crate::models::sarimax::spec::ModelSpec;
use crate::models::traits::{Forecaster, Interrupt, NeverInterrupt};
use log::debug;

/// Configuration for [`AutoSarimax`].
#[derive(Debug, Clone)]
pub struct AutoSarimaxConfig {
    /// Maximum non-seasonal AR order to consider.
    pub max_p: usize,
    /// Maximum non-seasonal MA order to consider.
    pub max_q: usize,
    /// Maximum non-seasonal differencing order.
    pub max_d: usize,
    /// Maximum seasonal AR order.
    pub max_cap_p: usize,
    /// Maximum seasonal MA order.
    pub max_cap_q: usize,
    /// Maximum seasonal differencing order.
    pub max_cap_d: usize,
    /// Seasonal period (values below 2 disable the seasonal part).
    pub seasonal_period: usize,
    /// Use stepwise search (faster) vs exhaustive.
    pub stepwise: bool,
    /// Select by AIC (true) or BIC (false).
    pub use_aic: bool,
}

impl Default for AutoSarimaxConfig {
    fn default() -> Self {
        Self {
            max_p: 5,
            max_q: 5,
            max_d: 2,
            max_cap_p: 2,
            max_cap_q: 2,
            max_cap_d: 1,
            seasonal_period: 12,
            stepwise: true,
            use_aic: true,
        }
    }
}

impl AutoSarimaxConfig {
    /// Set maximum non-seasonal orders.
    pub fn with_max_orders(mut self, max_p: usize, max_d: usize, max_q: usize) -> Self {
        self.max_p = max_p;
        self.max_d = max_d;
        self.max_q = max_q;
        self
    }

    /// Set maximum seasonal orders.
    pub fn with_seasonal_orders(mut self, max_p: usize, max_d: usize, max_q: usize) -> Self {
        self.max_cap_p = max_p;
        self.max_cap_d = max_d;
        self.max_cap_q = max_q;
        self
    }

    /// Set seasonal period.
    pub fn with_seasonal_period(mut self, period: usize) -> Self {
        self.seasonal_period = period;
        self
    }

    /// Use exhaustive search instead of stepwise.
    pub fn exhaustive(mut self) -> Self {
        self.stepwise = false;
        self
    }

    /// Select by BIC instead of AIC.
    pub fn with_bic(mut self) -> Self {
        self.use_aic = false;
        self
    }
}

/// Automatic SARIMAX model selection.
///
/// Picks the differencing orders from variance-ratio heuristics, then fits
/// every candidate order and keeps the one with the lowest information
/// criterion. Candidates that fail to fit are skipped.
#[derive(Debug, Clone)]
pub struct AutoSarimax {
    config: AutoSarimaxConfig,
    selected_model: Option<Sarimax>,
    /// All fitted models and their scores, best first.
    model_scores: Vec<(ModelSpec, f64)>,
}

impl AutoSarimax {
    /// Create a new AutoSarimax with default configuration.
    pub fn new() -> Self {
        Self::with_config(AutoSarimaxConfig::default())
    }

    /// Create AutoSarimax with custom configuration.
    pub fn with_config(config: AutoSarimaxConfig) -> Self {
        Self {
            config,
            selected_model: None,
            model_scores: Vec::new(),
        }
    }

    /// Create AutoSarimax with a seasonal period.
    pub fn seasonal(period: usize) -> Self {
        Self::with_config(AutoSarimaxConfig::default().with_seasonal_period(period))
    }

    /// Get the selected order.
    pub fn selected_spec(&self) -> Option<ModelSpec> {
        self.selected_model.as_ref().map(Sarimax::spec)
    }

    /// Get the selected model.
    pub fn selected_model(&self) -> Option<&Sarimax> {
        self.selected_model.as_ref()
    }

    /// Take ownership of the selected model.
    pub fn into_model(self) -> Option<Sarimax> {
        self.selected_model
    }

    /// Get all model scores.
    pub fn model_scores(&self) -> &[(ModelSpec, f64)] {
        &self.model_scores
    }

    fn period(&self) -> usize {
        if self.config.seasonal_period > 1 {
            self.config.seasonal_period
        } else {
            1
        }
    }

    /// Generate candidate orders using stepwise search.
    fn stepwise_candidates(&self, d: usize, cap_d: usize) -> Vec<ModelSpec> {
        let s = self.period();

        let nonseasonal = [
            (0, 0),
            (1, 0),
            (0, 1),
            (1, 1),
            (2, 0),
            (0, 2),
            (2, 1),
            (1, 2),
            (2, 2),
        ];

        let mut candidates: Vec<ModelSpec> = nonseasonal
            .iter()
            .filter(|&&(p, q)| p <= self.config.max_p && q <= self.config.max_q)
            .map(|&(p, q)| ModelSpec::new((p, d, q), (0, cap_d, 0, s)))
            .collect();

        if s > 1 {
            let seasonal = [(0, 1), (1, 0), (1, 1), (2, 0), (0, 2)];
            let nonseasonal_with_seasonal = [(0, 0), (1, 0), (0, 1), (1, 1), (2, 0), (0, 2)];

            for &(p, q) in &nonseasonal_with_seasonal {
                for &(cap_p, cap_q) in &seasonal {
                    if p <= self.config.max_p
                        && q <= self.config.max_q
                        && cap_p <= self.config.max_cap_p
                        && cap_q <= self.config.max_cap_q
                    {
                        candidates.push(ModelSpec::new((p, d, q), (cap_p, cap_d, cap_q, s)));
                    }
                }
            }
        }

        candidates
    }

    /// Generate all candidate orders (exhaustive).
    fn exhaustive_candidates(&self, d: usize, cap_d: usize) -> Vec<ModelSpec> {
        let s = self.period();
        let (max_cap_p, max_cap_q) = if s > 1 {
            (self.config.max_cap_p, self.config.max_cap_q)
        } else {
            (0, 0)
        };

        let mut candidates = Vec::new();
        for p in 0..=self.config.max_p {
            for q in 0..=self.config.max_q {
                for cap_p in 0..=max_cap_p {
                    for cap_q in 0..=max_cap_q {
                        candidates.push(ModelSpec::new((p, d, q), (cap_p, cap_d, cap_q, s)));
                    }
                }
            }
        }
        candidates
    }

    fn criterion(&self, model: &Sarimax) -> Option<f64> {
        if self.config.use_aic {
            model.aic()
        } else {
            model.bic()
        }
    }

    /// Build the deduplicated candidate list for a series.
    fn candidates(&self, values: &[f64]) -> Vec<ModelSpec> {
        let s = self.period();
        let suggested_d = suggest_differencing(values).min(self.config.max_d);
        let suggested_cap_d = if s > 1 {
            suggest_seasonal_differencing(values, s).min(self.config.max_cap_d)
        } else {
            0
        };

        let mut d_range = vec![suggested_d];
        if suggested_d > 0 {
            d_range.push(suggested_d - 1);
        }
        if suggested_d < self.config.max_d {
            d_range.push(suggested_d + 1);
        }
        d_range.sort_unstable();
        d_range.dedup();

        let mut cap_d_range = vec![0, suggested_cap_d];
        cap_d_range.sort_unstable();
        cap_d_range.dedup();

        let mut candidates = Vec::new();
        for &d in &d_range {
            for &cap_d in &cap_d_range {
                if self.config.stepwise {
                    candidates.extend(self.stepwise_candidates(d, cap_d));
                } else {
                    candidates.extend(self.exhaustive_candidates(d, cap_d));
                }
            }
        }
        candidates.sort();
        candidates.dedup();
        candidates
    }

    /// Fit every candidate, polling `interrupt` before each one and inside
    /// each fit.
    pub fn fit_with(&mut self, series: &TimeSeries, interrupt: &dyn Interrupt) -> Result<()> {
        let values = series.primary_values();
        let s = self.period();

        let min_required = if s > 1 { 2 * s } else { 10 };
        if values.len() < min_required {
            return Err(ForecastError::InsufficientData {
                needed: min_required,
                got: values.len(),
            });
        }

        self.model_scores.clear();
        self.selected_model = None;
        let mut best_score = f64::INFINITY;

        for spec in self.candidates(values) {
            if interrupt.is_interrupted() {
                return Err(ForecastError::Interrupted);
            }
            if values.len() < spec.min_observations() {
                continue;
            }

            let mut model = Sarimax::new(spec);
            match model.fit_with(series, interrupt) {
                Ok(()) => {}
                Err(ForecastError::Interrupted) => return Err(ForecastError::Interrupted),
                Err(err) => {
                    debug!("auto search skipped {spec}: {err}");
                    continue;
                }
            }

            let Some(score) = self.criterion(&model).filter(|v| v.is_finite()) else {
                continue;
            };
            self.model_scores.push((spec, score));
            if score < best_score {
                best_score = score;
                self.selected_model = Some(model);
            }
        }

        self.model_scores
            .sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        if self.selected_model.is_none() {
            return Err(ForecastError::ComputationError(
                "no valid SARIMAX model could be fitted".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for AutoSarimax {
    fn default() -> Self {
        Self::new()
    }
}

impl Forecaster for AutoSarimax {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        self.fit_with(series, &NeverInterrupt)
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        self.selected_model
            .as_ref()
            .ok_or(ForecastError::FitRequired)?
            .predict(horizon)
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        self.selected_model
            .as_ref()
            .ok_or(ForecastError::FitRequired)?
            .predict_with_intervals(horizon, level)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.selected_model.as_ref()?.fitted_values()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.selected_model.as_ref()?.residuals()
    }

    fn name(&self) -> &str {
        "AutoSARIMAX"
    }
}
