//! End-to-end analysis: load the SAIDI file, pick a configuration, and
//! predict the missing months.
//!
//! [`AnalysisPipeline::run`] searches the grid for the configuration;
//! [`AnalysisPipeline::run_with_spec`] scores and uses one chosen up front.

use crate::core::TimeSeries;
use crate::data::{self, SaidiData};
use crate::error::{ForecastError, SearchError};
use crate::models::{Forecaster, ModelSpec, Sarimax};
use crate::search::{
    validate_model_parameters, FitError, MetricsEvaluator, PrecisionGrade, PresetBridge,
    ProgressReporter, RankedModel, Scorecard, SearchConfig, SearchOrchestrator, SearchOutcome,
    PROGRESS_DONE, PROGRESS_FINAL_MODEL, PROGRESS_GRID_DONE, PROGRESS_GRID_START,
};
use chrono::{DateTime, Months, Utc};
use log::{info, warn};
use std::path::Path;

/// Progress published while the file is read.
pub const PROGRESS_LOADING: f64 = 5.0;
/// Progress published once the file is read.
pub const PROGRESS_LOADED: f64 = 10.0;
/// Smallest history the search accepts.
pub const MIN_HISTORY: usize = 12;
/// Coverage of the prediction intervals reported for each month.
pub const PREDICTION_LEVEL: f64 = 0.95;
/// Months forecast past the history by a fixed-order analysis of a file
/// with nothing missing.
pub const EXTENSION_HORIZON: usize = 6;

/// Forecast for one missing month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyPrediction {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Result of [`AnalysisPipeline::run`].
#[derive(Debug, Clone)]
pub enum AnalysisReport {
    /// The file had no missing months, so no search ran.
    NothingToPredict { observations: usize },
    /// Search finished and the missing months were predicted.
    Forecast {
        outcome: Box<SearchOutcome>,
        predictions: Vec<MonthlyPrediction>,
    },
}

impl AnalysisReport {
    pub fn predictions(&self) -> &[MonthlyPrediction] {
        match self {
            AnalysisReport::NothingToPredict { .. } => &[],
            AnalysisReport::Forecast { predictions, .. } => predictions.as_slice(),
        }
    }

    pub fn outcome(&self) -> Option<&SearchOutcome> {
        match self {
            AnalysisReport::NothingToPredict { .. } => None,
            AnalysisReport::Forecast { outcome, .. } => Some(outcome.as_ref()),
        }
    }
}

/// Result of [`AnalysisPipeline::run_with_spec`].
#[derive(Debug, Clone)]
pub struct FixedOrderReport {
    pub spec: ModelSpec,
    /// Validation scores, or `None` when the configuration could not be
    /// scored on the validation window.
    pub scorecard: Option<Scorecard>,
    /// The configuration fitted on the complete history.
    pub model: Sarimax,
    pub predictions: Vec<MonthlyPrediction>,
    /// True when the file had no missing months and the predictions extend
    /// past the history instead.
    pub extended: bool,
}

impl FixedOrderReport {
    pub fn precision(&self) -> f64 {
        self.scorecard.as_ref().map_or(0.0, Scorecard::precision_final)
    }

    pub fn grade(&self) -> Option<PrecisionGrade> {
        self.scorecard
            .as_ref()
            .map(|card| PrecisionGrade::from_precision(card.precision_final()))
    }
}

/// Loads the history, runs the parameter search and forecasts the months
/// with missing values.
///
/// Input errors and search failures are published as an `Error:` progress
/// document before being returned. A cancelled search has already published
/// its cancelled document.
pub struct AnalysisPipeline {
    config: SearchConfig,
    bridge: Option<Box<dyn PresetBridge>>,
}

impl AnalysisPipeline {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            bridge: None,
        }
    }

    pub fn with_bridge(mut self, bridge: impl PresetBridge + 'static) -> Self {
        self.bridge = Some(Box::new(bridge));
        self
    }

    /// Run the analysis on the CSV file at `path`.
    pub fn run(
        self,
        path: impl AsRef<Path>,
        mut reporter: ProgressReporter,
    ) -> Result<AnalysisReport, SearchError> {
        let cancel = reporter.cancellation().clone();
        // Sentinels left behind by an earlier run must not stop this one.
        cancel.clear_sources();

        if let Err(err) = self.config.validate() {
            return Err(failed(&mut reporter, err));
        }
        if !reporter.publish(PROGRESS_LOADING, "Loading historical data", "", &[]) {
            return Err(cancelled(&mut reporter));
        }
        let data = match load(path.as_ref()) {
            Ok(data) => data,
            Err(err) => return Err(failed(&mut reporter, err)),
        };

        if !data.has_missing() {
            info!("no missing months, nothing to predict");
            reporter.publish(
                PROGRESS_DONE,
                "No missing values to predict",
                &format!("{} observations, all months present", data.history.len()),
                &[],
            );
            cancel.clear_sources();
            return Ok(AnalysisReport::NothingToPredict {
                observations: data.history.len(),
            });
        }

        if !reporter.publish(
            PROGRESS_LOADED,
            &format!(
                "Data loaded: {} observations, {} months to predict",
                data.history.len(),
                data.missing.len()
            ),
            "",
            &[],
        ) {
            return Err(cancelled(&mut reporter));
        }

        let mut orchestrator = SearchOrchestrator::new(self.config, reporter);
        if let Some(bridge) = self.bridge {
            orchestrator = orchestrator.with_bridge(bridge);
        }

        let outcome = match orchestrator.search(&data.history) {
            Ok(outcome) => outcome,
            Err(err) if err.is_cancelled() => return Err(err),
            Err(err) => return Err(failed(orchestrator.reporter_mut(), err)),
        };

        let predictions = match predict_missing(&outcome.model, &data) {
            Ok(predictions) => predictions,
            Err(err) => return Err(failed(orchestrator.reporter_mut(), err)),
        };
        log_predictions(&predictions);

        let precision = outcome
            .top_models
            .first()
            .map_or(0.0, |m| m.scorecard.precision_final());
        orchestrator.complete(
            &format!(
                "Completed: {} predictions generated, best precision {:.1}%",
                predictions.len(),
                precision
            ),
            &format!("Model: {}", outcome.spec),
        );

        Ok(AnalysisReport::Forecast {
            outcome: Box::new(outcome),
            predictions,
        })
    }

    /// Score `spec` on the validation window, refit it on the complete
    /// history and predict the missing months.
    ///
    /// A configuration that cannot be scored is still fitted; one that
    /// cannot be fitted on the full history is an error. When nothing is
    /// missing the next [`EXTENSION_HORIZON`] months are predicted.
    pub fn run_with_spec(
        path: impl AsRef<Path>,
        spec: ModelSpec,
        mut reporter: ProgressReporter,
    ) -> Result<FixedOrderReport, SearchError> {
        let cancel = reporter.cancellation().clone();
        cancel.clear_sources();

        if !validate_model_parameters(&spec) {
            let err = SearchError::InvalidConfig(format!(
                "{spec} is outside the accepted order ranges"
            ));
            return Err(failed(&mut reporter, err));
        }
        if !reporter.publish(PROGRESS_LOADING, "Loading historical data", "", &[]) {
            return Err(cancelled(&mut reporter));
        }
        let mut data = match data::load_csv(path.as_ref()).and_then(check_history) {
            Ok(data) => data,
            Err(err) => return Err(failed(&mut reporter, err)),
        };
        let extended = !data.has_missing();
        if extended {
            data.missing = months_after(&data.history, EXTENSION_HORIZON);
            info!(
                "no missing months, predicting the {} months after the history",
                data.missing.len()
            );
        }

        let model_name = spec.to_string();
        if !reporter.publish(
            PROGRESS_LOADED,
            &format!(
                "Data loaded: {} observations, {} months to predict",
                data.history.len(),
                data.missing.len()
            ),
            &model_name,
            &[],
        ) {
            return Err(cancelled(&mut reporter));
        }
        if !reporter.publish(PROGRESS_GRID_START, "Validating model", &model_name, &[]) {
            return Err(cancelled(&mut reporter));
        }

        let scorecard = match MetricsEvaluator::new().try_evaluate(&data.history, spec, &cancel) {
            Ok(card) => {
                log_scorecard(spec, &card);
                Some(card)
            }
            Err(FitError::Interrupted) => return Err(cancelled(&mut reporter)),
            Err(FitError::Model(err)) => {
                warn!("validation metrics for {spec} could not be computed: {err}");
                None
            }
        };
        let ranked: Vec<RankedModel> = scorecard
            .iter()
            .map(|card| RankedModel::new(spec, card.clone()))
            .collect();

        if !reporter.publish(
            PROGRESS_GRID_DONE,
            "Validation complete, fitting on full history",
            &model_name,
            &ranked,
        ) {
            return Err(cancelled(&mut reporter));
        }
        let mut model = Sarimax::new(spec)
            .with_enforce_stationarity(false)
            .with_enforce_invertibility(false);
        match model.fit_with(&data.history, &cancel) {
            Ok(()) => {}
            Err(ForecastError::Interrupted) => return Err(cancelled(&mut reporter)),
            Err(err) => return Err(failed(&mut reporter, err.into())),
        }

        if !reporter.publish(
            PROGRESS_FINAL_MODEL,
            "Model fitted, generating predictions",
            &model_name,
            &ranked,
        ) {
            return Err(cancelled(&mut reporter));
        }
        let predictions = match predict_missing(&model, &data) {
            Ok(predictions) => predictions,
            Err(err) => return Err(failed(&mut reporter, err)),
        };
        log_predictions(&predictions);

        let report = FixedOrderReport {
            spec,
            scorecard,
            model,
            predictions,
            extended,
        };
        reporter.publish(
            PROGRESS_DONE,
            &format!(
                "Completed: {} predictions generated, precision {:.1}%",
                report.predictions.len(),
                report.precision()
            ),
            &format!("Model: {spec}"),
            &ranked,
        );
        cancel.clear_sources();
        Ok(report)
    }
}

fn load(path: &Path) -> Result<SaidiData, SearchError> {
    let data = data::load_csv(path)?;
    if data.has_missing() {
        check_history(data)
    } else {
        Ok(data)
    }
}

fn check_history(data: SaidiData) -> Result<SaidiData, SearchError> {
    if data.history.len() < MIN_HISTORY {
        return Err(SearchError::Input(format!(
            "need at least {MIN_HISTORY} observations, found {}",
            data.history.len()
        )));
    }
    Ok(data)
}

/// The `horizon` months following the last observation.
fn months_after(history: &TimeSeries, horizon: usize) -> Vec<DateTime<Utc>> {
    let Some(end) = history.end() else {
        return Vec::new();
    };
    (1..=horizon as u32)
        .filter_map(|i| end.checked_add_months(Months::new(i)))
        .collect()
}

fn log_scorecard(spec: ModelSpec, card: &Scorecard) {
    let grade = PrecisionGrade::from_precision(card.precision_final());
    info!(
        "{spec}: rmse={:.4} mae={:.4} mape={:.1}% r2={:.3} aic={:.2} bic={:.2} n_test={}",
        card.rmse, card.mae, card.mape, card.r2, card.aic, card.bic, card.n_test
    );
    info!(
        "precision {:.1}% - {grade}: {}",
        card.precision_final(),
        grade.description()
    );
}

fn log_predictions(predictions: &[MonthlyPrediction]) {
    for p in predictions {
        info!(
            "{}: {:.2} [{:.2}, {:.2}]",
            p.timestamp.format("%Y-%m"),
            p.value,
            p.lower,
            p.upper
        );
    }
}

/// Forecast one step per missing month and assign them in date order.
pub fn predict_missing(
    model: &Sarimax,
    data: &SaidiData,
) -> Result<Vec<MonthlyPrediction>, SearchError> {
    let horizon = data.missing.len();
    if let (Some(first), Some(end)) = (data.missing.first(), data.history.end()) {
        if *first < end {
            warn!("missing month {} precedes the end of the history", first.format("%Y-%m"));
        }
    }

    let forecast = model.predict_with_intervals(horizon, PREDICTION_LEVEL)?;
    let values = forecast.primary();
    let lower = forecast.lower().unwrap_or(values);
    let upper = forecast.upper().unwrap_or(values);

    Ok(data
        .missing
        .iter()
        .enumerate()
        .map(|(i, &timestamp)| MonthlyPrediction {
            timestamp,
            value: values[i],
            lower: lower[i],
            upper: upper[i],
        })
        .collect())
}

fn cancelled(reporter: &mut ProgressReporter) -> SearchError {
    reporter.publish_cancelled(&[]);
    reporter.cancellation().honor();
    SearchError::Cancelled
}

fn failed(reporter: &mut ProgressReporter, err: SearchError) -> SearchError {
    warn!("analysis failed: {err}");
    reporter.publish_error(&err.to_string());
    err
}
