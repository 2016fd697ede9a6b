//! Exhaustive grid search over SARIMAX configurations.

use crate::core::TimeSeries;
use crate::error::{ForecastError, SearchError};
use crate::models::{AutoSarimax, ModelSpec, Sarimax};
use crate::search::bridge::PresetBridge;
use crate::search::cancel::CancellationController;
use crate::search::config::SearchConfig;
use crate::search::evaluator::{FitError, MetricsEvaluator, Scorecard};
use crate::search::progress::{ProgressReporter, TopModelRecord};
use crate::search::topk::{RankedModel, TopKTracker};
use log::{debug, info, warn};
use std::fmt;

/// Progress published when grid evaluation starts.
pub const PROGRESS_GRID_START: f64 = 15.0;
/// Progress published when grid evaluation ends. Per-evaluation ticks
/// never go past it.
pub const PROGRESS_GRID_DONE: f64 = 90.0;
/// Progress published before the fallback automatic search.
pub const PROGRESS_FALLBACK: f64 = 95.0;
/// Progress published once the final model is chosen.
pub const PROGRESS_FINAL_MODEL: f64 = 98.0;
/// Progress of a finished analysis, published once by [`SearchOrchestrator::complete`].
pub const PROGRESS_DONE: f64 = 100.0;

/// Qualitative reading of a composite precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PrecisionGrade {
    Low,
    Fair,
    Acceptable,
    Good,
    Excellent,
}

impl PrecisionGrade {
    pub fn from_precision(precision: f64) -> Self {
        if precision >= 90.0 {
            PrecisionGrade::Excellent
        } else if precision >= 80.0 {
            PrecisionGrade::Good
        } else if precision >= 70.0 {
            PrecisionGrade::Acceptable
        } else if precision >= 60.0 {
            PrecisionGrade::Fair
        } else {
            PrecisionGrade::Low
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PrecisionGrade::Excellent => "very reliable predictions",
            PrecisionGrade::Good => "reliable predictions",
            PrecisionGrade::Acceptable => "moderately reliable predictions",
            PrecisionGrade::Fair => "use with caution",
            PrecisionGrade::Low => "unreliable model",
        }
    }
}

impl fmt::Display for PrecisionGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrecisionGrade::Excellent => "EXCELLENT",
            PrecisionGrade::Good => "GOOD",
            PrecisionGrade::Acceptable => "ACCEPTABLE",
            PrecisionGrade::Fair => "FAIR",
            PrecisionGrade::Low => "LOW",
        };
        f.write_str(name)
    }
}

/// One line of the evaluation log.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationRecord {
    /// 1-based position in the enumeration.
    pub iteration: usize,
    pub spec: ModelSpec,
    pub scorecard: Scorecard,
}

/// Best configuration per criterion; the first one seen wins ties.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchBests {
    pub rmse: Option<(ModelSpec, f64)>,
    pub composite: Option<(ModelSpec, f64)>,
    pub precision: Option<(ModelSpec, f64)>,
}

impl SearchBests {
    /// Update with a new scorecard. Sentinel values never become a best.
    pub fn update(&mut self, spec: ModelSpec, card: &Scorecard) {
        if card.rmse < self.rmse.map_or(f64::INFINITY, |(_, v)| v) {
            self.rmse = Some((spec, card.rmse));
            debug!("new best RMSE {:.4} for {}", card.rmse, spec);
        }
        if card.composite_score < self.composite.map_or(f64::INFINITY, |(_, v)| v) {
            self.composite = Some((spec, card.composite_score));
            debug!("new best composite score {:.4} for {}", card.composite_score, spec);
        }
        let precision = card.precision_final();
        if precision > self.precision.map_or(0.0, |(_, v)| v) {
            self.precision = Some((spec, precision));
            debug!("new best precision {:.1}% for {}", precision, spec);
        }
    }
}

/// Result of a completed search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Configuration of the final model.
    pub spec: ModelSpec,
    /// Final model fitted on the complete history.
    pub model: Sarimax,
    /// Final ranking, best first.
    pub top_models: Vec<RankedModel>,
    /// Every evaluation in enumeration order.
    pub evaluations: Vec<EvaluationRecord>,
    pub bests: SearchBests,
    /// Whether the final model came from the fallback automatic search.
    pub used_fallback: bool,
    pub total_combinations: usize,
}

impl SearchOutcome {
    /// Grade of the top-ranked model.
    pub fn grade(&self) -> Option<PrecisionGrade> {
        self.top_models
            .first()
            .map(|m| PrecisionGrade::from_precision(m.scorecard.precision_final()))
    }
}

/// Drives the grid: check cancellation, evaluate, rank, publish, repeat.
///
/// Owns the ranking and counters of one search. Cancellation is observed
/// through the reporter's [`CancellationController`], which is also passed
/// into every fit.
pub struct SearchOrchestrator {
    config: SearchConfig,
    evaluator: MetricsEvaluator,
    reporter: ProgressReporter,
    bridge: Option<Box<dyn PresetBridge>>,
    topk: TopKTracker,
    evaluations: Vec<EvaluationRecord>,
    bests: SearchBests,
}

impl SearchOrchestrator {
    pub fn new(config: SearchConfig, reporter: ProgressReporter) -> Self {
        let topk = TopKTracker::with_capacity(config.top_k);
        Self {
            config,
            evaluator: MetricsEvaluator::new(),
            reporter,
            bridge: None,
            topk,
            evaluations: Vec::new(),
            bests: SearchBests::default(),
        }
    }

    /// Hand the final ranking to `bridge` on completion.
    pub fn with_bridge(mut self, bridge: impl PresetBridge + 'static) -> Self {
        self.bridge = Some(Box::new(bridge));
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn reporter_mut(&mut self) -> &mut ProgressReporter {
        &mut self.reporter
    }

    pub fn cancellation(&self) -> CancellationController {
        self.reporter.cancellation().clone()
    }

    /// Current ranking.
    pub fn top_models(&self) -> &[RankedModel] {
        self.topk.entries()
    }

    /// Evaluations recorded so far.
    pub fn evaluations(&self) -> &[EvaluationRecord] {
        &self.evaluations
    }

    /// Run the whole search on `series`.
    ///
    /// The last document published is the 98% checkpoint; the caller
    /// publishes 100% through [`complete`](Self::complete) once the final
    /// model has been used.
    ///
    /// Returns [`SearchError::Cancelled`] after a honored cancellation and
    /// [`SearchError::NoModel`] when neither the grid nor the fallback
    /// produced a model.
    pub fn search(&mut self, series: &TimeSeries) -> Result<SearchOutcome, SearchError> {
        self.config.validate()?;
        self.topk = TopKTracker::with_capacity(self.config.top_k);
        self.evaluations.clear();
        self.bests = SearchBests::default();

        let cancel = self.cancellation();
        let total = self.config.grid.total_combinations();
        info!("evaluating {total} combinations on {} observations", series.len());

        if !self.reporter.publish(
            PROGRESS_GRID_START,
            &format!("Starting evaluation of {total} combinations"),
            "Preparing exhaustive search",
            &[],
        ) {
            return Err(self.honor_cancel());
        }

        let grid = self.config.grid.clone();
        for (index, spec) in grid.iter().enumerate() {
            if cancel.check() {
                return Err(self.honor_cancel());
            }

            let card = match self.evaluator.evaluate(series, spec, &cancel) {
                Ok(card) => card,
                Err(FitError::Interrupted) => return Err(self.honor_cancel()),
                Err(FitError::Model(_)) => Scorecard::sentinel(),
            };

            let iteration = index + 1;
            let percentage = iteration as f64 / total as f64 * 100.0;
            info!(
                "[{percentage:5.1}%] model {iteration}/{total}: {spec} rmse={:.4} precision={:.1}% mape={:.1}% r2={:.3}",
                card.rmse,
                card.precision_final(),
                card.mape,
                card.r2
            );
            self.record(iteration, spec, card);

            if !self.reporter.publish(
                percentage.min(PROGRESS_GRID_DONE),
                &format!("Evaluating model {iteration} of {total} ({percentage:.1}%)"),
                &spec.to_string(),
                self.topk.entries(),
            ) {
                return Err(self.honor_cancel());
            }
        }

        if !self.reporter.publish(
            PROGRESS_GRID_DONE,
            "Search complete, preparing final results",
            "Summarizing results",
            self.topk.entries(),
        ) {
            return Err(self.honor_cancel());
        }
        self.log_summary();

        let (model, used_fallback) = match self.refit_best(series, &cancel) {
            Ok(Some(model)) => (model, false),
            Ok(None) => (self.fallback(series, &cancel)?, true),
            Err(_) => return Err(self.honor_cancel()),
        };
        let spec = model.spec();
        info!("final model: {spec} (fallback: {used_fallback})");

        if !self.reporter.publish(
            PROGRESS_FINAL_MODEL,
            "Final model selected, generating predictions",
            &format!("Model: {spec}"),
            self.topk.entries(),
        ) {
            return Err(self.honor_cancel());
        }

        self.handoff();

        Ok(SearchOutcome {
            spec,
            model,
            top_models: self.topk.snapshot(),
            evaluations: self.evaluations.clone(),
            bests: self.bests.clone(),
            used_fallback,
            total_combinations: total,
        })
    }

    /// Publish the single 100% document with the final ranking and remove
    /// the cancellation sentinels.
    pub fn complete(&mut self, status: &str, current_model: &str) {
        self.reporter.publish(PROGRESS_DONE, status, current_model, self.topk.entries());
        self.cancellation().clear_sources();
    }

    fn record(&mut self, iteration: usize, spec: ModelSpec, card: Scorecard) {
        self.bests.update(spec, &card);
        self.topk.offer(spec, card.clone());
        self.evaluations.push(EvaluationRecord {
            iteration,
            spec,
            scorecard: card,
        });
    }

    /// Refit usable configurations on the full history, best composite
    /// score first, until one succeeds. The only error is
    /// [`ForecastError::Interrupted`].
    fn refit_best(
        &self,
        series: &TimeSeries,
        cancel: &CancellationController,
    ) -> Result<Option<Sarimax>, ForecastError> {
        let mut candidates: Vec<&EvaluationRecord> = self
            .evaluations
            .iter()
            .filter(|record| record.scorecard.is_usable())
            .collect();
        candidates.sort_by(|a, b| {
            a.scorecard
                .composite_score
                .total_cmp(&b.scorecard.composite_score)
        });

        for record in candidates {
            let mut model = Sarimax::new(record.spec)
                .with_enforce_stationarity(false)
                .with_enforce_invertibility(false);
            match model.fit_with(series, cancel) {
                Ok(()) => return Ok(Some(model)),
                Err(ForecastError::Interrupted) => return Err(ForecastError::Interrupted),
                Err(err) => warn!("refit of {} on full history failed: {err}", record.spec),
            }
        }
        Ok(None)
    }

    /// Stepwise automatic search with a fixed seasonal period.
    fn fallback(
        &mut self,
        series: &TimeSeries,
        cancel: &CancellationController,
    ) -> Result<Sarimax, SearchError> {
        warn!("no grid combination could be refit, using automatic order selection");
        if !self.reporter.publish(
            PROGRESS_FALLBACK,
            "Using automatic order selection as fallback",
            "Building final model",
            self.topk.entries(),
        ) {
            return Err(self.honor_cancel());
        }

        let mut auto = AutoSarimax::with_config(self.config.fallback_config());
        let spec = match auto.fit_with(series, cancel) {
            Ok(()) => auto.selected_spec().ok_or(SearchError::NoModel)?,
            Err(ForecastError::Interrupted) => return Err(self.honor_cancel()),
            Err(err) => {
                warn!("automatic order selection failed: {err}");
                return Err(SearchError::NoModel);
            }
        };

        let mut model = Sarimax::new(spec)
            .with_enforce_stationarity(false)
            .with_enforce_invertibility(false);
        match model.fit_with(series, cancel) {
            Ok(()) => Ok(model),
            Err(ForecastError::Interrupted) => Err(self.honor_cancel()),
            Err(err) => {
                warn!("refit of fallback model {spec} failed: {err}");
                // The selection fit used enforced bounds; keep it.
                auto.into_model().ok_or(SearchError::NoModel)
            }
        }
    }

    fn handoff(&self) {
        let Some(bridge) = &self.bridge else {
            return;
        };
        let records: Vec<TopModelRecord> =
            self.topk.entries().iter().map(TopModelRecord::from).collect();
        if let Err(err) = bridge.save_top_models(&records) {
            warn!("preset bridge handoff failed: {err}");
        }
    }

    /// Final cancelled write, sentinel cleanup, and the error to return.
    fn honor_cancel(&mut self) -> SearchError {
        let cancel = self.cancellation();
        let entries = self.topk.snapshot();
        self.reporter.publish_cancelled(&entries);
        cancel.honor();
        info!(
            "search cancelled after {} evaluations",
            self.evaluations.len()
        );
        SearchError::Cancelled
    }

    fn log_summary(&self) {
        info!("final summary: top {} models", self.topk.len());
        for (rank, model) in self.topk.entries().iter().enumerate() {
            let card = &model.scorecard;
            info!(
                "#{} {} precision={:.1}% rmse={:.4} mape={:.1}% r2={:.3} aic={:.1}",
                rank + 1,
                model.spec,
                card.precision_final(),
                card.rmse,
                card.mape,
                card.r2,
                card.aic
            );
        }
        if let Some(best) = self.topk.best() {
            let precision = best.scorecard.precision_final();
            let grade = PrecisionGrade::from_precision(precision);
            info!(
                "best model precision {precision:.1}% - {grade}: {}",
                grade.description()
            );
        }
    }
}
