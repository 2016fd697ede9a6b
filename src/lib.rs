//! # saidi-forecast
//!
//! SARIMAX hyperparameter search for monthly SAIDI (System Average
//! Interruption Duration Index) series.
//!
//! The search walks a grid of `(p, d, q)(P, D, Q, s)` configurations, scores
//! each one on a held-out window with a composite precision metric, keeps the
//! best three, and reports progress through a JSON document that another
//! process can watch and cancel through a sentinel file.
//!
//! ```no_run
//! use saidi_forecast::prelude::*;
//!
//! let cancel = CancellationController::new();
//! let sink = FileProgressSink::create("temp/progress.json")?;
//! let reporter = ProgressReporter::new(sink, cancel);
//! let report = AnalysisPipeline::new(SearchConfig::default())
//!     .run("saidi.csv", reporter)?;
//! for month in report.predictions() {
//!     println!("{} {:.2}", month.timestamp.format("%Y-%m"), month.value);
//! }
//! # Ok::<(), saidi_forecast::error::SearchError>(())
//! ```

#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]

pub mod core;
pub mod data;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod search;
pub mod utils;

pub use error::{ForecastError, Result, SearchError};

pub mod prelude {
    pub use crate::core::{Forecast, TimeSeries};
    pub use crate::data::{load_csv, SaidiData};
    pub use crate::error::{ForecastError, Result, SearchError};
    pub use crate::models::{AutoSarimax, Forecaster, ModelSpec, Sarimax};
    pub use crate::pipeline::{
        AnalysisPipeline, AnalysisReport, FixedOrderReport, MonthlyPrediction,
    };
    pub use crate::search::{
        CancellationController, FileBridge, FileCancellation, FileProgressSink,
        MetricsEvaluator, ParameterGrid, ProgressReporter, Scorecard, SearchConfig,
        SearchOrchestrator, TopKTracker,
    };
    pub use crate::utils::{calculate_metrics, quantile_normal, AccuracyMetrics};
}
