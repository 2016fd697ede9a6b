//! Hyperparameter search over SARIMAX configurations.
//!
//! This module provides:
//! - [`MetricsEvaluator`] scoring one configuration on a validation window
//! - [`TopKTracker`] keeping the best-ranked configurations
//! - [`CancellationController`] fed by a sentinel file and OS signals
//! - [`ProgressReporter`] publishing progress documents
//! - [`SearchOrchestrator`] driving the grid and choosing the final model
//! - [`FileBridge`] handing the ranking to the preset selector
//! - [`ProgressMonitor`] reading progress from another process

mod bridge;
mod cancel;
mod config;
mod evaluator;
mod monitor;
mod orchestrator;
mod progress;
mod topk;

pub use bridge::{
    format_model_info, presets_from, validate_model_parameters, BridgeDocument, FileBridge,
    OrderPreset, PresetBridge, PresetKind, DEFAULT_BRIDGE_PATH,
};
pub use cancel::{
    cancel_path_for, CancelRecord, CancelState, CancellationController, CancellationSource,
    FileCancellation,
};
pub use config::{GridIter, ParameterGrid, SearchConfig, DEFAULT_FALLBACK_PERIOD};
pub use evaluator::{
    validation_window, FitError, MetricsEvaluator, Scorecard, COMPLEXITY_PENALTY,
};
pub use monitor::{ObservedStatus, ProgressMonitor};
pub use orchestrator::{
    EvaluationRecord, PrecisionGrade, SearchBests, SearchOrchestrator, SearchOutcome,
    PROGRESS_DONE, PROGRESS_FALLBACK, PROGRESS_FINAL_MODEL, PROGRESS_GRID_DONE,
    PROGRESS_GRID_START,
};
pub use progress::{
    FileProgressSink, MemoryProgressSink, NullProgressSink, ProgressReporter, ProgressSink,
    ProgressState, TopModelRecord,
};
pub use topk::{rank_order, RankedModel, TopKTracker, DEFAULT_TOP_K};
