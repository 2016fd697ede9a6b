//! Progress document, its sinks, and the reporter that publishes it.

use crate::error::SearchError;
use crate::models::ModelSpec;
use crate::search::cancel::CancellationController;
use crate::search::topk::RankedModel;
use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// Serde helpers that write non-finite floats as `null` and read `null`
/// back as `+∞`.
pub mod non_finite {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}

/// One entry of the published top-k list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopModelRecord {
    pub order: [usize; 3],
    pub seasonal_order: [usize; 4],
    #[serde(with = "non_finite")]
    pub precision_final: f64,
    #[serde(with = "non_finite")]
    pub rmse: f64,
    #[serde(with = "non_finite")]
    pub mape: f64,
    #[serde(with = "non_finite")]
    pub r2_score: f64,
    #[serde(with = "non_finite")]
    pub aic: f64,
}

impl TopModelRecord {
    /// The configuration this record describes.
    pub fn spec(&self) -> ModelSpec {
        ModelSpec::from_arrays(self.order, self.seasonal_order)
    }
}

impl From<&RankedModel> for TopModelRecord {
    fn from(model: &RankedModel) -> Self {
        Self {
            order: model.spec.order(),
            seasonal_order: model.spec.seasonal_order(),
            precision_final: model.scorecard.precision_final(),
            rmse: model.scorecard.rmse,
            mape: model.scorecard.mape,
            r2_score: model.scorecard.r2,
            aic: model.scorecard.aic,
        }
    }
}

/// The whole progress document, rewritten on every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressState {
    pub progress: f64,
    pub status: String,
    #[serde(default)]
    pub current_model: String,
    #[serde(default)]
    pub top_models: Vec<TopModelRecord>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub pid: u32,
    #[serde(default)]
    pub cancelled: bool,
}

impl ProgressState {
    pub fn new(progress: f64, status: impl Into<String>) -> Self {
        Self {
            progress,
            status: status.into(),
            current_model: String::new(),
            top_models: Vec::new(),
            timestamp: Utc::now(),
            pid: std::process::id(),
            cancelled: false,
        }
    }

    /// Whether the status marks a fatal error.
    pub fn is_error(&self) -> bool {
        self.status.starts_with("Error")
    }
}

/// Destination of progress documents.
pub trait ProgressSink: Send {
    fn write(&self, state: &ProgressState) -> Result<(), SearchError>;
}

impl<S: ProgressSink + ?Sized> ProgressSink for Box<S> {
    fn write(&self, state: &ProgressState) -> Result<(), SearchError> {
        (**self).write(state)
    }
}

/// Writes each document to a temporary file in the target directory and
/// renames it over the progress file.
#[derive(Debug, Clone)]
pub struct FileProgressSink {
    path: PathBuf,
}

impl FileProgressSink {
    /// Create the sink, creating the directory if needed and checking that
    /// it is writable.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, SearchError> {
        let path = path.into();
        let sink = Self { path };
        let dir = sink.dir();
        fs::create_dir_all(&dir)?;
        NamedTempFile::new_in(&dir)?;
        Ok(sink)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

/// Serialize `value` and atomically replace `path` with it.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), SearchError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut tmp, value)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

impl ProgressSink for FileProgressSink {
    fn write(&self, state: &ProgressState) -> Result<(), SearchError> {
        write_json_atomic(&self.path, state)
    }
}

/// Keeps every published document in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryProgressSink {
    states: Arc<Mutex<Vec<ProgressState>>>,
}

impl MemoryProgressSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All documents published so far, oldest first.
    pub fn states(&self) -> Vec<ProgressState> {
        self.states
            .lock()
            .map(|states| states.clone())
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<ProgressState> {
        self.states().pop()
    }
}

impl ProgressSink for MemoryProgressSink {
    fn write(&self, state: &ProgressState) -> Result<(), SearchError> {
        let mut states = self
            .states
            .lock()
            .map_err(|_| SearchError::Input("progress sink lock poisoned".to_string()))?;
        states.push(state.clone());
        Ok(())
    }
}

/// Discards every document; used when no progress file is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn write(&self, _state: &ProgressState) -> Result<(), SearchError> {
        Ok(())
    }
}

/// Publishes progress and reports cancellation on every call.
///
/// Percentages are clamped to `[0, 100]` and never decrease, except for the
/// explicit error write which resets to 0.
pub struct ProgressReporter {
    sink: Box<dyn ProgressSink>,
    cancel: CancellationController,
    last_progress: f64,
}

impl ProgressReporter {
    pub fn new(sink: impl ProgressSink + 'static, cancel: CancellationController) -> Self {
        Self {
            sink: Box::new(sink),
            cancel,
            last_progress: 0.0,
        }
    }

    /// Last published percentage.
    pub fn last_progress(&self) -> f64 {
        self.last_progress
    }

    pub fn cancellation(&self) -> &CancellationController {
        &self.cancel
    }

    /// Publish a progress tick. Returns false when cancellation has been
    /// requested.
    pub fn publish(
        &mut self,
        progress: f64,
        status: &str,
        current_model: &str,
        top_models: &[RankedModel],
    ) -> bool {
        let progress = if progress.is_nan() {
            self.last_progress
        } else {
            progress.clamp(0.0, 100.0).max(self.last_progress)
        };
        self.last_progress = progress;

        let mut state = ProgressState::new(progress, status);
        state.current_model = current_model.to_string();
        state.top_models = top_models.iter().map(TopModelRecord::from).collect();
        self.write(&state);

        !self.cancel.check()
    }

    /// Final write after cancellation: `cancelled = true` at the last
    /// published percentage.
    pub fn publish_cancelled(&mut self, top_models: &[RankedModel]) {
        let mut state = ProgressState::new(self.last_progress, "Cancelled by user");
        state.top_models = top_models.iter().map(TopModelRecord::from).collect();
        state.cancelled = true;
        self.write(&state);
    }

    /// Fatal error write: progress 0 and a status starting with `Error`.
    pub fn publish_error(&mut self, message: &str) {
        self.last_progress = 0.0;
        let state = ProgressState::new(0.0, format!("Error: {message}"));
        self.write(&state);
    }

    fn write(&self, state: &ProgressState) {
        if let Err(err) = self.sink.write(state) {
            warn!("progress write failed: {err}");
        }
    }
}
