//! Tolerant reader for the progress file.

use crate::error::SearchError;
use crate::search::cancel::FileCancellation;
use crate::search::progress::{ProgressState, TopModelRecord};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

/// What an observer can tell about a search from its progress file.
#[derive(Debug, Clone, PartialEq)]
pub enum ObservedStatus {
    /// No progress document yet.
    NotStarted,
    /// Search in progress.
    Running { progress: f64, status: String },
    /// Finished with a non-empty ranking.
    Completed { top_models: Vec<TopModelRecord> },
    /// Finished without any ranked model.
    CompletedEmpty { status: String },
    /// Stopped at the user's request.
    Cancelled,
    /// Stopped by a fatal error.
    Errored { message: String },
}

impl ObservedStatus {
    /// Classify a progress document.
    pub fn classify(state: &ProgressState) -> Self {
        if state.cancelled {
            ObservedStatus::Cancelled
        } else if state.is_error() {
            ObservedStatus::Errored {
                message: state.status.clone(),
            }
        } else if state.progress >= 100.0 {
            if state.top_models.is_empty() {
                ObservedStatus::CompletedEmpty {
                    status: state.status.clone(),
                }
            } else {
                ObservedStatus::Completed {
                    top_models: state.top_models.clone(),
                }
            }
        } else {
            ObservedStatus::Running {
                progress: state.progress,
                status: state.status.clone(),
            }
        }
    }

    /// Whether the search has stopped for any reason.
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            ObservedStatus::NotStarted | ObservedStatus::Running { .. }
        )
    }
}

/// Reads a progress file written by another process.
///
/// The writer replaces the file atomically, but readers may still race with
/// a missing file or a platform without atomic rename, so reads are retried.
#[derive(Debug, Clone)]
pub struct ProgressMonitor {
    path: PathBuf,
    retries: usize,
    retry_delay: Duration,
}

impl ProgressMonitor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            retries: 3,
            retry_delay: Duration::from_millis(50),
        }
    }

    /// Set the number of extra attempts after a failed read.
    pub fn with_retries(mut self, retries: usize, delay: Duration) -> Self {
        self.retries = retries;
        self.retry_delay = delay;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the progress document, retrying transient failures.
    pub fn read(&self) -> Result<ProgressState, SearchError> {
        let mut attempt = 0;
        loop {
            let result = fs::read_to_string(&self.path)
                .map_err(SearchError::from)
                .and_then(|text| serde_json::from_str(&text).map_err(SearchError::from));
            match result {
                Ok(state) => return Ok(state),
                Err(err) if attempt < self.retries => {
                    debug!("progress read attempt {} failed: {}", attempt + 1, err);
                    attempt += 1;
                    thread::sleep(self.retry_delay);
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Read and classify; a missing file means the search has not started.
    pub fn observe(&self) -> Result<ObservedStatus, SearchError> {
        if !self.path.exists() {
            return Ok(ObservedStatus::NotStarted);
        }
        self.read().map(|state| ObservedStatus::classify(&state))
    }

    /// Ask the search writing this progress file to stop.
    pub fn request_cancel(&self, reason: &str) -> Result<PathBuf, SearchError> {
        FileCancellation::request(&self.path, "saidi-monitor", reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::cancel::cancel_path_for;
    use tempfile::tempdir;

    fn record() -> TopModelRecord {
        TopModelRecord {
            order: [1, 0, 0],
            seasonal_order: [1, 0, 0, 12],
            precision_final: 81.5,
            rmse: 1.2,
            mape: 9.0,
            r2_score: 0.7,
            aic: 120.0,
        }
    }

    #[test]
    fn classify_states() {
        let running = ProgressState::new(40.0, "Evaluating model 4 of 10");
        assert!(matches!(
            ObservedStatus::classify(&running),
            ObservedStatus::Running { progress, .. } if progress == 40.0
        ));

        let mut done = ProgressState::new(100.0, "Completed");
        assert!(matches!(
            ObservedStatus::classify(&done),
            ObservedStatus::CompletedEmpty { .. }
        ));
        done.top_models.push(record());
        assert!(matches!(
            ObservedStatus::classify(&done),
            ObservedStatus::Completed { ref top_models } if top_models.len() == 1
        ));

        let errored = ProgressState::new(0.0, "Error: bad file");
        assert!(ObservedStatus::classify(&errored).is_terminal());

        let mut cancelled = ProgressState::new(33.0, "Cancelled by user");
        cancelled.cancelled = true;
        assert_eq!(ObservedStatus::classify(&cancelled), ObservedStatus::Cancelled);
    }

    #[test]
    fn observe_missing_file() {
        let dir = tempdir().unwrap();
        let monitor = ProgressMonitor::new(dir.path().join("progress.json"));
        assert_eq!(monitor.observe().unwrap(), ObservedStatus::NotStarted);
    }

    #[test]
    fn read_gives_up_on_garbage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("progress.json");
        fs::write(&path, "{ not json").unwrap();

        let monitor = ProgressMonitor::new(&path).with_retries(2, Duration::from_millis(1));
        assert!(matches!(
            monitor.read(),
            Err(SearchError::Serialization(_))
        ));
    }

    #[test]
    fn read_accepts_minimal_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("progress.json");
        fs::write(
            &path,
            r#"{"progress": 55.0, "status": "x", "timestamp": "2024-05-01T10:00:00Z",
                "top_models": [{"order": [0,1,1], "seasonal_order": [0,0,0,12],
                "precision_final": 0, "rmse": null, "mape": 100, "r2_score": -1, "aic": null}]}"#,
        )
        .unwrap();

        let state = ProgressMonitor::new(&path).read().unwrap();
        assert_eq!(state.progress, 55.0);
        assert!(!state.cancelled);
        assert_eq!(state.top_models[0].rmse, f64::INFINITY);
    }

    #[test]
    fn request_cancel_writes_sentinel() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("progress.json");
        let written = ProgressMonitor::new(&path)
            .request_cancel("stop")
            .unwrap();
        assert_eq!(written, cancel_path_for(&path));
        assert!(written.exists());
    }
}
