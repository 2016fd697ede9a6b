//! Cooperative cancellation fed by a sentinel file and OS signals.

use crate::models::Interrupt;
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Lifecycle of a cancellation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CancelState {
    /// No request seen.
    Running = 0,
    /// A request arrived; no further evaluations start.
    CancelRequested = 1,
    /// The final cancelled progress write is done and sentinels are cleared.
    Honored = 2,
}

impl CancelState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => CancelState::Running,
            1 => CancelState::CancelRequested,
            _ => CancelState::Honored,
        }
    }
}

impl fmt::Display for CancelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CancelState::Running => "running",
            CancelState::CancelRequested => "cancel requested",
            CancelState::Honored => "honored",
        };
        f.write_str(name)
    }
}

/// Something that can ask the search to stop.
pub trait CancellationSource: Send + Sync {
    /// Poll for a pending request.
    fn poll(&self) -> bool;

    /// Remove any persistent trace of a request.
    fn clear(&self) -> io::Result<()> {
        Ok(())
    }

    /// Short human-readable name used in logs.
    fn describe(&self) -> String;
}

/// Path of the sentinel file that pairs with a progress file.
///
/// A `.json` suffix is replaced by `_cancel.json`; any other path gets
/// `_cancel.json` appended.
///
/// ```
/// use saidi_forecast::search::cancel_path_for;
/// use std::path::Path;
///
/// assert_eq!(
///     cancel_path_for(Path::new("/tmp/saidi_progress.json")),
///     Path::new("/tmp/saidi_progress_cancel.json")
/// );
/// assert_eq!(
///     cancel_path_for(Path::new("/tmp/progress")),
///     Path::new("/tmp/progress_cancel.json")
/// );
/// ```
pub fn cancel_path_for(progress_path: &Path) -> PathBuf {
    let raw = progress_path.as_os_str().to_string_lossy();
    match raw.strip_suffix(".json") {
        Some(stem) => PathBuf::from(format!("{stem}_cancel.json")),
        None => PathBuf::from(format!("{raw}_cancel.json")),
    }
}

/// Informational body of a cancel sentinel file. Only its presence matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelRecord {
    pub cancelled_at: DateTime<Utc>,
    pub cancelled_by: String,
    pub reason: String,
    pub progress_file: String,
    pub pid: u32,
}

/// Cancellation requested through a sentinel file next to the progress file.
#[derive(Debug, Clone)]
pub struct FileCancellation {
    path: PathBuf,
}

impl FileCancellation {
    /// Watch an explicit sentinel path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Watch the sentinel that pairs with `progress_path`.
    pub fn for_progress(progress_path: &Path) -> Self {
        Self::new(cancel_path_for(progress_path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the sentinel file, requesting cancellation of the search that
    /// owns `progress_path`.
    pub fn request(
        progress_path: &Path,
        cancelled_by: &str,
        reason: &str,
    ) -> Result<PathBuf, crate::error::SearchError> {
        let path = cancel_path_for(progress_path);
        let record = CancelRecord {
            cancelled_at: Utc::now(),
            cancelled_by: cancelled_by.to_string(),
            reason: reason.to_string(),
            progress_file: progress_path.display().to_string(),
            pid: std::process::id(),
        };
        fs::write(&path, serde_json::to_vec_pretty(&record)?)?;
        Ok(path)
    }
}

impl CancellationSource for FileCancellation {
    fn poll(&self) -> bool {
        self.path.exists()
    }

    fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }

    fn describe(&self) -> String {
        format!("cancel file {}", self.path.display())
    }
}

/// Shared cancellation state machine: `Running → CancelRequested → Honored`.
///
/// Clones share the same state, so a signal thread and the search loop see
/// one request. Sources are polled on [`check`](Self::check) while the state
/// is still `Running`.
#[derive(Clone, Default)]
pub struct CancellationController {
    state: Arc<AtomicU8>,
    sources: Vec<Arc<dyn CancellationSource>>,
}

impl fmt::Debug for CancellationController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sources: Vec<String> = self.sources.iter().map(|s| s.describe()).collect();
        f.debug_struct("CancellationController")
            .field("state", &self.state())
            .field("sources", &sources)
            .finish()
    }
}

impl CancellationController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a polled source.
    pub fn with_source(mut self, source: impl CancellationSource + 'static) -> Self {
        self.sources.push(Arc::new(source));
        self
    }

    pub fn state(&self) -> CancelState {
        CancelState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Move `Running → CancelRequested`. Returns false if a request was
    /// already recorded.
    pub fn request(&self) -> bool {
        self.state
            .compare_exchange(
                CancelState::Running as u8,
                CancelState::CancelRequested as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    /// Whether a request has been recorded, without polling sources.
    pub fn is_cancel_requested(&self) -> bool {
        self.state() != CancelState::Running
    }

    /// Poll every source and record a request if any fires.
    pub fn check(&self) -> bool {
        if self.is_cancel_requested() {
            return true;
        }
        if let Some(source) = self.sources.iter().find(|source| source.poll()) {
            if self.request() {
                info!("cancellation requested via {}", source.describe());
            }
            return true;
        }
        false
    }

    /// Move to `Honored` and clear every source.
    pub fn honor(&self) {
        self.state.store(CancelState::Honored as u8, Ordering::SeqCst);
        self.clear_sources();
    }

    /// Remove stale or handled sentinels. Failures are logged.
    pub fn clear_sources(&self) {
        for source in &self.sources {
            if let Err(err) = source.clear() {
                warn!("could not clear {}: {}", source.describe(), err);
            }
        }
    }

    /// Listen for Ctrl-C (and SIGTERM on Unix) on a background thread and
    /// record a cancellation request when one arrives.
    pub fn install_signal_handlers(&self) -> io::Result<()> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let controller = self.clone();

        std::thread::Builder::new()
            .name("saidi-signals".to_string())
            .spawn(move || {
                runtime.block_on(async move {
                    match wait_for_signal().await {
                        Ok(name) => {
                            if controller.request() {
                                info!("received {name}, cancelling search");
                            }
                        }
                        Err(err) => warn!("signal listener failed: {err}"),
                    }
                });
            })?;
        Ok(())
    }
}

impl Interrupt for CancellationController {
    fn is_interrupted(&self) -> bool {
        self.check()
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.map(|_| "interrupt signal"),
        _ = terminate.recv() => Ok("terminate signal"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|_| "interrupt signal")
}
