//! Handoff of the final ranking to the order-preset selector.

use crate::error::SearchError;
use crate::models::ModelSpec;
use crate::search::progress::{write_json_atomic, TopModelRecord};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Default location of the bridge document.
pub const DEFAULT_BRIDGE_PATH: &str = "temp/parametros_bridge.json";

/// Number of models needed to populate every preset.
pub const PRESET_COUNT: usize = 3;

/// Document exchanged through the bridge file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeDocument {
    pub timestamp: DateTime<Utc>,
    pub top_models: Vec<TopModelRecord>,
    pub status: String,
    pub source: String,
}

/// Receives the final top-k ranking.
pub trait PresetBridge {
    fn save_top_models(&self, top_models: &[TopModelRecord]) -> Result<(), SearchError>;
}

impl<B: PresetBridge + ?Sized> PresetBridge for Box<B> {
    fn save_top_models(&self, top_models: &[TopModelRecord]) -> Result<(), SearchError> {
        (**self).save_top_models(top_models)
    }
}

/// Bridge backed by a JSON file.
#[derive(Debug, Clone)]
pub struct FileBridge {
    path: PathBuf,
}

impl FileBridge {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored ranking, or `None` when it is missing or holds fewer
    /// than three models.
    pub fn load_top_models(&self) -> Result<Option<Vec<TopModelRecord>>, SearchError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let document: BridgeDocument = serde_json::from_str(&fs::read_to_string(&self.path)?)?;
        if document.top_models.len() < PRESET_COUNT {
            info!(
                "bridge holds {} models, presets need {}",
                document.top_models.len(),
                PRESET_COUNT
            );
            return Ok(None);
        }
        Ok(Some(document.top_models))
    }

    /// Map the stored ranking onto the selector presets.
    pub fn presets(&self) -> Result<Option<Vec<OrderPreset>>, SearchError> {
        Ok(self.load_top_models()?.map(|models| presets_from(&models)))
    }

    /// The stored model assigned to `kind`, if the bridge holds a full
    /// ranking.
    pub fn preset(&self, kind: PresetKind) -> Result<Option<OrderPreset>, SearchError> {
        Ok(self
            .presets()?
            .and_then(|presets| presets.into_iter().find(|preset| preset.kind == kind)))
    }

    /// Remove the bridge file.
    pub fn clear(&self) -> Result<(), SearchError> {
        match fs::remove_file(&self.path) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

impl Default for FileBridge {
    fn default() -> Self {
        Self::new(DEFAULT_BRIDGE_PATH)
    }
}

impl PresetBridge for FileBridge {
    fn save_top_models(&self, top_models: &[TopModelRecord]) -> Result<(), SearchError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let document = BridgeDocument {
            timestamp: Utc::now(),
            top_models: top_models.to_vec(),
            status: "updated".to_string(),
            source: env!("CARGO_PKG_NAME").to_string(),
        };
        write_json_atomic(&self.path, &document)?;
        info!(
            "saved {} top models to {}",
            top_models.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// Named order presets of the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetKind {
    Conservative,
    TrendOnly,
    Aggressive,
}

impl PresetKind {
    /// Presets in ranking order.
    pub const ALL: [PresetKind; PRESET_COUNT] = [
        PresetKind::Conservative,
        PresetKind::TrendOnly,
        PresetKind::Aggressive,
    ];
}

impl fmt::Display for PresetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PresetKind::Conservative => "Conservative",
            PresetKind::TrendOnly => "Trend only",
            PresetKind::Aggressive => "Aggressive",
        };
        f.write_str(name)
    }
}

/// A ranked model assigned to a selector preset.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderPreset {
    pub kind: PresetKind,
    pub model: TopModelRecord,
    pub description: String,
}

impl OrderPreset {
    pub fn spec(&self) -> ModelSpec {
        self.model.spec()
    }
}

/// Assign the first three models to Conservative, TrendOnly and Aggressive.
pub fn presets_from(top_models: &[TopModelRecord]) -> Vec<OrderPreset> {
    let labels = ["Optimized model", "Second best model", "Third best model"];
    PresetKind::ALL
        .iter()
        .zip(labels)
        .zip(top_models)
        .map(|((&kind, label), model)| OrderPreset {
            kind,
            model: model.clone(),
            description: format!("{label} (precision: {:.1}%)", model.precision_final),
        })
        .collect()
}

/// One-line description of a stored model.
pub fn format_model_info(model: &TopModelRecord) -> String {
    format!(
        "SARIMAX{:?}x{:?} - {:.1}%",
        model.order, model.seasonal_order, model.precision_final
    )
}

/// Check that orders fall in the ranges the selector accepts:
/// `p, q ≤ 10`, `d ≤ 2`, `P, Q ≤ 5`, `D ≤ 2`, `1 ≤ s ≤ 24`.
pub fn validate_model_parameters(spec: &ModelSpec) -> bool {
    spec.p <= 10
        && spec.q <= 10
        && spec.d <= 2
        && spec.cap_p <= 5
        && spec.cap_q <= 5
        && spec.cap_d <= 2
        && (1..=24).contains(&spec.s)
}
