//! On-disk storage of a fitted pipeline as two JSON artifacts.
//!
//! The model and the scaler are written to separate files. Each file is an
//! envelope carrying the format version and the `ArtifactMetadata` of the
//! training run, so a model can never be paired with a scaler from another
//! run.
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::{ModelType, PipelineConfig};
use crate::data_handling::{feature_names, N_FEATURES};
use crate::error::{PipelineError, Result};
use crate::models::ClassifierState;
use crate::pipeline::{ArtifactMetadata, FittedPipeline};
use crate::preprocessing::Scaler;

/// Bumped whenever the serialized layout changes.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    format_version: u32,
    metadata: ArtifactMetadata,
    payload: T,
}

/// Reads and writes the model/scaler pair for one `PipelineConfig`.
/// A pair built from a different `ModelType` than the configured one does
/// not load.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    model_path: PathBuf,
    scaler_path: PathBuf,
    expected_model: ModelType,
}

impl ArtifactStore {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            model_path: config.model_path(),
            scaler_path: config.scaler_path(),
            expected_model: config.model.clone(),
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn scaler_path(&self) -> &Path {
        &self.scaler_path
    }

    pub fn exists(&self) -> bool {
        self.model_path.is_file() && self.scaler_path.is_file()
    }

    /// Write both artifacts. Each file is replaced atomically; the scaler
    /// goes first so that a model file always has a scaler next to it.
    pub fn save(&self, pipeline: &FittedPipeline) -> Result<()> {
        write_artifact(&self.scaler_path, pipeline.metadata(), pipeline.scaler())?;
        write_artifact(&self.model_path, pipeline.metadata(), pipeline.model())?;
        log::info!(
            "Saved model to {} and scaler to {} (fit {})",
            self.model_path.display(),
            self.scaler_path.display(),
            pipeline.fit_id()
        );
        Ok(())
    }

    pub fn load(&self) -> Result<FittedPipeline> {
        let (model_meta, model): (ArtifactMetadata, ClassifierState) =
            read_artifact(&self.model_path)?;
        let (scaler_meta, scaler): (ArtifactMetadata, Scaler) = read_artifact(&self.scaler_path)?;

        if model_meta.fit_id != scaler_meta.fit_id {
            return Err(incompatible(
                &self.scaler_path,
                format!(
                    "scaler belongs to fit {} but model belongs to fit {}",
                    scaler_meta.fit_id, model_meta.fit_id
                ),
            ));
        }
        let found = model.model_type();
        if found != self.expected_model {
            return Err(incompatible(
                &self.model_path,
                format!(
                    "artifact holds {:?}, configuration expects {:?}",
                    found, self.expected_model
                ),
            ));
        }
        model
            .validate(N_FEATURES)
            .map_err(|reason| incompatible(&self.model_path, reason))?;
        if !scaler.is_fitted() || scaler.n_features() != N_FEATURES {
            return Err(incompatible(
                &self.scaler_path,
                format!("scaler has {} features, expected {}", scaler.n_features(), N_FEATURES),
            ));
        }

        let pipeline = FittedPipeline::new(scaler, model, model_meta)?;
        log::info!(
            "Loaded {} model from {} (fit {})",
            pipeline.metadata().model_name,
            self.model_path.display(),
            pipeline.fit_id()
        );
        Ok(pipeline)
    }
}

fn incompatible(path: &Path, reason: impl Into<String>) -> PipelineError {
    PipelineError::IncompatibleArtifact {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

fn io_error(path: &Path, source: std::io::Error) -> PipelineError {
    PipelineError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn write_artifact<T: Serialize>(path: &Path, metadata: &ArtifactMetadata, payload: &T) -> Result<()> {
    let envelope = Envelope {
        format_version: FORMAT_VERSION,
        metadata: metadata.clone(),
        payload,
    };
    let bytes = serde_json::to_vec_pretty(&envelope).map_err(|source| {
        PipelineError::Serialization {
            what: "model artifact",
            source,
        }
    })?;

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;

    let mut temp = tempfile::Builder::new()
        .prefix(".diabetes-artifact")
        .tempfile_in(dir)
        .map_err(|e| io_error(dir, e))?;
    temp.write_all(&bytes).map_err(|e| io_error(path, e))?;
    temp.as_file().sync_all().map_err(|e| io_error(path, e))?;
    temp.persist(path).map_err(|e| io_error(path, e.error))?;
    log::debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<(ArtifactMetadata, T)> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(PipelineError::ModelNotFound {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(io_error(path, e)),
    };

    let value: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| incompatible(path, format!("not valid JSON: {}", e)))?;
    let version = value.get("format_version").and_then(|v| v.as_u64());
    if version != Some(u64::from(FORMAT_VERSION)) {
        return Err(incompatible(
            path,
            format!("format version {:?}, expected {}", version, FORMAT_VERSION),
        ));
    }

    let envelope: Envelope<T> = serde_json::from_value(value)
        .map_err(|e| incompatible(path, format!("unexpected layout: {}", e)))?;
    if envelope.metadata.feature_names != feature_names() {
        return Err(incompatible(
            path,
            format!(
                "feature schema {:?} does not match {:?}",
                envelope.metadata.feature_names,
                feature_names()
            ),
        ));
    }
    Ok((envelope.metadata, envelope.payload))
}
