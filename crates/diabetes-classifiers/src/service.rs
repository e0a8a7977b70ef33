//! Thread-safe prediction facade.
//!
//! `PredictionService` owns the fitted pipeline for the life of the process.
//! The first caller loads it from disk, or trains and saves a new one when no
//! usable artifacts exist. Later callers share the same immutable `Arc`.
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use serde::{Deserialize, Serialize};

use crate::config::{ModelType, PipelineConfig};
use crate::error::{PipelineError, Result};
use crate::persistence::ArtifactStore;
use crate::pipeline::{load_splits, train_pipeline, FittedPipeline, TrainingReport};
use crate::prediction::{FeatureVector, PredictionExplanation, PredictionResult};
use crate::stats::EvaluationReport;

/// How `bootstrap` obtained the serving pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BootstrapOutcome {
    AlreadyReady,
    Loaded,
    Trained,
}

/// Held-out evaluation of the served model plus its importances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub fit_id: String,
    pub evaluation: EvaluationReport,
    pub feature_names: Vec<String>,
    pub feature_importances: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub algorithm: String,
    pub parameters: ModelType,
    pub fit_id: String,
    pub created_at: String,
    pub n_train: usize,
    pub n_test: usize,
    pub feature_names: Vec<String>,
}

pub struct PredictionService {
    config: PipelineConfig,
    store: ArtifactStore,
    state: RwLock<Option<Arc<FittedPipeline>>>,
    /// Serializes load, train and save.
    bootstrap: Mutex<()>,
}

impl PredictionService {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let store = ArtifactStore::new(&config);
        Ok(Self {
            config,
            store,
            state: RwLock::new(None),
            bootstrap: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn is_ready(&self) -> bool {
        self.current().is_some()
    }

    /// Make the service Ready: load the artifacts, or train and save when
    /// they are missing or unusable. Idempotent.
    pub fn bootstrap(&self) -> Result<BootstrapOutcome> {
        if self.current().is_some() {
            return Ok(BootstrapOutcome::AlreadyReady);
        }
        let _guard = self.lock_bootstrap();
        // another caller may have finished while we waited
        if self.current().is_some() {
            return Ok(BootstrapOutcome::AlreadyReady);
        }

        match self.store.load() {
            Ok(pipeline) => {
                self.install(pipeline);
                Ok(BootstrapOutcome::Loaded)
            }
            Err(e) if e.is_recoverable_by_training() => {
                log::warn!("{}; training a new model", e);
                self.train_and_save()?;
                Ok(BootstrapOutcome::Trained)
            }
            Err(e) => Err(e),
        }
    }

    /// Replace the in-memory pipeline with the one on disk.
    pub fn load(&self) -> Result<()> {
        let _guard = self.lock_bootstrap();
        let pipeline = self.store.load()?;
        self.install(pipeline);
        Ok(())
    }

    /// Retrain from the configured dataset, overwrite the artifacts and
    /// return the test accuracy.
    pub fn train(&self) -> Result<f64> {
        Ok(self.retrain()?.accuracy())
    }

    pub fn retrain(&self) -> Result<TrainingReport> {
        let _guard = self.lock_bootstrap();
        self.train_and_save()
    }

    pub fn predict(&self, features: &[f64]) -> Result<PredictionResult> {
        let features = FeatureVector::try_from(features)?;
        self.ready()?.predict_one(&features)
    }

    pub fn predict_fields<S: AsRef<str>>(&self, fields: &[S]) -> Result<PredictionResult> {
        let features = FeatureVector::parse_fields(fields)?;
        self.ready()?.predict_one(&features)
    }

    pub fn explain(&self, features: &[f64]) -> Result<PredictionExplanation> {
        let features = FeatureVector::try_from(features)?;
        self.ready()?.explain(&features)
    }

    /// Evaluate the served model on the held-out partition of the
    /// configured dataset.
    pub fn metrics(&self) -> Result<ModelMetrics> {
        let pipeline = self.ready()?;
        let (_, test) = load_splits(&self.config)?;
        let evaluation = pipeline.evaluate(&test)?;
        let (feature_names, feature_importances): (Vec<String>, Vec<f64>) =
            pipeline.feature_importances()?.into_iter().unzip();
        Ok(ModelMetrics {
            fit_id: pipeline.fit_id().to_string(),
            evaluation,
            feature_names,
            feature_importances,
        })
    }

    pub fn model_info(&self) -> Result<ModelInfo> {
        let pipeline = self.ready()?;
        let meta = pipeline.metadata();
        Ok(ModelInfo {
            algorithm: meta.model_name.clone(),
            parameters: pipeline.model().model_type(),
            fit_id: meta.fit_id.clone(),
            created_at: meta.created_at.clone(),
            n_train: meta.n_train,
            n_test: meta.n_test,
            feature_names: meta.feature_names.clone(),
        })
    }

    /// The serving pipeline, bootstrapping first if needed.
    pub fn ready(&self) -> Result<Arc<FittedPipeline>> {
        if let Some(pipeline) = self.current() {
            return Ok(pipeline);
        }
        self.bootstrap()?;
        self.current()
            .ok_or(PipelineError::NotFitted("PredictionService"))
    }

    fn current(&self) -> Option<Arc<FittedPipeline>> {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn install(&self, pipeline: FittedPipeline) {
        *self.state.write().unwrap_or_else(|e| e.into_inner()) = Some(Arc::new(pipeline));
    }

    fn lock_bootstrap(&self) -> MutexGuard<'_, ()> {
        self.bootstrap.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Caller must hold the bootstrap lock.
    fn train_and_save(&self) -> Result<TrainingReport> {
        let (pipeline, report) = train_pipeline(&self.config)?;
        self.store.save(&pipeline)?;
        self.install(pipeline);
        log::info!(
            "Serving {} model (fit {}), test accuracy {:.3}",
            report.model_name,
            report.fit_id,
            report.accuracy()
        );
        Ok(report)
    }
}
