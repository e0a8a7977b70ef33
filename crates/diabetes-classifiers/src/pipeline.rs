//! Training pipeline and the fitted (scaler, classifier) pair it produces.
use chrono::{SecondsFormat, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::data_handling::{feature_names, Dataset, FEATURE_NAMES, N_FEATURES};
use crate::error::{PipelineError, Result};
use crate::io::read_dataset;
use crate::math::Array2;
use crate::models::{build_model, label_for, ClassifierModel, ClassifierState};
use crate::prediction::{FeatureImpact, FeatureVector, PredictionExplanation, PredictionResult, RiskLevel};
use crate::preprocessing::{fit_scaler, transform_all, Scaler};
use crate::stats::EvaluationReport;

/// Bookkeeping shared by the model and scaler of one training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// Identifies the training run; both artifacts of a run carry the same id.
    pub fit_id: String,
    pub model_name: String,
    pub feature_names: Vec<String>,
    /// RFC 3339, UTC.
    pub created_at: String,
    pub n_train: usize,
    pub n_test: usize,
}

impl ArtifactMetadata {
    pub fn new(model_name: &str, n_train: usize, n_test: usize) -> Self {
        let now = Utc::now();
        let fit_id = format!(
            "{}-{:08x}",
            now.format("%Y%m%dT%H%M%S%3f"),
            rand::thread_rng().gen::<u32>()
        );
        Self {
            fit_id,
            model_name: model_name.to_string(),
            feature_names: feature_names(),
            created_at: now.to_rfc3339_opts(SecondsFormat::Secs, true),
            n_train,
            n_test,
        }
    }
}

/// A scaler and classifier fit together. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedPipeline {
    scaler: Scaler,
    model: ClassifierState,
    metadata: ArtifactMetadata,
}

impl FittedPipeline {
    pub fn new(scaler: Scaler, model: ClassifierState, metadata: ArtifactMetadata) -> Result<Self> {
        if scaler.n_features() != N_FEATURES {
            return Err(PipelineError::NotFitted("Scaler"));
        }
        model
            .validate(N_FEATURES)
            .map_err(PipelineError::Training)?;
        Ok(Self {
            scaler,
            model,
            metadata,
        })
    }

    pub fn scaler(&self) -> &Scaler {
        &self.scaler
    }

    pub fn model(&self) -> &ClassifierState {
        &self.model
    }

    pub fn metadata(&self) -> &ArtifactMetadata {
        &self.metadata
    }

    pub fn fit_id(&self) -> &str {
        &self.metadata.fit_id
    }

    /// Positive-class probabilities for raw (unscaled) rows.
    pub fn predict_proba_batch(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        let scaled = transform_all(x, &self.scaler)?;
        self.model.predict_proba(&scaled)
    }

    pub fn predict_batch(&self, x: &Array2<f64>) -> Result<Vec<u8>> {
        Ok(self
            .predict_proba_batch(x)?
            .into_iter()
            .map(label_for)
            .collect())
    }

    pub fn predict_one(&self, features: &FeatureVector) -> Result<PredictionResult> {
        let probability = self.probability_for(features)?;
        Ok(PredictionResult {
            label: label_for(probability),
            probability,
        })
    }

    pub fn explain(&self, features: &FeatureVector) -> Result<PredictionExplanation> {
        let scaled = self.scaler.transform_row(features.as_slice())?;
        let probability = self.probability_for(features)?;
        let importances = self.model.feature_importances()?;
        let label = label_for(probability);

        let feature_impact = FEATURE_NAMES
            .iter()
            .zip(features.as_slice())
            .zip(scaled.iter().zip(importances.iter()))
            .map(|((name, value), (scaled_value, importance))| FeatureImpact {
                name: name.to_string(),
                value: *value,
                scaled_value: *scaled_value,
                importance: *importance,
            })
            .collect();

        Ok(PredictionExplanation {
            prediction: label,
            probability_no_diabetes: 1.0 - probability,
            probability_diabetes: probability,
            model_confidence: if label == 1 { probability } else { 1.0 - probability },
            risk_level: RiskLevel::from_probability(probability),
            feature_impact,
        })
    }

    pub fn evaluate(&self, data: &Dataset) -> Result<EvaluationReport> {
        if data.is_empty() {
            return Err(PipelineError::Training(
                "cannot evaluate on an empty partition".to_string(),
            ));
        }
        let predictions = self.predict_batch(&data.x)?;
        EvaluationReport::from_predictions(&data.y, &predictions)
    }

    /// Importances paired with feature names, in canonical order.
    pub fn feature_importances(&self) -> Result<Vec<(String, f64)>> {
        let importances = self.model.feature_importances()?;
        Ok(feature_names().into_iter().zip(importances).collect())
    }

    fn probability_for(&self, features: &FeatureVector) -> Result<f64> {
        let scaled = self.scaler.transform_row(features.as_slice())?;
        let x = Array2::from_shape_vec((1, N_FEATURES), scaled)
            .map_err(|e| PipelineError::InvalidFeature(e.to_string()))?;
        let proba = self.model.predict_proba(&x)?;
        proba
            .first()
            .copied()
            .ok_or_else(|| PipelineError::Training("model returned no probability".to_string()))
    }
}

/// Outcome of one training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub fit_id: String,
    pub model_name: String,
    pub n_train: usize,
    pub n_test: usize,
    pub evaluation: EvaluationReport,
}

impl TrainingReport {
    pub fn accuracy(&self) -> f64 {
        self.evaluation.accuracy
    }
}

/// Held-out partition of the configured dataset, reproduced from the split seed.
pub fn load_splits(config: &PipelineConfig) -> Result<(Dataset, Dataset)> {
    config.validate()?;
    let dataset = read_dataset(&config.dataset_path)?;
    dataset.train_test_split(config.test_fraction, config.split_seed)
}

/// Load, split, fit scaler and classifier, then evaluate on the test partition.
///
/// Nothing is written to disk here; see `ArtifactStore::save`.
pub fn train_pipeline(config: &PipelineConfig) -> Result<(FittedPipeline, TrainingReport)> {
    config.validate()?;
    log::info!("Loading dataset from {}", config.dataset_path.display());
    let dataset = read_dataset(&config.dataset_path)?;
    dataset.log_summary();

    let (train, test) = dataset.train_test_split(config.test_fraction, config.split_seed)?;
    log::info!(
        "Split {} samples into {} train / {} test (seed {})",
        dataset.len(),
        train.len(),
        test.len(),
        config.split_seed
    );

    let mut model = build_model(&config.model);
    let scaler = if model.requires_standardized_input() {
        fit_scaler(&train.x)?
    } else {
        log::debug!("{} takes raw features; using identity scaler", model.name());
        Scaler::identity(N_FEATURES)
    };
    let x_train = transform_all(&train.x, &scaler)?;

    log::info!("Training {} on {} samples", model.name(), train.len());
    let start = std::time::Instant::now();
    model.fit(&x_train, &train.y)?;
    log::info!("Training finished in {:.2?}", start.elapsed());

    let metadata = ArtifactMetadata::new(model.name(), train.len(), test.len());
    let fitted = FittedPipeline::new(scaler, model, metadata)?;

    let evaluation = fitted.evaluate(&test)?;
    evaluation.log();

    let report = TrainingReport {
        fit_id: fitted.fit_id().to_string(),
        model_name: fitted.metadata().model_name.clone(),
        n_train: train.len(),
        n_test: test.len(),
        evaluation,
    };
    Ok((fitted, report))
}
