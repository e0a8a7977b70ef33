use anyhow::{Context, Result};
use serde::Serialize;

use diabetes_classifiers::config::PipelineConfig;
use diabetes_classifiers::data_handling::DatasetSummary;
use diabetes_classifiers::io::read_dataset;
use diabetes_classifiers::pipeline::TrainingReport;
use diabetes_classifiers::prediction::{PredictionExplanation, RiskLevel};
use diabetes_classifiers::service::{ModelInfo, ModelMetrics, PredictionService};

#[derive(Debug, Serialize)]
pub struct PredictionOutput {
    pub label: u8,
    pub probability: f64,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PredictOutput {
    Prediction(PredictionOutput),
    Explanation(PredictionExplanation),
}

#[derive(Debug, Serialize)]
pub struct MetricsOutput {
    pub model: ModelInfo,
    pub metrics: ModelMetrics,
}

pub fn run_train(config: &PipelineConfig) -> Result<TrainingReport> {
    let service = PredictionService::new(config.clone())?;
    let report = service.retrain().context("Training failed")?;
    log::info!(
        "Trained {} (fit {}) with test accuracy {:.3}",
        report.model_name,
        report.fit_id,
        report.accuracy()
    );
    Ok(report)
}

/// Predict for one patient given as eight text fields. Trains first when no
/// saved model exists.
pub fn run_predict<S: AsRef<str>>(config: &PipelineConfig, fields: &[S], explain: bool) -> Result<PredictOutput> {
    let service = PredictionService::new(config.clone())?;
    let prediction = service.predict_fields(fields)?;
    if !explain {
        return Ok(PredictOutput::Prediction(PredictionOutput {
            label: prediction.label,
            probability: prediction.probability,
            risk_level: prediction.risk_level(),
        }));
    }
    let values: Vec<f64> = fields
        .iter()
        .map(|f| f.as_ref().trim().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .context("Failed to parse feature values")?;
    Ok(PredictOutput::Explanation(service.explain(&values)?))
}

pub fn run_metrics(config: &PipelineConfig) -> Result<MetricsOutput> {
    let service = PredictionService::new(config.clone())?;
    let metrics = service.metrics().context("Failed to evaluate model")?;
    let model = service.model_info()?;
    Ok(MetricsOutput { model, metrics })
}

pub fn run_summary(config: &PipelineConfig) -> Result<DatasetSummary> {
    let dataset = read_dataset(&config.dataset_path)?;
    dataset.log_summary();
    Ok(dataset.summary())
}
