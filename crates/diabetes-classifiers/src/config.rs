use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// How many features each tree split considers.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    /// `floor(sqrt(n_features))`, at least one.
    Sqrt,
    All,
    Count(usize),
}

impl MaxFeatures {
    pub fn resolve(&self, n_features: usize) -> usize {
        let k = match self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().floor() as usize,
            MaxFeatures::All => n_features,
            MaxFeatures::Count(k) => *k,
        };
        k.clamp(1, n_features.max(1))
    }
}

/// Supported model types and their hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum ModelType {
    RandomForest {
        n_estimators: usize,
        max_depth: Option<usize>,
        min_samples_split: usize,
        min_samples_leaf: usize,
        max_features: MaxFeatures,
        seed: u64,
    },
    RuleBased,
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::RandomForest {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            seed: 42,
        }
    }
}

impl ModelType {
    pub fn name(&self) -> &'static str {
        match self {
            ModelType::RandomForest { .. } => "random_forest",
            ModelType::RuleBased => "rule_based",
        }
    }
}

impl FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "random_forest" | "random-forest" | "rf" => Ok(ModelType::default()),
            "rule_based" | "rule-based" | "rules" => Ok(ModelType::RuleBased),
            _ => Err(format!(
                "Unknown model type: {}. Valid options are: random_forest, rule_based",
                s
            )),
        }
    }
}

/// Central configuration for the training / inference pipeline.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct PipelineConfig {
    /// CSV/TSV file with the 8 feature columns plus `Outcome`.
    pub dataset_path: PathBuf,
    /// Directory holding the persisted model and scaler artifacts.
    pub model_dir: PathBuf,
    pub model_file: String,
    pub scaler_file: String,
    /// Fraction of samples held out for evaluation.
    pub test_fraction: f64,
    /// Seed for the train/test shuffle.
    pub split_seed: u64,
    pub model: ModelType,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("diabetes.csv"),
            model_dir: PathBuf::from("."),
            model_file: String::from("diabetes_model.json"),
            scaler_file: String::from("scaler.json"),
            test_fraction: 0.2,
            split_seed: 42,
            model: ModelType::default(),
        }
    }
}

impl PipelineConfig {
    pub fn new(dataset_path: impl Into<PathBuf>, model_dir: impl Into<PathBuf>) -> Self {
        Self {
            dataset_path: dataset_path.into(),
            model_dir: model_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_model(mut self, model: ModelType) -> Self {
        self.model = model;
        self
    }

    pub fn model_path(&self) -> PathBuf {
        self.model_dir.join(&self.model_file)
    }

    pub fn scaler_path(&self) -> PathBuf {
        self.model_dir.join(&self.scaler_file)
    }

    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: PipelineConfig = serde_json::from_str(&content).map_err(|e| {
            PipelineError::InvalidConfig(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "test_fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        if self.model_file.is_empty() || self.scaler_file.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "model_file and scaler_file must be non-empty".to_string(),
            ));
        }
        if self.model_file == self.scaler_file {
            return Err(PipelineError::InvalidConfig(
                "model_file and scaler_file must differ".to_string(),
            ));
        }
        if let ModelType::RandomForest {
            n_estimators,
            min_samples_split,
            min_samples_leaf,
            max_depth,
            max_features,
            ..
        } = &self.model
        {
            if *n_estimators == 0 {
                return Err(PipelineError::InvalidConfig(
                    "n_estimators must be at least 1".to_string(),
                ));
            }
            if *min_samples_split < 2 {
                return Err(PipelineError::InvalidConfig(
                    "min_samples_split must be at least 2".to_string(),
                ));
            }
            if *min_samples_leaf == 0 {
                return Err(PipelineError::InvalidConfig(
                    "min_samples_leaf must be at least 1".to_string(),
                ));
            }
            if *max_depth == Some(0) {
                return Err(PipelineError::InvalidConfig(
                    "max_depth must be at least 1 when set".to_string(),
                ));
            }
            if *max_features == MaxFeatures::Count(0) {
                return Err(PipelineError::InvalidConfig(
                    "max_features must be at least 1".to_string(),
                ));
            }
        }
        Ok(())
    }
}
