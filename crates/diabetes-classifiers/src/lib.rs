//! diabetes-classifiers: training and inference pipeline for diabetes risk.
//!
//! The crate loads the eight-feature clinical dataset, standardizes it, fits
//! either a bagged decision-tree ensemble or a fixed rule-based scorer,
//! evaluates the result on a held-out split and persists the fitted pair.
//! `service::PredictionService` puts it all behind a thread-safe facade that
//! loads or trains on first use.
pub mod config;
pub mod data_handling;
pub mod error;
pub mod io;
pub mod math;
pub mod models;
pub mod persistence;
pub mod pipeline;
pub mod prediction;
pub mod preprocessing;
pub mod service;
pub mod stats;

pub use config::{MaxFeatures, ModelType, PipelineConfig};
pub use data_handling::{Dataset, FEATURE_NAMES, N_FEATURES};
pub use error::{PipelineError, Result};
pub use io::read_dataset as load_dataset;
pub use persistence::ArtifactStore;
pub use pipeline::{train_pipeline, FittedPipeline, TrainingReport};
pub use prediction::{FeatureVector, PredictionResult, RiskLevel};
pub use service::PredictionService;
