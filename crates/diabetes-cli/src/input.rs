use anyhow::{Context, Result};
use clap::ArgMatches;
use std::any::Any;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use diabetes_classifiers::config::{ModelType, PipelineConfig};

use crate::util::validate_tsv_or_csv_file;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PipelineConfig> {
    PipelineConfig::from_json_file(&path)
        .with_context(|| format!("Failed to load config: {}", path.as_ref().display()))
}

/// Read the JSON config named on the command line (or fall back to the
/// defaults), then apply the flag overrides present on this subcommand.
pub fn config_from_arguments(matches: &ArgMatches) -> Result<PipelineConfig> {
    let mut config = match arg::<PathBuf>(matches, "config") {
        Some(config_path) => {
            log::info!("Using config: {:?}", config_path);
            load_config(config_path)?
        }
        None => {
            log::info!("No config provided; using defaults.");
            PipelineConfig::default()
        }
    };

    // Apply CLI overrides
    if let Some(dataset) = arg::<PathBuf>(matches, "dataset") {
        validate_tsv_or_csv_file(dataset)?;
        config.dataset_path = dataset.clone();
    }

    if let Some(model_dir) = arg::<PathBuf>(matches, "model_dir") {
        config.model_dir = model_dir.clone();
    }

    if let Some(model_type) = arg::<String>(matches, "model_type") {
        config.model = ModelType::from_str(model_type).map_err(anyhow::Error::msg)?;
    }

    config
        .validate()
        .context("Invalid configuration after applying command line overrides")?;
    Ok(config)
}

/// `None` both when the flag is absent and when the subcommand does not
/// define it.
fn arg<'a, T: Any + Clone + Send + Sync + 'static>(matches: &'a ArgMatches, id: &str) -> Option<&'a T> {
    matches.try_get_one::<T>(id).ok().flatten()
}
