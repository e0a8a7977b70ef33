#![allow(dead_code)]

use std::path::{Path, PathBuf};

use diabetes_classifiers::config::{MaxFeatures, ModelType, PipelineConfig};
use diabetes_classifiers::data_handling::{FEATURE_NAMES, OUTCOME_COLUMN};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

pub const LOW_RISK: [f64; 8] = [1.0, 85.0, 66.0, 29.0, 0.0, 26.6, 0.351, 31.0];
pub const HIGH_RISK: [f64; 8] = [5.0, 180.0, 95.0, 35.0, 200.0, 35.0, 1.5, 55.0];

/// One synthetic patient in Pima schema order. The outcome is a
/// deterministic function of glucose, BMI and age.
fn synthetic_row(rng: &mut StdRng) -> ([f64; 8], u8) {
    let pregnancies = rng.gen_range(0..12) as f64;
    let glucose = rng.gen_range(70.0..200.0f64).round();
    let blood_pressure = rng.gen_range(50.0..110.0f64).round();
    let skin = rng.gen_range(10.0..50.0f64).round();
    let insulin = rng.gen_range(0.0..300.0f64).round();
    let bmi = (rng.gen_range(18.0..48.0f64) * 10.0).round() / 10.0;
    let pedigree = (rng.gen_range(0.08..2.4f64) * 1000.0).round() / 1000.0;
    let age = rng.gen_range(21..70) as f64;

    let score = (glucose - 125.0) / 15.0 + (bmi - 31.0) / 6.0 + (age - 40.0) / 20.0;
    let outcome = u8::from(score > 0.0);
    (
        [pregnancies, glucose, blood_pressure, skin, insulin, bmi, pedigree, age],
        outcome,
    )
}

/// Write `n` synthetic rows with a header to `path` (comma or tab separated).
pub fn write_dataset(path: &Path, n: usize, seed: u64) {
    let delimiter = if path.extension().map_or(false, |e| e == "tsv") {
        b'\t'
    } else {
        b','
    };
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .expect("failed to create dataset file");
    let mut header: Vec<&str> = FEATURE_NAMES.to_vec();
    header.push(OUTCOME_COLUMN);
    writer.write_record(&header).unwrap();

    let mut rng = StdRng::seed_from_u64(seed);
    for _ in 0..n {
        let (features, outcome) = synthetic_row(&mut rng);
        let mut record: Vec<String> = features.iter().map(|v| v.to_string()).collect();
        record.push(outcome.to_string());
        writer.write_record(&record).unwrap();
    }
    writer.flush().unwrap();
}

/// Write arbitrary text (for malformed-input cases).
pub fn write_text(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

pub fn small_forest() -> ModelType {
    ModelType::RandomForest {
        n_estimators: 30,
        max_depth: None,
        min_samples_split: 2,
        min_samples_leaf: 1,
        max_features: MaxFeatures::Sqrt,
        seed: 42,
    }
}

/// Scratch directory holding a 400-row dataset and a config pointing at it.
pub fn scratch_config() -> (TempDir, PipelineConfig) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let dataset = dir.path().join("diabetes.csv");
    write_dataset(&dataset, 400, 7);
    let config = PipelineConfig::new(dataset, dir.path().join("models")).with_model(small_forest());
    (dir, config)
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
