use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use clap::{Arg, Command};
use diabetes_classifiers::config::{ModelType, PipelineConfig};
use diabetes_cli::commands::{run_metrics, run_predict, run_summary, run_train, PredictOutput};
use diabetes_cli::input::{config_from_arguments, load_config};
use diabetes_cli::util::validate_tsv_or_csv_file;

/// Small deterministic dataset: outcome follows glucose and BMI.
fn write_dataset(path: &Path, n: usize) {
    let mut csv = String::from(
        "Pregnancies,Glucose,BloodPressure,SkinThickness,Insulin,BMI,DiabetesPedigreeFunction,Age,Outcome\n",
    );
    for i in 0..n {
        let glucose = 70 + (i * 37) % 130;
        let bmi = 18.0 + ((i * 13) % 30) as f64;
        let age = 21 + (i * 7) % 50;
        let outcome = u8::from(glucose as f64 + 3.0 * bmi > 215.0);
        writeln!(
            csv,
            "{},{},{},{},{},{:.1},{:.3},{},{}",
            i % 10,
            glucose,
            60 + i % 40,
            15 + i % 30,
            (i * 11) % 250,
            bmi,
            0.1 + (i % 20) as f64 * 0.05,
            age,
            outcome
        )
        .unwrap();
    }
    std::fs::write(path, csv).unwrap();
}

fn test_command() -> Command {
    Command::new("test")
        .arg(Arg::new("config").value_parser(clap::value_parser!(PathBuf)))
        .arg(Arg::new("dataset").short('d').value_parser(clap::value_parser!(PathBuf)))
        .arg(Arg::new("model_dir").short('o').value_parser(clap::value_parser!(PathBuf)))
        .arg(Arg::new("model_type").long("model-type"))
}

fn scratch() -> (tempfile::TempDir, PipelineConfig) {
    let dir = tempfile::tempdir().unwrap();
    let dataset = dir.path().join("diabetes.csv");
    write_dataset(&dataset, 150);
    let config = PipelineConfig::new(dataset, dir.path().join("models")).with_model(ModelType::RandomForest {
        n_estimators: 15,
        max_depth: None,
        min_samples_split: 2,
        min_samples_leaf: 1,
        max_features: diabetes_classifiers::MaxFeatures::Sqrt,
        seed: 42,
    });
    (dir, config)
}

#[test]
fn validate_tsv_or_csv_file_checks_extension_and_existence() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("data.csv");
    std::fs::write(&csv, "a,b\n").unwrap();
    assert!(validate_tsv_or_csv_file(&csv).is_ok());

    let txt = dir.path().join("data.txt");
    std::fs::write(&txt, "a,b\n").unwrap();
    assert!(validate_tsv_or_csv_file(&txt).is_err());

    assert!(validate_tsv_or_csv_file(&dir.path().join("missing.tsv")).is_err());
}

#[test]
fn overrides_replace_config_values() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.json");
    std::fs::write(&config_path, r#"{"dataset_path": "elsewhere.csv", "split_seed": 7}"#).unwrap();
    let dataset = dir.path().join("pima.csv");
    write_dataset(&dataset, 10);

    let matches = test_command().get_matches_from([
        "test",
        config_path.to_str().unwrap(),
        "-d",
        dataset.to_str().unwrap(),
        "-o",
        "artifacts",
        "--model-type",
        "rule_based",
    ]);
    let config = config_from_arguments(&matches).unwrap();
    assert_eq!(config.dataset_path, dataset);
    assert_eq!(config.model_dir, PathBuf::from("artifacts"));
    assert_eq!(config.model, ModelType::RuleBased);
    assert_eq!(config.split_seed, 7);
}

#[test]
fn missing_config_uses_defaults() {
    let matches = test_command().get_matches_from(["test"]);
    let config = config_from_arguments(&matches).unwrap();
    assert_eq!(config.dataset_path, PathBuf::from("diabetes.csv"));

    let matches = test_command().get_matches_from(["test", "--model-type", "boosted"]);
    assert!(config_from_arguments(&matches).is_err());
}

#[test]
fn load_config_reports_bad_files() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_config(dir.path().join("absent.json")).is_err());

    let path = dir.path().join("bad.json");
    std::fs::write(&path, r#"{"test_fraction": 2.0}"#).unwrap();
    let err = load_config(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("test_fraction"));
}

#[test]
fn train_predict_and_metrics_end_to_end() {
    let (_dir, config) = scratch();

    let report = run_train(&config).unwrap();
    assert_eq!(report.n_test, 30);

    let high = ["5", "180", "95", "35", "200", "35.0", "1.5", "55"];
    match run_predict(&config, &high, false).unwrap() {
        PredictOutput::Prediction(p) => {
            assert_eq!(p.label == 1, p.probability >= 0.5);
        }
        other => panic!("expected plain prediction, got {:?}", other),
    }
    match run_predict(&config, &high, true).unwrap() {
        PredictOutput::Explanation(e) => assert_eq!(e.feature_impact.len(), 8),
        other => panic!("expected explanation, got {:?}", other),
    }
    assert!(run_predict(&config, &high[..7], false).is_err());

    let metrics = run_metrics(&config).unwrap();
    assert_eq!(metrics.model.fit_id, report.fit_id);
    assert_eq!(metrics.metrics.evaluation, report.evaluation);
}

#[test]
fn summary_counts_rows() {
    let (_dir, config) = scratch();
    let summary = run_summary(&config).unwrap();
    assert_eq!(summary.n_samples, 150);
    assert_eq!(summary.features.len(), 8);
}

#[test]
fn metrics_serve_the_configured_model_type() {
    let (_dir, config) = scratch();
    let rule_based = config.clone().with_model(ModelType::RuleBased);
    run_train(&rule_based).unwrap();

    let metrics = run_metrics(&rule_based).unwrap();
    assert_eq!(metrics.model.algorithm, "rule_based");

    let metrics = run_metrics(&config).unwrap();
    assert_eq!(metrics.model.algorithm, "random_forest");
    assert_eq!(metrics.model.parameters, config.model);
}
