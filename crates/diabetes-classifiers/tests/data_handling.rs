mod common;

use diabetes_classifiers::data_handling::{FEATURE_NAMES, N_FEATURES};
use diabetes_classifiers::error::PipelineError;
use diabetes_classifiers::io::read_dataset;

const HEADER: &str =
    "Pregnancies,Glucose,BloodPressure,SkinThickness,Insulin,BMI,DiabetesPedigreeFunction,Age,Outcome";

fn assert_data_load(result: diabetes_classifiers::Result<diabetes_classifiers::Dataset>) -> String {
    match result {
        Err(e @ PipelineError::DataLoad { .. }) => e.to_string(),
        other => panic!("expected DataLoad error, got {:?}", other.map(|d| d.len())),
    }
}

#[test]
fn reads_generated_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("diabetes.csv");
    common::write_dataset(&path, 120, 3);

    let data = read_dataset(&path).unwrap();
    assert_eq!(data.len(), 120);
    assert_eq!(data.x.ncols(), N_FEATURES);
    assert!(data.n_positive() > 0 && data.n_positive() < 120);
}

#[test]
fn reads_tab_separated_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("diabetes.tsv");
    common::write_dataset(&path, 30, 3);
    assert_eq!(read_dataset(&path).unwrap().len(), 30);
}

#[test]
fn reorders_columns_into_canonical_order() {
    let dir = tempfile::tempdir().unwrap();
    let content = "Outcome,Age,DiabetesPedigreeFunction,BMI,Insulin,SkinThickness,BloodPressure,Glucose,Pregnancies\n\
                   1,50,0.6,33.1,0,30,72,148,6\n";
    let path = common::write_text(dir.path(), "shuffled.csv", content);

    let data = read_dataset(&path).unwrap();
    assert_eq!(data.x.row_slice(0), &[6.0, 148.0, 72.0, 30.0, 0.0, 33.1, 0.6, 50.0]);
    assert_eq!(data.y, vec![1]);
}

#[test]
fn missing_file_is_a_data_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let msg = assert_data_load(read_dataset(dir.path().join("absent.csv")));
    assert!(msg.contains("does not exist"));
}

#[test]
fn wrong_header_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let content = "Pregnancies,Glucose,BloodPressure,SkinThickness,Insulin,BMI,Age,Outcome\n1,2,3,4,5,6,7,0\n";
    let path = common::write_text(dir.path(), "short.csv", content);
    assert_data_load(read_dataset(&path));

    let renamed = HEADER.replace("Glucose", "Glucose_mg");
    let path = common::write_text(dir.path(), "renamed.csv", &format!("{}\n1,2,3,4,5,6,7,8,0\n", renamed));
    let msg = assert_data_load(read_dataset(&path));
    assert!(msg.contains(FEATURE_NAMES[1]));
}

#[test]
fn non_numeric_and_blank_cells_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_text(
        dir.path(),
        "text.csv",
        &format!("{}\n1,85,66,29,0,26.6,0.351,31,0\n1,high,66,29,0,26.6,0.351,31,0\n", HEADER),
    );
    let msg = assert_data_load(read_dataset(&path));
    assert!(msg.contains("line 3"), "{}", msg);

    let path = common::write_text(
        dir.path(),
        "blank.csv",
        &format!("{}\n1,85,,29,0,26.6,0.351,31,0\n", HEADER),
    );
    assert_data_load(read_dataset(&path));
}

#[test]
fn outcome_must_be_binary() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_text(
        dir.path(),
        "outcome.csv",
        &format!("{}\n1,85,66,29,0,26.6,0.351,31,2\n", HEADER),
    );
    let msg = assert_data_load(read_dataset(&path));
    assert!(msg.contains("outcome"));
}

#[test]
fn header_only_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_text(dir.path(), "empty.csv", &format!("{}\n", HEADER));
    let msg = assert_data_load(read_dataset(&path));
    assert!(msg.contains("no data rows"));
}

#[test]
fn split_is_reproducible() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("diabetes.csv");
    common::write_dataset(&path, 101, 11);
    let data = read_dataset(&path).unwrap();

    let (train_a, test_a) = data.train_test_split(0.2, 42).unwrap();
    let (train_b, test_b) = data.train_test_split(0.2, 42).unwrap();
    assert_eq!(test_a.len(), 21);
    assert_eq!(train_a.len(), 80);
    assert_eq!(test_a.x, test_b.x);
    assert_eq!(train_a.y, train_b.y);

    let (_, test_c) = data.train_test_split(0.2, 43).unwrap();
    assert_ne!(test_a.x, test_c.x);
}

#[test]
fn summary_reports_class_balance() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("diabetes.csv");
    common::write_dataset(&path, 200, 5);
    let data = read_dataset(&path).unwrap();

    let summary = data.summary();
    assert_eq!(summary.n_samples, 200);
    assert_eq!(summary.n_positive + summary.n_negative, 200);
    assert_eq!(summary.features.len(), N_FEATURES);
    let glucose = &summary.features[1];
    assert_eq!(glucose.name, "Glucose");
    assert!(glucose.min >= 70.0 && glucose.max <= 200.0);
    assert!(glucose.min <= glucose.median && glucose.median <= glucose.max);
}
