//! Binary classification metrics on a held-out partition.
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// 2x2 confusion matrix with the positive class = 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub true_positive: usize,
}

impl ConfusionMatrix {
    pub fn from_predictions(y_true: &[u8], y_pred: &[u8]) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(PipelineError::Training(format!(
                "truth ({}) and predictions ({}) must have equal lengths",
                y_true.len(),
                y_pred.len()
            )));
        }
        let mut cm = ConfusionMatrix::default();
        for (&t, &p) in y_true.iter().zip(y_pred) {
            match (t, p) {
                (0, 0) => cm.true_negative += 1,
                (0, _) => cm.false_positive += 1,
                (_, 0) => cm.false_negative += 1,
                _ => cm.true_positive += 1,
            }
        }
        Ok(cm)
    }

    pub fn total(&self) -> usize {
        self.true_negative + self.false_positive + self.false_negative + self.true_positive
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positive + self.true_negative, self.total())
    }

    pub fn precision(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }

    pub fn f1(&self) -> f64 {
        f1(self.precision(), self.recall())
    }

    /// Rows are the true class, columns the predicted class.
    pub fn as_rows(&self) -> [[usize; 2]; 2] {
        [
            [self.true_negative, self.false_positive],
            [self.false_negative, self.true_positive],
        ]
    }

    /// Metrics with class 0 treated as the positive class.
    fn negative_class(&self) -> ClassMetrics {
        let precision = ratio(self.true_negative, self.true_negative + self.false_negative);
        let recall = ratio(self.true_negative, self.true_negative + self.false_positive);
        ClassMetrics {
            label: 0,
            precision,
            recall,
            f1: f1(precision, recall),
            support: self.true_negative + self.false_positive,
        }
    }

    fn positive_class(&self) -> ClassMetrics {
        ClassMetrics {
            label: 1,
            precision: self.precision(),
            recall: self.recall(),
            f1: self.f1(),
            support: self.true_positive + self.false_negative,
        }
    }
}

/// `num / den`, or 0 when the denominator is 0.
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: u8,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Evaluation of one model on one labelled partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub confusion_matrix: ConfusionMatrix,
    /// Per-class report, class 0 first.
    pub per_class: Vec<ClassMetrics>,
    pub n_samples: usize,
}

impl EvaluationReport {
    pub fn from_predictions(y_true: &[u8], y_pred: &[u8]) -> Result<Self> {
        let cm = ConfusionMatrix::from_predictions(y_true, y_pred)?;
        Ok(Self {
            accuracy: cm.accuracy(),
            precision: cm.precision(),
            recall: cm.recall(),
            f1_score: cm.f1(),
            per_class: vec![cm.negative_class(), cm.positive_class()],
            n_samples: cm.total(),
            confusion_matrix: cm,
        })
    }

    pub fn log(&self) {
        log::info!("Model Performance:");
        log::info!("Accuracy: {:.3}", self.accuracy);
        log::info!("Precision: {:.3}", self.precision);
        log::info!("Recall: {:.3}", self.recall);
        log::info!("F1-Score: {:.3}", self.f1_score);
        log::debug!("Confusion matrix [[tn, fp], [fn, tp]]: {:?}", self.confusion_matrix.as_rows());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_each_cell() {
        let cm = ConfusionMatrix::from_predictions(&[0, 0, 1, 1, 1], &[0, 1, 0, 1, 1]).unwrap();
        assert_eq!(cm.as_rows(), [[1, 1], [1, 2]]);
        assert!((cm.accuracy() - 0.6).abs() < 1e-12);
        assert!((cm.precision() - 2.0 / 3.0).abs() < 1e-12);
        assert!((cm.recall() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn zero_denominators_give_zero() {
        let cm = ConfusionMatrix::from_predictions(&[0, 0], &[0, 0]).unwrap();
        assert_eq!(cm.precision(), 0.0);
        assert_eq!(cm.recall(), 0.0);
        assert_eq!(cm.f1(), 0.0);
        assert_eq!(cm.accuracy(), 1.0);
    }

    #[test]
    fn length_mismatch_is_an_error() {
        assert!(ConfusionMatrix::from_predictions(&[0, 1], &[0]).is_err());
    }

    #[test]
    fn report_has_both_classes() {
        let report = EvaluationReport::from_predictions(&[0, 1, 1, 0], &[0, 1, 0, 0]).unwrap();
        assert_eq!(report.per_class.len(), 2);
        assert_eq!(report.per_class[0].support, 2);
        assert_eq!(report.per_class[1].support, 2);
        assert!((report.per_class[0].recall - 1.0).abs() < 1e-12);
        assert!((report.per_class[1].recall - 0.5).abs() < 1e-12);
        assert_eq!(report.n_samples, 4);
    }
}
