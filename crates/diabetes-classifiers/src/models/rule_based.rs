//! Deterministic scorer built from clinical risk thresholds.
//!
//! Works on raw clinical units, so its pipeline uses an identity scaler.
//! Nothing is learned: `fit` only checks the input shape.
use serde::{Deserialize, Serialize};

use crate::data_handling::N_FEATURES;
use crate::error::{PipelineError, Result};
use crate::math::Array2;
use crate::models::classifier_trait::ClassifierModel;

const PREGNANCIES: usize = 0;
const GLUCOSE: usize = 1;
const BLOOD_PRESSURE: usize = 2;
const SKIN_THICKNESS: usize = 3;
const INSULIN: usize = 4;
const BMI: usize = 5;
const PEDIGREE: usize = 6;
const AGE: usize = 7;

pub const MIN_PROBABILITY: f64 = 0.05;
pub const MAX_PROBABILITY: f64 = 0.95;

/// Fixed per-feature weights reported as importances.
pub const RULE_WEIGHTS: [f64; N_FEATURES] = [0.05, 0.40, 0.10, 0.03, 0.07, 0.20, 0.05, 0.10];

/// Bands per feature as `(lower bound, contribution)`, highest band first;
/// the first band the value reaches is the one that counts.
const BANDS: [(usize, &[(f64, f64)]); N_FEATURES] = [
    (GLUCOSE, &[(126.0, 0.40), (100.0, 0.20)]),
    (BMI, &[(30.0, 0.25), (25.0, 0.15)]),
    (AGE, &[(45.0, 0.15), (35.0, 0.08)]),
    (BLOOD_PRESSURE, &[(90.0, 0.10), (80.0, 0.05)]),
    (PEDIGREE, &[(0.5, 0.05), (0.3, 0.025)]),
    (INSULIN, &[(200.0, 0.02)]),
    (PREGNANCIES, &[(4.0, 0.015)]),
    (SKIN_THICKNESS, &[(35.0, 0.015)]),
];

/// Glucose below this is scored as hypoglycemic.
const HYPOGLYCEMIA_BELOW: f64 = 70.0;
const HYPOGLYCEMIA_WEIGHT: f64 = 0.10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleBasedClassifier {
    min_probability: f64,
    max_probability: f64,
}

impl Default for RuleBasedClassifier {
    fn default() -> Self {
        Self {
            min_probability: MIN_PROBABILITY,
            max_probability: MAX_PROBABILITY,
        }
    }
}

impl RuleBasedClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clamped risk probability for one sample in clinical units.
    pub fn score(&self, row: &[f64]) -> f64 {
        let mut prob = 0.0f64;
        for (feature, bands) in BANDS.iter() {
            let value = row[*feature];
            if let Some((_, weight)) = bands.iter().find(|(bound, _)| value >= *bound) {
                prob += *weight;
            } else if *feature == GLUCOSE && value < HYPOGLYCEMIA_BELOW {
                prob += HYPOGLYCEMIA_WEIGHT;
            }
        }
        prob.clamp(self.min_probability, self.max_probability)
    }

    /// Check clamp bounds of a scorer read back from disk.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let (lo, hi) = (self.min_probability, self.max_probability);
        if !(0.0..=1.0).contains(&lo) || !(0.0..=1.0).contains(&hi) || lo > hi {
            return Err(format!("invalid probability bounds [{}, {}]", lo, hi));
        }
        Ok(())
    }

    fn check_width(x: &Array2<f64>) -> Result<()> {
        if x.ncols() != N_FEATURES {
            return Err(PipelineError::InvalidFeature(format!(
                "expected {} features, got {}",
                N_FEATURES,
                x.ncols()
            )));
        }
        Ok(())
    }
}

impl ClassifierModel for RuleBasedClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<()> {
        Self::check_width(x)?;
        if x.nrows() != y.len() {
            return Err(PipelineError::Training(format!(
                "feature rows ({}) and labels ({}) differ in length",
                x.nrows(),
                y.len()
            )));
        }
        log::debug!("Rule-based scorer has fixed weights; nothing to fit");
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        Self::check_width(x)?;
        Ok(x.rows().map(|row| self.score(row)).collect())
    }

    fn feature_importances(&self) -> Result<Vec<f64>> {
        Ok(RULE_WEIGHTS.to_vec())
    }

    fn requires_standardized_input(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "rule_based"
    }
}
