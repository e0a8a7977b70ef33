//! Inference-side value types: validated inputs and prediction outputs.
use serde::{Deserialize, Serialize};

use crate::data_handling::{FEATURE_NAMES, N_FEATURES};
use crate::error::{PipelineError, Result};

/// One sample's eight clinical features in canonical order.
///
/// Construction rejects a wrong count, non-numeric text, non-finite and
/// negative values, so every `FeatureVector` can be fed to a model as is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector([f64; N_FEATURES]);

impl FeatureVector {
    pub fn new(values: [f64; N_FEATURES]) -> Result<Self> {
        for (value, name) in values.iter().zip(FEATURE_NAMES.iter()) {
            if !value.is_finite() {
                return Err(PipelineError::InvalidFeature(format!(
                    "{} must be a finite number, got {}",
                    name, value
                )));
            }
            if *value < 0.0 {
                return Err(PipelineError::InvalidFeature(format!(
                    "{} must not be negative, got {}",
                    name, value
                )));
            }
        }
        Ok(FeatureVector(values))
    }

    /// Parse text fields (e.g. form or CLI input) into a feature vector.
    pub fn parse_fields<S: AsRef<str>>(fields: &[S]) -> Result<Self> {
        if fields.len() != N_FEATURES {
            return Err(wrong_count(fields.len()));
        }
        let mut values = [0.0; N_FEATURES];
        for ((slot, field), name) in values.iter_mut().zip(fields).zip(FEATURE_NAMES.iter()) {
            let raw = field.as_ref().trim();
            *slot = raw.parse::<f64>().map_err(|_| {
                PipelineError::InvalidFeature(format!("{} is not numeric: '{}'", name, raw))
            })?;
        }
        Self::new(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn values(&self) -> [f64; N_FEATURES] {
        self.0
    }
}

impl TryFrom<&[f64]> for FeatureVector {
    type Error = PipelineError;

    fn try_from(values: &[f64]) -> Result<Self> {
        let values: [f64; N_FEATURES] = values.try_into().map_err(|_| wrong_count(values.len()))?;
        Self::new(values)
    }
}

fn wrong_count(found: usize) -> PipelineError {
    PipelineError::InvalidFeature(format!(
        "expected {} features ({}), got {}",
        N_FEATURES,
        FEATURE_NAMES.join(", "),
        found
    ))
}

/// Coarse risk band derived from the positive-class probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// High above 0.7, Medium above 0.4, Low otherwise.
    pub fn from_probability(probability: f64) -> Self {
        if probability > 0.7 {
            RiskLevel::High
        } else if probability > 0.4 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// 1 = diabetes predicted.
    pub label: u8,
    /// Probability of the positive class, in [0, 1].
    pub probability: f64,
}

impl PredictionResult {
    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_probability(self.probability)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImpact {
    pub name: String,
    pub value: f64,
    /// Value as the model saw it (after scaling).
    pub scaled_value: f64,
    pub importance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionExplanation {
    pub prediction: u8,
    pub probability_no_diabetes: f64,
    pub probability_diabetes: f64,
    /// Probability of the predicted class.
    pub model_confidence: f64,
    pub risk_level: RiskLevel,
    pub feature_impact: Vec<FeatureImpact>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_fields_accepts_padded_numbers() {
        let fv = FeatureVector::parse_fields(&["1", " 85", "66", "29", "0", "26.6", "0.351", "31 "]).unwrap();
        assert_eq!(fv.values()[5], 26.6);
    }

    #[test]
    fn parse_fields_rejects_text() {
        let err = FeatureVector::parse_fields(&["1", "high", "66", "29", "0", "26.6", "0.351", "31"]).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidFeature(_)));
    }

    #[test]
    fn rejects_wrong_count() {
        let err = FeatureVector::try_from(&[1.0; 7][..]).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidFeature(_)));
    }

    #[test]
    fn rejects_non_finite_and_negative() {
        let mut values = [1.0; N_FEATURES];
        values[2] = f64::NAN;
        assert!(FeatureVector::new(values).is_err());
        values[2] = -3.0;
        assert!(FeatureVector::new(values).is_err());
    }

    #[test]
    fn risk_bands() {
        assert_eq!(RiskLevel::from_probability(0.2), RiskLevel::Low);
        assert_eq!(RiskLevel::from_probability(0.4), RiskLevel::Low);
        assert_eq!(RiskLevel::from_probability(0.55), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_probability(0.71), RiskLevel::High);
    }
}
