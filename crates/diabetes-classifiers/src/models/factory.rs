use serde::{Deserialize, Serialize};

use crate::config::ModelType;
use crate::error::Result;
use crate::math::Array2;
use crate::models::classifier_trait::ClassifierModel;
use crate::models::random_forest::{ForestParams, RandomForestClassifier};
use crate::models::rule_based::RuleBasedClassifier;

/// Serializable classifier state: whichever variant the configuration
/// selected. Dispatches the `ClassifierModel` contract to the variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierState {
    RandomForest(RandomForestClassifier),
    RuleBased(RuleBasedClassifier),
}

impl ClassifierState {
    /// Structural check for state read back from disk.
    pub fn validate(&self, n_features: usize) -> std::result::Result<(), String> {
        match self {
            ClassifierState::RandomForest(m) => m.validate(n_features),
            ClassifierState::RuleBased(m) => m.validate(),
        }
    }

    /// The `ModelType` this state was built from.
    pub fn model_type(&self) -> ModelType {
        match self {
            ClassifierState::RandomForest(m) => m.params().to_model_type(),
            ClassifierState::RuleBased(_) => ModelType::RuleBased,
        }
    }

    fn inner(&self) -> &dyn ClassifierModel {
        match self {
            ClassifierState::RandomForest(m) => m,
            ClassifierState::RuleBased(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn ClassifierModel {
        match self {
            ClassifierState::RandomForest(m) => m,
            ClassifierState::RuleBased(m) => m,
        }
    }
}

impl ClassifierModel for ClassifierState {
    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<()> {
        self.inner_mut().fit(x, y)
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        self.inner().predict_proba(x)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<u8>> {
        self.inner().predict(x)
    }

    fn feature_importances(&self) -> Result<Vec<f64>> {
        self.inner().feature_importances()
    }

    fn requires_standardized_input(&self) -> bool {
        self.inner().requires_standardized_input()
    }

    fn name(&self) -> &str {
        self.inner().name()
    }
}

/// Build an unfitted classifier from a `ModelType`.
pub fn build_model(model_type: &ModelType) -> ClassifierState {
    match ForestParams::from_model_type(model_type) {
        Some(params) => ClassifierState::RandomForest(RandomForestClassifier::new(params)),
        None => ClassifierState::RuleBased(RuleBasedClassifier::new()),
    }
}
