pub mod classifier_trait;
pub mod decision_tree;
pub mod factory;
pub mod random_forest;
pub mod rule_based;

pub use classifier_trait::{label_for, ClassifierModel, DECISION_THRESHOLD};
pub use factory::{build_model, ClassifierState};
pub use random_forest::{ForestParams, RandomForestClassifier};
pub use rule_based::RuleBasedClassifier;
