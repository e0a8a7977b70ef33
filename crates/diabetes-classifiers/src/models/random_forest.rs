use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{MaxFeatures, ModelType};
use crate::error::{PipelineError, Result};
use crate::math::Array2;
use crate::models::classifier_trait::ClassifierModel;
use crate::models::decision_tree::{DecisionTree, TreeParams};

/// Hyper-parameters of the bagged ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            seed: 42,
        }
    }
}

impl ForestParams {
    /// Extract forest parameters from a `ModelType`, if it describes a forest.
    pub fn from_model_type(model_type: &ModelType) -> Option<Self> {
        match model_type {
            ModelType::RandomForest {
                n_estimators,
                max_depth,
                min_samples_split,
                min_samples_leaf,
                max_features,
                seed,
            } => Some(Self {
                n_estimators: *n_estimators,
                max_depth: *max_depth,
                min_samples_split: *min_samples_split,
                min_samples_leaf: *min_samples_leaf,
                max_features: *max_features,
                seed: *seed,
            }),
            ModelType::RuleBased => None,
        }
    }

    pub fn to_model_type(&self) -> ModelType {
        ModelType::RandomForest {
            n_estimators: self.n_estimators,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            max_features: self.max_features,
            seed: self.seed,
        }
    }
}

/// Bootstrap-aggregated CART trees voting on a binary label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    params: ForestParams,
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForestClassifier {
    pub fn new(params: ForestParams) -> Self {
        RandomForestClassifier {
            params,
            n_features: 0,
            trees: Vec::new(),
        }
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Structural check for a forest read back from disk.
    pub fn validate(&self, n_features: usize) -> std::result::Result<(), String> {
        if !self.is_fitted() {
            return Err("forest has no trees".to_string());
        }
        if self.n_features != n_features {
            return Err(format!(
                "forest was trained on {} features, expected {}",
                self.n_features, n_features
            ));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(n_features).map_err(|e| format!("tree {}: {}", i, e))?;
        }
        Ok(())
    }

    fn check_input(&self, x: &Array2<f64>) -> Result<()> {
        if !self.is_fitted() {
            return Err(PipelineError::NotFitted("RandomForestClassifier"));
        }
        if x.ncols() != self.n_features {
            return Err(PipelineError::InvalidFeature(format!(
                "expected {} features, got {}",
                self.n_features,
                x.ncols()
            )));
        }
        Ok(())
    }
}

impl ClassifierModel for RandomForestClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<()> {
        let (n, n_features) = x.shape();
        if n == 0 || n_features == 0 {
            return Err(PipelineError::Training(
                "cannot fit a forest on an empty matrix".to_string(),
            ));
        }
        if n != y.len() {
            return Err(PipelineError::Training(format!(
                "feature rows ({}) and labels ({}) differ in length",
                n,
                y.len()
            )));
        }
        if self.params.n_estimators == 0 {
            return Err(PipelineError::InvalidConfig(
                "n_estimators must be at least 1".to_string(),
            ));
        }

        let tree_params = TreeParams {
            max_depth: self.params.max_depth,
            min_samples_split: self.params.min_samples_split.max(2),
            min_samples_leaf: self.params.min_samples_leaf.max(1),
            max_features: self.params.max_features.resolve(n_features),
        };

        // Per-tree seeds come from one master stream, so the forest is the
        // same no matter how rayon schedules the trees.
        let mut master = StdRng::seed_from_u64(self.params.seed);
        let seeds: Vec<u64> = (0..self.params.n_estimators).map(|_| master.gen()).collect();

        log::debug!(
            "Fitting {} trees on {} samples x {} features (max_features={}, seed={})",
            seeds.len(),
            n,
            n_features,
            tree_params.max_features,
            self.params.seed
        );

        let trees: Vec<DecisionTree> = seeds
            .par_iter()
            .map(|&seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                DecisionTree::fit(x, y, bootstrap, &tree_params, &mut rng)
            })
            .collect();

        if log::log_enabled!(log::Level::Trace) {
            let max_depth = trees.iter().map(|t| t.depth()).max().unwrap_or(0);
            let nodes: usize = trees.iter().map(|t| t.n_nodes()).sum();
            log::trace!("Forest grown: {} nodes total, deepest tree {}", nodes, max_depth);
        }

        self.trees = trees;
        self.n_features = n_features;
        Ok(())
    }

    /// Fraction of trees voting positive.
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        self.check_input(x)?;
        let n_trees = self.trees.len() as f64;
        Ok(x.rows()
            .map(|row| {
                let votes: usize = self.trees.iter().map(|t| t.vote(row) as usize).sum();
                votes as f64 / n_trees
            })
            .collect())
    }

    /// Mean decrease in impurity, averaged over trees and renormalized.
    /// Uniform when no tree made a split.
    fn feature_importances(&self) -> Result<Vec<f64>> {
        if !self.is_fitted() {
            return Err(PipelineError::NotFitted("RandomForestClassifier"));
        }
        let mut totals = vec![0.0f64; self.n_features];
        for tree in &self.trees {
            for (t, v) in totals.iter_mut().zip(tree.importances()) {
                *t += v;
            }
        }
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            Ok(totals.into_iter().map(|v| v / sum).collect())
        } else {
            Ok(vec![1.0 / self.n_features as f64; self.n_features])
        }
    }

    fn name(&self) -> &str {
        "random_forest"
    }
}
