//! CART decision tree for binary labels, grown with the Gini criterion.
//!
//! Nodes live in a flat arena; children are always pushed after their
//! parent, so every child index is greater than its parent's index.
use rand::rngs::StdRng;
use rand::seq::index;
use serde::{Deserialize, Serialize};

use crate::math::Array2;

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Number of features drawn (without replacement) at every split.
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum TreeNode {
    /// Samples with `x[feature] <= threshold` go left.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        positive_fraction: f64,
        n_samples: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
    /// Weighted impurity decrease per feature, normalized to sum to 1
    /// (all zeros when the tree never split).
    importances: Vec<f64>,
}

/// Gini impurity of a node with `n_pos` positives out of `n`.
#[inline]
pub(crate) fn gini(n_pos: usize, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let p = n_pos as f64 / n as f64;
    2.0 * p * (1.0 - p)
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct TreeBuilder<'a> {
    x: &'a Array2<f64>,
    y: &'a [u8],
    params: &'a TreeParams,
    rng: &'a mut StdRng,
    n_total: f64,
    nodes: Vec<TreeNode>,
    importances: Vec<f64>,
}

impl DecisionTree {
    /// Grow a tree on the rows named by `indices` (duplicates allowed, as
    /// produced by bootstrap sampling).
    pub fn fit(
        x: &Array2<f64>,
        y: &[u8],
        indices: Vec<usize>,
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let mut builder = TreeBuilder {
            x,
            y,
            params,
            rng,
            n_total: indices.len() as f64,
            nodes: Vec::new(),
            importances: vec![0.0; x.ncols()],
        };
        builder.grow(indices, 0);

        let total: f64 = builder.importances.iter().sum();
        if total > 0.0 {
            for v in builder.importances.iter_mut() {
                *v /= total;
            }
        }

        DecisionTree {
            nodes: builder.nodes,
            importances: builder.importances,
        }
    }

    /// Positive fraction of the leaf `row` falls into.
    pub fn leaf_value(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
                TreeNode::Leaf {
                    positive_fraction, ..
                } => return *positive_fraction,
            }
        }
    }

    /// This tree's 0/1 vote for `row`; an evenly split leaf votes 0.
    pub fn vote(&self, row: &[f64]) -> u8 {
        u8::from(self.leaf_value(row) > 0.5)
    }

    pub fn importances(&self) -> &[f64] {
        &self.importances
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[TreeNode], idx: usize) -> usize {
            match &nodes[idx] {
                TreeNode::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
                TreeNode::Leaf { .. } => 0,
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }

    /// Structural check for trees read back from disk.
    pub fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        if self.importances.len() != n_features {
            return Err(format!(
                "tree importances cover {} features, expected {}",
                self.importances.len(),
                n_features
            ));
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(format!("node {} splits on unknown feature {}", idx, feature));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {} has a non-finite threshold", idx));
                    }
                    for child in [left, right] {
                        if *child <= idx || *child >= self.nodes.len() {
                            return Err(format!("node {} has invalid child {}", idx, child));
                        }
                    }
                }
                TreeNode::Leaf {
                    positive_fraction, ..
                } => {
                    if !(0.0..=1.0).contains(positive_fraction) {
                        return Err(format!("leaf {} has fraction {}", idx, positive_fraction));
                    }
                }
            }
        }
        Ok(())
    }
}

impl TreeBuilder<'_> {
    fn grow(&mut self, indices: Vec<usize>, depth: usize) -> usize {
        let n = indices.len();
        let n_pos = indices.iter().filter(|&&i| self.y[i] == 1).count();
        let node_id = self.nodes.len();
        self.nodes.push(TreeNode::Leaf {
            positive_fraction: if n == 0 { 0.0 } else { n_pos as f64 / n as f64 },
            n_samples: n,
        });

        let impurity = gini(n_pos, n);
        let depth_exhausted = self.params.max_depth.is_some_and(|d| depth >= d);
        if depth_exhausted
            || impurity <= 0.0
            || n < self.params.min_samples_split
            || n < 2 * self.params.min_samples_leaf
        {
            return node_id;
        }

        let Some(split) = self.best_split(&indices, n_pos, impurity) else {
            return node_id;
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| self.x[(i, split.feature)] <= split.threshold);
        self.importances[split.feature] += (n as f64 / self.n_total) * split.gain;

        let left = self.grow(left_idx, depth + 1);
        let right = self.grow(right_idx, depth + 1);
        self.nodes[node_id] = TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node_id
    }

    /// Best Gini split over a random subset of features. Ties keep the
    /// first candidate found, so the result depends only on the rng state.
    fn best_split(&mut self, indices: &[usize], n_pos: usize, parent_impurity: f64) -> Option<SplitCandidate> {
        let n_features = self.x.ncols();
        let k = self.params.max_features.clamp(1, n_features);
        let candidates = index::sample(&mut *self.rng, n_features, k).into_vec();

        let n = indices.len();
        let min_leaf = self.params.min_samples_leaf;
        let mut best: Option<SplitCandidate> = None;
        let mut pairs: Vec<(f64, u8)> = Vec::with_capacity(n);

        for feature in candidates {
            pairs.clear();
            pairs.extend(indices.iter().map(|&i| (self.x[(i, feature)], self.y[i])));
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_pos = 0usize;
            for pos in 0..n - 1 {
                left_pos += pairs[pos].1 as usize;
                let n_left = pos + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }
                let (lo, hi) = (pairs[pos].0, pairs[pos + 1].0);
                if lo == hi {
                    continue;
                }

                let right_pos = n_pos - left_pos;
                let child_impurity = (n_left as f64 * gini(left_pos, n_left)
                    + n_right as f64 * gini(right_pos, n_right))
                    / n as f64;
                let gain = parent_impurity - child_impurity;

                if best.as_ref().map_or(true, |b| gain > b.gain) {
                    let mut threshold = lo + (hi - lo) / 2.0;
                    // adjacent floats: the midpoint may round up to `hi`
                    if threshold >= hi {
                        threshold = lo;
                    }
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        gain,
                    });
                }
            }
        }
        best
    }
}
