//! Decision tree ensemble backend.
//!
//! Trees are stored as flat node arrays with the root at index 0. A split
//! sends a sample left when `x[feature] <= threshold`. Children always sit at
//! higher indices than their parent, so traversal terminates.

use diarisk_core::{FeatureVector, InvalidInput, FEATURE_COUNT};
use serde::{Deserialize, Serialize};

use crate::{sigmoid, ArtifactError};

/// How per-tree leaf values combine into a positive-class probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Leaves hold probabilities, averaged across trees (random forest).
    #[default]
    Average,
    /// Leaves hold raw scores, summed with `base_score` then squashed (boosting).
    LogitSum,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    fn validate(&self, tree_idx: usize, aggregation: Aggregation) -> Result<(), ArtifactError> {
        if self.nodes.is_empty() {
            return Err(ArtifactError::Invalid(format!("tree {} has no nodes", tree_idx)));
        }

        let invalid = |node_idx: usize, reason: &str| {
            ArtifactError::Invalid(format!("tree {} node {}: {}", tree_idx, node_idx, reason))
        };

        for (idx, node) in self.nodes.iter().enumerate() {
            match *node {
                Node::Split { feature, threshold, left, right } => {
                    if feature >= FEATURE_COUNT {
                        return Err(invalid(idx, "feature index out of range"));
                    }
                    if threshold.is_nan() {
                        return Err(invalid(idx, "threshold is NaN"));
                    }
                    let in_range = |child: usize| child > idx && child < self.nodes.len();
                    if !in_range(left) || !in_range(right) {
                        return Err(invalid(idx, "child index must point forward within the tree"));
                    }
                }
                Node::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(invalid(idx, "leaf value is not finite"));
                    }
                    if aggregation == Aggregation::Average && !(0.0..=1.0).contains(&value) {
                        return Err(invalid(idx, "leaf probability outside [0, 1]"));
                    }
                }
            }
        }
        Ok(())
    }

    /// Walks from the root to a leaf and returns its value.
    pub fn leaf_value(&self, features: &FeatureVector) -> Result<f64, InvalidInput> {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(Node::Leaf { value }) => return Ok(*value),
                Some(Node::Split { feature, threshold, left, right }) => {
                    let x = features
                        .get(*feature)
                        .ok_or_else(|| InvalidInput::Model(format!("feature index {} out of range", feature)))?;
                    let next = if x <= *threshold { *left } else { *right };
                    if next <= idx {
                        return Err(InvalidInput::Model(format!("tree node {} loops back", idx)));
                    }
                    idx = next;
                }
                None => return Err(InvalidInput::Model(format!("tree node {} missing", idx))),
            }
        }
    }
}

/// An ensemble of decision trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEnsemble {
    pub trees: Vec<Tree>,
    #[serde(default)]
    pub aggregation: Aggregation,
    /// Starting score for [`Aggregation::LogitSum`]; ignored otherwise.
    #[serde(default)]
    pub base_score: f64,
}

impl TreeEnsemble {
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.trees.is_empty() {
            return Err(ArtifactError::Invalid("tree ensemble has no trees".into()));
        }
        if !self.base_score.is_finite() {
            return Err(ArtifactError::Invalid("base_score is not finite".into()));
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.validate(idx, self.aggregation)?;
        }
        Ok(())
    }

    pub fn predict_probability(&self, features: &FeatureVector) -> Result<[f64; 2], InvalidInput> {
        features.ensure_finite()?;

        if self.trees.is_empty() {
            return Err(InvalidInput::Model("tree ensemble has no trees".into()));
        }

        let mut total = 0.0;
        for tree in &self.trees {
            total += tree.leaf_value(features)?;
        }

        let p1 = match self.aggregation {
            Aggregation::Average => total / self.trees.len() as f64,
            Aggregation::LogitSum => sigmoid(self.base_score + total),
        };
        Ok([1.0 - p1, p1])
    }
}
