//! Tree-ensemble regressor loaded from a JSON export.
//!
//! The collapse model is a random-forest regressor. Its trees are exported as
//! nested JSON nodes:
//!
//! ```json
//! {
//!   "n_features": 8,
//!   "trees": [
//!     { "root": { "feature": 1, "threshold": 0.42,
//!                 "left": { "leaf": 0.18 }, "right": { "leaf": 0.77 } } }
//!   ]
//! }
//! ```
//!
//! A sample goes left when `x[feature] <= threshold`. The ensemble prediction
//! is the mean of all tree outputs.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use super::{read_json_artifact, Regressor};
use crate::error::{EwclError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Leaf {
        leaf: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    pub root: TreeNode,
}

impl RegressionTree {
    /// Walk to a leaf. `None` when a split reads past the end of `sample`.
    pub fn predict(&self, sample: &[f64]) -> Option<f64> {
        let mut node = &self.root;
        loop {
            match node {
                TreeNode::Leaf { leaf } => return Some(*leaf),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if *sample.get(*feature)? <= *threshold {
                        &**left
                    } else {
                        &**right
                    };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        node_depth(&self.root)
    }
}

fn node_depth(node: &TreeNode) -> usize {
    match node {
        TreeNode::Leaf { .. } => 1,
        TreeNode::Split { left, right, .. } => 1 + node_depth(left).max(node_depth(right)),
    }
}

fn validate_node(node: &TreeNode, n_features: usize) -> std::result::Result<(), String> {
    match node {
        TreeNode::Leaf { leaf } => {
            if !leaf.is_finite() {
                return Err("leaf value is not finite".to_string());
            }
        }
        TreeNode::Split {
            feature,
            threshold,
            left,
            right,
        } => {
            if *feature >= n_features {
                return Err(format!(
                    "split feature {feature} out of range for n_features {n_features}"
                ));
            }
            if threshold.is_nan() {
                return Err("split threshold is NaN".to_string());
            }
            validate_node(left, n_features)?;
            validate_node(right, n_features)?;
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEnsemble {
    pub n_features: usize,
    pub trees: Vec<RegressionTree>,

    /// Optional free-form metadata (training info, feature names, etc).
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl TreeEnsemble {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let model: Self = read_json_artifact(path)?;
        model.validate().map_err(|e| {
            EwclError::ModelUnavailable(format!("invalid tree ensemble {}: {e}", path.display()))
        })?;
        debug!(
            path = %path.display(),
            trees = model.trees.len(),
            max_depth = model.max_depth(),
            "Loaded tree ensemble"
        );
        Ok(model)
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.n_features == 0 {
            return Err("n_features must be > 0".to_string());
        }
        if self.trees.is_empty() {
            return Err("trees must not be empty".to_string());
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            validate_node(&tree.root, self.n_features).map_err(|e| format!("tree[{idx}]: {e}"))?;
        }
        Ok(())
    }

    pub fn max_depth(&self) -> usize {
        self.trees.iter().map(RegressionTree::depth).max().unwrap_or(0)
    }
}

impl Regressor for TreeEnsemble {
    fn input_dim(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: &[f64]) -> Result<f64> {
        if features.len() != self.n_features {
            return Err(EwclError::ShapeMismatch {
                expected: self.n_features,
                got: features.len(),
            });
        }
        if self.trees.is_empty() {
            return Err(EwclError::Prediction("tree ensemble has no trees".to_string()));
        }
        let mut sum = 0.0;
        for (idx, tree) in self.trees.iter().enumerate() {
            sum += tree.predict(features).ok_or_else(|| {
                EwclError::Prediction(format!("tree[{idx}] splits on a missing feature"))
            })?;
        }
        Ok(sum / self.trees.len() as f64)
    }

    fn kind(&self) -> &'static str {
        "forest"
    }
}
