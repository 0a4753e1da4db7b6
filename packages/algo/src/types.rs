//! Common Types and Constants
//!
//! Shared constants and small value types used across the model modules.

use serde::{Deserialize, Serialize};

// ==================== Constants ====================

/// Numerical stability epsilon
pub const EPSILON: f64 = 1e-10;

/// Minimum regularization parameter
pub const MIN_LAMBDA: f64 = 1e-3;

/// Ridge term added to the normal equations of least squares fits
pub const RIDGE_LAMBDA: f64 = 1e-8;

/// Maximum feature absolute value accepted by the models
pub const MAX_FEATURE_ABS: f64 = 1e9;

/// Maximum Gram matrix entry
pub const MAX_GRAM: f64 = 1e15;

/// Euler-Mascheroni constant, used for average path length estimates
pub const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

// ==================== Model Types ====================

/// Impurity measure used when growing a tree
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitCriterion {
    /// Gini impurity over class frequencies
    Gini,
    /// Mean squared error around the node mean
    SquaredError,
}

/// Number of features examined at each split
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    #[default]
    All,
    Sqrt,
}

impl MaxFeatures {
    pub fn resolve(&self, n_features: usize) -> usize {
        match self {
            Self::All => n_features,
            Self::Sqrt => ((n_features as f64).sqrt() as usize).max(1),
        }
    }
}

/// Growth limits for a single decision tree
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    #[serde(default)]
    pub max_features: MaxFeatures,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
        }
    }
}

/// Feature/importance pair, sorted descending by callers
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}
