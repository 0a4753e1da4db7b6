//! Random forest: bootstrap-aggregated CART trees.
//!
//! Trees are grown in parallel with rayon. Each tree owns a ChaCha8 stream
//! derived from the forest seed and its index, so a fit is reproducible
//! regardless of thread scheduling.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::tree::{argmax, DecisionTree};
use crate::types::TreeParams;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub tree: TreeParams,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            tree: TreeParams::default(),
            bootstrap: true,
            seed: 42,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum ForestTask {
    Classification { n_classes: usize },
    Regression,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub task: ForestTask,
    pub trees: Vec<DecisionTree>,
}

fn tree_seed(seed: u64, index: usize) -> u64 {
    seed.wrapping_mul(0x9E37_79B9_7F4A_7C15).wrapping_add(index as u64)
}

fn draw_rows(n: usize, bootstrap: bool, rng: &mut ChaCha8Rng) -> Vec<usize> {
    if bootstrap {
        (0..n).map(|_| rng.gen_range(0..n)).collect()
    } else {
        (0..n).collect()
    }
}

impl RandomForest {
    pub fn fit_classifier(
        x: &[Vec<f64>],
        labels: &[usize],
        n_classes: usize,
        params: &ForestParams,
    ) -> Self {
        let n = x.len().min(labels.len());
        let trees = if n == 0 {
            Vec::new()
        } else {
            (0..params.n_estimators)
                .into_par_iter()
                .map(|i| {
                    let seed = tree_seed(params.seed, i);
                    let mut rng = ChaCha8Rng::seed_from_u64(seed);
                    let rows = draw_rows(n, params.bootstrap, &mut rng);
                    DecisionTree::fit_classifier_on(x, labels, n_classes, rows, &params.tree, seed)
                })
                .collect()
        };

        Self {
            task: ForestTask::Classification { n_classes },
            trees,
        }
    }

    pub fn fit_regressor(x: &[Vec<f64>], targets: &[f64], params: &ForestParams) -> Self {
        let n = x.len().min(targets.len());
        let trees = if n == 0 {
            Vec::new()
        } else {
            (0..params.n_estimators)
                .into_par_iter()
                .map(|i| {
                    let seed = tree_seed(params.seed, i);
                    let mut rng = ChaCha8Rng::seed_from_u64(seed);
                    let rows = draw_rows(n, params.bootstrap, &mut rng);
                    DecisionTree::fit_regressor_on(x, targets, rows, &params.tree, seed)
                })
                .collect()
        };

        Self {
            task: ForestTask::Regression,
            trees,
        }
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Every tree is well formed and agrees with the task's output width.
    pub fn is_well_formed(&self) -> bool {
        let n_outputs = match self.task {
            ForestTask::Classification { n_classes } => n_classes,
            ForestTask::Regression => 1,
        };
        self.trees
            .iter()
            .all(|t| t.n_outputs == n_outputs && t.is_well_formed())
    }

    /// Mean of per-tree class frequencies.
    pub fn predict_proba(&self, row: &[f64]) -> Vec<f64> {
        let n_classes = match self.task {
            ForestTask::Classification { n_classes } => n_classes.max(1),
            ForestTask::Regression => 1,
        };
        if self.trees.is_empty() {
            return vec![1.0 / n_classes as f64; n_classes];
        }

        let mut acc = vec![0.0; n_classes];
        for tree in &self.trees {
            for (a, p) in acc.iter_mut().zip(tree.predict_proba(row)) {
                *a += p;
            }
        }
        let count = self.trees.len() as f64;
        acc.into_iter().map(|a| a / count).collect()
    }

    pub fn predict_class(&self, row: &[f64]) -> usize {
        argmax(&self.predict_proba(row))
    }

    /// Mean of per-tree leaf values.
    pub fn predict_value(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        self.trees.iter().map(|t| t.predict_value(row)).sum::<f64>() / self.trees.len() as f64
    }

    pub fn feature_importances(&self) -> Vec<f64> {
        let Some(first) = self.trees.first() else {
            return Vec::new();
        };
        let mut acc = vec![0.0; first.n_features];
        for tree in &self.trees {
            for (a, v) in acc.iter_mut().zip(tree.feature_importances.iter()) {
                *a += v;
            }
        }
        let count = self.trees.len() as f64;
        acc.into_iter().map(|a| a / count).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MaxFeatures;

    fn params(n: usize) -> ForestParams {
        ForestParams {
            n_estimators: n,
            tree: TreeParams {
                max_depth: Some(6),
                max_features: MaxFeatures::Sqrt,
                ..TreeParams::default()
            },
            bootstrap: true,
            seed: 42,
        }
    }

    #[test]
    fn test_classifier_learns_threshold_rule() {
        let x: Vec<Vec<f64>> = (0..200)
            .map(|i| vec![(i % 50) as f64, (i % 7) as f64])
            .collect();
        let y: Vec<usize> = x.iter().map(|r| usize::from(r[0] > 25.0)).collect();
        let forest = RandomForest::fit_classifier(&x, &y, 2, &params(20));

        assert_eq!(forest.trees.len(), 20);
        assert_eq!(forest.predict_class(&[45.0, 3.0]), 1);
        assert_eq!(forest.predict_class(&[3.0, 3.0]), 0);
        let proba = forest.predict_proba(&[45.0, 3.0]);
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_regressor_tracks_linear_target() {
        let x: Vec<Vec<f64>> = (0..100).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = x.iter().map(|r| r[0] * 2.0).collect();
        let forest = RandomForest::fit_regressor(&x, &y, &params(10));

        let low = forest.predict_value(&[10.0]);
        let high = forest.predict_value(&[90.0]);
        assert!(high > low);
        assert!((high - 180.0).abs() < 20.0);
    }

    #[test]
    fn test_fit_is_reproducible() {
        let x: Vec<Vec<f64>> = (0..60).map(|i| vec![i as f64, (i * 3 % 11) as f64]).collect();
        let y: Vec<usize> = (0..60).map(|i| i % 3).collect();
        let a = RandomForest::fit_classifier(&x, &y, 3, &params(8));
        let b = RandomForest::fit_classifier(&x, &y, 3, &params(8));
        assert_eq!(a, b);
    }

    #[test]
    fn test_fitted_forest_is_well_formed() {
        let x: Vec<Vec<f64>> = (0..40).map(|i| vec![i as f64]).collect();
        let y: Vec<usize> = (0..40).map(|i| usize::from(i >= 20)).collect();
        let mut forest = RandomForest::fit_classifier(&x, &y, 2, &params(4));
        assert!(forest.is_well_formed());

        forest.task = ForestTask::Classification { n_classes: 3 };
        assert!(!forest.is_well_formed());
    }

    #[test]
    fn test_unfitted_forest_defaults() {
        let forest = RandomForest::fit_classifier(&[], &[], 2, &params(5));
        assert!(!forest.is_fitted());
        assert_eq!(forest.predict_proba(&[1.0]), vec![0.5, 0.5]);
        assert_eq!(forest.predict_value(&[1.0]), 0.0);
        assert!(forest.feature_importances().is_empty());
    }
}
