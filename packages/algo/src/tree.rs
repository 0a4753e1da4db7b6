//! CART decision tree
//!
//! Binary axis-aligned splits chosen greedily by impurity decrease:
//! - classification: Gini impurity, leaves store class frequencies
//! - regression: squared error, leaves store the node mean
//!
//! Split thresholds are midpoints between consecutive distinct feature values
//! and a sample goes left when `x[feature] <= threshold`.

use rand::seq::index::sample;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::types::{SplitCriterion, TreeParams};

/// Impurity below which a node is considered pure
const PURE_IMPURITY: f64 = 1e-12;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    Leaf {
        value: Vec<f64>,
        samples: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        samples: usize,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub criterion: SplitCriterion,
    pub n_features: usize,
    /// Class count for classification, 1 for regression
    pub n_outputs: usize,
    pub nodes: Vec<TreeNode>,
    pub feature_importances: Vec<f64>,
}

#[derive(Clone, Copy)]
enum Targets<'a> {
    Classes { labels: &'a [usize], n_classes: usize },
    Values(&'a [f64]),
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    decrease: f64,
}

struct Builder<'a> {
    x: &'a [Vec<f64>],
    targets: Targets<'a>,
    params: &'a TreeParams,
    n_features: usize,
    features_per_split: usize,
    rng: ChaCha8Rng,
    nodes: Vec<TreeNode>,
    importances: Vec<f64>,
}

impl<'a> Builder<'a> {
    fn new(x: &'a [Vec<f64>], targets: Targets<'a>, params: &'a TreeParams, seed: u64) -> Self {
        let n_features = x.first().map(|row| row.len()).unwrap_or(0);
        Self {
            x,
            targets,
            params,
            n_features,
            features_per_split: params.max_features.resolve(n_features).min(n_features),
            rng: ChaCha8Rng::seed_from_u64(seed),
            nodes: Vec::new(),
            importances: vec![0.0; n_features],
        }
    }

    fn n_outputs(&self) -> usize {
        match self.targets {
            Targets::Classes { n_classes, .. } => n_classes,
            Targets::Values(_) => 1,
        }
    }

    /// Per-sample impurity of a node (Gini or variance)
    fn impurity(&self, indices: &[usize]) -> f64 {
        let n = indices.len() as f64;
        if n == 0.0 {
            return 0.0;
        }
        match self.targets {
            Targets::Classes { labels, n_classes } => {
                let mut counts = vec![0.0; n_classes];
                for &i in indices {
                    counts[labels[i]] += 1.0;
                }
                gini(&counts, n)
            }
            Targets::Values(values) => {
                let (sum, sq) = indices.iter().fold((0.0, 0.0), |(s, q), &i| {
                    (s + values[i], q + values[i] * values[i])
                });
                (sq / n - (sum / n).powi(2)).max(0.0)
            }
        }
    }

    fn leaf_value(&self, indices: &[usize]) -> Vec<f64> {
        let n = indices.len().max(1) as f64;
        match self.targets {
            Targets::Classes { labels, n_classes } => {
                let mut counts = vec![0.0; n_classes];
                for &i in indices {
                    counts[labels[i]] += 1.0;
                }
                counts.into_iter().map(|c| c / n).collect()
            }
            Targets::Values(values) => {
                vec![indices.iter().map(|&i| values[i]).sum::<f64>() / n]
            }
        }
    }

    fn candidate_features(&mut self) -> Vec<usize> {
        if self.features_per_split >= self.n_features {
            (0..self.n_features).collect()
        } else {
            let mut picked = sample(&mut self.rng, self.n_features, self.features_per_split).into_vec();
            picked.sort_unstable();
            picked
        }
    }

    fn best_split(&mut self, indices: &[usize], parent_impurity: f64) -> Option<SplitCandidate> {
        let n = indices.len();
        let min_leaf = self.params.min_samples_leaf.max(1);
        let parent_weighted = parent_impurity * n as f64;
        let mut best: Option<SplitCandidate> = None;

        for feature in self.candidate_features() {
            let mut sorted: Vec<(f64, usize)> =
                indices.iter().map(|&i| (self.x[i][feature], i)).collect();
            sorted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

            if sorted[0].0 == sorted[n - 1].0 {
                continue;
            }

            let mut sweep = Sweep::new(self.targets, &sorted);
            for pos in 0..(n - 1) {
                sweep.move_left(sorted[pos].1);
                let left_n = pos + 1;
                let right_n = n - left_n;
                if left_n < min_leaf || right_n < min_leaf {
                    continue;
                }
                let (value, next) = (sorted[pos].0, sorted[pos + 1].0);
                if value == next {
                    continue;
                }

                let decrease = parent_weighted - sweep.children_weighted_impurity(left_n, right_n);
                if best.as_ref().map_or(true, |b| decrease > b.decrease) {
                    let mut threshold = (value + next) / 2.0;
                    if threshold >= next {
                        threshold = value;
                    }
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        decrease,
                    });
                }
            }
        }

        best.filter(|b| b.decrease > PURE_IMPURITY)
    }

    fn build(&mut self, indices: &mut [usize], depth: usize) -> usize {
        let n = indices.len();
        let node_id = self.nodes.len();
        self.nodes.push(TreeNode::Leaf {
            value: self.leaf_value(indices),
            samples: n,
        });

        let impurity = self.impurity(indices);
        let depth_allowed = self.params.max_depth.map_or(true, |max| depth < max);
        let min_leaf = self.params.min_samples_leaf.max(1);
        if !depth_allowed
            || n < self.params.min_samples_split.max(2)
            || n < 2 * min_leaf
            || impurity <= PURE_IMPURITY
        {
            return node_id;
        }

        let Some(split) = self.best_split(indices, impurity) else {
            return node_id;
        };

        let x = self.x;
        let mut mid = 0;
        for k in 0..n {
            if x[indices[k]][split.feature] <= split.threshold {
                indices.swap(k, mid);
                mid += 1;
            }
        }
        if mid == 0 || mid == n {
            return node_id;
        }

        self.importances[split.feature] += split.decrease;
        let (left_indices, right_indices) = indices.split_at_mut(mid);
        let left = self.build(left_indices, depth + 1);
        let right = self.build(right_indices, depth + 1);

        self.nodes[node_id] = TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
            samples: n,
        };
        node_id
    }
}

/// Incremental left/right statistics while sweeping a sorted feature column
enum Sweep<'a> {
    Classes {
        labels: &'a [usize],
        left: Vec<f64>,
        right: Vec<f64>,
    },
    Values {
        values: &'a [f64],
        left_sum: f64,
        left_sq: f64,
        right_sum: f64,
        right_sq: f64,
    },
}

impl<'a> Sweep<'a> {
    fn new(targets: Targets<'a>, sorted: &[(f64, usize)]) -> Self {
        match targets {
            Targets::Classes { labels, n_classes } => {
                let mut right = vec![0.0; n_classes];
                for &(_, i) in sorted {
                    right[labels[i]] += 1.0;
                }
                Self::Classes {
                    labels,
                    left: vec![0.0; n_classes],
                    right,
                }
            }
            Targets::Values(values) => {
                let (sum, sq) = sorted.iter().fold((0.0, 0.0), |(s, q), &(_, i)| {
                    (s + values[i], q + values[i] * values[i])
                });
                Self::Values {
                    values,
                    left_sum: 0.0,
                    left_sq: 0.0,
                    right_sum: sum,
                    right_sq: sq,
                }
            }
        }
    }

    fn move_left(&mut self, sample_idx: usize) {
        match self {
            Self::Classes {
                labels,
                left,
                right,
            } => {
                let class = labels[sample_idx];
                left[class] += 1.0;
                right[class] -= 1.0;
            }
            Self::Values {
                values,
                left_sum,
                left_sq,
                right_sum,
                right_sq,
            } => {
                let v = values[sample_idx];
                *left_sum += v;
                *left_sq += v * v;
                *right_sum -= v;
                *right_sq -= v * v;
            }
        }
    }

    fn children_weighted_impurity(&self, left_n: usize, right_n: usize) -> f64 {
        let (ln, rn) = (left_n as f64, right_n as f64);
        match self {
            Self::Classes { left, right, .. } => ln * gini(left, ln) + rn * gini(right, rn),
            Self::Values {
                left_sum,
                left_sq,
                right_sum,
                right_sq,
                ..
            } => {
                let left_sse = (left_sq - left_sum * left_sum / ln).max(0.0);
                let right_sse = (right_sq - right_sum * right_sum / rn).max(0.0);
                left_sse + right_sse
            }
        }
    }
}

fn gini(counts: &[f64], n: f64) -> f64 {
    if n <= 0.0 {
        return 0.0;
    }
    1.0 - counts.iter().map(|c| (c / n).powi(2)).sum::<f64>()
}

/// Index of the largest value; the first one wins ties
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

impl DecisionTree {
    pub fn fit_classifier(
        x: &[Vec<f64>],
        labels: &[usize],
        n_classes: usize,
        params: &TreeParams,
        seed: u64,
    ) -> Self {
        let indices = (0..x.len().min(labels.len())).collect();
        Self::fit_classifier_on(x, labels, n_classes, indices, params, seed)
    }

    pub fn fit_regressor(x: &[Vec<f64>], targets: &[f64], params: &TreeParams, seed: u64) -> Self {
        let indices = (0..x.len().min(targets.len())).collect();
        Self::fit_regressor_on(x, targets, indices, params, seed)
    }

    /// Fit on a subset of rows; repeated indices act as sample weights.
    pub fn fit_classifier_on(
        x: &[Vec<f64>],
        labels: &[usize],
        n_classes: usize,
        indices: Vec<usize>,
        params: &TreeParams,
        seed: u64,
    ) -> Self {
        let targets = Targets::Classes {
            labels,
            n_classes: n_classes.max(1),
        };
        Self::grow(x, targets, SplitCriterion::Gini, indices, params, seed)
    }

    pub fn fit_regressor_on(
        x: &[Vec<f64>],
        targets: &[f64],
        indices: Vec<usize>,
        params: &TreeParams,
        seed: u64,
    ) -> Self {
        Self::grow(
            x,
            Targets::Values(targets),
            SplitCriterion::SquaredError,
            indices,
            params,
            seed,
        )
    }

    fn grow(
        x: &[Vec<f64>],
        targets: Targets<'_>,
        criterion: SplitCriterion,
        mut indices: Vec<usize>,
        params: &TreeParams,
        seed: u64,
    ) -> Self {
        let mut builder = Builder::new(x, targets, params, seed);
        let n_outputs = builder.n_outputs();
        if !indices.is_empty() {
            builder.build(&mut indices, 0);
        }

        let total: f64 = builder.importances.iter().sum();
        let feature_importances = if total > 0.0 {
            builder.importances.iter().map(|v| v / total).collect()
        } else {
            builder.importances
        };

        Self {
            criterion,
            n_features: builder.n_features,
            n_outputs,
            nodes: builder.nodes,
            feature_importances,
        }
    }

    /// Children are stored after their parent, so a walk only moves forward.
    fn leaf_for(&self, row: &[f64]) -> Option<&[f64]> {
        let mut id = 0;
        loop {
            match self.nodes.get(id)? {
                TreeNode::Leaf { value, .. } => return Some(value),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    let v = row.get(*feature).copied().unwrap_or(0.0);
                    let next = if v <= *threshold { *left } else { *right };
                    if next <= id {
                        return None;
                    }
                    id = next;
                }
            }
        }
    }

    /// True when every split points forward to an existing node and every
    /// leaf carries `n_outputs` values. Deserialized trees are checked with
    /// this before use.
    pub fn is_well_formed(&self) -> bool {
        self.nodes.iter().enumerate().all(|(id, node)| match node {
            TreeNode::Leaf { value, .. } => value.len() == self.n_outputs,
            TreeNode::Split { left, right, .. } => {
                *left > id && *right > id && *left < self.nodes.len() && *right < self.nodes.len()
            }
        })
    }

    /// Class frequencies of the reached leaf; uniform for an empty tree.
    pub fn predict_proba(&self, row: &[f64]) -> Vec<f64> {
        match self.leaf_for(row) {
            Some(value) => value.to_vec(),
            None => vec![1.0 / self.n_outputs.max(1) as f64; self.n_outputs.max(1)],
        }
    }

    pub fn predict_class(&self, row: &[f64]) -> usize {
        argmax(&self.predict_proba(row))
    }

    pub fn predict_value(&self, row: &[f64]) -> f64 {
        self.leaf_for(row)
            .and_then(|value| value.first().copied())
            .unwrap_or(0.0)
    }

    pub fn is_fitted(&self) -> bool {
        !self.nodes.is_empty()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, TreeNode::Leaf { .. }))
            .count()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[TreeNode], id: usize) -> usize {
            match nodes.get(id) {
                Some(TreeNode::Split { left, right, .. }) if *left > id && *right > id => {
                    1 + walk(nodes, *left).max(walk(nodes, *right))
                }
                _ => 0,
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_cluster_data() -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..20 {
            x.push(vec![i as f64 * 0.1, 5.0]);
            y.push(0);
            x.push(vec![10.0 + i as f64 * 0.1, 5.0]);
            y.push(1);
        }
        (x, y)
    }

    #[test]
    fn test_classifier_separates_clusters() {
        let (x, y) = two_cluster_data();
        let tree = DecisionTree::fit_classifier(&x, &y, 2, &TreeParams::default(), 7);

        assert_eq!(tree.predict_class(&[0.5, 5.0]), 0);
        assert_eq!(tree.predict_class(&[11.0, 5.0]), 1);
        assert_eq!(tree.predict_proba(&[11.0, 5.0]), vec![0.0, 1.0]);
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.n_leaves(), 2);
    }

    #[test]
    fn test_importances_favor_informative_feature() {
        let (x, y) = two_cluster_data();
        let tree = DecisionTree::fit_classifier(&x, &y, 2, &TreeParams::default(), 7);
        let total: f64 = tree.feature_importances.iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert_eq!(tree.feature_importances[1], 0.0);
    }

    #[test]
    fn test_max_depth_is_respected() {
        let x: Vec<Vec<f64>> = (0..64).map(|i| vec![i as f64]).collect();
        let y: Vec<usize> = (0..64).map(|i| i % 2).collect();
        let params = TreeParams {
            max_depth: Some(3),
            ..TreeParams::default()
        };
        let tree = DecisionTree::fit_classifier(&x, &y, 2, &params, 1);
        assert!(tree.depth() <= 3);
    }

    #[test]
    fn test_min_samples_leaf_is_respected() {
        let x: Vec<Vec<f64>> = (0..30).map(|i| vec![i as f64]).collect();
        let y: Vec<usize> = (0..30).map(|i| usize::from(i == 29)).collect();
        let params = TreeParams {
            min_samples_leaf: 5,
            ..TreeParams::default()
        };
        let tree = DecisionTree::fit_classifier(&x, &y, 2, &params, 1);
        for node in &tree.nodes {
            if let TreeNode::Leaf { samples, .. } = node {
                assert!(*samples >= 5);
            }
        }
    }

    #[test]
    fn test_regressor_fits_step_function() {
        let x: Vec<Vec<f64>> = (0..40).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..40).map(|i| if i < 20 { 1.0 } else { 3.0 }).collect();
        let tree = DecisionTree::fit_regressor(&x, &y, &TreeParams::default(), 3);

        assert!((tree.predict_value(&[5.0]) - 1.0).abs() < 1e-12);
        assert!((tree.predict_value(&[35.0]) - 3.0).abs() < 1e-12);
        assert!(matches!(tree.nodes[0], TreeNode::Split { threshold, .. } if (threshold - 19.5).abs() < 1e-12));
    }

    #[test]
    fn test_pure_input_yields_single_leaf() {
        let x = vec![vec![1.0], vec![2.0], vec![3.0]];
        let tree = DecisionTree::fit_classifier(&x, &[1, 1, 1], 2, &TreeParams::default(), 0);
        assert_eq!(tree.nodes.len(), 1);
        assert_eq!(tree.predict_class(&[100.0]), 1);
    }

    #[test]
    fn test_empty_tree_predicts_uniform() {
        let tree = DecisionTree::fit_classifier(&[], &[], 4, &TreeParams::default(), 0);
        assert!(!tree.is_fitted());
        assert_eq!(tree.predict_proba(&[1.0]), vec![0.25; 4]);
        assert_eq!(tree.predict_value(&[1.0]), 0.0);
    }

    #[test]
    fn test_fitted_tree_is_well_formed() {
        let (x, y) = two_cluster_data();
        let tree = DecisionTree::fit_classifier(&x, &y, 2, &TreeParams::default(), 7);
        assert!(tree.is_well_formed());
    }

    #[test]
    fn test_backward_link_is_rejected_and_does_not_hang() {
        let tree = DecisionTree {
            criterion: SplitCriterion::Gini,
            n_features: 1,
            n_outputs: 2,
            nodes: vec![
                TreeNode::Split {
                    feature: 0,
                    threshold: 0.5,
                    left: 0,
                    right: 1,
                    samples: 4,
                },
                TreeNode::Leaf {
                    value: vec![0.0, 1.0],
                    samples: 2,
                },
            ],
            feature_importances: vec![1.0],
        };
        assert!(!tree.is_well_formed());
        assert_eq!(tree.predict_proba(&[0.0]), vec![0.5, 0.5]);
        assert_eq!(tree.predict_proba(&[1.0]), vec![0.0, 1.0]);
        assert_eq!(tree.depth(), 0);
    }

    #[test]
    fn test_out_of_range_child_is_rejected() {
        let tree = DecisionTree {
            criterion: SplitCriterion::SquaredError,
            n_features: 1,
            n_outputs: 1,
            nodes: vec![TreeNode::Split {
                feature: 0,
                threshold: 0.5,
                left: 1,
                right: 9,
                samples: 4,
            }],
            feature_importances: vec![1.0],
        };
        assert!(!tree.is_well_formed());
        assert_eq!(tree.predict_value(&[0.0]), 0.0);
    }

    #[test]
    fn test_argmax_first_wins_ties() {
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), 1);
        assert_eq!(argmax(&[]), 0);
    }
}
