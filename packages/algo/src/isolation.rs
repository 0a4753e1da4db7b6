//! Isolation forest outlier scoring
//!
//! Each tree isolates a random subsample with random axis-aligned cuts.
//! Outliers are isolated in fewer cuts, so the score
//! `s(x) = -2^(-E[h(x)] / c(ψ))` is closer to -1 for anomalies and closer
//! to -0.5 for typical points. The decision offset is the `contamination`
//! quantile of the training scores; a point is an outlier when its score is
//! strictly below the offset.

use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::types::EULER_GAMMA;

const DEFAULT_MAX_SAMPLES: usize = 256;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IsolationParams {
    pub n_estimators: usize,
    pub max_samples: usize,
    pub contamination: f64,
    pub seed: u64,
}

impl Default for IsolationParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_samples: DEFAULT_MAX_SAMPLES,
            contamination: 0.15,
            seed: 42,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum IsolationNode {
    External {
        size: usize,
    },
    Internal {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct IsolationTree {
    nodes: Vec<IsolationNode>,
}

impl IsolationTree {
    fn grow(x: &[Vec<f64>], rows: &mut [usize], height_limit: usize, rng: &mut ChaCha8Rng) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.build(x, rows, 0, height_limit, rng);
        tree
    }

    fn build(
        &mut self,
        x: &[Vec<f64>],
        rows: &mut [usize],
        depth: usize,
        height_limit: usize,
        rng: &mut ChaCha8Rng,
    ) -> usize {
        let id = self.nodes.len();
        self.nodes.push(IsolationNode::External { size: rows.len() });
        if depth >= height_limit || rows.len() <= 1 {
            return id;
        }

        let n_features = x[rows[0]].len();
        let mut order: Vec<usize> = (0..n_features).collect();
        for i in (1..order.len()).rev() {
            let j = rng.gen_range(0..=i);
            order.swap(i, j);
        }

        let mut cut = None;
        for feature in order {
            let (min, max) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
                (lo.min(x[r][feature]), hi.max(x[r][feature]))
            });
            if max > min {
                cut = Some((feature, rng.gen_range(min..max)));
                break;
            }
        }
        let Some((feature, threshold)) = cut else {
            return id;
        };

        let mut mid = 0;
        for k in 0..rows.len() {
            if x[rows[k]][feature] < threshold {
                rows.swap(k, mid);
                mid += 1;
            }
        }
        if mid == 0 || mid == rows.len() {
            return id;
        }

        let (left_rows, right_rows) = rows.split_at_mut(mid);
        let left = self.build(x, left_rows, depth + 1, height_limit, rng);
        let right = self.build(x, right_rows, depth + 1, height_limit, rng);
        self.nodes[id] = IsolationNode::Internal {
            feature,
            threshold,
            left,
            right,
        };
        id
    }

    fn path_length(&self, row: &[f64]) -> f64 {
        let mut id = 0;
        let mut depth = 0.0;
        loop {
            match self.nodes.get(id) {
                Some(IsolationNode::External { size }) => return depth + average_path_length(*size),
                Some(IsolationNode::Internal {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let v = row.get(*feature).copied().unwrap_or(0.0);
                    let next = if v < *threshold { *left } else { *right };
                    if next <= id {
                        return depth;
                    }
                    id = next;
                    depth += 1.0;
                }
                None => return depth,
            }
        }
    }
}

impl IsolationTree {
    fn is_well_formed(&self) -> bool {
        let n = self.nodes.len();
        self.nodes.iter().enumerate().all(|(id, node)| match node {
            IsolationNode::External { .. } => true,
            IsolationNode::Internal { left, right, .. } => {
                *left > id && *right > id && *left < n && *right < n
            }
        })
    }
}

/// Average path length of an unsuccessful BST search over `n` points, c(n)
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    pub max_samples: usize,
    pub contamination: f64,
    /// Scores below this value are outliers
    pub offset: f64,
}

impl IsolationForest {
    pub fn fit(x: &[Vec<f64>], params: &IsolationParams) -> Self {
        let n = x.len();
        let max_samples = params.max_samples.min(n).max(1);
        if n == 0 {
            return Self {
                trees: Vec::new(),
                max_samples,
                contamination: params.contamination,
                offset: -0.5,
            };
        }

        let height_limit = (max_samples as f64).log2().ceil().max(1.0) as usize;
        let trees: Vec<IsolationTree> = (0..params.n_estimators)
            .into_par_iter()
            .map(|i| {
                let mut rng = ChaCha8Rng::seed_from_u64(params.seed.wrapping_add(i as u64));
                let mut rows = sample(&mut rng, n, max_samples).into_vec();
                IsolationTree::grow(x, &mut rows, height_limit, &mut rng)
            })
            .collect();

        let mut forest = Self {
            trees,
            max_samples,
            contamination: params.contamination,
            offset: -0.5,
        };

        let mut scores: Vec<f64> = x.iter().map(|row| forest.score_sample(row)).collect();
        scores.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        forest.offset = percentile(&scores, params.contamination.clamp(0.0, 0.5) * 100.0);
        forest
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Every tree links forward to existing nodes and the offset is finite.
    pub fn is_well_formed(&self) -> bool {
        self.offset.is_finite() && self.trees.iter().all(IsolationTree::is_well_formed)
    }

    /// Anomaly score in [-1, 0): lower is more abnormal
    pub fn score_sample(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return -0.5;
        }
        let mean_path = self.trees.iter().map(|t| t.path_length(row)).sum::<f64>()
            / self.trees.len() as f64;
        let norm = average_path_length(self.max_samples).max(f64::EPSILON);
        -(2f64.powf(-mean_path / norm))
    }

    pub fn decision_function(&self, row: &[f64]) -> f64 {
        self.score_sample(row) - self.offset
    }

    pub fn is_outlier(&self, row: &[f64]) -> bool {
        self.decision_function(row) < 0.0
    }
}

/// Linear-interpolated percentile of an ascending slice
fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}
