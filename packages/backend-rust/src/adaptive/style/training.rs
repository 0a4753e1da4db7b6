use engage_algo::{DecisionTree, MaxFeatures, TreeParams};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::LearningStyle;
use crate::adaptive::config::TrainingConfig;

#[derive(Clone, Copy)]
enum Range {
    Int(i64, i64),
    Float(f64, f64),
}

use Range::{Float, Int};

/// Per-style sampling ranges, in feature-vector order.
fn profile(style: LearningStyle) -> [Range; 15] {
    match style {
        LearningStyle::Visual => [
            Int(20, 50),
            Int(0, 10),
            Int(0, 15),
            Int(0, 10),
            Int(15, 40),
            Int(0, 5),
            Int(0, 10),
            Int(5, 20),
            Int(0, 10),
            Float(5.0, 30.0),
            Float(600.0, 3600.0),
            Int(0, 10),
            Int(0, 5),
            Int(0, 3),
            Int(0, 3),
        ],
        LearningStyle::Auditory => [
            Int(5, 20),
            Int(20, 50),
            Int(5, 15),
            Int(0, 10),
            Int(5, 15),
            Int(20, 45),
            Int(5, 15),
            Int(3, 15),
            Int(0, 8),
            Float(10.0, 40.0),
            Float(800.0, 4000.0),
            Int(5, 15),
            Int(0, 5),
            Int(0, 5),
            Int(0, 3),
        ],
        LearningStyle::ReadingWriting => [
            Int(5, 20),
            Int(0, 10),
            Int(25, 50),
            Int(0, 8),
            Int(3, 12),
            Int(0, 5),
            Int(20, 45),
            Int(10, 25),
            Int(0, 5),
            Float(20.0, 60.0),
            Float(1500.0, 5000.0),
            Int(10, 20),
            Int(5, 12),
            Int(10, 25),
            Int(8, 20),
        ],
        LearningStyle::Kinesthetic => [
            Int(10, 25),
            Int(5, 15),
            Int(5, 15),
            Int(20, 45),
            Int(8, 18),
            Int(3, 10),
            Int(3, 12),
            Int(15, 30),
            Int(20, 40),
            Float(3.0, 15.0),
            Float(400.0, 2000.0),
            Int(8, 18),
            Int(15, 30),
            Int(0, 5),
            Int(0, 5),
        ],
    }
}

/// Class-balanced synthetic rows; labels index `LearningStyle::ALL`.
pub fn synthetic_profiles(per_class: usize, seed: u64) -> (Vec<Vec<f64>>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut rows = Vec::with_capacity(per_class * LearningStyle::ALL.len());
    let mut labels = Vec::with_capacity(per_class * LearningStyle::ALL.len());

    for (class, style) in LearningStyle::ALL.iter().enumerate() {
        let ranges = profile(*style);
        for _ in 0..per_class {
            let row: Vec<f64> = ranges
                .iter()
                .map(|r| match *r {
                    Int(lo, hi) => rng.random_range(lo..hi) as f64,
                    Float(lo, hi) => rng.random_range(lo..hi),
                })
                .collect();
            rows.push(row);
            labels.push(class);
        }
    }
    (rows, labels)
}

pub fn tree_params() -> TreeParams {
    TreeParams {
        max_depth: Some(10),
        min_samples_split: 10,
        min_samples_leaf: 5,
        max_features: MaxFeatures::All,
    }
}

pub fn fit_style_tree(config: &TrainingConfig) -> DecisionTree {
    let (rows, labels) = synthetic_profiles(config.style_samples_per_class, config.seed);
    DecisionTree::fit_classifier(
        &rows,
        &labels,
        LearningStyle::ALL.len(),
        &tree_params(),
        config.seed,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_are_balanced() {
        let (rows, labels) = synthetic_profiles(150, 42);
        assert_eq!(rows.len(), 600);
        for class in 0..4 {
            assert_eq!(labels.iter().filter(|l| **l == class).count(), 150);
        }
        // reading/writing learners take 10..25 notes
        for (row, label) in rows.iter().zip(&labels) {
            if *label == 2 {
                assert!(row[13] >= 10.0 && row[13] < 25.0);
            }
        }
    }

    #[test]
    fn tree_separates_training_profiles() {
        let (rows, labels) = synthetic_profiles(150, 42);
        let tree = fit_style_tree(&TrainingConfig::default());
        let correct = rows
            .iter()
            .zip(&labels)
            .filter(|(row, label)| tree.predict_class(row) == **label)
            .count();
        assert!(correct as f64 / rows.len() as f64 > 0.95);
        assert!(tree.depth() <= 10);
    }
}
