use engage_algo::{ForestParams, MaxFeatures, RandomForest, TreeParams};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::features::{encode_content_type, friction_score, raw_engagement_score};
use crate::adaptive::config::TrainingConfig;
use crate::adaptive::synthetic::{exponential, normal};

const SAMPLED_CONTENT_TYPES: [&str; 4] = ["video", "quiz", "text", "interactive"];

/// Engagement regressor and dropout classifier, fitted together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorModels {
    pub engagement: RandomForest,
    pub dropout: RandomForest,
}

impl BehaviorModels {
    pub fn is_well_formed(&self) -> bool {
        self.engagement.is_well_formed() && self.dropout.is_well_formed()
    }
}

pub struct BehaviorDataset {
    pub rows: Vec<Vec<f64>>,
    pub engagement: Vec<f64>,
    pub dropout: Vec<f64>,
}

impl BehaviorDataset {
    pub fn dropout_labels(&self) -> Vec<usize> {
        self.dropout.iter().map(|p| usize::from(*p > 0.5)).collect()
    }
}

/// Synthetic sessions in feature-vector order with noisy rule-based targets.
pub fn synthetic_behavior(samples: usize, seed: u64) -> BehaviorDataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = BehaviorDataset {
        rows: Vec::with_capacity(samples),
        engagement: Vec::with_capacity(samples),
        dropout: Vec::with_capacity(samples),
    };

    for _ in 0..samples {
        let total_events = rng.random_range(5..200) as f64;
        let unique_content = rng.random_range(1..20) as f64;
        let page_views = rng.random_range(1..50) as f64;
        let clicks = rng.random_range(0..30) as f64;
        let scrolls = rng.random_range(0..50) as f64;
        let pauses = rng.random_range(0..15) as f64;
        let resumes = rng.random_range(0..10) as f64;
        let completes = rng.random_range(0..10) as f64;
        let tab_switches = rng.random_range(0..20) as f64;
        let video_watches = rng.random_range(0..20) as f64;
        let quiz_attempts = rng.random_range(0..10) as f64;
        let avg_gap = exponential(&mut rng, 30.0);
        let duration = exponential(&mut rng, 300.0);
        let density = rng.random_range(0.1..5.0);
        let content_type = SAMPLED_CONTENT_TYPES[rng.random_range(0..SAMPLED_CONTENT_TYPES.len())];

        let raw = (completes * 10.0 + video_watches * 5.0 + quiz_attempts * 7.0)
            / total_events.max(1.0)
            * 100.0;
        let engagement = (raw + normal(&mut rng, 10.0)).clamp(0.0, 100.0).trunc();

        let dropout = 0.3 + tab_switches * 0.03 + pauses * 0.02
            - completes * 0.05
            - quiz_attempts * 0.03;
        let dropout = (dropout + normal(&mut rng, 0.1)).clamp(0.0, 1.0);

        data.rows.push(vec![
            total_events,
            unique_content,
            page_views,
            clicks,
            scrolls,
            pauses,
            resumes,
            completes,
            tab_switches,
            video_watches,
            quiz_attempts,
            avg_gap,
            duration,
            density,
            raw_engagement_score(completes, video_watches, total_events),
            friction_score(tab_switches, pauses, total_events),
            encode_content_type(content_type),
        ]);
        data.engagement.push(engagement);
        data.dropout.push(dropout);
    }
    data
}

fn forest_params(config: &TrainingConfig, max_features: MaxFeatures) -> ForestParams {
    ForestParams {
        n_estimators: config.behavior_trees,
        tree: TreeParams {
            max_depth: Some(10),
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features,
        },
        bootstrap: true,
        seed: config.seed,
    }
}

pub fn fit_behavior_models(config: &TrainingConfig) -> BehaviorModels {
    let data = synthetic_behavior(config.behavior_samples, config.seed);
    let engagement = RandomForest::fit_regressor(
        &data.rows,
        &data.engagement,
        &forest_params(config, MaxFeatures::All),
    );
    let dropout = RandomForest::fit_classifier(
        &data.rows,
        &data.dropout_labels(),
        2,
        &forest_params(config, MaxFeatures::Sqrt),
    );
    BehaviorModels { engagement, dropout }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_rows_respect_ranges() {
        let data = synthetic_behavior(200, 42);
        assert_eq!(data.rows.len(), 200);
        for (row, (e, d)) in data.rows.iter().zip(data.engagement.iter().zip(&data.dropout)) {
            assert_eq!(row.len(), 17);
            assert!(row[0] >= 5.0 && row[0] < 200.0);
            assert!(row[16] >= 0.0 && row[16] <= 4.0);
            assert!((0.0..=100.0).contains(e));
            assert_eq!(e.fract(), 0.0);
            assert!((0.0..=1.0).contains(d));
        }
    }

    #[test]
    fn synthetic_rows_are_reproducible() {
        let a = synthetic_behavior(30, 9);
        let b = synthetic_behavior(30, 9);
        assert_eq!(a.rows, b.rows);
        assert_eq!(a.engagement, b.engagement);
    }

    #[test]
    fn models_fit_with_configured_tree_count() {
        let config = TrainingConfig {
            behavior_trees: 10,
            behavior_samples: 200,
            ..TrainingConfig::default()
        };
        let models = fit_behavior_models(&config);
        assert_eq!(models.engagement.trees.len(), 10);
        assert_eq!(models.dropout.trees.len(), 10);
        let data = synthetic_behavior(200, config.seed);
        let labels = data.dropout_labels();
        let hits = data
            .rows
            .iter()
            .zip(&labels)
            .filter(|(row, label)| models.dropout.predict_class(row) == **label)
            .count();
        assert!(hits as f64 / labels.len() as f64 > 0.8);
    }
}
