//! Learning-style classification over VARK categories.

pub mod features;
pub mod guidance;
pub mod training;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use engage_algo::{round_to, DecisionTree, FeatureImportance};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::adaptive::config::TrainingConfig;
use crate::adaptive::types::BehaviorEvent;

pub use features::StyleFeatures;
pub use guidance::{style_guidance, StyleGuidance};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningStyle {
    Visual,
    Auditory,
    ReadingWriting,
    Kinesthetic,
}

impl LearningStyle {
    pub const ALL: [LearningStyle; 4] = [
        LearningStyle::Visual,
        LearningStyle::Auditory,
        LearningStyle::ReadingWriting,
        LearningStyle::Kinesthetic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Visual => "visual",
            Self::Auditory => "auditory",
            Self::ReadingWriting => "reading_writing",
            Self::Kinesthetic => "kinesthetic",
        }
    }
}

impl fmt::Display for LearningStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeatureCounts {
    pub videos: usize,
    pub audio: usize,
    pub reading: usize,
    pub interactive: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearningStyleProfile {
    pub learning_style: LearningStyle,
    pub confidence: f64,
    pub probabilities: BTreeMap<LearningStyle, f64>,
    pub signals: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_counts: Option<FeatureCounts>,
}

impl LearningStyleProfile {
    fn undetermined() -> Self {
        let share = 1.0 / LearningStyle::ALL.len() as f64;
        Self {
            learning_style: LearningStyle::Visual,
            confidence: share,
            probabilities: LearningStyle::ALL.iter().map(|s| (*s, share)).collect(),
            signals: Vec::new(),
            feature_counts: None,
        }
    }
}

pub struct LearningStyleClassifier {
    training: TrainingConfig,
    tree: RwLock<Option<Arc<DecisionTree>>>,
}

impl LearningStyleClassifier {
    pub fn new(training: TrainingConfig) -> Self {
        Self {
            training,
            tree: RwLock::new(None),
        }
    }

    pub fn is_trained(&self) -> bool {
        self.tree.read().is_some()
    }

    pub fn train(&self) {
        let tree = Arc::new(training::fit_style_tree(&self.training));
        info!(leaves = tree.n_leaves(), depth = tree.depth(), "learning style classifier trained");
        *self.tree.write() = Some(tree);
    }

    fn tree(&self) -> Arc<DecisionTree> {
        if let Some(tree) = self.tree.read().as_ref() {
            return Arc::clone(tree);
        }

        let mut guard = self.tree.write();
        if let Some(tree) = guard.as_ref() {
            return Arc::clone(tree);
        }
        info!("learning style classifier untrained, training on first use");
        let tree = Arc::new(training::fit_style_tree(&self.training));
        *guard = Some(Arc::clone(&tree));
        tree
    }

    pub fn classify(&self, events: &[BehaviorEvent]) -> LearningStyleProfile {
        let Some(features) = StyleFeatures::extract(events) else {
            return LearningStyleProfile::undetermined();
        };
        let tree = self.tree();

        let proba = tree.predict_proba(&features.to_vector());
        let best = engage_algo::tree::argmax(&proba);
        let learning_style = LearningStyle::ALL
            .get(best)
            .copied()
            .unwrap_or(LearningStyle::Visual);
        let confidence = proba.get(best).copied().unwrap_or(0.0);

        debug!(style = %learning_style, confidence, events = events.len(), "learning style classified");

        LearningStyleProfile {
            learning_style,
            confidence: round_to(confidence, 3),
            probabilities: LearningStyle::ALL
                .iter()
                .zip(proba.iter())
                .map(|(s, p)| (*s, round_to(*p, 3)))
                .collect(),
            signals: features.signals(),
            feature_counts: Some(FeatureCounts {
                videos: features.video_watches,
                audio: features.audio_listens,
                reading: features.reading_views,
                interactive: features.interactive_plays,
            }),
        }
    }

    /// Impurity importances of the fitted tree, highest first.
    pub fn feature_importance(&self) -> Vec<FeatureImportance> {
        let tree = self.tree();
        let mut ranked: Vec<FeatureImportance> = features::FEATURE_NAMES
            .iter()
            .zip(tree.feature_importances.iter())
            .map(|(name, importance)| FeatureImportance {
                feature: name.to_string(),
                importance: round_to(*importance, 4),
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.importance
                .partial_cmp(&a.importance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked
    }

    pub fn snapshot(&self) -> Option<StyleSnapshot> {
        self.tree.read().as_ref().map(|tree| StyleSnapshot {
            tree: tree.as_ref().clone(),
        })
    }

    /// Installs a persisted tree. Returns false and keeps the current state
    /// when the tree is malformed or has the wrong class count.
    pub fn restore(&self, snapshot: StyleSnapshot) -> bool {
        let tree = snapshot.tree;
        if tree.n_outputs != LearningStyle::ALL.len() || !tree.is_well_formed() {
            warn!("learning style snapshot has a malformed tree, ignoring");
            return false;
        }
        *self.tree.write() = Some(Arc::new(tree));
        true
    }
}

impl Default for LearningStyleClassifier {
    fn default() -> Self {
        Self::new(TrainingConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleSnapshot {
    pub tree: DecisionTree,
}
