//! Engagement and dropout prediction from a behavior-event window.

pub mod features;
pub mod training;

use std::sync::Arc;

use engage_algo::round_to;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::adaptive::config::TrainingConfig;
use crate::adaptive::types::BehaviorEvent;

pub use features::EngagementFeatures;
pub use training::BehaviorModels;

const NEUTRAL_ENGAGEMENT: f64 = 50.0;
const NEUTRAL_DROPOUT: f64 = 0.5;
const MODEL_CONFIDENCE: f64 = 0.85;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngagementSignals {
    pub total_events: usize,
    pub completes: usize,
    pub friction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngagementPrediction {
    pub engagement_score: f64,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signals: Option<EngagementSignals>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_probability(p: f64) -> Self {
        if p > 0.7 {
            Self::High
        } else if p > 0.4 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DropoutSignals {
    pub tab_switches: usize,
    pub pauses: usize,
    pub completes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DropoutPrediction {
    pub dropout_probability: f64,
    pub risk_level: RiskLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signals: Option<DropoutSignals>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BehaviorAction {
    Boost,
    Intervene,
    Advance,
    Continue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BehaviorRecommendation {
    pub action: BehaviorAction,
    pub content_type: &'static str,
    pub reason: &'static str,
    pub engagement: EngagementPrediction,
    pub dropout: DropoutPrediction,
}

/// Map the two predictions onto a next step; low engagement wins over dropout risk.
pub fn recommend(engagement: EngagementPrediction, dropout: DropoutPrediction) -> BehaviorRecommendation {
    let (action, content_type, reason) = if engagement.engagement_score < 30.0 {
        (
            BehaviorAction::Boost,
            "quiz",
            "Low engagement - switching to interactive content",
        )
    } else if dropout.dropout_probability > 0.6 {
        (
            BehaviorAction::Intervene,
            "interactive",
            "High dropout risk - offering engaging content",
        )
    } else if engagement.engagement_score > 70.0 {
        (
            BehaviorAction::Advance,
            "video",
            "High engagement - can proceed with next content",
        )
    } else {
        (
            BehaviorAction::Continue,
            "video",
            "Normal engagement patterns detected",
        )
    };

    BehaviorRecommendation {
        action,
        content_type,
        reason,
        engagement,
        dropout,
    }
}

pub struct BehaviorAnalyzer {
    training: TrainingConfig,
    models: RwLock<Option<Arc<BehaviorModels>>>,
}

impl BehaviorAnalyzer {
    pub fn new(training: TrainingConfig) -> Self {
        Self {
            training,
            models: RwLock::new(None),
        }
    }

    pub fn is_trained(&self) -> bool {
        self.models.read().is_some()
    }

    pub fn train(&self) {
        let models = Arc::new(training::fit_behavior_models(&self.training));
        info!(
            trees = models.engagement.trees.len(),
            samples = self.training.behavior_samples,
            "behavior analyzer trained"
        );
        *self.models.write() = Some(models);
    }

    fn models(&self) -> Arc<BehaviorModels> {
        if let Some(models) = self.models.read().as_ref() {
            return Arc::clone(models);
        }

        let mut guard = self.models.write();
        if let Some(models) = guard.as_ref() {
            return Arc::clone(models);
        }
        info!("behavior analyzer untrained, training on first use");
        let models = Arc::new(training::fit_behavior_models(&self.training));
        *guard = Some(Arc::clone(&models));
        models
    }

    pub fn predict_engagement(&self, events: &[BehaviorEvent]) -> EngagementPrediction {
        let Some(features) = EngagementFeatures::extract(events) else {
            return EngagementPrediction {
                engagement_score: NEUTRAL_ENGAGEMENT,
                confidence: 0.0,
                signals: None,
            };
        };

        let score = self
            .models()
            .engagement
            .predict_value(&features.to_vector())
            .clamp(0.0, 100.0);
        debug!(score, events = events.len(), "engagement predicted");

        EngagementPrediction {
            engagement_score: round_to(score, 2),
            confidence: MODEL_CONFIDENCE,
            signals: Some(EngagementSignals {
                total_events: features.total_events,
                completes: features.completes,
                friction: features.friction_score,
            }),
        }
    }

    pub fn predict_dropout(&self, events: &[BehaviorEvent]) -> DropoutPrediction {
        let Some(features) = EngagementFeatures::extract(events) else {
            return DropoutPrediction {
                dropout_probability: NEUTRAL_DROPOUT,
                risk_level: RiskLevel::Medium,
                signals: None,
            };
        };

        let proba = self.models().dropout.predict_proba(&features.to_vector());
        let p = proba.get(1).or(proba.first()).copied().unwrap_or(NEUTRAL_DROPOUT);
        debug!(probability = p, events = events.len(), "dropout predicted");

        DropoutPrediction {
            dropout_probability: round_to(p, 3),
            risk_level: RiskLevel::from_probability(p),
            signals: Some(DropoutSignals {
                tab_switches: features.tab_switches,
                pauses: features.pauses,
                completes: features.completes,
            }),
        }
    }

    pub fn behavior_recommendation(&self, events: &[BehaviorEvent]) -> BehaviorRecommendation {
        recommend(self.predict_engagement(events), self.predict_dropout(events))
    }

    pub fn snapshot(&self) -> Option<BehaviorSnapshot> {
        self.models.read().as_ref().map(|m| BehaviorSnapshot {
            models: m.as_ref().clone(),
        })
    }

    /// Installs persisted forests. Returns false and keeps the current state
    /// when any tree is malformed.
    pub fn restore(&self, snapshot: BehaviorSnapshot) -> bool {
        if !snapshot.models.is_well_formed() {
            warn!("behavior snapshot has malformed trees, ignoring");
            return false;
        }
        *self.models.write() = Some(Arc::new(snapshot.models));
        true
    }
}

impl Default for BehaviorAnalyzer {
    fn default() -> Self {
        Self::new(TrainingConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorSnapshot {
    pub models: BehaviorModels,
}
