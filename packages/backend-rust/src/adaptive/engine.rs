use serde::Serialize;
use tracing::{info, warn};

use super::behavior::{BehaviorAnalyzer, BehaviorSnapshot};
use super::config::EngineConfig;
use super::monitor::{LearnerMonitor, MonitorSnapshot, SessionAnalysis};
use super::persistence::{
    ModelStore, PersistenceError, BEHAVIOR_FILE, MONITOR_FILE, RECOMMENDER_FILE, STYLE_FILE,
};
use super::recommender::{AdaptiveRecommender, Recommendation, RecommenderSnapshot, UpdateOutcome};
use super::style::{LearningStyleClassifier, LearningStyleProfile, StyleSnapshot};
use super::types::{Action, BehaviorEvent, CourseRecord, Feedback, LearnerState};

/// Which components came back from disk; the rest train on first use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub monitor: bool,
    pub recommender: bool,
    pub style: bool,
    pub behavior: bool,
}

/// One instance of every adaptive component, sharing a configuration.
pub struct AdaptiveEngine {
    config: EngineConfig,
    monitor: LearnerMonitor,
    recommender: AdaptiveRecommender,
    classifier: LearningStyleClassifier,
    analyzer: BehaviorAnalyzer,
}

impl AdaptiveEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            monitor: LearnerMonitor::new(config.thresholds.clone(), config.training.clone()),
            recommender: AdaptiveRecommender::new(
                config.recommender.clone(),
                config.reward_weights.clone(),
            ),
            classifier: LearningStyleClassifier::new(config.training.clone()),
            analyzer: BehaviorAnalyzer::new(config.training.clone()),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn monitor(&self) -> &LearnerMonitor {
        &self.monitor
    }

    pub fn recommender(&self) -> &AdaptiveRecommender {
        &self.recommender
    }

    pub fn classifier(&self) -> &LearningStyleClassifier {
        &self.classifier
    }

    pub fn analyzer(&self) -> &BehaviorAnalyzer {
        &self.analyzer
    }

    pub fn analyze_session(&self, events: &[BehaviorEvent], user_id: Option<&str>) -> SessionAnalysis {
        self.monitor.analyze_session(events, user_id)
    }

    pub fn get_recommendation(
        &self,
        learner: &LearnerState,
        available_courses: &[CourseRecord],
    ) -> Recommendation {
        self.recommender.get_recommendation(learner, available_courses)
    }

    pub fn update(
        &self,
        learner: &LearnerState,
        action: Action,
        feedback: &Feedback,
        next_state: Option<&LearnerState>,
    ) -> UpdateOutcome {
        self.recommender.update(learner, action, feedback, next_state)
    }

    pub fn classify_learning_style(&self, events: &[BehaviorEvent]) -> LearningStyleProfile {
        self.classifier.classify(events)
    }

    /// Fits every model that is still untrained.
    pub fn warm_up(&self) {
        if !self.monitor.is_trained() {
            self.monitor.train();
        }
        if !self.classifier.is_trained() {
            self.classifier.train();
        }
        if !self.analyzer.is_trained() {
            self.analyzer.train();
        }
    }

    pub fn load_from(&self, store: &ModelStore) -> LoadReport {
        let mut report = LoadReport::default();

        if let Some(snapshot) = store.load::<MonitorSnapshot>(MONITOR_FILE) {
            report.monitor = self.monitor.restore(snapshot);
        }
        if let Some(snapshot) = store.load::<RecommenderSnapshot>(RECOMMENDER_FILE) {
            self.recommender.restore(snapshot);
            report.recommender = true;
        }
        if let Some(snapshot) = store.load::<StyleSnapshot>(STYLE_FILE) {
            report.style = self.classifier.restore(snapshot);
        }
        if let Some(snapshot) = store.load::<BehaviorSnapshot>(BEHAVIOR_FILE) {
            report.behavior = self.analyzer.restore(snapshot);
        }

        info!(
            dir = %store.dir().display(),
            monitor = report.monitor,
            recommender = report.recommender,
            style = report.style,
            behavior = report.behavior,
            "model store loaded"
        );
        report
    }

    /// Persists the recommender and every trained model. Returns the files written.
    pub fn save_to(&self, store: &ModelStore) -> Result<Vec<&'static str>, PersistenceError> {
        let mut saved = Vec::new();

        store.save(RECOMMENDER_FILE, &self.recommender.snapshot())?;
        saved.push(RECOMMENDER_FILE);

        match self.monitor.snapshot() {
            Some(snapshot) => {
                store.save(MONITOR_FILE, &snapshot)?;
                saved.push(MONITOR_FILE);
            }
            None => warn!("learner monitor untrained, nothing to save"),
        }
        match self.classifier.snapshot() {
            Some(snapshot) => {
                store.save(STYLE_FILE, &snapshot)?;
                saved.push(STYLE_FILE);
            }
            None => warn!("learning style classifier untrained, nothing to save"),
        }
        match self.analyzer.snapshot() {
            Some(snapshot) => {
                store.save(BEHAVIOR_FILE, &snapshot)?;
                saved.push(BEHAVIOR_FILE);
            }
            None => warn!("behavior analyzer untrained, nothing to save"),
        }

        Ok(saved)
    }
}

impl Default for AdaptiveEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
