//! Learner Monitor
//!
//! Session feature extraction, the five-detector ensemble, alert
//! aggregation and the intervention mapper. The fitted models are trained
//! once on seeded synthetic sessions and shared read-only afterwards.

pub mod alerts;
pub mod detectors;
pub mod features;
pub mod training;

use std::sync::Arc;

use engage_algo::StandardScaler;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::adaptive::config::{MonitorThresholds, TrainingConfig};
use crate::adaptive::types::BehaviorEvent;

pub use alerts::{Alert, AlertSeverity, AlertType, InterventionRecommendation, SessionStatus};
pub use detectors::{DetectorResult, OutlierModel, ProbabilityModel};
pub use features::SessionFeatures;
pub use training::MonitorModels;

/// Fitted parameters the detector ensemble reads.
pub trait SessionModels {
    fn scaler(&self) -> &StandardScaler;
    fn anomaly(&self) -> &dyn OutlierModel;
    fn struggle(&self) -> &dyn ProbabilityModel;
    fn boredom(&self) -> &dyn ProbabilityModel;
}

impl SessionModels for MonitorModels {
    fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    fn anomaly(&self) -> &dyn OutlierModel {
        &self.anomaly
    }

    fn struggle(&self) -> &dyn ProbabilityModel {
        &self.struggle
    }

    fn boredom(&self) -> &dyn ProbabilityModel {
        &self.boredom
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectorReport {
    pub anomaly: DetectorResult,
    pub boredom: DetectorResult,
    pub inactivity: DetectorResult,
    pub struggle: DetectorResult,
    pub fast_completion: DetectorResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionAnalysis {
    pub overall_status: SessionStatus,
    pub alerts: Vec<Alert>,
    pub analysis: DetectorReport,
}

/// Runs every detector over one event window and folds the triggered ones
/// into alerts.
pub fn analyze_with(
    models: &dyn SessionModels,
    thresholds: &MonitorThresholds,
    events: &[BehaviorEvent],
) -> SessionAnalysis {
    let report = match SessionFeatures::extract(events) {
        None => DetectorReport {
            inactivity: detectors::idle_inactivity(),
            fast_completion: detectors::idle_fast_completion(),
            ..DetectorReport::default()
        },
        Some(f) => {
            let scaled = models.scaler().transform_row(&f.to_vector());
            DetectorReport {
                anomaly: detectors::detect_anomaly(models.anomaly(), &scaled),
                boredom: detectors::detect_boredom(
                    models.boredom(),
                    &scaled,
                    &f,
                    thresholds.boredom_score,
                ),
                inactivity: detectors::detect_inactivity(&f, thresholds.inactive_hours),
                struggle: detectors::detect_struggle(
                    models.struggle(),
                    &scaled,
                    &f,
                    thresholds.struggle_score,
                ),
                fast_completion: detectors::detect_fast_completion(
                    &f,
                    thresholds.fast_completion_hours,
                ),
            }
        }
    };

    let mut alerts = Vec::new();
    if report.anomaly.is_triggered {
        alerts.push(Alert::anomaly());
    }
    if report.boredom.is_triggered {
        alerts.push(Alert::boredom());
    }
    if report.inactivity.is_triggered {
        let hours = report.inactivity.measure("inactive_hours").unwrap_or(0.0);
        alerts.push(Alert::inactivity(hours));
    }
    if report.struggle.is_triggered {
        alerts.push(Alert::struggle());
    }
    if report.fast_completion.is_triggered {
        alerts.push(Alert::fast_completion());
    }

    SessionAnalysis {
        overall_status: SessionStatus::from_alert_count(alerts.len()),
        alerts,
        analysis: report,
    }
}

/// Persisted form of a trained monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorSnapshot {
    #[serde(default)]
    pub thresholds: MonitorThresholds,
    pub models: MonitorModels,
}

pub struct LearnerMonitor {
    thresholds: RwLock<MonitorThresholds>,
    training: TrainingConfig,
    models: RwLock<Option<Arc<MonitorModels>>>,
}

impl LearnerMonitor {
    pub fn new(thresholds: MonitorThresholds, training: TrainingConfig) -> Self {
        Self {
            thresholds: RwLock::new(thresholds),
            training,
            models: RwLock::new(None),
        }
    }

    pub fn is_trained(&self) -> bool {
        self.models.read().is_some()
    }

    pub fn thresholds(&self) -> MonitorThresholds {
        self.thresholds.read().clone()
    }

    /// Fits fresh models and swaps them in.
    pub fn train(&self) {
        let fitted = Arc::new(training::fit_monitor_models(&self.training));
        *self.models.write() = Some(fitted);
        info!(
            samples = self.training.monitor_samples,
            seed = self.training.seed,
            "learner monitor trained"
        );
    }

    fn models(&self) -> Arc<MonitorModels> {
        if let Some(models) = self.models.read().as_ref() {
            return Arc::clone(models);
        }

        let mut guard = self.models.write();
        if let Some(models) = guard.as_ref() {
            return Arc::clone(models);
        }
        info!("learner monitor untrained, training on first use");
        let fitted = Arc::new(training::fit_monitor_models(&self.training));
        *guard = Some(Arc::clone(&fitted));
        fitted
    }

    pub fn analyze_session(&self, events: &[BehaviorEvent], user_id: Option<&str>) -> SessionAnalysis {
        let models = self.models();
        let thresholds = self.thresholds();
        let analysis = analyze_with(models.as_ref(), &thresholds, events);
        debug!(
            user_id = user_id.unwrap_or("-"),
            events = events.len(),
            status = ?analysis.overall_status,
            alerts = analysis.alerts.len(),
            "session analyzed"
        );
        analysis
    }

    pub fn get_recommendations(&self, events: &[BehaviorEvent]) -> Vec<InterventionRecommendation> {
        let analysis = self.analyze_session(events, None);
        alerts::interventions(&analysis.alerts)
    }

    pub fn snapshot(&self) -> Option<MonitorSnapshot> {
        let models = self.models.read().as_ref().map(|m| m.as_ref().clone())?;
        Some(MonitorSnapshot {
            thresholds: self.thresholds(),
            models,
        })
    }

    /// Installs persisted models. Returns false and keeps the current state
    /// when the models are structurally broken.
    pub fn restore(&self, snapshot: MonitorSnapshot) -> bool {
        if !snapshot.models.is_well_formed() {
            warn!("learner monitor snapshot has malformed trees, ignoring");
            return false;
        }
        *self.thresholds.write() = snapshot.thresholds;
        *self.models.write() = Some(Arc::new(snapshot.models));
        true
    }
}

impl Default for LearnerMonitor {
    fn default() -> Self {
        Self::new(MonitorThresholds::default(), TrainingConfig::default())
    }
}
