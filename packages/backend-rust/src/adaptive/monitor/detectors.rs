use std::collections::BTreeMap;

use engage_algo::{clamp_unit, round_to, IsolationForest, LinearRegression};
use serde::{Deserialize, Serialize};

use super::features::SessionFeatures;

/// Regression-shaped detector: maps a scaled feature row to a raw probability.
pub trait ProbabilityModel: Send + Sync {
    fn predict(&self, scaled: &[f64]) -> f64;
}

impl ProbabilityModel for LinearRegression {
    fn predict(&self, scaled: &[f64]) -> f64 {
        self.predict_row(scaled)
    }
}

/// Unsupervised outlier scorer over a scaled feature row.
pub trait OutlierModel: Send + Sync {
    /// Raw score; lower is more abnormal.
    fn score(&self, scaled: &[f64]) -> f64;
    fn is_outlier(&self, scaled: &[f64]) -> bool;
}

impl OutlierModel for IsolationForest {
    fn score(&self, scaled: &[f64]) -> f64 {
        self.score_sample(scaled)
    }

    fn is_outlier(&self, scaled: &[f64]) -> bool {
        IsolationForest::is_outlier(self, scaled)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectorResult {
    pub is_triggered: bool,
    pub score: f64,
    pub signals: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub measures: BTreeMap<String, f64>,
}

impl DetectorResult {
    fn with_measure(mut self, name: &str, value: f64) -> Self {
        self.measures.insert(name.to_string(), value);
        self
    }

    pub fn measure(&self, name: &str) -> Option<f64> {
        self.measures.get(name).copied()
    }
}

fn rules(checks: &[(bool, &str)]) -> (Vec<String>, f64) {
    let signals: Vec<String> = checks
        .iter()
        .filter(|(fired, _)| *fired)
        .map(|(_, name)| name.to_string())
        .collect();
    let share = signals.len() as f64 / checks.len().max(1) as f64;
    (signals, share)
}

pub fn detect_anomaly(model: &dyn OutlierModel, scaled: &[f64]) -> DetectorResult {
    DetectorResult {
        is_triggered: model.is_outlier(scaled),
        score: round_to(model.score(scaled).abs(), 3),
        ..DetectorResult::default()
    }
}

pub fn boredom_signals(f: &SessionFeatures) -> Vec<String> {
    rules(&[
        (f.events_per_minute < 0.3, "low_interaction_rate"),
        (f.max_gap_hours > 1.0, "long_gaps"),
        (f.scroll_depth_avg < 0.3, "low_scroll_depth"),
        (
            f.content_diversity == 1 && f.total_events > 10,
            "no_content_exploration",
        ),
    ])
    .0
}

pub fn detect_boredom(
    model: &dyn ProbabilityModel,
    scaled: &[f64],
    f: &SessionFeatures,
    threshold: f64,
) -> DetectorResult {
    let probability = clamp_unit(model.predict(scaled));
    DetectorResult {
        is_triggered: probability > threshold,
        score: round_to(probability, 3),
        signals: boredom_signals(f),
        ..DetectorResult::default()
    }
}

pub fn struggle_signals(f: &SessionFeatures) -> Vec<String> {
    rules(&[
        (f.tab_switches > 5, "excessive_tab_switching"),
        (f.quiz_fails > 3, "multiple_quiz_failures"),
        (f.video_pauses > 5, "excessive_video_pausing"),
        (f.repeats > 2, "content_repetition"),
        (
            f.events_per_minute > 2.0 && f.quiz_fails > 2,
            "rushed_with_failures",
        ),
    ])
    .0
}

pub fn detect_struggle(
    model: &dyn ProbabilityModel,
    scaled: &[f64],
    f: &SessionFeatures,
    threshold: f64,
) -> DetectorResult {
    let probability = clamp_unit(model.predict(scaled));
    DetectorResult {
        is_triggered: probability > threshold,
        score: round_to(probability, 3),
        signals: struggle_signals(f),
        ..DetectorResult::default()
    }
}

pub fn detect_inactivity(f: &SessionFeatures, inactive_hours: f64) -> DetectorResult {
    let (signals, share) = rules(&[
        (f.long_inactive_periods > 2, "multiple_long_gaps"),
        (f.max_gap_hours > inactive_hours, "extended_inactivity"),
    ]);
    DetectorResult {
        is_triggered: f.max_gap_hours > inactive_hours,
        score: share,
        signals,
        ..DetectorResult::default()
    }
    .with_measure("inactive_hours", round_to(f.max_gap_hours, 2))
    .with_measure("long_inactive_periods", f.long_inactive_periods as f64)
}

pub fn detect_fast_completion(f: &SessionFeatures, fast_completion_hours: f64) -> DetectorResult {
    let hours = f.session_duration_hours;
    let events = f.total_events;
    let (signals, share) = rules(&[
        (hours < fast_completion_hours && events > 15, "completion_too_fast"),
        (hours < 0.1 && events > 30, "impossibly_fast"),
        (f.scroll_depth_avg < 0.2 && events > 10, "no_meaningful_interaction"),
        (f.engagement_ratio < 0.3 && events > 20, "low_engagement_high_events"),
    ]);
    DetectorResult {
        is_triggered: !signals.is_empty(),
        score: share,
        signals,
        ..DetectorResult::default()
    }
    .with_measure("completion_speed_hours", round_to(hours, 2))
    .with_measure("total_events", events as f64)
}

/// Neutral results for an empty event window.
pub fn idle_inactivity() -> DetectorResult {
    DetectorResult::default()
        .with_measure("inactive_hours", 0.0)
        .with_measure("long_inactive_periods", 0.0)
}

pub fn idle_fast_completion() -> DetectorResult {
    DetectorResult::default()
        .with_measure("completion_speed_hours", 0.0)
        .with_measure("total_events", 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(f64);

    impl ProbabilityModel for Fixed {
        fn predict(&self, _: &[f64]) -> f64 {
            self.0
        }
    }

    fn features() -> SessionFeatures {
        SessionFeatures {
            total_events: 12,
            session_duration_hours: 1.5,
            events_per_minute: 0.5,
            engagement_ratio: 0.8,
            scroll_depth_avg: 0.5,
            content_diversity: 3,
            ..SessionFeatures::default()
        }
    }

    #[test]
    fn boredom_threshold_is_strict() {
        let f = features();
        let at = detect_boredom(&Fixed(0.6), &[], &f, 0.6);
        assert!(!at.is_triggered);
        let above = detect_boredom(&Fixed(0.6001), &[], &f, 0.6);
        assert!(above.is_triggered);
        assert_eq!(above.score, 0.6);
    }

    #[test]
    fn probabilities_are_clipped() {
        let f = features();
        assert_eq!(detect_struggle(&Fixed(1.7), &[], &f, 0.7).score, 1.0);
        assert_eq!(detect_struggle(&Fixed(-0.4), &[], &f, 0.7).score, 0.0);
    }

    #[test]
    fn boredom_signals_fire_independently() {
        let f = SessionFeatures {
            total_events: 11,
            events_per_minute: 0.2,
            max_gap_hours: 1.2,
            scroll_depth_avg: 0.1,
            content_diversity: 1,
            ..SessionFeatures::default()
        };
        assert_eq!(
            boredom_signals(&f),
            vec![
                "low_interaction_rate",
                "long_gaps",
                "low_scroll_depth",
                "no_content_exploration"
            ]
        );
    }

    #[test]
    fn struggle_rushed_with_failures() {
        let f = SessionFeatures {
            events_per_minute: 2.5,
            quiz_fails: 3,
            ..SessionFeatures::default()
        };
        assert_eq!(struggle_signals(&f), vec!["rushed_with_failures"]);
    }

    #[test]
    fn inactivity_triggers_on_long_gap_only() {
        let mut f = features();
        f.long_inactive_periods = 4;
        f.max_gap_hours = 2.0;
        let r = detect_inactivity(&f, 2.0);
        assert!(!r.is_triggered);
        assert_eq!(r.signals, vec!["multiple_long_gaps"]);
        assert_eq!(r.score, 0.5);

        f.max_gap_hours = 2.347;
        let r = detect_inactivity(&f, 2.0);
        assert!(r.is_triggered);
        assert_eq!(r.score, 1.0);
        assert_eq!(r.measure("inactive_hours"), Some(2.35));
    }

    #[test]
    fn fast_completion_rules() {
        let f = SessionFeatures {
            total_events: 35,
            session_duration_hours: 0.05,
            scroll_depth_avg: 0.9,
            engagement_ratio: 0.9,
            ..SessionFeatures::default()
        };
        let r = detect_fast_completion(&f, 0.5);
        assert!(r.is_triggered);
        assert_eq!(r.signals, vec!["completion_too_fast", "impossibly_fast"]);
        assert_eq!(r.score, 0.5);
        assert_eq!(r.measure("total_events"), Some(35.0));

        let calm = detect_fast_completion(&features(), 0.5);
        assert!(!calm.is_triggered);
        assert_eq!(calm.score, 0.0);
    }
}
