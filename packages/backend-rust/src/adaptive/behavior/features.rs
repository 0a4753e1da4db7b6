use std::collections::HashSet;

use serde::Serialize;

use crate::adaptive::monitor::features::dominant;
use crate::adaptive::types::{gaps_seconds, sorted_by_time, BehaviorEvent, EventType};

pub const FEATURE_DIM: usize = 17;

/// Content types the dominant-type feature can encode, in code order.
pub const CONTENT_TYPES: [&str; 5] = ["interactive", "quiz", "simulation", "text", "video"];

pub const DEFAULT_CONTENT_TYPE: &str = "video";

/// Ordinal code of a content type; unknown types map to 0.
pub fn encode_content_type(content_type: &str) -> f64 {
    CONTENT_TYPES
        .iter()
        .position(|t| *t == content_type)
        .unwrap_or(0) as f64
}

/// Events per minute over the session, with durations under a second treated as one.
pub fn interaction_density(total_events: f64, session_duration: f64) -> f64 {
    total_events / session_duration.max(1.0) * 60.0
}

pub fn raw_engagement_score(completes: f64, video_watches: f64, total_events: f64) -> f64 {
    (completes + video_watches * 0.5) * 10.0 / total_events.max(1.0)
}

pub fn friction_score(tab_switches: f64, pauses: f64, total_events: f64) -> f64 {
    (tab_switches + pauses * 0.3) / total_events.max(1.0)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngagementFeatures {
    pub total_events: usize,
    pub unique_content: usize,
    pub page_views: usize,
    pub clicks: usize,
    pub scrolls: usize,
    pub pauses: usize,
    pub resumes: usize,
    pub completes: usize,
    pub tab_switches: usize,
    pub video_watches: usize,
    pub quiz_attempts: usize,
    pub avg_time_between_events: f64,
    pub session_duration: f64,
    pub interaction_density: f64,
    pub raw_engagement_score: f64,
    pub friction_score: f64,
    pub dominant_content_type: String,
}

impl EngagementFeatures {
    pub fn extract(events: &[BehaviorEvent]) -> Option<Self> {
        if events.is_empty() {
            return None;
        }

        let sorted = sorted_by_time(events);
        let count = |kind: EventType| sorted.iter().filter(|e| e.event_type == kind).count();

        let total_events = sorted.len();
        let unique_content = sorted
            .iter()
            .filter_map(|e| e.content_id.as_deref())
            .collect::<HashSet<_>>()
            .len();

        let (avg_time_between_events, session_duration) = if sorted.len() > 1 {
            let gaps = gaps_seconds(&sorted);
            let span = (sorted[sorted.len() - 1].timestamp - sorted[0].timestamp).num_milliseconds()
                as f64
                / 1000.0;
            (gaps.iter().sum::<f64>() / gaps.len() as f64, span)
        } else {
            (0.0, 0.0)
        };

        let completes = count(EventType::Complete);
        let video_watches = count(EventType::VideoPlay);
        let tab_switches = count(EventType::TabSwitch);
        let pauses = count(EventType::Pause);
        let n = total_events as f64;

        Some(Self {
            total_events,
            unique_content,
            page_views: count(EventType::PageView),
            clicks: count(EventType::Click),
            scrolls: count(EventType::Scroll),
            pauses,
            resumes: count(EventType::Resume),
            completes,
            tab_switches,
            video_watches,
            quiz_attempts: count(EventType::QuizAnswer),
            avg_time_between_events,
            session_duration,
            interaction_density: interaction_density(n, session_duration),
            raw_engagement_score: raw_engagement_score(completes as f64, video_watches as f64, n),
            friction_score: friction_score(tab_switches as f64, pauses as f64, n),
            dominant_content_type: dominant(sorted.iter().filter_map(|e| e.content_type.as_deref()))
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
        })
    }

    pub fn to_vector(&self) -> Vec<f64> {
        vec![
            self.total_events as f64,
            self.unique_content as f64,
            self.page_views as f64,
            self.clicks as f64,
            self.scrolls as f64,
            self.pauses as f64,
            self.resumes as f64,
            self.completes as f64,
            self.tab_switches as f64,
            self.video_watches as f64,
            self.quiz_attempts as f64,
            self.avg_time_between_events,
            self.session_duration,
            self.interaction_density,
            self.raw_engagement_score,
            self.friction_score,
            encode_content_type(&self.dominant_content_type),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn event(second: i64, kind: EventType, id: &str, content_type: &str) -> BehaviorEvent {
        let base = Utc.with_ymd_and_hms(2024, 5, 20, 14, 0, 0).unwrap();
        BehaviorEvent::new(base + Duration::seconds(second), kind).with_content(id, content_type)
    }

    #[test]
    fn counts_and_derived_scores() {
        let events = vec![
            event(0, EventType::PageView, "a", "text"),
            event(20, EventType::VideoPlay, "b", "video"),
            event(40, EventType::Pause, "b", "video"),
            event(60, EventType::Resume, "b", "video"),
            event(80, EventType::TabSwitch, "b", "video"),
            event(100, EventType::Complete, "b", "video"),
            event(120, EventType::QuizAnswer, "c", "quiz"),
        ];
        let f = EngagementFeatures::extract(&events).unwrap();
        assert_eq!(f.total_events, 7);
        assert_eq!(f.unique_content, 3);
        assert_eq!(f.completes, 1);
        assert_eq!(f.video_watches, 1);
        assert_eq!(f.quiz_attempts, 1);
        assert_eq!(f.session_duration, 120.0);
        assert_eq!(f.avg_time_between_events, 20.0);
        assert!((f.interaction_density - 3.5).abs() < 1e-12);
        assert!((f.raw_engagement_score - 15.0 / 7.0).abs() < 1e-12);
        assert!((f.friction_score - 1.3 / 7.0).abs() < 1e-12);
        assert_eq!(f.dominant_content_type, "video");

        let v = f.to_vector();
        assert_eq!(v.len(), FEATURE_DIM);
        assert_eq!(v[16], 4.0);
    }

    #[test]
    fn single_event_uses_unit_duration_floor() {
        let f = EngagementFeatures::extract(&[event(0, EventType::Click, "a", "quiz")]).unwrap();
        assert_eq!(f.session_duration, 0.0);
        assert_eq!(f.interaction_density, 60.0);
        assert_eq!(encode_content_type(&f.dominant_content_type), 1.0);
    }

    #[test]
    fn missing_content_type_defaults_to_video() {
        let base = Utc.with_ymd_and_hms(2024, 5, 20, 14, 0, 0).unwrap();
        let f = EngagementFeatures::extract(&[BehaviorEvent::new(base, EventType::Scroll)]).unwrap();
        assert_eq!(f.dominant_content_type, "video");
        assert_eq!(f.unique_content, 0);
    }

    #[test]
    fn unknown_content_type_encodes_as_zero() {
        assert_eq!(encode_content_type("podcast"), 0.0);
        assert_eq!(encode_content_type("text"), 3.0);
    }

    #[test]
    fn empty_events_yield_nothing() {
        assert!(EngagementFeatures::extract(&[]).is_none());
    }
}
