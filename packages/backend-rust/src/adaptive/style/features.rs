use serde::Serialize;

use crate::adaptive::types::{gaps_seconds, sorted_by_time, BehaviorEvent, EventType};

pub const FEATURE_NAMES: [&str; 15] = [
    "video_watches",
    "audio_listens",
    "reading_views",
    "interactive_plays",
    "plays",
    "listens",
    "reads",
    "clicks",
    "interactions",
    "avg_time_per_event",
    "session_duration",
    "quiz_attempts",
    "practice_attempts",
    "note_taking",
    "bookmarking",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StyleFeatures {
    pub video_watches: usize,
    pub audio_listens: usize,
    pub reading_views: usize,
    pub interactive_plays: usize,
    pub plays: usize,
    pub listens: usize,
    pub reads: usize,
    pub clicks: usize,
    pub interactions: usize,
    /// Mean gap between consecutive events, seconds
    pub avg_time_per_event: f64,
    /// Seconds from first to last event
    pub session_duration: f64,
    pub quiz_attempts: usize,
    pub practice_attempts: usize,
    pub note_taking: usize,
    pub bookmarking: usize,
    pub sharing: usize,
    pub total_events: usize,
}

impl StyleFeatures {
    pub fn extract(events: &[BehaviorEvent]) -> Option<Self> {
        if events.is_empty() {
            return None;
        }

        let sorted = sorted_by_time(events);
        let mut f = StyleFeatures {
            total_events: sorted.len(),
            ..Self::default()
        };

        for event in &sorted {
            match event.content_type.as_deref() {
                Some("video") => f.video_watches += 1,
                Some("audio") => f.audio_listens += 1,
                Some("text") | Some("reading") => f.reading_views += 1,
                Some("interactive") | Some("simulation") => f.interactive_plays += 1,
                _ => {}
            }
            match event.event_type {
                EventType::VideoPlay | EventType::AudioPlay => f.plays += 1,
                EventType::AudioListen => f.listens += 1,
                EventType::PageView | EventType::Scroll => f.reads += 1,
                EventType::Click => f.clicks += 1,
                EventType::Interaction => f.interactions += 1,
                EventType::QuizAttempt => f.quiz_attempts += 1,
                EventType::PracticeAttempt => f.practice_attempts += 1,
                EventType::NoteCreate => f.note_taking += 1,
                EventType::Bookmark => f.bookmarking += 1,
                EventType::Share => f.sharing += 1,
                _ => {}
            }
        }

        if sorted.len() > 1 {
            let gaps = gaps_seconds(&sorted);
            f.avg_time_per_event = gaps.iter().sum::<f64>() / gaps.len() as f64;
            f.session_duration =
                (sorted[sorted.len() - 1].timestamp - sorted[0].timestamp).num_milliseconds() as f64
                    / 1000.0;
        }

        Some(f)
    }

    pub fn to_vector(&self) -> Vec<f64> {
        vec![
            self.video_watches as f64,
            self.audio_listens as f64,
            self.reading_views as f64,
            self.interactive_plays as f64,
            self.plays as f64,
            self.listens as f64,
            self.reads as f64,
            self.clicks as f64,
            self.interactions as f64,
            self.avg_time_per_event,
            self.session_duration,
            self.quiz_attempts as f64,
            self.practice_attempts as f64,
            self.note_taking as f64,
            self.bookmarking as f64,
        ]
    }

    /// Rule-based hints layered on top of the classifier output.
    pub fn signals(&self) -> Vec<String> {
        let checks = [
            (
                self.video_watches as f64 > self.reading_views as f64 * 1.5,
                "prefers_video_content",
            ),
            (self.audio_listens > self.video_watches, "prefers_audio_content"),
            (self.note_taking > 10, "takes_notes"),
            (self.interactive_plays > self.reading_views, "prefers_hands_on"),
            (self.avg_time_per_event > 40.0, "slow_paced_learner"),
            (self.interactions > self.reads, "interactive_learner"),
        ];
        checks
            .into_iter()
            .filter(|(fired, _)| *fired)
            .map(|(_, name)| name.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn event(second: i64, kind: EventType, content_type: &str) -> BehaviorEvent {
        let base = Utc.with_ymd_and_hms(2024, 7, 9, 8, 0, 0).unwrap();
        BehaviorEvent::new(base + Duration::seconds(second), kind).with_content("c", content_type)
    }

    #[test]
    fn tallies_content_and_interaction_types() {
        let events = vec![
            event(0, EventType::VideoPlay, "video"),
            event(30, EventType::VideoPlay, "video"),
            event(60, EventType::NoteCreate, "text"),
            event(150, EventType::Interaction, "simulation"),
        ];
        let f = StyleFeatures::extract(&events).unwrap();
        assert_eq!(f.video_watches, 2);
        assert_eq!(f.reading_views, 1);
        assert_eq!(f.interactive_plays, 1);
        assert_eq!(f.plays, 2);
        assert_eq!(f.note_taking, 1);
        assert_eq!(f.interactions, 1);
        assert_eq!(f.session_duration, 150.0);
        assert_eq!(f.avg_time_per_event, 50.0);
        assert_eq!(f.to_vector().len(), FEATURE_NAMES.len());
    }

    #[test]
    fn signals_follow_counts() {
        let f = StyleFeatures {
            video_watches: 9,
            reading_views: 2,
            interactive_plays: 3,
            interactions: 4,
            reads: 1,
            avg_time_per_event: 45.0,
            ..StyleFeatures::default()
        };
        assert_eq!(
            f.signals(),
            vec![
                "prefers_video_content",
                "prefers_hands_on",
                "slow_paced_learner",
                "interactive_learner"
            ]
        );
    }

    #[test]
    fn single_event_has_no_timing() {
        let f = StyleFeatures::extract(&[event(0, EventType::Click, "audio")]).unwrap();
        assert_eq!(f.session_duration, 0.0);
        assert_eq!(f.signals(), vec!["prefers_audio_content"]);
    }
}
