use std::collections::HashSet;

use serde::Serialize;

use crate::adaptive::types::{gaps_seconds, sorted_by_time, BehaviorEvent, EventType};

/// Gaps longer than this many seconds count as an inactive period.
pub const LONG_GAP_SECONDS: f64 = 300.0;

pub const FEATURE_DIM: usize = 12;

pub const FEATURE_NAMES: [&str; FEATURE_DIM] = [
    "total_events",
    "session_duration_hours",
    "max_gap_hours",
    "long_inactive_periods",
    "events_per_minute",
    "engagement_ratio",
    "tab_switches",
    "quiz_fails",
    "video_pauses",
    "repeats",
    "content_diversity",
    "scroll_depth_avg",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionFeatures {
    pub total_events: usize,
    pub page_views: usize,
    pub clicks: usize,
    pub scrolls: usize,
    pub video_plays: usize,
    pub video_pauses: usize,
    pub video_completes: usize,
    pub tab_switches: usize,
    pub quiz_attempts: usize,
    pub quiz_fails: usize,
    pub quiz_successes: usize,
    pub timeouts: usize,
    pub searches: usize,
    pub repeats: usize,
    pub session_duration_hours: f64,
    pub avg_time_between_events: f64,
    pub max_gap_hours: f64,
    pub long_inactive_periods: usize,
    pub total_inactive_seconds: f64,
    pub events_per_minute: f64,
    pub engagement_ratio: f64,
    pub scroll_depth_avg: f64,
    pub video_watch_ratio: f64,
    pub content_diversity: usize,
    pub dominant_content_type: Option<String>,
}

impl SessionFeatures {
    /// `None` for an empty window.
    pub fn extract(events: &[BehaviorEvent]) -> Option<Self> {
        if events.is_empty() {
            return None;
        }

        let sorted = sorted_by_time(events);
        let mut f = SessionFeatures {
            total_events: sorted.len(),
            ..Self::default()
        };

        for event in &sorted {
            match event.event_type {
                EventType::PageView => f.page_views += 1,
                EventType::Click => f.clicks += 1,
                EventType::Scroll => f.scrolls += 1,
                EventType::VideoPlay => f.video_plays += 1,
                EventType::VideoPause => f.video_pauses += 1,
                EventType::VideoComplete => f.video_completes += 1,
                EventType::TabSwitch => f.tab_switches += 1,
                EventType::QuizAttempt => f.quiz_attempts += 1,
                EventType::QuizFail => f.quiz_fails += 1,
                EventType::QuizSuccess => f.quiz_successes += 1,
                EventType::Timeout => f.timeouts += 1,
                EventType::Search => f.searches += 1,
                EventType::ContentRepeat => f.repeats += 1,
                _ => {}
            }
        }

        if sorted.len() > 1 {
            let first = sorted[0].timestamp;
            let last = sorted[sorted.len() - 1].timestamp;
            f.session_duration_hours = (last - first).num_milliseconds() as f64 / 3_600_000.0;

            let gaps = gaps_seconds(&sorted);
            f.avg_time_between_events = gaps.iter().sum::<f64>() / gaps.len() as f64;
            f.max_gap_hours = gaps.iter().copied().fold(0.0, f64::max) / 3600.0;
            for gap in gaps.iter().filter(|g| **g > LONG_GAP_SECONDS) {
                f.long_inactive_periods += 1;
                f.total_inactive_seconds += gap;
            }
        }

        f.events_per_minute = f.total_events as f64 / (f.session_duration_hours * 60.0).max(1.0);

        let positive = f.clicks + f.video_plays + f.quiz_successes;
        let negative = f.tab_switches + f.timeouts + f.quiz_fails;
        f.engagement_ratio = positive as f64 / (positive + negative).max(1) as f64;

        let depths: Vec<f64> = sorted.iter().filter_map(|e| e.scroll_depth).collect();
        if !depths.is_empty() {
            f.scroll_depth_avg = depths.iter().sum::<f64>() / depths.len() as f64;
        }

        f.video_watch_ratio = f.video_plays as f64 / f.video_completes.max(1) as f64;

        let ids: HashSet<&str> = sorted.iter().filter_map(|e| e.content_id.as_deref()).collect();
        f.content_diversity = if sorted.iter().any(|e| e.content_id.is_some()) {
            ids.len()
        } else {
            1
        };

        f.dominant_content_type = dominant(sorted.iter().filter_map(|e| e.content_type.as_deref()));

        Some(f)
    }

    pub fn to_vector(&self) -> Vec<f64> {
        vec![
            self.total_events as f64,
            self.session_duration_hours,
            self.max_gap_hours,
            self.long_inactive_periods as f64,
            self.events_per_minute,
            self.engagement_ratio,
            self.tab_switches as f64,
            self.quiz_fails as f64,
            self.video_pauses as f64,
            self.repeats as f64,
            self.content_diversity as f64,
            self.scroll_depth_avg,
        ]
    }
}

/// Most frequent value; ties go to the value seen first.
pub fn dominant<'a>(values: impl Iterator<Item = &'a str>) -> Option<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(v, _)| *v == value) {
            Some((_, n)) => *n += 1,
            None => counts.push((value, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (value, n) in counts {
        if best.map_or(true, |(_, m)| n > m) {
            best = Some((value, n));
        }
    }
    best.map(|(v, _)| v.to_string())
}
