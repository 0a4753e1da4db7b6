use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==================== Behavior events ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    PageView,
    Click,
    Scroll,
    VideoPlay,
    VideoPause,
    VideoComplete,
    AudioPlay,
    AudioListen,
    TabSwitch,
    QuizAttempt,
    QuizAnswer,
    QuizFail,
    QuizSuccess,
    PracticeAttempt,
    Timeout,
    Search,
    ContentRepeat,
    NoteCreate,
    Bookmark,
    Share,
    Interaction,
    Pause,
    Resume,
    Complete,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorEvent {
    pub timestamp: DateTime<Utc>,
    #[serde(alias = "event_type")]
    pub event_type: EventType,
    #[serde(default, alias = "content_id", skip_serializing_if = "Option::is_none")]
    pub content_id: Option<String>,
    #[serde(default, alias = "content_type", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, alias = "scroll_depth", skip_serializing_if = "Option::is_none")]
    pub scroll_depth: Option<f64>,
}

impl BehaviorEvent {
    pub fn new(timestamp: DateTime<Utc>, event_type: EventType) -> Self {
        Self {
            timestamp,
            event_type,
            content_id: None,
            content_type: None,
            scroll_depth: None,
        }
    }

    pub fn with_content(mut self, content_id: impl Into<String>, content_type: impl Into<String>) -> Self {
        self.content_id = Some(content_id.into());
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_scroll_depth(mut self, depth: f64) -> Self {
        self.scroll_depth = Some(depth);
        self
    }
}

/// Events ordered by timestamp; the sort is stable so ties keep input order.
pub fn sorted_by_time(events: &[BehaviorEvent]) -> Vec<&BehaviorEvent> {
    let mut sorted: Vec<&BehaviorEvent> = events.iter().collect();
    sorted.sort_by_key(|e| e.timestamp);
    sorted
}

/// Seconds between consecutive events of an ordered window.
pub fn gaps_seconds(sorted: &[&BehaviorEvent]) -> Vec<f64> {
    sorted
        .windows(2)
        .map(|w| (w[1].timestamp - w[0].timestamp).num_milliseconds() as f64 / 1000.0)
        .collect()
}

// ==================== Learner state ====================

fn default_score() -> f64 {
    50.0
}

fn default_level() -> i64 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerState {
    #[serde(default = "default_score", alias = "engagement_score")]
    pub engagement_score: f64,
    #[serde(default = "default_score", alias = "performance_score")]
    pub performance_score: f64,
    #[serde(default = "default_score", alias = "completion_rate")]
    pub completion_rate: f64,
    #[serde(default = "default_level", alias = "current_level")]
    pub current_level: i64,
    #[serde(default, alias = "streak_days")]
    pub streak_days: i64,
}

impl Default for LearnerState {
    fn default() -> Self {
        Self {
            engagement_score: default_score(),
            performance_score: default_score(),
            completion_rate: default_score(),
            current_level: default_level(),
            streak_days: 0,
        }
    }
}

/// Candidate course supplied by the catalog. Unknown fields pass through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nsqf_level: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CourseRecord {
    pub fn level(&self) -> i64 {
        self.nsqf_level.unwrap_or(0)
    }

    pub fn has_keyword(&self, token: &str) -> bool {
        self.keywords
            .as_deref()
            .map(|k| k.to_lowercase().contains(token))
            .unwrap_or(false)
    }
}

/// Outcome of a delivered recommendation. Missing keys contribute nothing to
/// the reward; unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    #[serde(default, alias = "engagement_delta")]
    pub engagement_delta: Option<f64>,
    #[serde(default)]
    pub completion: Option<bool>,
    #[serde(default, alias = "performance_delta")]
    pub performance_delta: Option<f64>,
    #[serde(default)]
    pub satisfaction: Option<f64>,
    #[serde(default)]
    pub skip: Option<bool>,
    #[serde(default, alias = "negative_feedback")]
    pub negative_feedback: Option<bool>,
}

// ==================== Actions ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    RecommendSameDifficulty,
    RecommendHarder,
    RecommendEasier,
    RecommendDifferentTopic,
    RecommendInteractive,
    RecommendVideo,
    RecommendReading,
    RecommendQuiz,
}

impl Action {
    pub const ALL: [Action; 8] = [
        Action::RecommendSameDifficulty,
        Action::RecommendHarder,
        Action::RecommendEasier,
        Action::RecommendDifferentTopic,
        Action::RecommendInteractive,
        Action::RecommendVideo,
        Action::RecommendReading,
        Action::RecommendQuiz,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RecommendSameDifficulty => "recommend_same_difficulty",
            Self::RecommendHarder => "recommend_harder",
            Self::RecommendEasier => "recommend_easier",
            Self::RecommendDifferentTopic => "recommend_different_topic",
            Self::RecommendInteractive => "recommend_interactive",
            Self::RecommendVideo => "recommend_video",
            Self::RecommendReading => "recommend_reading",
            Self::RecommendQuiz => "recommend_quiz",
        }
    }

    /// Keyword a course must carry to match a content-format action.
    pub fn content_keyword(&self) -> Option<&'static str> {
        match self {
            Self::RecommendInteractive => Some("interactive"),
            Self::RecommendVideo => Some("video"),
            Self::RecommendReading => Some("reading"),
            Self::RecommendQuiz => Some("quiz"),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown action: {0}")]
pub struct UnknownAction(pub String);

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}
