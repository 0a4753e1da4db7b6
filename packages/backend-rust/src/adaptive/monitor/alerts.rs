use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    Anomaly,
    Boredom,
    Inactivity,
    Struggle,
    FastCompletion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Medium,
    High,
}

impl AlertType {
    pub fn severity(&self) -> AlertSeverity {
        match self {
            Self::Boredom => AlertSeverity::Medium,
            _ => AlertSeverity::High,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
}

impl Alert {
    pub fn anomaly() -> Self {
        Self::new(AlertType::Anomaly, "Unusual learning pattern detected")
    }

    pub fn boredom() -> Self {
        Self::new(AlertType::Boredom, "User appears bored or disengaged")
    }

    pub fn inactivity(hours: f64) -> Self {
        Self::new(
            AlertType::Inactivity,
            format!("User inactive for {} hours", format_hours(hours)),
        )
    }

    pub fn struggle() -> Self {
        Self::new(AlertType::Struggle, "User is struggling with content")
    }

    pub fn fast_completion() -> Self {
        Self::new(AlertType::FastCompletion, "Suspiciously fast completion detected")
    }

    fn new(alert_type: AlertType, message: impl Into<String>) -> Self {
        Self {
            alert_type,
            severity: alert_type.severity(),
            message: message.into(),
        }
    }
}

/// Whole hours keep one decimal ("3.0"), others print as-is ("2.35").
fn format_hours(hours: f64) -> String {
    if hours.fract() == 0.0 {
        format!("{hours:.1}")
    } else {
        format!("{hours}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Normal,
    Attention,
    Warning,
    Critical,
}

impl SessionStatus {
    pub fn from_alert_count(count: usize) -> Self {
        match count {
            0 => Self::Normal,
            1 => Self::Attention,
            2 => Self::Warning,
            _ => Self::Critical,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterventionRecommendation {
    pub action: String,
    pub reason: String,
    pub content_type: String,
}

impl InterventionRecommendation {
    fn new(action: &str, reason: &str, content_type: &str) -> Self {
        Self {
            action: action.to_string(),
            reason: reason.to_string(),
            content_type: content_type.to_string(),
        }
    }

    pub fn keep_going() -> Self {
        Self::new("continue", "Normal learning pattern", "current")
    }
}

/// Intervention for one alert type. Anomalies have none.
pub fn intervention_for(alert_type: AlertType) -> Option<InterventionRecommendation> {
    let rec = match alert_type {
        AlertType::Boredom => InterventionRecommendation::new(
            "suggest_interactive_content",
            "User shows boredom signals",
            "quiz",
        ),
        AlertType::Struggle => InterventionRecommendation::new(
            "provide_hint_or_help",
            "User is struggling with material",
            "tutorial",
        ),
        AlertType::Inactivity => InterventionRecommendation::new(
            "send_reminder",
            "User has been inactive",
            "notification",
        ),
        AlertType::FastCompletion => InterventionRecommendation::new(
            "verify_learning",
            "Suspicious completion pattern",
            "assessment",
        ),
        AlertType::Anomaly => return None,
    };
    Some(rec)
}

pub fn interventions(alerts: &[Alert]) -> Vec<InterventionRecommendation> {
    let recs: Vec<InterventionRecommendation> = alerts
        .iter()
        .filter_map(|a| intervention_for(a.alert_type))
        .collect();
    if recs.is_empty() {
        vec![InterventionRecommendation::keep_going()]
    } else {
        recs
    }
}
