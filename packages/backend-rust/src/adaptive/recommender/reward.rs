use crate::adaptive::config::RewardWeights;
use crate::adaptive::types::Feedback;

const SKIP_PENALTY: f64 = 0.3;
const NEGATIVE_FEEDBACK_PENALTY: f64 = 0.5;

/// Scalar reward in [-1, 1] for one feedback record.
pub fn compute_reward(feedback: &Feedback, weights: &RewardWeights) -> f64 {
    let mut reward = 0.0;

    if let Some(delta) = feedback.engagement_delta {
        reward += weights.engagement * delta;
    }
    if let Some(completed) = feedback.completion {
        reward += weights.completion * if completed { 1.0 } else { -0.5 };
    }
    if let Some(delta) = feedback.performance_delta {
        reward += weights.performance * delta;
    }
    if let Some(satisfaction) = feedback.satisfaction {
        reward += weights.satisfaction * (satisfaction - 0.5) * 2.0;
    }
    if feedback.skip == Some(true) {
        reward -= SKIP_PENALTY;
    }
    if feedback.negative_feedback == Some(true) {
        reward -= NEGATIVE_FEEDBACK_PENALTY;
    }

    if reward.is_nan() {
        return 0.0;
    }
    reward.clamp(-1.0, 1.0)
}
