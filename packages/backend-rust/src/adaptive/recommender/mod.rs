//! Adaptive Recommender
//!
//! Tabular Q-learning over discretized learner states. Reads (recommend,
//! state value, policy, stats) share a read lock on the table; `update`
//! takes the write lock so concurrent feedback is serialized.

pub mod policy;
pub mod qtable;
pub mod reward;
pub mod state;

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use engage_algo::round_to;
use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adaptive::config::{RecommenderParams, RewardWeights};
use crate::adaptive::types::{Action, CourseRecord, Feedback, LearnerState};

pub use qtable::QTable;
pub use state::StateKey;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub action: Action,
    pub reward: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub action_taken: Action,
    pub state: StateKey,
    pub recommended_courses: Vec<CourseRecord>,
    pub exploration: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UpdateOutcome {
    pub reward: f64,
    pub epsilon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateValue {
    pub state_key: StateKey,
    pub q_values: BTreeMap<Action, f64>,
    pub best_action: String,
    pub epsilon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyEntry {
    pub action: Action,
    pub q_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommenderStats {
    pub states_visited: usize,
    pub total_updates: usize,
    pub average_reward: f64,
    pub epsilon: f64,
    pub q_table_size: usize,
}

fn default_epsilon() -> f64 {
    RecommenderParams::default().epsilon
}

fn default_alpha() -> f64 {
    RecommenderParams::default().alpha
}

fn default_gamma() -> f64 {
    RecommenderParams::default().gamma
}

/// Persisted form. Every field falls back to its default so older or
/// partial blobs still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommenderSnapshot {
    #[serde(default)]
    pub q_table: QTable,
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    #[serde(default = "default_gamma")]
    pub gamma: f64,
    #[serde(default, alias = "feature_weights")]
    pub reward_weights: RewardWeights,
}

struct Learning {
    q_table: QTable,
    epsilon: f64,
    alpha: f64,
    gamma: f64,
    weights: RewardWeights,
    history: HashMap<StateKey, Vec<HistoryEntry>>,
}

pub struct AdaptiveRecommender {
    epsilon_decay: f64,
    min_epsilon: f64,
    learning: RwLock<Learning>,
    rng: Mutex<StdRng>,
}

impl AdaptiveRecommender {
    pub fn new(params: RecommenderParams, weights: RewardWeights) -> Self {
        Self::with_rng(params, weights, StdRng::from_rng(&mut rand::rng()))
    }

    /// Deterministic exploration, for tests and replays.
    pub fn with_seed(params: RecommenderParams, weights: RewardWeights, seed: u64) -> Self {
        Self::with_rng(params, weights, StdRng::seed_from_u64(seed))
    }

    fn with_rng(params: RecommenderParams, weights: RewardWeights, rng: StdRng) -> Self {
        Self {
            epsilon_decay: params.epsilon_decay,
            min_epsilon: params.min_epsilon,
            learning: RwLock::new(Learning {
                q_table: QTable::new(),
                epsilon: params.epsilon,
                alpha: params.alpha,
                gamma: params.gamma,
                weights,
                history: HashMap::new(),
            }),
            rng: Mutex::new(rng),
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.learning.read().epsilon
    }

    pub fn q_value(&self, state: &LearnerState, action: Action) -> f64 {
        self.learning.read().q_table.get(StateKey::from_state(state), action)
    }

    pub fn get_recommendation(
        &self,
        learner: &LearnerState,
        courses: &[CourseRecord],
    ) -> Recommendation {
        let key = StateKey::from_state(learner);
        let (row, epsilon) = {
            let learning = self.learning.read();
            (learning.q_table.row(key), learning.epsilon)
        };
        let action = policy::select_action(&row, epsilon, &mut *self.rng.lock());
        let recommended_courses = policy::filter_courses(action, learner, courses);

        debug!(
            state = %key,
            action = %action,
            candidates = courses.len(),
            picked = recommended_courses.len(),
            "recommendation selected"
        );

        Recommendation {
            action_taken: action,
            state: key,
            recommended_courses,
            exploration: epsilon > self.min_epsilon,
        }
    }

    /// One Q-learning step. `next` is the learner state observed after the
    /// action; without it the transition is treated as a self-loop.
    pub fn update(
        &self,
        learner: &LearnerState,
        action: Action,
        feedback: &Feedback,
        next: Option<&LearnerState>,
    ) -> UpdateOutcome {
        let key = StateKey::from_state(learner);
        let next_key = next.map(StateKey::from_state).unwrap_or(key);

        let mut learning = self.learning.write();
        let reward = reward::compute_reward(feedback, &learning.weights);

        let current = learning.q_table.get_or_default(key, action, 0.0);
        let max_next = learning.q_table.max_value(next_key);
        let updated = current + learning.alpha * (reward + learning.gamma * max_next - current);
        learning.q_table.set(key, action, updated);

        learning.history.entry(key).or_default().push(HistoryEntry {
            action,
            reward,
            timestamp: Utc::now(),
        });

        learning.epsilon = (learning.epsilon * self.epsilon_decay).max(self.min_epsilon);

        debug!(
            state = %key,
            next_state = %next_key,
            action = %action,
            reward,
            q = updated,
            epsilon = learning.epsilon,
            "q-value updated"
        );

        UpdateOutcome {
            reward,
            epsilon: learning.epsilon,
        }
    }

    pub fn get_state_value(&self, learner: &LearnerState) -> StateValue {
        let key = StateKey::from_state(learner);
        let learning = self.learning.read();
        let row = learning.q_table.row(key);

        let best_action = if row.iter().any(|q| *q != 0.0) {
            policy::argmax_action(&row).0.as_str().to_string()
        } else {
            "explore".to_string()
        };

        StateValue {
            state_key: key,
            q_values: Action::ALL
                .iter()
                .zip(row.iter())
                .map(|(a, q)| (*a, round_to(*q, 3)))
                .collect(),
            best_action,
            epsilon: learning.epsilon,
        }
    }

    pub fn get_policy(&self) -> BTreeMap<StateKey, PolicyEntry> {
        let learning = self.learning.read();
        learning
            .q_table
            .states()
            .into_iter()
            .map(|key| {
                let (action, q_value) = policy::argmax_action(&learning.q_table.row(key));
                (key, PolicyEntry { action, q_value })
            })
            .collect()
    }

    pub fn get_stats(&self) -> RecommenderStats {
        let learning = self.learning.read();
        let total_updates = learning.history.values().map(Vec::len).sum();
        let per_state: Vec<f64> = learning
            .history
            .values()
            .filter(|h| !h.is_empty())
            .map(|h| h.iter().map(|e| e.reward).sum::<f64>() / h.len() as f64)
            .collect();
        let average_reward = if per_state.is_empty() {
            0.0
        } else {
            per_state.iter().sum::<f64>() / per_state.len() as f64
        };

        RecommenderStats {
            states_visited: learning.q_table.states().len(),
            total_updates,
            average_reward: round_to(average_reward, 3),
            epsilon: round_to(learning.epsilon, 3),
            q_table_size: learning.q_table.len(),
        }
    }

    pub fn snapshot(&self) -> RecommenderSnapshot {
        let learning = self.learning.read();
        RecommenderSnapshot {
            q_table: learning.q_table.clone(),
            epsilon: learning.epsilon,
            alpha: learning.alpha,
            gamma: learning.gamma,
            reward_weights: learning.weights.clone(),
        }
    }

    /// Replaces the table and hyperparameters; per-state history starts over.
    pub fn restore(&self, snapshot: RecommenderSnapshot) {
        let mut learning = self.learning.write();
        learning.q_table = snapshot.q_table;
        learning.epsilon = snapshot.epsilon;
        learning.alpha = snapshot.alpha;
        learning.gamma = snapshot.gamma;
        learning.weights = snapshot.reward_weights;
        learning.history.clear();
    }
}

impl Default for AdaptiveRecommender {
    fn default() -> Self {
        Self::new(RecommenderParams::default(), RewardWeights::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> AdaptiveRecommender {
        AdaptiveRecommender::with_seed(RecommenderParams::default(), RewardWeights::default(), 42)
    }

    fn completed() -> Feedback {
        Feedback {
            completion: Some(true),
            satisfaction: Some(1.0),
            ..Feedback::default()
        }
    }

    #[test]
    fn single_update_moves_toward_reward() {
        let rec = seeded();
        let learner = LearnerState::default();
        let out = rec.update(&learner, Action::RecommendVideo, &completed(), None);

        assert!((out.reward - 0.45).abs() < 1e-12);
        assert!((out.epsilon - 0.099).abs() < 1e-12);
        assert!((rec.q_value(&learner, Action::RecommendVideo) - 0.045).abs() < 1e-12);
    }

    #[test]
    fn next_state_bootstraps_from_its_best_value() {
        let rec = seeded();
        let next = LearnerState {
            engagement_score: 90.0,
            ..LearnerState::default()
        };
        for _ in 0..10 {
            rec.update(&next, Action::RecommendQuiz, &completed(), None);
        }
        let best_next = rec.q_value(&next, Action::RecommendQuiz);

        let start = LearnerState::default();
        rec.update(&start, Action::RecommendHarder, &Feedback::default(), Some(&next));
        let q = rec.q_value(&start, Action::RecommendHarder);
        assert!((q - 0.1 * 0.9 * best_next).abs() < 1e-12);
    }

    #[test]
    fn epsilon_floor_and_exploration_flag() {
        let rec = seeded();
        let learner = LearnerState::default();
        for _ in 0..1000 {
            rec.update(&learner, Action::RecommendReading, &Feedback::default(), None);
        }
        assert_eq!(rec.epsilon(), 0.01);
        let out = rec.get_recommendation(&learner, &[]);
        assert!(!out.exploration);
        assert!(out.recommended_courses.is_empty());
    }

    #[test]
    fn state_value_reports_explore_for_fresh_state() {
        let rec = seeded();
        let value = rec.get_state_value(&LearnerState::default());
        assert_eq!(value.best_action, "explore");
        assert_eq!(value.q_values.len(), 8);
        assert_eq!(value.state_key.to_string(), "s_2_2_2_0");

        rec.update(&LearnerState::default(), Action::RecommendEasier, &completed(), None);
        let value = rec.get_state_value(&LearnerState::default());
        assert_eq!(value.best_action, "recommend_easier");
        assert_eq!(value.q_values[&Action::RecommendEasier], 0.045);
    }

    #[test]
    fn policy_and_stats() {
        let rec = seeded();
        let a = LearnerState::default();
        let b = LearnerState {
            performance_score: 95.0,
            ..LearnerState::default()
        };
        rec.update(&a, Action::RecommendVideo, &completed(), None);
        rec.update(
            &a,
            Action::RecommendQuiz,
            &Feedback {
                completion: Some(false),
                ..Feedback::default()
            },
            None,
        );
        rec.update(
            &b,
            Action::RecommendHarder,
            &Feedback {
                skip: Some(true),
                ..Feedback::default()
            },
            None,
        );

        let policy = rec.get_policy();
        assert_eq!(policy.len(), 2);
        assert_eq!(policy[&StateKey::from_state(&a)].action, Action::RecommendVideo);

        let stats = rec.get_stats();
        assert_eq!(stats.states_visited, 2);
        assert_eq!(stats.total_updates, 3);
        assert_eq!(stats.q_table_size, 3);
        // per-state means 0.1625 and -0.3
        assert!((stats.average_reward + 0.069).abs() < 1e-9);
    }

    #[test]
    fn snapshot_restores_table_and_hyperparameters() {
        let rec = seeded();
        rec.update(&LearnerState::default(), Action::RecommendVideo, &completed(), None);
        let snapshot = rec.snapshot();

        let fresh = seeded();
        fresh.restore(snapshot.clone());
        assert_eq!(fresh.snapshot(), snapshot);
        assert_eq!(fresh.get_stats().total_updates, 0);
    }

    #[test]
    fn partial_snapshot_uses_defaults() {
        let snapshot: RecommenderSnapshot =
            serde_json::from_str(r#"{"q_table": {"s_1_1_1_0": {"recommend_quiz": 0.2}}}"#).unwrap();
        assert_eq!(snapshot.epsilon, 0.1);
        assert_eq!(snapshot.gamma, 0.9);
        assert_eq!(snapshot.reward_weights, RewardWeights::default());
        assert_eq!(snapshot.q_table.len(), 1);
    }
}
