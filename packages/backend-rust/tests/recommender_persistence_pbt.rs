//! Property-based tests for recommender persistence
//!
//! Invariants:
//! - Round-trip: save -> load reproduces every Q-value and hyperparameter
//! - Tolerance: partial or legacy blobs load with defaults filled in
//! - Epsilon never drops below its floor across any update sequence

use proptest::prelude::*;

use engage_backend::adaptive::config::{RecommenderParams, RewardWeights};
use engage_backend::adaptive::persistence::{ModelStore, RECOMMENDER_FILE};
use engage_backend::adaptive::recommender::{AdaptiveRecommender, RecommenderSnapshot};
use engage_backend::adaptive::{Action, Feedback, LearnerState};

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_learner_state() -> impl Strategy<Value = LearnerState> {
    (0u32..=100, 0u32..=100, 0u32..=100, 1i64..=8, 0i64..=12).prop_map(
        |(engagement, performance, completion, level, streak)| LearnerState {
            engagement_score: engagement as f64,
            performance_score: performance as f64,
            completion_rate: completion as f64,
            current_level: level,
            streak_days: streak,
        },
    )
}

fn arb_action() -> impl Strategy<Value = Action> {
    (0usize..Action::ALL.len()).prop_map(|i| Action::ALL[i])
}

fn arb_feedback() -> impl Strategy<Value = Feedback> {
    (
        proptest::option::of(-1.0f64..=1.0),
        proptest::option::of(any::<bool>()),
        proptest::option::of(-1.0f64..=1.0),
        proptest::option::of(0.0f64..=1.0),
        proptest::option::of(any::<bool>()),
        proptest::option::of(any::<bool>()),
    )
        .prop_map(
            |(engagement_delta, completion, performance_delta, satisfaction, skip, negative_feedback)| {
                Feedback {
                    engagement_delta,
                    completion,
                    performance_delta,
                    satisfaction,
                    skip,
                    negative_feedback,
                }
            },
        )
}

fn arb_step() -> impl Strategy<Value = (LearnerState, Action, Feedback, Option<LearnerState>)> {
    (
        arb_learner_state(),
        arb_action(),
        arb_feedback(),
        proptest::option::of(arb_learner_state()),
    )
}

fn trained(steps: &[(LearnerState, Action, Feedback, Option<LearnerState>)]) -> AdaptiveRecommender {
    let recommender =
        AdaptiveRecommender::with_seed(RecommenderParams::default(), RewardWeights::default(), 11);
    for (state, action, feedback, next) in steps {
        recommender.update(state, *action, feedback, next.as_ref());
    }
    recommender
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Saved and reloaded recommenders agree on every (state, action) value.
    #[test]
    fn save_then_load_reproduces_q_table(steps in proptest::collection::vec(arb_step(), 1..40)) {
        let original = trained(&steps);
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        store.save(RECOMMENDER_FILE, &original.snapshot()).unwrap();

        let loaded: RecommenderSnapshot = store.load(RECOMMENDER_FILE).unwrap();
        let restored = AdaptiveRecommender::default();
        restored.restore(loaded);

        prop_assert_eq!(restored.snapshot(), original.snapshot());
        for (state, _, _, next) in &steps {
            for action in Action::ALL {
                prop_assert_eq!(restored.q_value(state, action), original.q_value(state, action));
                if let Some(next) = next {
                    prop_assert_eq!(restored.q_value(next, action), original.q_value(next, action));
                }
            }
        }
        prop_assert_eq!(restored.epsilon(), original.epsilon());
    }

    /// Epsilon is non-increasing and floored at min_epsilon.
    #[test]
    fn epsilon_decays_to_floor(steps in proptest::collection::vec(arb_step(), 1..120)) {
        let recommender =
            AdaptiveRecommender::with_seed(RecommenderParams::default(), RewardWeights::default(), 3);
        let mut previous = recommender.epsilon();
        for (state, action, feedback, next) in &steps {
            let outcome = recommender.update(state, *action, feedback, next.as_ref());
            prop_assert!(outcome.epsilon <= previous);
            prop_assert!(outcome.epsilon >= 0.01);
            prop_assert!((-1.0..=1.0).contains(&outcome.reward));
            previous = outcome.epsilon;
        }
    }
}

#[test]
fn legacy_blob_loads_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let store = ModelStore::new(dir.path());
    std::fs::write(
        store.path(RECOMMENDER_FILE),
        r#"{
            "q_table": { "s_2_2_2_0": { "recommend_quiz": 0.25, "warp_drive": 9.0 } },
            "feature_weights": { "engagement": 0.4, "completion": 0.2, "performance": 0.2, "satisfaction": 0.2 }
        }"#,
    )
    .unwrap();

    let snapshot: RecommenderSnapshot = store.load(RECOMMENDER_FILE).unwrap();
    assert_eq!(snapshot.epsilon, 0.1);
    assert_eq!(snapshot.alpha, 0.1);
    assert_eq!(snapshot.gamma, 0.9);
    assert_eq!(snapshot.reward_weights.engagement, 0.4);
    assert_eq!(snapshot.q_table.len(), 1);

    let recommender = AdaptiveRecommender::default();
    recommender.restore(snapshot);
    assert_eq!(
        recommender.q_value(&LearnerState::default(), Action::RecommendQuiz),
        0.25
    );
}

#[test]
fn corrupt_blob_is_cold_start() {
    let dir = tempfile::tempdir().unwrap();
    let store = ModelStore::new(dir.path());
    std::fs::write(store.path(RECOMMENDER_FILE), "[1, 2").unwrap();
    assert!(store.load::<RecommenderSnapshot>(RECOMMENDER_FILE).is_none());
}
