use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::adaptive::types::LearnerState;

const SCORE_BAND: f64 = 20.0;
const STREAK_CAP: i64 = 5;
const STREAK_BAND: i64 = 2;

/// Discretized learner state. Learners whose scores fall in the same bands
/// share one Q-table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateKey {
    pub engagement: i64,
    pub performance: i64,
    pub completion: i64,
    pub streak: i64,
}

/// Score bands of width 20 with no upper cap: a perfect 100 lands in band 5,
/// one past the 0..=4 range that scores below 100 fall into.
fn band(score: f64) -> i64 {
    (score / SCORE_BAND).trunc() as i64
}

impl StateKey {
    pub fn from_state(state: &LearnerState) -> Self {
        Self {
            engagement: band(state.engagement_score),
            performance: band(state.performance_score),
            completion: band(state.completion_rate),
            streak: state.streak_days.min(STREAK_CAP) / STREAK_BAND,
        }
    }
}

impl From<&LearnerState> for StateKey {
    fn from(state: &LearnerState) -> Self {
        Self::from_state(state)
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "s_{}_{}_{}_{}",
            self.engagement, self.performance, self.completion, self.streak
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed state key: {0}")]
pub struct MalformedStateKey(pub String);

impl FromStr for StateKey {
    type Err = MalformedStateKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || MalformedStateKey(s.to_string());
        let rest = s.strip_prefix("s_").ok_or_else(err)?;
        let parts: Vec<i64> = rest
            .split('_')
            .map(|p| p.parse::<i64>())
            .collect::<Result<_, _>>()
            .map_err(|_| err())?;
        match parts.as_slice() {
            [engagement, performance, completion, streak] => Ok(Self {
                engagement: *engagement,
                performance: *performance,
                completion: *completion,
                streak: *streak,
            }),
            _ => Err(err()),
        }
    }
}

impl Serialize for StateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn learner(e: f64, p: f64, c: f64, streak: i64) -> LearnerState {
        LearnerState {
            engagement_score: e,
            performance_score: p,
            completion_rate: c,
            current_level: 1,
            streak_days: streak,
        }
    }

    #[test]
    fn buckets_and_rendering() {
        let key = StateKey::from_state(&learner(75.0, 39.9, 100.0, 9));
        assert_eq!(key.to_string(), "s_3_1_5_2");
        assert_eq!(StateKey::from_state(&LearnerState::default()).to_string(), "s_2_2_2_0");
    }

    #[test]
    fn parse_round_trip_and_rejects_garbage() {
        let key: StateKey = "s_4_0_3_1".parse().unwrap();
        assert_eq!(key.to_string(), "s_4_0_3_1");
        assert!("s_4_0_3".parse::<StateKey>().is_err());
        assert!("x_1_1_1_1".parse::<StateKey>().is_err());
        assert!("s_a_1_1_1".parse::<StateKey>().is_err());
    }

    proptest! {
        #[test]
        fn bucket_bounds(
            e in 0.0f64..=100.0,
            p in 0.0f64..=100.0,
            c in 0.0f64..=100.0,
            streak in 0i64..400,
        ) {
            let key = StateKey::from_state(&learner(e, p, c, streak));
            for b in [key.engagement, key.performance, key.completion] {
                prop_assert!((0..=5).contains(&b));
            }
            prop_assert!((0..=2).contains(&key.streak));
        }

        #[test]
        fn same_bands_same_key(e in 0.0f64..19.99, shift in 0.0f64..0.01) {
            let a = StateKey::from_state(&learner(e, 50.0, 50.0, 1));
            let b = StateKey::from_state(&learner(e + shift, 50.0, 50.0, 1));
            prop_assert_eq!(a, b);
        }
    }
}
