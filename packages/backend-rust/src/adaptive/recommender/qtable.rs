use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::state::StateKey;
use crate::adaptive::types::Action;

/// Persisted shape: state key -> action name -> value.
type NestedTable = BTreeMap<String, BTreeMap<String, f64>>;

/// Tabular value estimates keyed by `(state, action)`. Unseen pairs read as 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "NestedTable", into = "NestedTable")]
pub struct QTable {
    values: HashMap<(StateKey, Action), f64>,
}

impl QTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_default(&self, state: StateKey, action: Action, default: f64) -> f64 {
        self.values.get(&(state, action)).copied().unwrap_or(default)
    }

    pub fn get(&self, state: StateKey, action: Action) -> f64 {
        self.get_or_default(state, action, 0.0)
    }

    pub fn set(&mut self, state: StateKey, action: Action, value: f64) {
        self.values.insert((state, action), value);
    }

    /// Values for every action, in action-space order.
    pub fn row(&self, state: StateKey) -> [f64; 8] {
        Action::ALL.map(|a| self.get(state, a))
    }

    pub fn max_value(&self, state: StateKey) -> f64 {
        self.row(state).into_iter().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn states(&self) -> BTreeSet<StateKey> {
        self.values.keys().map(|(s, _)| *s).collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<QTable> for NestedTable {
    fn from(table: QTable) -> Self {
        let mut nested = NestedTable::new();
        for ((state, action), value) in table.values {
            nested
                .entry(state.to_string())
                .or_default()
                .insert(action.as_str().to_string(), value);
        }
        nested
    }
}

impl From<NestedTable> for QTable {
    fn from(nested: NestedTable) -> Self {
        let mut table = QTable::new();
        for (raw_state, actions) in nested {
            let Ok(state) = raw_state.parse::<StateKey>() else {
                warn!(state = %raw_state, "skipping malformed q-table state");
                continue;
            };
            for (raw_action, value) in actions {
                match raw_action.parse::<Action>() {
                    Ok(action) => table.set(state, action, value),
                    Err(e) => warn!(error = %e, "skipping q-table entry"),
                }
            }
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> StateKey {
        s.parse().unwrap()
    }

    #[test]
    fn unseen_pairs_default_to_zero() {
        let table = QTable::new();
        assert_eq!(table.get(key("s_1_1_1_1"), Action::RecommendQuiz), 0.0);
        assert_eq!(table.get_or_default(key("s_1_1_1_1"), Action::RecommendQuiz, 0.0), 0.0);
        assert_eq!(table.max_value(key("s_1_1_1_1")), 0.0);
        assert!(table.is_empty());
    }

    #[test]
    fn row_follows_action_order() {
        let mut table = QTable::new();
        table.set(key("s_2_2_2_0"), Action::RecommendVideo, 0.4);
        table.set(key("s_2_2_2_0"), Action::RecommendHarder, -0.2);
        let row = table.row(key("s_2_2_2_0"));
        assert_eq!(row[1], -0.2);
        assert_eq!(row[5], 0.4);
        assert_eq!(table.max_value(key("s_2_2_2_0")), 0.4);
        assert_eq!(table.states().len(), 1);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn nested_json_shape() {
        let mut table = QTable::new();
        table.set(key("s_0_1_2_1"), Action::RecommendEasier, 0.125);
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["s_0_1_2_1"]["recommend_easier"], 0.125);

        let back: QTable = serde_json::from_value(json).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn malformed_entries_are_dropped() {
        let json = serde_json::json!({
            "s_1_1_1_1": {"recommend_quiz": 0.5, "recommend_magic": 9.0},
            "bogus": {"recommend_quiz": 1.0}
        });
        let table: QTable = serde_json::from_value(json).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(key("s_1_1_1_1"), Action::RecommendQuiz), 0.5);
    }
}
