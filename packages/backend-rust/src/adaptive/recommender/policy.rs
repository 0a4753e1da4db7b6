use rand::Rng;

use crate::adaptive::types::{Action, CourseRecord, LearnerState};

pub const MAX_RECOMMENDED: usize = 5;

fn random_action<R: Rng + ?Sized>(rng: &mut R) -> Action {
    Action::ALL[rng.random_range(0..Action::ALL.len())]
}

/// Epsilon-greedy choice over one Q-table row. A row whose values are all
/// exactly zero has not been learned yet and is explored.
pub fn select_action<R: Rng + ?Sized>(row: &[f64; 8], epsilon: f64, rng: &mut R) -> Action {
    if rng.random::<f64>() < epsilon {
        return random_action(rng);
    }

    if row.iter().all(|q| *q == 0.0) {
        return random_action(rng);
    }

    let max_q = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let best: Vec<Action> = Action::ALL
        .iter()
        .zip(row.iter())
        .filter(|(_, q)| **q == max_q)
        .map(|(a, _)| *a)
        .collect();
    best[rng.random_range(0..best.len())]
}

/// Greedy action for reporting; ties resolve to the earliest action.
pub fn argmax_action(row: &[f64; 8]) -> (Action, f64) {
    let mut best = 0;
    for (i, q) in row.iter().enumerate() {
        if *q > row[best] {
            best = i;
        }
    }
    (Action::ALL[best], row[best])
}

/// Courses matching the action, falling back to the head of the catalog.
pub fn filter_courses(
    action: Action,
    state: &LearnerState,
    courses: &[CourseRecord],
) -> Vec<CourseRecord> {
    let level = state.current_level;
    let matches = |c: &CourseRecord| match action {
        Action::RecommendHarder => c.level() > level,
        Action::RecommendEasier => c.level() < level,
        Action::RecommendSameDifficulty => c.level() == level,
        Action::RecommendDifferentTopic => true,
        _ => action.content_keyword().is_some_and(|k| c.has_keyword(k)),
    };

    let picked: Vec<CourseRecord> = courses
        .iter()
        .filter(|c| matches(c))
        .take(MAX_RECOMMENDED)
        .cloned()
        .collect();
    if picked.is_empty() {
        courses.iter().take(MAX_RECOMMENDED).cloned().collect()
    } else {
        picked
    }
}
