use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use super::run_blocking;
use crate::adaptive::types::UnknownAction;
use crate::adaptive::{Action, CourseRecord, Feedback, LearnerState};
use crate::response::{ok, AppError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecommendRequest {
    #[serde(default, alias = "learner_state")]
    learner_state: LearnerState,
    #[serde(default, alias = "available_courses")]
    available_courses: Vec<CourseRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRequest {
    #[serde(default, alias = "learner_state")]
    learner_state: LearnerState,
    action: String,
    #[serde(default)]
    feedback: Feedback,
    #[serde(default, alias = "next_state")]
    next_state: Option<LearnerState>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StateValueRequest {
    #[serde(default, alias = "learner_state")]
    learner_state: LearnerState,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recommend", post(recommend))
        .route("/update", post(update))
        .route("/state-value", post(state_value))
        .route("/policy", get(policy))
        .route("/stats", get(stats))
}

async fn recommend(
    State(state): State<AppState>,
    Json(body): Json<RecommendRequest>,
) -> Result<impl IntoResponse, AppError> {
    let recommendation = run_blocking(&state, move |engine| {
        engine.get_recommendation(&body.learner_state, &body.available_courses)
    })
    .await?;
    Ok(ok(recommendation))
}

async fn update(
    State(state): State<AppState>,
    Json(body): Json<UpdateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let action: Action = body
        .action
        .parse()
        .map_err(|err: UnknownAction| AppError::validation(err.to_string()))?;

    let outcome = run_blocking(&state, move |engine| {
        engine.update(
            &body.learner_state,
            action,
            &body.feedback,
            body.next_state.as_ref(),
        )
    })
    .await?;
    Ok(ok(outcome))
}

async fn state_value(
    State(state): State<AppState>,
    Json(body): Json<StateValueRequest>,
) -> Result<impl IntoResponse, AppError> {
    let value = run_blocking(&state, move |engine| {
        engine.recommender().get_state_value(&body.learner_state)
    })
    .await?;
    Ok(ok(value))
}

async fn policy(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let policy = run_blocking(&state, |engine| engine.recommender().get_policy()).await?;
    Ok(ok(policy))
}

async fn stats(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let stats = run_blocking(&state, |engine| engine.recommender().get_stats()).await?;
    Ok(ok(stats))
}
