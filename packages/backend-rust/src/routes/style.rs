use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use super::{run_blocking, EventsRequest};
use crate::adaptive::style::style_guidance;
use crate::response::{ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/classify", post(classify))
        .route("/guidance/:style", get(guidance))
        .route("/feature-importance", get(feature_importance))
}

async fn classify(
    State(state): State<AppState>,
    Json(body): Json<EventsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let profile = run_blocking(&state, move |engine| engine.classify_learning_style(&body.events)).await?;
    Ok(ok(profile))
}

async fn guidance(Path(style): Path<String>) -> impl IntoResponse {
    ok(style_guidance(&style))
}

async fn feature_importance(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let ranked = run_blocking(&state, |engine| engine.classifier().feature_importance()).await?;
    Ok(ok(ranked))
}
