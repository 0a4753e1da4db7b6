use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;

use super::{run_blocking, EventsRequest};
use crate::response::{ok, AppError};
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct TrainedResponse {
    trained: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/predict", post(predict))
        .route("/engagement", post(engagement))
        .route("/dropout", post(dropout))
        .route("/train", post(train))
}

async fn predict(
    State(state): State<AppState>,
    Json(body): Json<EventsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let recommendation = run_blocking(&state, move |engine| {
        engine.analyzer().behavior_recommendation(&body.events)
    })
    .await?;
    Ok(ok(recommendation))
}

async fn engagement(
    State(state): State<AppState>,
    Json(body): Json<EventsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let prediction =
        run_blocking(&state, move |engine| engine.analyzer().predict_engagement(&body.events)).await?;
    Ok(ok(prediction))
}

async fn dropout(
    State(state): State<AppState>,
    Json(body): Json<EventsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let prediction =
        run_blocking(&state, move |engine| engine.analyzer().predict_dropout(&body.events)).await?;
    Ok(ok(prediction))
}

async fn train(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    run_blocking(&state, |engine| engine.analyzer().train()).await?;
    Ok(ok(TrainedResponse { trained: true }))
}
