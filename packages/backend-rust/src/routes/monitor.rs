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
        .route("/analyze", post(analyze))
        .route("/recommendations", post(recommendations))
        .route("/train", post(train))
}

async fn analyze(
    State(state): State<AppState>,
    Json(body): Json<EventsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let analysis = run_blocking(&state, move |engine| {
        engine.analyze_session(&body.events, body.user_id.as_deref())
    })
    .await?;
    Ok(ok(analysis))
}

async fn recommendations(
    State(state): State<AppState>,
    Json(body): Json<EventsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let recommendations =
        run_blocking(&state, move |engine| engine.monitor().get_recommendations(&body.events)).await?;
    Ok(ok(recommendations))
}

async fn train(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    run_blocking(&state, |engine| engine.monitor().train()).await?;
    Ok(ok(TrainedResponse { trained: true }))
}
