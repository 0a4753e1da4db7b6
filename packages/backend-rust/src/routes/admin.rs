use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use serde::Serialize;

use crate::response::{ok, AppError};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveResponse {
    directory: String,
    files: Vec<&'static str>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/models/save", post(save_models))
}

async fn save_models(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let engine = Arc::clone(state.engine());
    let store = Arc::clone(state.store());
    let directory = store.dir().display().to_string();

    let files = tokio::task::spawn_blocking(move || engine.save_to(&store))
        .await
        .map_err(|err| AppError::internal(format!("model save task failed: {err}")))?
        .map_err(|err| AppError::internal(err.to_string()))?;

    tracing::info!(%directory, files = ?files, "models saved on request");
    Ok(ok(SaveResponse { directory, files }))
}
