mod admin;
mod behavior;
mod health;
mod monitor;
mod recommender;
mod style;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde::Deserialize;

use crate::adaptive::{AdaptiveEngine, BehaviorEvent};
use crate::response::{json_error, AppError};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/health", health::router())
        .nest("/api/monitor", monitor::router())
        .nest("/api/recommender", recommender::router())
        .nest("/api/style", style::router())
        .nest("/api/behavior", behavior::router())
        .nest("/api/admin", admin::router())
        .fallback(fallback_handler)
        .with_state(state)
}

/// Body shared by every endpoint that scores an event window.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EventsRequest {
    #[serde(default)]
    pub events: Vec<BehaviorEvent>,
    #[serde(default, alias = "user_id")]
    pub user_id: Option<String>,
}

/// Model work is CPU bound and may train on first use, so it runs off the async workers.
pub(crate) async fn run_blocking<T, F>(state: &AppState, job: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&AdaptiveEngine) -> T + Send + 'static,
{
    let engine = Arc::clone(state.engine());
    tokio::task::spawn_blocking(move || job(&engine))
        .await
        .map_err(|err| AppError::internal(format!("engine task failed: {err}")))
}

async fn fallback_handler() -> Response {
    json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "Endpoint not found").into_response()
}
