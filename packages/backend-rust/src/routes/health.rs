use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    timestamp: String,
    start_time: String,
    uptime: u64,
    models: ModelStatus,
}

#[derive(Debug, Serialize)]
struct ModelStatus {
    monitor: bool,
    style: bool,
    behavior: bool,
    recommender_states: usize,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(health))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let engine = state.engine();
    let started: DateTime<Utc> = state.started_at_system().into();

    Json(HealthResponse {
        status: "ok",
        service: "engage-backend",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        start_time: started.to_rfc3339_opts(SecondsFormat::Millis, true),
        uptime: state.uptime_seconds(),
        models: ModelStatus {
            monitor: engine.monitor().is_trained(),
            style: engine.classifier().is_trained(),
            behavior: engine.analyzer().is_trained(),
            recommender_states: engine.recommender().get_stats().states_visited,
        },
    })
}
