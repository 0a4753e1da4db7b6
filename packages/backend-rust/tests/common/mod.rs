#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, TimeZone, Utc};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use engage_backend::adaptive::config::TrainingConfig;
use engage_backend::adaptive::{AdaptiveEngine, EngineConfig, ModelStore};
use engage_backend::state::AppState;

/// Smaller forests keep the lazily trained models quick under test.
pub fn test_engine_config() -> EngineConfig {
    EngineConfig {
        training: TrainingConfig {
            behavior_trees: 10,
            behavior_samples: 200,
            ..TrainingConfig::default()
        },
        ..EngineConfig::default()
    }
}

pub struct TestApp {
    pub router: Router,
    pub engine: Arc<AdaptiveEngine>,
    pub dir: TempDir,
}

pub fn create_test_app() -> TestApp {
    let dir = tempfile::tempdir().expect("failed to create model dir");
    let engine = Arc::new(AdaptiveEngine::new(test_engine_config()));
    let state = AppState::new(Arc::clone(&engine), ModelStore::new(dir.path()));
    TestApp {
        router: engage_backend::build_app(state),
        engine,
        dir,
    }
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

/// `(minute offset, event type, content type)` triples as request JSON.
pub fn events_json(plan: &[(i64, &str, &str)]) -> Value {
    let base = Utc.with_ymd_and_hms(2024, 6, 3, 10, 0, 0).unwrap();
    Value::Array(
        plan.iter()
            .enumerate()
            .map(|(i, (minute, kind, content_type))| {
                serde_json::json!({
                    "timestamp": (base + Duration::minutes(*minute)).to_rfc3339(),
                    "eventType": kind,
                    "contentId": format!("c{}", i % 4),
                    "contentType": content_type,
                })
            })
            .collect(),
    )
}
