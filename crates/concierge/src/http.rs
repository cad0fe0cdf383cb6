// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook HTTP surface built on axum.
//!
//! The channel gateway posts normalized turns to `POST /v1/turns` and
//! forwards the returned reply contract to the platform.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use concierge_agent::TurnProcessor;
use concierge_core::{InboundTurn, Reply};
use concierge_storage::SqliteStore;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared state for request handlers.
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<TurnProcessor>,
    /// Probed by `/health`; absent in tests without a database.
    pub store: Option<Arc<SqliteStore>>,
    pub start_time: Instant,
}

/// Health response body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub database: &'static str,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/turns", post(post_turn))
        .route("/health", get(get_health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn post_turn(State(state): State<AppState>, Json(turn): Json<InboundTurn>) -> Json<Reply> {
    Json(state.processor.process(turn).await)
}

async fn get_health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = match &state.store {
        Some(store) => match store.health_check().await {
            Ok(()) => "ok",
            Err(e) => {
                tracing::warn!(error = %e, "database health check failed");
                "unavailable"
            }
        },
        None => "none",
    };
    let status = if database == "unavailable" {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    let body = HealthResponse {
        status: if status == StatusCode::OK { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.start_time.elapsed().as_secs(),
        database,
    };
    (status, Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use concierge_config::model::StorageConfig;
    use concierge_test_utils::TestWorld;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app(world: &TestWorld, store: Option<Arc<SqliteStore>>) -> Router {
        let processor = TurnProcessor::new(world.collaborators(), Arc::new(world.config.clone()));
        router(AppState {
            processor: Arc::new(processor),
            store,
            start_time: Instant::now(),
        })
    }

    async fn post_json(app: Router, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/v1/turns")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn empty_message_gets_the_greeting() {
        let world = TestWorld::new();
        let (status, body) = post_json(
            app(&world, None),
            json!({
                "channel": "line-oa",
                "user": "U1",
                "message": {"type": "text", "text": "  "},
                "trace_id": "trace-abc"
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply_text"], json!(world.config.templates.greeting));
        assert_eq!(body["meta"]["trace_id"], "trace-abc");
        assert_eq!(body["meta"]["handler"], "concierge_router");
    }

    #[tokio::test]
    async fn turn_without_identity_is_silent() {
        let world = TestWorld::new();
        let (status, body) = post_json(
            app(&world, None),
            json!({"message": {"type": "text", "text": "สวัสดีค่ะ"}}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["reply_text"].is_null());
        assert_eq!(body["meta"]["reason"], "missing_context");
    }

    #[tokio::test]
    async fn malformed_body_is_rejected() {
        let world = TestWorld::new();
        let request = Request::builder()
            .method("POST")
            .uri("/v1/turns")
            .header("content-type", "application/json")
            .body(Body::from("{\"channel\": 1"))
            .unwrap();
        let response = app(&world, None).oneshot(request).await.unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn health_reports_the_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            database_path: dir.path().join("health.db").to_string_lossy().into_owned(),
            wal_mode: true,
        };
        let store = Arc::new(SqliteStore::open(&config).await.unwrap());
        let world = TestWorld::new();

        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app(&world, Some(store)).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], "ok");
    }
}
