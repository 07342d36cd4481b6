//! `/health`, `/ready` and `/live`.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;

use super::state::HealthStatus;

pub const HEALTH_PATH: &str = "/health";
pub const READY_PATH: &str = "/ready";
pub const LIVE_PATH: &str = "/live";

/// Paths owned by the health endpoints.
pub const RESERVED_PATHS: [&str; 3] = [HEALTH_PATH, READY_PATH, LIVE_PATH];

/// Router serving the three health endpoints.
pub fn router(status: HealthStatus) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health_handler))
        .route(READY_PATH, get(ready_handler))
        .route(LIVE_PATH, get(health_handler))
        .with_state(status)
}

async fn health_handler(State(status): State<HealthStatus>) -> impl IntoResponse {
    if status.is_healthy().await {
        (StatusCode::OK, Json(json!({ "status": "healthy" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unhealthy" })),
        )
    }
}

async fn ready_handler(State(status): State<HealthStatus>) -> impl IntoResponse {
    if status.is_ready().await {
        (StatusCode::OK, Json(json!({ "status": "ready" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "not ready" })),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    async fn fetch(status: &HealthStatus, path: &str) -> (StatusCode, serde_json::Value) {
        let response = router(status.clone())
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let code = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (code, serde_json::from_slice(&bytes).unwrap())
    }

    async fn codes(status: &HealthStatus) -> [StatusCode; 3] {
        [
            fetch(status, HEALTH_PATH).await.0,
            fetch(status, READY_PATH).await.0,
            fetch(status, LIVE_PATH).await.0,
        ]
    }

    #[tokio::test]
    async fn test_fresh_tracker_is_unavailable() {
        let status = HealthStatus::new();
        assert_eq!(codes(&status).await, [StatusCode::SERVICE_UNAVAILABLE; 3]);

        let (_, body) = fetch(&status, HEALTH_PATH).await;
        assert_eq!(body["status"], "unhealthy");
        let (_, body) = fetch(&status, READY_PATH).await;
        assert_eq!(body["status"], "not ready");
    }

    #[tokio::test]
    async fn test_healthy_but_not_ready() {
        let status = HealthStatus::new();
        status.set_healthy(true).await;
        assert_eq!(
            codes(&status).await,
            [
                StatusCode::OK,
                StatusCode::SERVICE_UNAVAILABLE,
                StatusCode::OK
            ]
        );
    }

    #[tokio::test]
    async fn test_healthy_and_ready() {
        let status = HealthStatus::new();
        status.set_healthy(true).await;
        status.set_ready(true).await;
        assert_eq!(codes(&status).await, [StatusCode::OK; 3]);

        let (_, body) = fetch(&status, READY_PATH).await;
        assert_eq!(body["status"], "ready");
    }

    #[tokio::test]
    async fn test_only_get_is_served() {
        let response = router(HealthStatus::new())
            .oneshot(
                Request::post(HEALTH_PATH)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
