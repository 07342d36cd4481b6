//! Metrics collection and exposition.
//!
//! # Metrics
//! - `bedrock_http_requests_total` (counter): requests by method, route, status
//! - `bedrock_http_request_duration_seconds` (histogram): handler latency
//!
//! # Design Decisions
//! - The Prometheus recorder is process-global and installed once
//! - Recording without an installed recorder is a no-op
//! - The scrape endpoint is an ordinary router served by the server runner

use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use axum::{routing::get, Router};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

pub const REQUESTS_TOTAL: &str = "bedrock_http_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "bedrock_http_request_duration_seconds";

static HANDLE: Mutex<Option<PrometheusHandle>> = Mutex::new(None);

/// Install the Prometheus recorder, or return the one already installed.
pub fn install() -> Result<PrometheusHandle, BuildError> {
    let mut slot = HANDLE.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(handle) = slot.as_ref() {
        return Ok(handle.clone());
    }
    let handle = PrometheusBuilder::new().install_recorder()?;
    *slot = Some(handle.clone());
    Ok(handle)
}

/// Router exposing `GET /metrics` in the Prometheus text format.
pub fn router(handle: PrometheusHandle) -> Router {
    Router::new().route(
        "/metrics",
        get(move || {
            let handle = handle.clone();
            async move { handle.render() }
        }),
    )
}

/// Record one dispatched request.
pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    let method = method.to_string();
    let route = route.to_string();
    let status = status.to_string();

    ::metrics::counter!(
        REQUESTS_TOTAL,
        "method" => method.clone(),
        "route" => route.clone(),
        "status" => status.clone()
    )
    .increment(1);
    ::metrics::histogram!(
        REQUEST_DURATION_SECONDS,
        "method" => method,
        "route" => route,
        "status" => status
    )
    .record(start.elapsed().as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_recorded_requests_are_scrapable() {
        let handle = install().unwrap();
        record_request("GET", "/metrics-test", 200, Instant::now());

        let response = router(handle)
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains(REQUESTS_TOTAL));
        assert!(text.contains(r#"route="/metrics-test""#));
    }

    #[test]
    fn test_install_is_idempotent() {
        install().unwrap();
        install().unwrap();
    }
}
