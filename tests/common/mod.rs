//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::json as json_value;
use tokio::sync::{oneshot, Notify};
use tokio::task::JoinHandle;

use bedrock::{
    decode_json, json, parse_multipart_form, query_param, require_auth, App, BaseConfig, Context,
    Handler, HealthStatus, Request, Route, Server, ServerError,
};

pub const SECRET: &str = "integration-secret";

/// Configurable application used by the integration tests.
pub struct TestApp {
    pub routes: Vec<Route>,
    pub fail_start: bool,
    /// When set, `on_start` blocks until notified.
    pub start_gate: Option<Arc<Notify>>,
    pub stopped: Arc<AtomicBool>,
}

impl TestApp {
    pub fn new(routes: Vec<Route>) -> Self {
        Self {
            routes,
            fail_start: false,
            start_gate: None,
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_start: true,
            ..Self::new(standard_routes())
        }
    }
}

#[async_trait]
impl App for TestApp {
    async fn on_start(&self) -> anyhow::Result<()> {
        if let Some(gate) = &self.start_gate {
            gate.notified().await;
        }
        if self.fail_start {
            anyhow::bail!("dependency unavailable");
        }
        Ok(())
    }

    async fn on_stop(&self) -> anyhow::Result<()> {
        self.stopped.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn routes(&self) -> Vec<Route> {
        self.routes.clone()
    }
}

/// `/hello`, `/slow?ms=N`, `POST /echo`, `POST /upload`, `/users/{id}` and
/// auth-protected `/me`.
pub fn standard_routes() -> Vec<Route> {
    vec![
        Route::get(
            "/hello",
            Handler::new(|_ctx: Context, _req: Request| async {
                json(StatusCode::OK, json_value!({ "message": "Hello!" }))
            }),
        ),
        Route::get(
            "/slow",
            Handler::new(|_ctx: Context, req: Request| async move {
                let ms = query_param(&req, "ms")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0);
                tokio::time::sleep(Duration::from_millis(ms)).await;
                json(StatusCode::OK, json_value!({ "slept_ms": ms }))
            }),
        ),
        Route::post(
            "/echo",
            Handler::new(|_ctx: Context, req: Request| async move {
                match decode_json::<serde_json::Value>(req).await {
                    Ok(value) => json(StatusCode::CREATED, value),
                    Err(_) => json(StatusCode::BAD_REQUEST, json_value!("Invalid JSON")),
                }
            }),
        ),
        Route::post(
            "/upload",
            Handler::new(|_ctx: Context, req: Request| async move {
                let form = match parse_multipart_form(req, 0).await {
                    Ok(form) => form,
                    Err(e) => {
                        return json(StatusCode::BAD_REQUEST, json_value!({ "error": e.to_string() }))
                    }
                };
                let files: Vec<_> = form
                    .files("files")
                    .unwrap_or_default()
                    .iter()
                    .map(|f| json_value!({ "filename": f.filename, "size": f.size }))
                    .collect();
                json(
                    StatusCode::OK,
                    json_value!({ "title": form.value("title"), "files": files }),
                )
            }),
        ),
        Route::get(
            "/users/{id}",
            Handler::new(|ctx: Context, _req: Request| async move {
                json(StatusCode::OK, json_value!({ "id": ctx.path_param("id") }))
            }),
        ),
        Route::get(
            "/me",
            Handler::new(|ctx: Context, _req: Request| async move {
                json(StatusCode::OK, json_value!({ "user_id": ctx.user_id() }))
            }),
        )
        .with_middleware(require_auth(SECRET)),
    ]
}

pub fn ports(http_port: u16, health_port: u16) -> BaseConfig {
    BaseConfig {
        http_port,
        health_port,
        ..BaseConfig::default()
    }
}

/// A server running on a background task.
pub struct TestServer {
    pub health: HealthStatus,
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<(), ServerError>>,
}

impl TestServer {
    pub fn spawn<A: App>(server: Server<A>) -> Self {
        let health = server.health();
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(server.run_until(async move {
            let _ = rx.await;
        }));
        Self {
            health,
            stop: Some(tx),
            handle,
        }
    }

    /// Spawn and wait until the server reports ready.
    pub async fn start<A: App>(server: Server<A>) -> Self {
        let running = Self::spawn(server);
        let health = running.health.clone();
        eventually(move || {
            let health = health.clone();
            async move { health.is_ready().await }
        })
        .await;
        running
    }

    /// Trigger shutdown and wait for the runner to return.
    pub async fn stop(mut self) -> Result<(), ServerError> {
        if let Some(tx) = self.stop.take() {
            let _ = tx.send(());
        }
        self.join().await
    }

    /// Wait for the runner to return on its own.
    pub async fn join(self) -> Result<(), ServerError> {
        tokio::time::timeout(Duration::from_secs(10), self.handle)
            .await
            .expect("server did not stop in time")
            .expect("server task panicked")
    }
}

/// Poll `check` until it returns true, panicking after five seconds.
pub async fn eventually<F, Fut>(check: F)
where
    F: Fn() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..250 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("condition not met within 5s");
}

pub fn url(port: u16, path: &str) -> String {
    format!("http://127.0.0.1:{port}{path}")
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .unwrap()
}

/// Status of `GET path`, or `None` if the connection failed.
pub async fn status_of(port: u16, path: &str) -> Option<u16> {
    client()
        .get(url(port, path))
        .send()
        .await
        .ok()
        .map(|res| res.status().as_u16())
}
