//! Server runner.
//!
//! # Responsibilities
//! - Serve the health endpoints before the application initialises
//! - Run the application's start hook and flip the health flags
//! - Compile application routes and wire up middleware (CORS, tracing, request ID)
//! - Bind listeners on the resolved (Nomad-aware) ports
//! - Drain every listener on shutdown, then run the stop hook
//!
//! # Startup Order
//! ```text
//! mode from ports → [separate] health listener → metrics listener
//!     → on_start → healthy → routes → main listener → ready
//! ```

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use crate::app::App;
use crate::config::{BaseConfig, CorsConfig, EnvSource, ProcessEnv};
use crate::health::{self, HealthStatus};
use crate::http::middleware::cors::{cors_middleware, CorsPolicy};
use crate::lifecycle::startup::reserved_path_conflict;
use crate::lifecycle::{shutdown_signal, ServerMode, Shutdown};
use crate::observability::metrics;
use crate::routing::{self, Route, RouteError};

/// How long each listener may take to drain before it is closed.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("application failed to start: {0:#}")]
    Startup(anyhow::Error),

    #[error("route `{0}` conflicts with a health endpoint on the shared listener")]
    RouteConflict(String),

    #[error("invalid route table: {0}")]
    Route(#[from] RouteError),

    #[error("failed to bind {role} listener on port {port}: {source}")]
    Bind {
        role: &'static str,
        port: u16,
        #[source]
        source: std::io::Error,
    },
}

/// A spawned listener task.
struct Listener {
    role: &'static str,
    task: JoinHandle<std::io::Result<()>>,
}

/// Runs an [`App`] with health endpoints, CORS and graceful shutdown.
pub struct Server<A: App> {
    app: A,
    config: BaseConfig,
    cors: CorsConfig,
    health: HealthStatus,
    env: Arc<dyn EnvSource>,
    shutdown_timeout: Duration,
}

impl<A: App> Server<A> {
    pub fn new(app: A, config: BaseConfig) -> Self {
        Self {
            app,
            config,
            cors: CorsConfig::default(),
            health: HealthStatus::new(),
            env: Arc::new(ProcessEnv),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    pub fn with_cors(mut self, cors: CorsConfig) -> Self {
        self.cors = cors;
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Resolve `NOMAD_PORT_*` from `env` instead of the process environment.
    pub fn with_env(mut self, env: Arc<dyn EnvSource>) -> Self {
        self.env = env;
        self
    }

    /// Handle to the health flags this server drives.
    pub fn health(&self) -> HealthStatus {
        self.health.clone()
    }

    /// Serve until SIGINT or SIGTERM.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_until(shutdown_signal()).await
    }

    /// Serve until `signal` completes, then shut down gracefully.
    pub async fn run_until<F>(self, signal: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send,
    {
        let shutdown = Shutdown::new();
        let mut listeners = Vec::new();

        if let Err(e) = self.start(&shutdown, &mut listeners).await {
            error!(error = %e, "Startup failed");
            self.health.set_ready(false).await;
            self.health.set_healthy(false).await;
            shutdown.trigger();
            drain(listeners, self.shutdown_timeout).await;
            return Err(e);
        }

        signal.await;

        info!("Shutting down");
        self.health.set_ready(false).await;
        shutdown.trigger();
        drain(listeners, self.shutdown_timeout).await;

        if let Err(e) = self.app.on_stop().await {
            error!(error = %format!("{e:#}"), "Application stop hook failed");
        }

        info!("Shutdown complete");
        Ok(())
    }

    async fn start(
        &self,
        shutdown: &Shutdown,
        listeners: &mut Vec<Listener>,
    ) -> Result<(), ServerError> {
        let env = self.env.as_ref();
        let http_port = self.config.resolved_http_port_with(env);
        let health_port = self.config.resolved_health_port_with(env);
        let metrics_port = self.config.resolved_metrics_port_with(env);

        let mode = ServerMode::from_ports(http_port, health_port);
        info!(
            http_port,
            health_port,
            merged = mode.is_merged(),
            "Starting server"
        );

        if let ServerMode::Separate { health_port, .. } = mode {
            let listener = bind("health", health_port).await?;
            listeners.push(serve("health", listener, health::router(self.health()), shutdown));
        }

        if metrics_port != 0 {
            match metrics::install() {
                Ok(handle) => {
                    let listener = bind("metrics", metrics_port).await?;
                    listeners.push(serve("metrics", listener, metrics::router(handle), shutdown));
                }
                Err(e) => warn!(error = %e, "Prometheus recorder unavailable, metrics disabled"),
            }
        }

        self.app.on_start().await.map_err(ServerError::Startup)?;
        self.health.set_healthy(true).await;

        let routes = self.app.routes();
        if mode.is_merged() {
            if let Some(route) = reserved_path_conflict(&routes) {
                return Err(ServerError::RouteConflict(route.path.clone()));
            }
        }

        let main = if routes.is_empty() {
            if mode.is_merged() {
                Some(health::router(self.health()))
            } else {
                info!("No routes declared, running in background mode");
                None
            }
        } else {
            let app_router = self.application_router(routes)?;
            if mode.is_merged() {
                Some(app_router.merge(health::router(self.health())))
            } else {
                Some(app_router)
            }
        };

        if let Some(router) = main {
            let listener = bind("http", mode.http_port()).await?;
            listeners.push(serve("http", listener, router, shutdown));
        }

        self.health.set_ready(true).await;
        info!("Server ready");
        Ok(())
    }

    /// Application routes behind CORS, request IDs and request tracing.
    fn application_router(&self, routes: Vec<Route>) -> Result<Router, ServerError> {
        let policy = Arc::new(CorsPolicy::from_config(&self.cors));
        // Request helpers enforce their own body caps.
        let router = routing::build(routes)?.layer(
            ServiceBuilder::new()
                .layer(DefaultBodyLimit::disable())
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(axum::middleware::from_fn_with_state(policy, cors_middleware)),
        );
        Ok(router)
    }
}

async fn bind(role: &'static str, port: u16) -> Result<TcpListener, ServerError> {
    TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], port)))
        .await
        .map_err(|source| ServerError::Bind { role, port, source })
}

fn serve(role: &'static str, listener: TcpListener, router: Router, shutdown: &Shutdown) -> Listener {
    if let Ok(addr) = listener.local_addr() {
        info!(role, address = %addr, "Listening for connections");
    }
    let signal = shutdown.signalled();
    let task = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(signal)
            .await
    });
    Listener { role, task }
}

/// Wait for each listener to finish, closing any that exceed `timeout`.
async fn drain(listeners: Vec<Listener>, timeout: Duration) {
    for Listener { role, mut task } in listeners {
        match tokio::time::timeout(timeout, &mut task).await {
            Ok(Ok(Ok(()))) => info!(role, "Listener stopped"),
            Ok(Ok(Err(e))) => error!(role, error = %e, "Listener failed"),
            Ok(Err(e)) => error!(role, error = %e, "Listener task aborted"),
            Err(_) => {
                warn!(role, timeout_secs = timeout.as_secs_f64(), "Listener did not drain in time, closing");
                task.abort();
            }
        }
    }
}
