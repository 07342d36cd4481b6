//! Bedrock: minimal web-application scaffolding.
//!
//! An application implements [`App`], declares its [`Route`]s and hands
//! itself to [`run`]. Bedrock serves the routes behind CORS, exposes
//! `/health`, `/ready` and `/live` for orchestrators, and shuts down
//! gracefully on SIGINT/SIGTERM.
//!
//! ```no_run
//! use axum::http::StatusCode;
//! use bedrock::{json, App, BaseConfig, Context, Handler, Request, Route};
//!
//! struct Hello;
//!
//! impl App for Hello {
//!     fn routes(&self) -> Vec<Route> {
//!         vec![Route::get(
//!             "/hello",
//!             Handler::new(|_ctx: Context, _req: Request| async {
//!                 json(StatusCode::OK, "hello")
//!             }),
//!         )]
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), bedrock::ServerError> {
//!     let config = BaseConfig {
//!         http_port: 8080,
//!         health_port: 8080,
//!         ..BaseConfig::default()
//!     };
//!     bedrock::run(Hello, config).await
//! }
//! ```

// Core subsystems
pub mod app;
pub mod config;
pub mod http;
pub mod routing;

// Security
pub mod auth;

// Cross-cutting concerns
pub mod health;
pub mod lifecycle;
pub mod observability;

pub use app::App;
pub use auth::{
    hash_password, issue_token, require_auth, validate_token, verify_password, AuthError,
    PasswordError,
};
pub use config::{BaseConfig, ConfigError, CorsConfig, EnvOverrides, Loader, Overlay};
pub use health::HealthStatus;
pub use http::{
    chain, decode_json, error, json, parse_multipart_form, query_param, BoxResponse, Context,
    Handler, JsonResponse, Middleware, MultipartForm, Request, Response, Server, ServerError,
    StatusResponse, UploadError, UploadedFile,
};
pub use lifecycle::Shutdown;
pub use routing::Route;

/// Serve `app` with the default CORS policy until SIGINT or SIGTERM.
pub async fn run<A: App>(app: A, config: BaseConfig) -> Result<(), ServerError> {
    Server::new(app, config).run().await
}

/// Serve `app` with a custom CORS policy until SIGINT or SIGTERM.
pub async fn run_with_cors<A: App>(
    app: A,
    config: BaseConfig,
    cors: CorsConfig,
) -> Result<(), ServerError> {
    Server::new(app, config).with_cors(cors).run().await
}
