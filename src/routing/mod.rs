//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     App::routes() → Vec<Route>
//!     → router.rs (validate, group by path, add preflight responders)
//!     → Freeze as immutable axum::Router
//!
//! Incoming Request:
//!     axum path match → per-route middleware chain → handler → Response
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - `{name}` segments capture path parameters; prefix routes add a catch-all
//! - Every path answers OPTIONS unless the application declares it

pub mod router;

use axum::http::Method;

use crate::http::handler::Handler;
use crate::http::middleware::Middleware;

pub use router::{build, RouteError};

/// One application endpoint.
#[derive(Debug, Clone)]
pub struct Route {
    pub method: Method,
    /// Absolute path; `{name}` segments capture a path parameter and a
    /// trailing `{*name}` captures the remainder.
    pub path: String,
    pub handler: Handler,
    /// Applied in order, first one outermost.
    pub middleware: Vec<Middleware>,
    /// Match `path` and everything beneath it.
    pub is_prefix: bool,
}

impl Route {
    pub fn new(method: Method, path: impl Into<String>, handler: Handler) -> Self {
        Self {
            method,
            path: path.into(),
            handler,
            middleware: Vec::new(),
            is_prefix: false,
        }
    }

    pub fn get(path: impl Into<String>, handler: Handler) -> Self {
        Self::new(Method::GET, path, handler)
    }

    pub fn post(path: impl Into<String>, handler: Handler) -> Self {
        Self::new(Method::POST, path, handler)
    }

    pub fn put(path: impl Into<String>, handler: Handler) -> Self {
        Self::new(Method::PUT, path, handler)
    }

    pub fn patch(path: impl Into<String>, handler: Handler) -> Self {
        Self::new(Method::PATCH, path, handler)
    }

    pub fn delete(path: impl Into<String>, handler: Handler) -> Self {
        Self::new(Method::DELETE, path, handler)
    }

    /// Append a middleware; the first one added runs first.
    pub fn with_middleware(mut self, middleware: Middleware) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Turn this into a prefix route.
    pub fn prefix(mut self) -> Self {
        self.is_prefix = true;
        self
    }
}
