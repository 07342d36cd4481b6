//! Route table compilation and dispatch.
//!
//! # Responsibilities
//! - Validate application routes (path syntax, method, duplicates, overlaps)
//! - Group routes by path into axum method routers
//! - Add an OPTIONS responder to every path that lacks one
//! - Dispatch: capture path params, run the middleware chain, render
//!
//! # Design Decisions
//! - Parameters are registered positionally (`{p0}`, `{p1}`, ...) and renamed
//!   per route at dispatch, so routes sharing a shape may name them freely
//! - Every pattern is checked against a `matchit` table before axum sees it;
//!   overlaps become `RouteError::Conflict` instead of a startup panic
//! - Preflight responders bypass per-route middleware, so auth never blocks them
//! - A response that fails to render becomes a bare 500

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{FromRequestParts, RawPathParams},
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::{on, options, MethodFilter, MethodRouter},
    Router,
};
use thiserror::Error;

use super::Route;
use crate::http::context::Context;
use crate::http::handler::Handler;
use crate::http::middleware::chain;
use crate::http::request::Request;
use crate::http::response::HttpResponse;
use crate::observability::metrics;

/// Parameter name a prefix route's remainder is exposed under.
pub const PREFIX_REST_PARAM: &str = "rest";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("route path `{0}` must start with `/` and use `{{name}}` or a trailing `{{*name}}` parameter")]
    InvalidPath(String),

    #[error("unsupported method `{method}` on `{path}`")]
    UnsupportedMethod { method: Method, path: String },

    #[error("`{method} {path}` is registered more than once")]
    Duplicate { method: Method, path: String },

    #[error("route `{path}` overlaps an earlier route: {reason}")]
    Conflict { path: String, reason: String },
}

/// One segment of a route path.
#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Static(&'a str),
    Param(&'a str),
    CatchAll(&'a str),
}

/// A route path compiled to the positional form registered with axum.
#[derive(Debug, PartialEq, Eq)]
struct Pattern {
    path: String,
    /// Route-declared names, indexed by position.
    names: Vec<String>,
}

struct PathEntry {
    methods: MethodRouter,
    has_options: bool,
}

/// Compile `routes` into an axum router.
pub fn build(routes: Vec<Route>) -> Result<Router, RouteError> {
    let mut table: BTreeMap<String, PathEntry> = BTreeMap::new();
    let mut seen: HashSet<(String, Method)> = HashSet::new();
    let mut shapes: matchit::Router<()> = matchit::Router::new();

    for route in routes {
        let compiled = patterns(&route.path, route.is_prefix)
            .ok_or_else(|| RouteError::InvalidPath(route.path.clone()))?;
        let filter =
            MethodFilter::try_from(route.method.clone()).map_err(|_| RouteError::UnsupportedMethod {
                method: route.method.clone(),
                path: route.path.clone(),
            })?;

        // The last pattern (a prefix route's catch-all) carries every name.
        let names: Arc<[String]> = compiled
            .last()
            .map(|pattern| Arc::from(pattern.names.as_slice()))
            .unwrap_or_else(|| Arc::from(Vec::new()));
        let handler = chain(route.handler, &route.middleware);
        let label: Arc<str> = Arc::from(route.path.as_str());
        let endpoint: MethodRouter = on(filter, move |request: Request| {
            dispatch(handler.clone(), label.clone(), names.clone(), request)
        });

        for Pattern { path: pattern, .. } in compiled {
            if !seen.insert((pattern.clone(), route.method.clone())) {
                return Err(RouteError::Duplicate {
                    method: route.method,
                    path: route.path,
                });
            }

            let is_options = route.method == Method::OPTIONS;
            let entry = match table.remove(&pattern) {
                Some(existing) => PathEntry {
                    methods: existing.methods.merge(endpoint.clone()),
                    has_options: existing.has_options || is_options,
                },
                None => {
                    shapes
                        .insert(pattern.as_str(), ())
                        .map_err(|e| RouteError::Conflict {
                            path: route.path.clone(),
                            reason: e.to_string(),
                        })?;
                    PathEntry {
                        methods: endpoint.clone(),
                        has_options: is_options,
                    }
                }
            };
            table.insert(pattern, entry);
        }
    }

    let router = table
        .into_iter()
        .fold(Router::new(), |router, (pattern, entry)| {
            let methods = if entry.has_options {
                entry.methods
            } else {
                entry.methods.merge(options(preflight))
            };
            tracing::debug!(path = %pattern, "Registered route");
            router.route(&pattern, methods)
        });

    Ok(router)
}

/// Split an absolute path into segments, or `None` if its syntax is invalid.
fn parse(path: &str) -> Option<Vec<Segment<'_>>> {
    let rest = path.strip_prefix('/')?;
    let raw: Vec<&str> = rest.split('/').collect();
    let last = raw.len() - 1;

    let mut segments = Vec::with_capacity(raw.len());
    let mut names = HashSet::new();
    for (i, segment) in raw.into_iter().enumerate() {
        let parsed = match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(inner) => match inner.strip_prefix('*') {
                Some(name) if i == last && valid_name(name) => Segment::CatchAll(name),
                Some(_) => return None,
                None if valid_name(inner) => Segment::Param(inner),
                None => return None,
            },
            None if segment.contains(['{', '}']) || segment.starts_with([':', '*']) => {
                return None
            }
            None => Segment::Static(segment),
        };
        if let Segment::Param(name) | Segment::CatchAll(name) = parsed {
            if !names.insert(name) {
                return None;
            }
        }
        segments.push(parsed);
    }
    Some(segments)
}

fn valid_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['{', '}', '*', ':'])
}

/// Render segments with positional parameter names.
fn render(segments: &[Segment<'_>]) -> Pattern {
    let mut names = Vec::new();
    let parts: Vec<String> = segments
        .iter()
        .map(|segment| match segment {
            Segment::Static(text) => text.to_string(),
            Segment::Param(name) => {
                names.push(name.to_string());
                format!("{{p{}}}", names.len() - 1)
            }
            Segment::CatchAll(name) => {
                names.push(name.to_string());
                format!("{{*p{}}}", names.len() - 1)
            }
        })
        .collect();
    Pattern {
        path: format!("/{}", parts.join("/")),
        names,
    }
}

/// axum paths registered for a route, or `None` if the path is invalid.
fn patterns(path: &str, is_prefix: bool) -> Option<Vec<Pattern>> {
    let segments = parse(path)?;
    if !is_prefix {
        return Some(vec![render(&segments)]);
    }
    if matches!(segments.last(), Some(Segment::CatchAll(_))) {
        return None;
    }

    let base = path.trim_end_matches('/');
    let mut segments = if base.is_empty() {
        Vec::new()
    } else {
        parse(base)?
    };
    let exact = if segments.is_empty() {
        render(&[Segment::Static("")])
    } else {
        render(&segments)
    };
    if exact.names.iter().any(|name| name == PREFIX_REST_PARAM) {
        return None;
    }
    segments.push(Segment::CatchAll(PREFIX_REST_PARAM));
    Some(vec![exact, render(&segments)])
}

async fn preflight() -> HttpResponse {
    StatusCode::OK.into_response()
}

async fn dispatch(
    handler: Handler,
    route: Arc<str>,
    names: Arc<[String]>,
    request: Request,
) -> HttpResponse {
    let start = Instant::now();
    let method = request.method().clone();

    let (mut parts, body) = request.into_parts();
    let params: Vec<(String, String)> = match RawPathParams::from_request_parts(&mut parts, &()).await {
        Ok(raw) => raw
            .iter()
            .filter_map(|(key, value)| {
                let index: usize = key.strip_prefix('p')?.parse().ok()?;
                Some((names.get(index)?.clone(), value.to_string()))
            })
            .collect(),
        Err(_) => Vec::new(),
    };
    let request = Request::from_parts(parts, body);
    let ctx = Context::new().with_path_params(params);

    let response = match handler.call(ctx, request).await.into_http() {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(route = %route, error = %e, "Failed to render response");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    };

    metrics::record_request(method.as_str(), &route, response.status().as_u16(), start);
    response
}
