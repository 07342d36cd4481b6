//! CORS header injection.
//!
//! Applied to the application router only. Health endpoints served on the
//! same listener are merged in after this layer and never see it.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::config::CorsConfig;

/// Header values precomputed from a [`CorsConfig`].
#[derive(Debug, Clone, Default)]
pub struct CorsPolicy {
    origins: Vec<String>,
    allow_methods: Option<HeaderValue>,
    allow_headers: Option<HeaderValue>,
    expose_headers: Option<HeaderValue>,
    allow_credentials: bool,
    max_age: Option<HeaderValue>,
}

impl CorsPolicy {
    pub fn from_config(config: &CorsConfig) -> Self {
        Self {
            origins: config.allowed_origins.clone(),
            allow_methods: joined("allowed_methods", &config.allowed_methods),
            allow_headers: joined("allowed_headers", &config.allowed_headers),
            expose_headers: joined("exposed_headers", &config.exposed_headers),
            allow_credentials: config.allow_credentials,
            max_age: (config.max_age > 0).then(|| HeaderValue::from(config.max_age)),
        }
    }

    /// Value for `Access-Control-Allow-Origin`, if the origin is allowed.
    ///
    /// The first matching entry decides: a listed origin is echoed, `"*"`
    /// is sent as is.
    fn allowed_origin(&self, origin: Option<&HeaderValue>) -> Option<HeaderValue> {
        let text = origin.and_then(|value| value.to_str().ok());
        self.origins.iter().find_map(|allowed| {
            if allowed == "*" {
                Some(HeaderValue::from_static("*"))
            } else if Some(allowed.as_str()) == text {
                origin.cloned()
            } else {
                None
            }
        })
    }

    /// Write the CORS headers for a request carrying `origin` into `headers`.
    ///
    /// Headers the handler already set are left alone.
    pub fn apply(&self, origin: Option<&HeaderValue>, headers: &mut HeaderMap) {
        if let Some(value) = self.allowed_origin(origin) {
            headers
                .entry(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .or_insert(value);
        }

        let optional = [
            (header::ACCESS_CONTROL_ALLOW_METHODS, &self.allow_methods),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, &self.allow_headers),
            (header::ACCESS_CONTROL_EXPOSE_HEADERS, &self.expose_headers),
            (header::ACCESS_CONTROL_MAX_AGE, &self.max_age),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                headers.entry(name).or_insert_with(|| value.clone());
            }
        }

        if self.allow_credentials {
            headers
                .entry(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
                .or_insert(HeaderValue::from_static("true"));
        }
    }
}

fn joined(field: &str, values: &[String]) -> Option<HeaderValue> {
    if values.is_empty() {
        return None;
    }
    match HeaderValue::from_str(&values.join(", ")) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(field, error = %e, "Ignoring CORS setting that is not a valid header value");
            None
        }
    }
}

/// Axum middleware adding CORS headers to every response.
pub async fn cors_middleware(
    State(policy): State<Arc<CorsPolicy>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let origin = request.headers().get(header::ORIGIN).cloned();
    let mut response = next.run(request).await;
    policy.apply(origin.as_ref(), response.headers_mut());
    response
}
