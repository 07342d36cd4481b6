//! Request helpers.
//!
//! # Responsibilities
//! - Decode JSON request bodies into typed values
//! - Read query parameters
//!
//! # Design Decisions
//! - Body reads are capped so a single request cannot exhaust memory
//! - Helpers take the request by value or reference like any other axum code

use std::collections::HashMap;

use axum::extract::Query;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// The request type handlers receive.
pub type Request = axum::extract::Request;

/// Largest JSON body [`decode_json`] will buffer (2 MiB).
pub const MAX_JSON_BODY: usize = 2 * 1024 * 1024;

/// Error type for request decoding.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("failed to read request body: {0}")]
    Body(#[from] axum::Error),

    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),
}

/// Consume the request body and decode it as JSON.
pub async fn decode_json<T: DeserializeOwned>(request: Request) -> Result<T, RequestError> {
    let bytes = axum::body::to_bytes(request.into_body(), MAX_JSON_BODY).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// First value of query parameter `name`, if any.
pub fn query_param(request: &Request, name: &str) -> Option<String> {
    let Query(params) = Query::<HashMap<String, String>>::try_from_uri(request.uri()).ok()?;
    params.get(name).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        firstname: String,
        email: String,
    }

    fn post(body: &'static str) -> Request {
        axum::http::Request::builder()
            .method("POST")
            .uri("/user")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_decode_json() {
        let user: User = decode_json(post(r#"{"firstname":"Ada","email":"ada@example.com"}"#))
            .await
            .unwrap();
        assert_eq!(
            user,
            User {
                firstname: "Ada".into(),
                email: "ada@example.com".into()
            }
        );
    }

    #[tokio::test]
    async fn test_decode_json_rejects_garbage() {
        let result = decode_json::<User>(post("{not json")).await;
        assert!(matches!(result, Err(RequestError::Json(_))));
    }

    #[test]
    fn test_query_param() {
        let request = axum::http::Request::builder()
            .uri("/search?q=rust&page=2")
            .body(Body::empty())
            .unwrap();
        assert_eq!(query_param(&request, "q").as_deref(), Some("rust"));
        assert_eq!(query_param(&request, "page").as_deref(), Some("2"));
        assert_eq!(query_param(&request, "missing"), None);
    }
}
