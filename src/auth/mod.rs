//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! Authorization: Bearer <token>
//!     → require_auth (header shape)
//!     → token.rs (signature + expiry)
//!     → Context::with_user_id → next handler
//! ```
//!
//! # Design Decisions
//! - Every failure is a 401 with a generic message; the precise cause is only logged
//! - Passwords are bcrypt-hashed at a fixed cost (password.rs)

pub mod password;
pub mod token;

use axum::http::{header, StatusCode};
use serde_json::json;
use thiserror::Error;

use crate::http::context::Context;
use crate::http::handler::Handler;
use crate::http::middleware::Middleware;
use crate::http::request::Request;
use crate::http::response::{self, Response};

pub use password::{hash_password, verify_password, PasswordError, BCRYPT_COST};
pub use token::{issue_token, validate_token, Claims};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing authorization header")]
    MissingHeader,

    #[error("authorization header is not of the form `Bearer <token>`")]
    BadFormat,

    #[error("token signature or algorithm is invalid")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token is malformed")]
    Malformed,
}

impl AuthError {
    /// Message sent to the client.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::MissingHeader => "missing authorization header",
            Self::BadFormat => "invalid authorization format",
            Self::InvalidSignature | Self::Expired | Self::Malformed => "invalid token",
        }
    }
}

/// Extract the bearer token from a request.
fn bearer_token(request: &Request) -> Result<&str, AuthError> {
    let value = match request.headers().get(header::AUTHORIZATION) {
        Some(value) if !value.is_empty() => value,
        _ => return Err(AuthError::MissingHeader),
    };
    let value = value.to_str().map_err(|_| AuthError::BadFormat)?;

    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        ["Bearer", token] => Ok(token),
        _ => Err(AuthError::BadFormat),
    }
}

/// Middleware that admits only requests carrying a valid token signed with
/// `secret`, exposing the token subject via [`Context::user_id`].
pub fn require_auth(secret: impl Into<String>) -> Middleware {
    let secret: std::sync::Arc<str> = secret.into().into();
    Middleware::new(move |next: Handler| {
        let secret = secret.clone();
        Handler::new(move |ctx: Context, request: Request| {
            let verdict = bearer_token(&request).and_then(|token| validate_token(token, &secret));
            let next = next.clone();
            async move {
                match verdict {
                    Ok(user_id) => next.call(ctx.with_user_id(user_id), request).await,
                    Err(e) => {
                        tracing::debug!(
                            path = %request.uri().path(),
                            error = %e,
                            "Rejected unauthenticated request"
                        );
                        response::json(
                            StatusCode::UNAUTHORIZED,
                            json!({ "error": e.public_message() }),
                        )
                        .boxed()
                    }
                }
            }
        })
    })
}
