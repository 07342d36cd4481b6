//! Signed bearer tokens.
//!
//! Tokens are HMAC-signed JWTs carrying `sub`, `iat` and `exp`. Only the HS*
//! family is accepted at validation; anything else is treated as a bad
//! signature.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::AuthError;

/// Claims carried by every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User identifier.
    pub sub: String,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

/// Sign a token for `subject`, valid for `ttl` from now.
///
/// A negative `ttl` produces a token that is already expired.
pub fn issue_token(
    subject: &str,
    secret: &str,
    ttl: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let expires = now
        .checked_add_signed(ttl)
        .unwrap_or(if ttl < Duration::zero() {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        });

    let claims = Claims {
        sub: subject.to_string(),
        iat: now.timestamp(),
        exp: expires.timestamp(),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Verify `token` under `secret` and return its subject.
pub fn validate_token(token: &str, secret: &str) -> Result<String, AuthError> {
    let claims = decode(token, secret)?;
    if Utc::now().timestamp() >= claims.exp {
        return Err(AuthError::Expired);
    }
    if claims.sub.is_empty() {
        return Err(AuthError::Malformed);
    }
    Ok(claims.sub)
}

fn decode(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm | ErrorKind::InvalidKeyFormat => {
            AuthError::InvalidSignature
        }
        ErrorKind::ExpiredSignature => AuthError::Expired,
        _ => AuthError::Malformed,
    })
}
