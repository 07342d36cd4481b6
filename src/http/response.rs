//! Responses returned by handlers.
//!
//! # Responsibilities
//! - Let each response shape render itself into an HTTP response
//! - Provide the JSON status+payload shape handlers use day to day
//!
//! # Design Decisions
//! - Handlers return `impl Response`; the dispatcher boxes and renders them
//! - A render failure becomes a plain 500, never a panic

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use serde::Serialize;
use thiserror::Error;

/// The rendered HTTP response type.
pub type HttpResponse = axum::response::Response;

/// A type-erased handler response.
pub type BoxResponse = Box<dyn Response>;

/// Error raised while rendering a response.
#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("failed to encode JSON body: {0}")]
    Json(#[from] serde_json::Error),
}

/// Something a handler can answer with.
pub trait Response: Send {
    /// Render into an HTTP response.
    fn into_http(self: Box<Self>) -> Result<HttpResponse, ResponseError>;

    /// Erase the concrete type.
    fn boxed(self) -> BoxResponse
    where
        Self: Sized + 'static,
    {
        Box::new(self)
    }
}

impl Response for BoxResponse {
    fn into_http(self: Box<Self>) -> Result<HttpResponse, ResponseError> {
        (*self).into_http()
    }

    fn boxed(self) -> BoxResponse {
        self
    }
}

/// A status code plus a JSON-encoded payload.
#[derive(Debug, Clone)]
pub struct JsonResponse<T> {
    pub status: StatusCode,
    pub data: T,
}

impl<T: Serialize + Send> Response for JsonResponse<T> {
    fn into_http(self: Box<Self>) -> Result<HttpResponse, ResponseError> {
        let body = serde_json::to_vec(&self.data)?;
        let mut response = HttpResponse::new(Body::from(body));
        *response.status_mut() = self.status;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Ok(response)
    }
}

/// A bare status with an empty body.
#[derive(Debug, Clone, Copy)]
pub struct StatusResponse(pub StatusCode);

impl Response for StatusResponse {
    fn into_http(self: Box<Self>) -> Result<HttpResponse, ResponseError> {
        let mut response = HttpResponse::new(Body::empty());
        *response.status_mut() = self.0;
        Ok(response)
    }
}

/// JSON response with the given status.
pub fn json<T: Serialize + Send>(status: StatusCode, data: T) -> JsonResponse<T> {
    JsonResponse { status, data }
}

/// JSON response with status 500.
pub fn error<T: Serialize + Send>(data: T) -> JsonResponse<T> {
    json(StatusCode::INTERNAL_SERVER_ERROR, data)
}
