//! Multipart form uploads.
//!
//! # Responsibilities
//! - Buffer a `multipart/form-data` body up to a caller-chosen size
//! - Split it into uploaded files and plain form values
//!
//! # Design Decisions
//! - The whole form is read up front; handlers then look fields up by name
//! - Form values fall back to the query string, like a classic form lookup
//! - `Server` disables axum's 2 MiB extractor limit; routers mounted
//!   elsewhere need `DefaultBodyLimit::disable()` for larger forms

use std::collections::HashMap;

use axum::body::{Body, Bytes};
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{FromRequest, Multipart, Query};
use thiserror::Error;

use crate::http::request::Request;

/// Size cap used when [`parse_multipart_form`] is given `0`.
pub const DEFAULT_MAX_MEMORY_MB: usize = 32;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to read multipart body: {0}")]
    Body(axum::Error),

    #[error("not a multipart request: {0}")]
    Multipart(#[from] MultipartRejection),

    #[error("malformed multipart field: {0}")]
    Field(#[from] MultipartError),

    #[error("no file uploaded in field `{0}`")]
    MissingFile(String),
}

/// A file received in a multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub size: u64,
    pub bytes: Bytes,
}

/// A fully read multipart form.
#[derive(Debug, Default)]
pub struct MultipartForm {
    files: HashMap<String, Vec<UploadedFile>>,
    values: HashMap<String, Vec<String>>,
    query: Vec<(String, String)>,
}

impl MultipartForm {
    /// First file uploaded under `field`.
    pub fn file(&self, field: &str) -> Result<&UploadedFile, UploadError> {
        self.files(field)?
            .first()
            .ok_or_else(|| UploadError::MissingFile(field.to_string()))
    }

    /// Every file uploaded under `field`; at least one.
    pub fn files(&self, field: &str) -> Result<&[UploadedFile], UploadError> {
        match self.files.get(field) {
            Some(files) if !files.is_empty() => Ok(files),
            _ => Err(UploadError::MissingFile(field.to_string())),
        }
    }

    /// First value of a non-file field, else of the query parameter `field`.
    pub fn value(&self, field: &str) -> Option<&str> {
        self.values
            .get(field)
            .and_then(|values| values.first())
            .or_else(|| {
                self.query
                    .iter()
                    .find(|(key, _)| key == field)
                    .map(|(_, value)| value)
            })
            .map(String::as_str)
    }
}

fn limit_bytes(max_memory_mb: usize) -> usize {
    let mb = if max_memory_mb == 0 {
        DEFAULT_MAX_MEMORY_MB
    } else {
        max_memory_mb
    };
    mb.saturating_mul(1 << 20)
}

/// Read a multipart form of at most `max_memory_mb` MiB (`0` means
/// [`DEFAULT_MAX_MEMORY_MB`]).
pub async fn parse_multipart_form(
    request: Request,
    max_memory_mb: usize,
) -> Result<MultipartForm, UploadError> {
    let (parts, body) = request.into_parts();
    let query = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
        .map(|Query(pairs)| pairs)
        .unwrap_or_default();

    let bytes = axum::body::to_bytes(body, limit_bytes(max_memory_mb))
        .await
        .map_err(UploadError::Body)?;
    let request = Request::from_parts(parts, Body::from(bytes));
    let mut multipart = Multipart::from_request(request, &()).await?;

    let mut form = MultipartForm {
        query,
        ..MultipartForm::default()
    };
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            Some(filename) => {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                form.files.entry(name).or_default().push(UploadedFile {
                    filename,
                    content_type,
                    size: bytes.len() as u64,
                    bytes,
                });
            }
            None => {
                let text = field.text().await?;
                form.values.entry(name).or_default().push(text);
            }
        }
    }
    Ok(form)
}
