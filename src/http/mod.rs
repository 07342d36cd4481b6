//! HTTP handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (listeners, request ID, tracing, CORS)
//!     → routing (path + method match, path params into Context)
//!     → middleware (per-route chain, e.g. auth)
//!     → handler.rs (application code)
//!     → response.rs (render status + body)
//!     → Send to client
//! ```

pub mod context;
pub mod handler;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;
pub mod upload;

pub use context::Context;
pub use handler::Handler;
pub use middleware::{chain, Middleware};
pub use request::{decode_json, query_param, Request, RequestError};
pub use response::{error, json, BoxResponse, JsonResponse, Response, ResponseError, StatusResponse};
pub use server::{Server, ServerError};
pub use upload::{parse_multipart_form, MultipartForm, UploadError, UploadedFile};
