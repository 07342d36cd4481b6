//! Handler middleware.
//!
//! A [`Middleware`] turns the handler for the rest of the chain into a new
//! handler. It may pass the request through, add values to the [`Context`]
//! before delegating, or answer on its own without delegating.
//!
//! [`Context`]: crate::http::Context

pub mod cors;

use std::fmt;
use std::sync::Arc;

use crate::http::handler::Handler;

/// Wraps a [`Handler`] and returns a new one.
#[derive(Clone)]
pub struct Middleware {
    wrap: Arc<dyn Fn(Handler) -> Handler + Send + Sync>,
}

impl Middleware {
    pub fn new<F>(wrap: F) -> Self
    where
        F: Fn(Handler) -> Handler + Send + Sync + 'static,
    {
        Self {
            wrap: Arc::new(wrap),
        }
    }

    pub fn wrap(&self, next: Handler) -> Handler {
        (self.wrap)(next)
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Middleware")
    }
}

/// Compose `middleware` around `handler`.
///
/// The first middleware runs first: `chain(h, &[logging, auth])` executes
/// `logging → auth → h`.
pub fn chain(handler: Handler, middleware: &[Middleware]) -> Handler {
    middleware
        .iter()
        .rev()
        .fold(handler, |next, m| m.wrap(next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::context::Context;
    use crate::http::request::Request;
    use crate::http::response::{json, BoxResponse, HttpResponse, StatusResponse};
    use axum::body::Body;
    use axum::http::StatusCode;
    use std::sync::Mutex;

    type Trace = Arc<Mutex<Vec<String>>>;

    fn recording(name: &'static str, trace: Trace) -> Middleware {
        Middleware::new(move |next| {
            let trace = trace.clone();
            Handler::new(move |ctx: Context, req: Request| {
                trace.lock().unwrap().push(name.to_string());
                next.call(ctx, req)
            })
        })
    }

    fn terminal(trace: Trace) -> Handler {
        Handler::new(move |_ctx: Context, _req: Request| {
            trace.lock().unwrap().push("handler".to_string());
            async { json(StatusCode::OK, "done") }
        })
    }

    fn request() -> Request {
        axum::http::Request::builder().uri("/").body(Body::empty()).unwrap()
    }

    async fn render(response: BoxResponse) -> HttpResponse {
        response.into_http().unwrap()
    }

    #[tokio::test]
    async fn test_chain_runs_in_declared_order() {
        let trace: Trace = Arc::default();
        let handler = chain(
            terminal(trace.clone()),
            &[
                recording("m1", trace.clone()),
                recording("m2", trace.clone()),
                recording("m3", trace.clone()),
            ],
        );

        let response = render(handler.call(Context::new(), request()).await).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(*trace.lock().unwrap(), vec!["m1", "m2", "m3", "handler"]);
    }

    #[tokio::test]
    async fn test_empty_chain_is_the_handler() {
        let trace: Trace = Arc::default();
        let handler = chain(terminal(trace.clone()), &[]);
        handler.call(Context::new(), request()).await;
        assert_eq!(*trace.lock().unwrap(), vec!["handler"]);
    }

    #[tokio::test]
    async fn test_short_circuit_skips_rest_of_chain() {
        let trace: Trace = Arc::default();
        let deny = Middleware::new(|_next| {
            Handler::new(|_ctx: Context, _req: Request| async {
                StatusResponse(StatusCode::FORBIDDEN)
            })
        });
        let handler = chain(
            terminal(trace.clone()),
            &[recording("m1", trace.clone()), deny, recording("m3", trace.clone())],
        );

        let response = render(handler.call(Context::new(), request()).await).await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(*trace.lock().unwrap(), vec!["m1"]);
    }

    #[tokio::test]
    async fn test_middleware_can_enrich_context() {
        let tag = Middleware::new(|next| {
            Handler::new(move |ctx: Context, req: Request| {
                next.call(ctx.with_user_id("from-middleware"), req)
            })
        });
        let echo = Handler::new(|ctx: Context, _req: Request| async move {
            json(StatusCode::OK, ctx.user_id().unwrap_or_default().to_string())
        });

        let response = render(chain(echo, &[tag]).call(Context::new(), request()).await).await;
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], br#""from-middleware""#);
    }
}
