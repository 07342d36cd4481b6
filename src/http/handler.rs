//! Type-erased request handlers.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::http::context::Context;
use crate::http::request::Request;
use crate::http::response::{BoxResponse, Response};

type HandlerFn = dyn Fn(Context, Request) -> BoxFuture<'static, BoxResponse> + Send + Sync;

/// An async function from `(Context, Request)` to a [`Response`].
///
/// Cheap to clone; every clone calls the same function.
#[derive(Clone)]
pub struct Handler {
    inner: Arc<HandlerFn>,
}

impl Handler {
    pub fn new<F, Fut, R>(f: F) -> Self
    where
        F: Fn(Context, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: Response + 'static,
    {
        Self {
            inner: Arc::new(move |ctx: Context, request: Request| -> BoxFuture<'static, BoxResponse> {
                let fut = f(ctx, request);
                Box::pin(async move { fut.await.boxed() })
            }),
        }
    }

    pub fn call(&self, ctx: Context, request: Request) -> BoxFuture<'static, BoxResponse> {
        (self.inner)(ctx, request)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler")
    }
}
