//! Request-scoped values threaded through the handler chain.
//!
//! Values are keyed by type, so two middlewares can only collide if they
//! share a key type. The authenticated user id uses a private key type and
//! is reachable only through [`Context::with_user_id`] / [`Context::user_id`].

use axum::http::Extensions;

#[derive(Clone)]
struct UserId(String);

#[derive(Clone, Default)]
struct PathParams(Vec<(String, String)>);

/// Per-request context handed to every handler and middleware.
#[derive(Clone, Debug, Default)]
pub struct Context {
    values: Extensions,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an arbitrary value keyed by its type.
    pub fn with<T: Clone + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.values.insert(value);
        self
    }

    pub fn get<T: Clone + Send + Sync + 'static>(&self) -> Option<&T> {
        self.values.get::<T>()
    }

    /// Attach the authenticated user id.
    pub fn with_user_id(self, user_id: impl Into<String>) -> Self {
        self.with(UserId(user_id.into()))
    }

    /// The authenticated user id, if an auth middleware ran.
    pub fn user_id(&self) -> Option<&str> {
        self.get::<UserId>().map(|id| id.0.as_str())
    }

    pub(crate) fn with_path_params<I, K, V>(self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let params = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.with(PathParams(params))
    }

    /// Value captured by a `{name}` segment of the matched route.
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.get::<PathParams>()?
            .0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}
