//! The application contract.

use async_trait::async_trait;

use crate::routing::Route;

/// An application served by [`Server`](crate::http::server::Server).
///
/// `on_start` runs after the health endpoints are reachable but before any
/// application route is. If it fails the process never reports healthy.
/// `on_stop` runs after the listeners have drained; its error is logged only.
#[async_trait]
pub trait App: Send + Sync + 'static {
    async fn on_start(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn on_stop(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Routes to serve. Called once, after a successful start.
    fn routes(&self) -> Vec<Route>;
}
