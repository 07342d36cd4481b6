//! Liveness and readiness flags.
//!
//! # State Transitions
//! ```text
//! start hook succeeded      → healthy = true
//! main listener accepting   → ready   = true
//! shutdown signal received  → ready   = false
//! ```
//!
//! Only the server runner writes these. Endpoint handlers only read.

use std::sync::Arc;

use tokio::sync::RwLock;

#[derive(Debug, Default, Clone, Copy)]
struct Flags {
    healthy: bool,
    ready: bool,
}

/// Shared handle to the process health flags.
///
/// Cheap to clone; all clones observe the same flags.
#[derive(Debug, Clone, Default)]
pub struct HealthStatus {
    flags: Arc<RwLock<Flags>>,
}

impl HealthStatus {
    /// Both flags start false.
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_healthy(&self, healthy: bool) {
        self.flags.write().await.healthy = healthy;
        tracing::debug!(healthy, "Health flag updated");
    }

    pub async fn set_ready(&self, ready: bool) {
        self.flags.write().await.ready = ready;
        tracing::debug!(ready, "Readiness flag updated");
    }

    pub async fn is_healthy(&self) -> bool {
        self.flags.read().await.healthy
    }

    pub async fn is_ready(&self) -> bool {
        self.flags.read().await.ready
    }
}
