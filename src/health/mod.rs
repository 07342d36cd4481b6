//! Health reporting subsystem.
//!
//! # Data Flow
//! ```text
//! Server runner:
//!     start hook ok → set_healthy(true)
//!     listener up   → set_ready(true)
//!     signal        → set_ready(false)
//!
//! Orchestrator checks (endpoints.rs):
//!     GET /health, /live → healthy flag
//!     GET /ready         → ready flag
//! ```
//!
//! # Design Decisions
//! - Two independent flags, no further states
//! - One tracker per server, passed explicitly; no global instance
//! - Health routes bypass CORS and application middleware

pub mod endpoints;
pub mod state;

pub use endpoints::{router, RESERVED_PATHS};
pub use state::HealthStatus;
