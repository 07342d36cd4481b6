//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Pick server mode → health listener → start hook → routes → main listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → not ready → drain listeners → stop hook
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: health is observable before the application initialises
//! - Shutdown has a timeout per listener: forced close after the deadline

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
pub use startup::ServerMode;
