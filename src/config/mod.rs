//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (decode over the destination; missing file is fine)
//!     → env.rs (overlay declared fields from environment variables)
//!     → application config (read-only from here on)
//!
//! At bind time:
//!     ports.rs checks NOMAD_PORT_<label> before the configured port
//! ```
//!
//! # Design Decisions
//! - Overridable fields are listed explicitly per record, not discovered
//! - Nested records forward to each other, so embedding `BaseConfig` is enough
//! - Nomad-assigned ports take precedence over every other source

pub mod env;
pub mod loader;
pub mod ports;
pub mod schema;

pub use env::{EnvOverrides, EnvSource, FromEnv, Overlay, ProcessEnv};
pub use loader::{ConfigError, Loader};
pub use schema::{BaseConfig, CorsConfig};
