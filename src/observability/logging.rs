//! Structured logging.
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, human format otherwise
//! - `RUST_LOG` wins over the configured level when set

use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// Calling it again after a subscriber is installed is a no-op.
pub fn init(level: &str, environment: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = if is_production(environment) {
        builder.json().with_target(false).try_init()
    } else {
        builder.try_init()
    };

    if installed.is_ok() {
        tracing::debug!(level, environment, "Logging initialised");
    }
}

fn is_production(environment: &str) -> bool {
    environment.eq_ignore_ascii_case("production")
}
