//! Startup decisions made before any application listener is bound.
//!
//! # Responsibilities
//! - Decide whether health endpoints share the main listener
//! - Reject application routes that would shadow a health endpoint
//!
//! # Design Decisions
//! - Fail fast: a conflicting route aborts startup
//! - Only merged mode can conflict; on a separate listener the paths never meet

use crate::health::RESERVED_PATHS;
use crate::routing::Route;

/// Where the health endpoints are served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerMode {
    /// Health and application routes share one listener.
    Merged { port: u16 },
    /// Health endpoints get their own listener.
    Separate { http_port: u16, health_port: u16 },
}

impl ServerMode {
    pub fn from_ports(http_port: u16, health_port: u16) -> Self {
        if http_port == health_port {
            Self::Merged { port: http_port }
        } else {
            Self::Separate {
                http_port,
                health_port,
            }
        }
    }

    pub fn is_merged(&self) -> bool {
        matches!(self, Self::Merged { .. })
    }

    pub fn http_port(&self) -> u16 {
        match *self {
            Self::Merged { port } => port,
            Self::Separate { http_port, .. } => http_port,
        }
    }
}

/// First application route whose path is one of the health endpoints.
pub fn reserved_path_conflict(routes: &[Route]) -> Option<&Route> {
    routes.iter().find(|route| {
        let path = route.path.trim_end_matches('/');
        RESERVED_PATHS.contains(&path)
    })
}
