//! Nomad-aware port resolution.
//!
//! Nomad publishes dynamically allocated ports as `NOMAD_PORT_<label>`.
//! When present and valid such a variable wins over everything else,
//! including `HTTP_PORT`-style overrides already applied to the config.

use crate::config::env::{EnvSource, ProcessEnv};
use crate::config::schema::BaseConfig;

/// Port labels bedrock resolves.
pub const HTTP_LABEL: &str = "http";
pub const HEALTH_LABEL: &str = "health";
pub const METRICS_LABEL: &str = "metrics";

/// Name of the Nomad variable for `label`.
pub fn nomad_var(label: &str) -> String {
    format!("NOMAD_PORT_{label}")
}

/// The port in `NOMAD_PORT_<label>`, if set and numeric.
pub fn nomad_port(label: &str, env: &dyn EnvSource) -> Option<u16> {
    let var = nomad_var(label);
    let raw = env.var(&var).filter(|v| !v.is_empty())?;
    match raw.parse::<u16>() {
        Ok(port) => Some(port),
        Err(_) => {
            tracing::warn!(
                var = %var,
                value = %raw,
                "Nomad port variable is invalid, falling back to configured port"
            );
            None
        }
    }
}

/// `NOMAD_PORT_<label>` if set and numeric, otherwise `fallback`.
pub fn resolve_port(label: &str, fallback: u16, env: &dyn EnvSource) -> u16 {
    match nomad_port(label, env) {
        Some(port) => {
            tracing::info!(label, port, "Using Nomad-assigned port");
            port
        }
        None => fallback,
    }
}

impl BaseConfig {
    pub fn resolved_http_port(&self) -> u16 {
        self.resolved_http_port_with(&ProcessEnv)
    }

    pub fn resolved_health_port(&self) -> u16 {
        self.resolved_health_port_with(&ProcessEnv)
    }

    pub fn resolved_metrics_port(&self) -> u16 {
        self.resolved_metrics_port_with(&ProcessEnv)
    }

    pub fn resolved_http_port_with(&self, env: &dyn EnvSource) -> u16 {
        resolve_port(HTTP_LABEL, self.http_port, env)
    }

    pub fn resolved_health_port_with(&self, env: &dyn EnvSource) -> u16 {
        resolve_port(HEALTH_LABEL, self.health_port, env)
    }

    pub fn resolved_metrics_port_with(&self, env: &dyn EnvSource) -> u16 {
        resolve_port(METRICS_LABEL, self.metrics_port, env)
    }
}
