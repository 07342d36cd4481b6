//! Configuration schema definitions.
//!
//! Applications embed [`BaseConfig`] (conventionally under a `[bedrock]`
//! table) in their own config record.

use serde::{Deserialize, Serialize};

use crate::config::env::{EnvOverrides, Overlay};
use crate::config::loader::ConfigError;

/// Core settings every bedrock service carries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BaseConfig {
    /// Main listener port. Overridden by `HTTP_PORT`.
    pub http_port: u16,

    /// Health listener port. Equal to `http_port` means the health
    /// endpoints share the main listener. Overridden by `HEALTH_PORT`.
    pub health_port: u16,

    /// Prometheus exporter port, `0` disables it. Overridden by `METRICS_PORT`.
    pub metrics_port: u16,

    /// Default tracing filter. Overridden by `LOG_LEVEL`.
    pub log_level: String,

    /// Deployment environment name. Overridden by `ENVIRONMENT`.
    pub environment: String,
}

impl EnvOverrides for BaseConfig {
    fn apply_env(&mut self, env: &Overlay<'_>) -> Result<(), ConfigError> {
        env.field("http_port", "HTTP_PORT", &mut self.http_port)?;
        env.field("health_port", "HEALTH_PORT", &mut self.health_port)?;
        env.field("metrics_port", "METRICS_PORT", &mut self.metrics_port)?;
        env.field("log_level", "LOG_LEVEL", &mut self.log_level)?;
        env.field("environment", "ENVIRONMENT", &mut self.environment)
    }
}

/// Cross-origin settings applied to application routes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins echoed back in `Access-Control-Allow-Origin`; `"*"` allows any.
    pub allowed_origins: Vec<String>,

    pub allowed_methods: Vec<String>,

    pub allowed_headers: Vec<String>,

    pub exposed_headers: Vec<String>,

    pub allow_credentials: bool,

    /// Preflight cache lifetime in seconds, `0` omits the header.
    pub max_age: u32,
}

impl Default for CorsConfig {
    /// Permissive settings suitable for development.
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: ["GET", "POST", "PUT", "DELETE", "PATCH", "OPTIONS"]
                .map(String::from)
                .to_vec(),
            allowed_headers: ["Accept", "Authorization", "Content-Type", "X-CSRF-Token"]
                .map(String::from)
                .to_vec(),
            exposed_headers: vec!["Link".to_string()],
            allow_credentials: false,
            max_age: 300,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_base_config_defaults_are_zero() {
        let cfg = BaseConfig::default();
        assert_eq!(cfg.http_port, 0);
        assert_eq!(cfg.health_port, 0);
        assert_eq!(cfg.metrics_port, 0);
        assert!(cfg.log_level.is_empty());
        assert!(cfg.environment.is_empty());
    }

    #[test]
    fn test_base_config_env_overrides() {
        let env: HashMap<String, String> = [
            ("HTTP_PORT", "8080"),
            ("HEALTH_PORT", "9090"),
            ("METRICS_PORT", "9100"),
            ("LOG_LEVEL", "debug"),
            ("ENVIRONMENT", "staging"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let mut cfg = BaseConfig::default();
        cfg.apply_env(&Overlay::new(&env)).unwrap();

        assert_eq!(
            cfg,
            BaseConfig {
                http_port: 8080,
                health_port: 9090,
                metrics_port: 9100,
                log_level: "debug".into(),
                environment: "staging".into(),
            }
        );
    }

    #[test]
    fn test_cors_default_is_permissive() {
        let cors = CorsConfig::default();
        assert_eq!(cors.allowed_origins, vec!["*"]);
        assert!(cors.allowed_methods.iter().any(|m| m == "OPTIONS"));
        assert!(cors.allowed_headers.iter().any(|h| h == "Authorization"));
        assert!(!cors.allow_credentials);
        assert_eq!(cors.max_age, 300);
    }

    #[test]
    fn test_cors_table_deserializes_with_defaults() {
        let cors: CorsConfig = toml::from_str(
            r#"
            allowed_origins = ["https://app.example.com"]
            allow_credentials = true
            "#,
        )
        .unwrap();
        assert_eq!(cors.allowed_origins, vec!["https://app.example.com"]);
        assert!(cors.allow_credentials);
        assert_eq!(cors.max_age, 300);
    }
}
