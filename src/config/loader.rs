//! Configuration loading from disk.
//!
//! A missing file is not an error: the destination keeps its current values
//! and still receives environment overrides. A malformed file is.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use toml::{Table, Value};

use crate::config::env::{EnvOverrides, EnvSource, Overlay, ProcessEnv};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file is not valid TOML or does not fit the destination type.
    #[error("failed to decode TOML file {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The destination could not be represented as a TOML table.
    #[error("failed to snapshot configuration before decoding: {0}")]
    Snapshot(#[from] toml::ser::Error),

    /// An environment variable held a value the field's type cannot take.
    #[error("failed to set field {field} from env {var}: cannot parse {value:?}: {reason}")]
    Conversion {
        field: &'static str,
        var: String,
        value: String,
        reason: String,
    },
}

/// Loads a TOML file into a config record, then applies env overrides.
#[derive(Clone)]
pub struct Loader {
    path: PathBuf,
    env: Arc<dyn EnvSource>,
}

impl Loader {
    /// Loader for `path`, reading overrides from the process environment.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            env: Arc::new(ProcessEnv),
        }
    }

    /// Replace the environment source.
    pub fn with_env(mut self, env: impl EnvSource + 'static) -> Self {
        self.env = Arc::new(env);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load into a fresh `C::default()`.
    pub fn load<C>(&self) -> Result<C, ConfigError>
    where
        C: Default + Serialize + DeserializeOwned + EnvOverrides,
    {
        let mut config = C::default();
        self.load_into(&mut config)?;
        Ok(config)
    }

    /// Decode the file over `dest` and apply env overrides in place.
    ///
    /// Keys present in the file replace the destination's values; keys
    /// absent from it leave them untouched.
    pub fn load_into<C>(&self, dest: &mut C) -> Result<(), ConfigError>
    where
        C: Serialize + DeserializeOwned + EnvOverrides,
    {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                *dest = self.decode_onto(dest, &content)?;
                tracing::debug!(path = %self.path.display(), "Config file decoded");
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(
                    path = %self.path.display(),
                    "Config file not found, continuing with current values"
                );
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        }

        dest.apply_env(&Overlay::new(self.env.as_ref()))
    }

    fn decode_onto<C>(&self, current: &C, content: &str) -> Result<C, ConfigError>
    where
        C: Serialize + DeserializeOwned,
    {
        let decode_err = |source| ConfigError::Decode {
            path: self.path.clone(),
            source,
        };

        let file: Table = toml::from_str(content).map_err(decode_err)?;
        let mut merged = match Value::try_from(current)? {
            Value::Table(table) => table,
            _ => Table::new(),
        };
        merge_tables(&mut merged, file);

        Value::Table(merged).try_into().map_err(decode_err)
    }
}

impl std::fmt::Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader").field("path", &self.path).finish()
    }
}

fn merge_tables(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        if let Value::Table(incoming) = value {
            if let Some(Value::Table(existing)) = base.get_mut(&key) {
                merge_tables(existing, incoming);
                continue;
            }
            base.insert(key, Value::Table(incoming));
        } else {
            base.insert(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BaseConfig;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(default)]
    struct AppConfig {
        bedrock: BaseConfig,
        database_url: String,
        max_connections: i32,
        cache_ttl: u64,
        debug: bool,
    }

    impl EnvOverrides for AppConfig {
        fn apply_env(&mut self, env: &Overlay<'_>) -> Result<(), ConfigError> {
            env.nested(&mut self.bedrock)?;
            env.field("database_url", "DATABASE_URL", &mut self.database_url)?;
            env.field("max_connections", "MAX_CONNECTIONS", &mut self.max_connections)?;
            env.field("cache_ttl", "CACHE_TTL", &mut self.cache_ttl)?;
            env.field("debug", "DEBUG", &mut self.debug)
        }
    }

    fn write_config(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("bedrock-{}-{name}.toml", std::process::id()));
        fs::write(&path, content).unwrap();
        path
    }

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let loader = Loader::new("/nonexistent/bedrock/config.toml").with_env(env(&[]));
        let cfg: AppConfig = loader.load().unwrap();
        assert_eq!(cfg.bedrock.http_port, 0);
        assert_eq!(cfg.bedrock.log_level, "");
        assert_eq!(cfg.database_url, "");
        assert_eq!(cfg.max_connections, 0);
    }

    #[test]
    fn test_missing_file_still_applies_env() {
        let loader = Loader::new("/nonexistent/bedrock/config.toml")
            .with_env(env(&[("HTTP_PORT", "8080"), ("DATABASE_URL", "postgres://db")]));
        let cfg: AppConfig = loader.load().unwrap();
        assert_eq!(cfg.bedrock.http_port, 8080);
        assert_eq!(cfg.database_url, "postgres://db");
    }

    #[test]
    fn test_file_values_then_env_override() {
        let path = write_config(
            "override",
            r#"
            database_url = "postgres://file"
            max_connections = 10

            [bedrock]
            http_port = 8080
            health_port = 9090
            log_level = "info"
            "#,
        );

        let loader = Loader::new(&path).with_env(env(&[
            ("HTTP_PORT", "3000"),
            ("MAX_CONNECTIONS", "50"),
        ]));
        let cfg: AppConfig = loader.load().unwrap();

        assert_eq!(cfg.bedrock.http_port, 3000);
        assert_eq!(cfg.bedrock.health_port, 9090);
        assert_eq!(cfg.bedrock.log_level, "info");
        assert_eq!(cfg.database_url, "postgres://file");
        assert_eq!(cfg.max_connections, 50);

        fs::remove_file(path).unwrap_or_default();
    }

    #[test]
    fn test_non_numeric_env_for_integer_field() {
        let loader = Loader::new("/nonexistent/bedrock/config.toml")
            .with_env(env(&[("MAX_CONNECTIONS", "many")]));
        let err = loader.load::<AppConfig>().unwrap_err();
        match err {
            ConfigError::Conversion { field, var, value, .. } => {
                assert_eq!(field, "max_connections");
                assert_eq!(var, "MAX_CONNECTIONS");
                assert_eq!(value, "many");
            }
            other => panic!("expected conversion error, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_file_is_decode_error() {
        let path = write_config("malformed", "this is = = not toml [");
        let loader = Loader::new(&path).with_env(env(&[]));
        let err = loader.load::<AppConfig>().unwrap_err();
        assert!(matches!(err, ConfigError::Decode { .. }));
        fs::remove_file(path).unwrap_or_default();
    }

    #[test]
    fn test_wrong_type_in_file_is_decode_error() {
        let path = write_config("wrongtype", "[bedrock]\nhttp_port = \"eighty\"\n");
        let loader = Loader::new(&path).with_env(env(&[]));
        let err = loader.load::<AppConfig>().unwrap_err();
        assert!(matches!(err, ConfigError::Decode { .. }));
        fs::remove_file(path).unwrap_or_default();
    }

    #[test]
    fn test_load_into_keeps_values_absent_from_file() {
        let path = write_config("partial", "[bedrock]\nhealth_port = 9191\n");
        let mut cfg = AppConfig {
            cache_ttl: 60,
            ..AppConfig::default()
        };
        cfg.bedrock.http_port = 8081;

        Loader::new(&path)
            .with_env(env(&[("DEBUG", "true")]))
            .load_into(&mut cfg)
            .unwrap();

        assert_eq!(cfg.bedrock.http_port, 8081);
        assert_eq!(cfg.bedrock.health_port, 9191);
        assert_eq!(cfg.cache_ttl, 60);
        assert!(cfg.debug);
        fs::remove_file(path).unwrap_or_default();
    }

    #[test]
    fn test_merge_tables_recurses() {
        let mut base: Table = toml::from_str("[a]\nx = 1\ny = 2\n").unwrap();
        let overlay: Table = toml::from_str("[a]\ny = 3\n[b]\nz = 4\n").unwrap();
        merge_tables(&mut base, overlay);
        assert_eq!(base["a"]["x"].as_integer(), Some(1));
        assert_eq!(base["a"]["y"].as_integer(), Some(3));
        assert_eq!(base["b"]["z"].as_integer(), Some(4));
    }
}
