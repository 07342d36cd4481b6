//! Environment-variable overlay.
//!
//! Records opt in by implementing [`EnvOverrides`] and listing each
//! overridable field against the variable that may replace it. Nested
//! records are visited through [`Overlay::nested`], so an application
//! config that embeds [`BaseConfig`](crate::config::BaseConfig) only has to
//! forward to it.
//!
//! ```
//! use bedrock::config::{BaseConfig, ConfigError, EnvOverrides, Overlay};
//!
//! #[derive(Default)]
//! struct AppConfig {
//!     bedrock: BaseConfig,
//!     database_url: String,
//!     max_connections: u32,
//! }
//!
//! impl EnvOverrides for AppConfig {
//!     fn apply_env(&mut self, env: &Overlay<'_>) -> Result<(), ConfigError> {
//!         env.nested(&mut self.bedrock)?;
//!         env.field("database_url", "DATABASE_URL", &mut self.database_url)?;
//!         env.field("max_connections", "MAX_CONNECTIONS", &mut self.max_connections)
//!     }
//! }
//! ```

use std::collections::HashMap;

use crate::config::loader::ConfigError;

/// Where environment values come from.
pub trait EnvSource: Send + Sync {
    /// Value of `key`, or `None` when unset.
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// A value that can be parsed from an environment variable.
pub trait FromEnv: Sized {
    /// Parse `value`, returning a short reason on failure.
    fn from_env(value: &str) -> Result<Self, String>;
}

impl FromEnv for String {
    fn from_env(value: &str) -> Result<Self, String> {
        Ok(value.to_owned())
    }
}

impl FromEnv for bool {
    fn from_env(value: &str) -> Result<Self, String> {
        match value {
            "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
            "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
            _ => Err("not a boolean".to_owned()),
        }
    }
}

impl<T: FromEnv> FromEnv for Option<T> {
    fn from_env(value: &str) -> Result<Self, String> {
        T::from_env(value).map(Some)
    }
}

macro_rules! from_env_via_parse {
    ($kind:literal => $($ty:ty),+) => {
        $(
            impl FromEnv for $ty {
                fn from_env(value: &str) -> Result<Self, String> {
                    value
                        .parse::<$ty>()
                        .map_err(|e| format!("not a valid {}: {e}", $kind))
                }
            }
        )+
    };
}

from_env_via_parse!("signed integer" => i8, i16, i32, i64, isize);
from_env_via_parse!("unsigned integer" => u8, u16, u32, u64, usize);
from_env_via_parse!("float" => f32, f64);

/// Implemented by every record that carries environment overrides.
pub trait EnvOverrides {
    /// Overwrite fields from `env`, recursing into nested records.
    fn apply_env(&mut self, env: &Overlay<'_>) -> Result<(), ConfigError>;
}

/// Visitor handed to [`EnvOverrides::apply_env`].
pub struct Overlay<'a> {
    env: &'a dyn EnvSource,
}

impl<'a> Overlay<'a> {
    pub fn new(env: &'a dyn EnvSource) -> Self {
        Self { env }
    }

    /// Replace `slot` with the parsed value of `var` if it is set and non-empty.
    pub fn field<T: FromEnv>(
        &self,
        field: &'static str,
        var: &str,
        slot: &mut T,
    ) -> Result<(), ConfigError> {
        let Some(value) = self.env.var(var).filter(|v| !v.is_empty()) else {
            return Ok(());
        };

        match T::from_env(&value) {
            Ok(parsed) => {
                *slot = parsed;
                tracing::debug!(field, var, "Applied environment override");
                Ok(())
            }
            Err(reason) => Err(ConfigError::Conversion {
                field,
                var: var.to_owned(),
                value,
                reason,
            }),
        }
    }

    /// Recurse into a nested record.
    pub fn nested<C: EnvOverrides + ?Sized>(&self, section: &mut C) -> Result<(), ConfigError> {
        section.apply_env(self)
    }
}
