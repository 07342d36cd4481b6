//! config-demo: load a bedrock configuration and report where each value
//! came from.
//!
//! ```text
//! config-demo [PATH]          # defaults to config.toml
//! NOMAD_PORT_http=24000 config-demo
//! ```

use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};

use bedrock::config::ports::{nomad_port, nomad_var, HEALTH_LABEL, HTTP_LABEL, METRICS_LABEL};
use bedrock::config::{
    BaseConfig, ConfigError, EnvOverrides, EnvSource, Loader, Overlay, ProcessEnv,
};

#[derive(Parser)]
#[command(name = "config-demo")]
#[command(about = "Load a bedrock configuration and show where each value came from", long_about = None)]
struct Cli {
    /// Path to the TOML config file
    #[arg(default_value = "config.toml")]
    path: PathBuf,
}

/// An application config embedding bedrock's base settings.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct AppConfig {
    bedrock: BaseConfig,
    database_url: String,
    max_connections: i32,
    api_key: String,
    cache_ttl: i32,
}

impl EnvOverrides for AppConfig {
    fn apply_env(&mut self, env: &Overlay<'_>) -> Result<(), ConfigError> {
        env.nested(&mut self.bedrock)?;
        env.field("database_url", "DATABASE_URL", &mut self.database_url)?;
        env.field("max_connections", "MAX_CONNECTIONS", &mut self.max_connections)?;
        env.field("api_key", "API_KEY", &mut self.api_key)?;
        env.field("cache_ttl", "CACHE_TTL", &mut self.cache_ttl)
    }
}

const OVERRIDABLE: [&str; 9] = [
    "HTTP_PORT",
    "HEALTH_PORT",
    "METRICS_PORT",
    "LOG_LEVEL",
    "ENVIRONMENT",
    "DATABASE_URL",
    "MAX_CONNECTIONS",
    "API_KEY",
    "CACHE_TTL",
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    println!("Bedrock Config Demo");
    println!("===================");
    println!();
    println!("Loading configuration from: {}", cli.path.display());
    println!();

    let cfg: AppConfig = Loader::new(&cli.path).load()?;
    let base = &cfg.bedrock;

    println!("Bedrock Configuration:");
    println!("  HTTP Port:    {}", base.http_port);
    println!("  Health Port:  {}", base.health_port);
    println!("  Metrics Port: {}", base.metrics_port);
    println!("  Log Level:    {}", base.log_level);
    println!("  Environment:  {}", base.environment);
    println!();

    println!("Resolved Ports (Nomad-aware):");
    let resolved = [
        ("HTTP Port:   ", HTTP_LABEL, base.resolved_http_port()),
        ("Health Port: ", HEALTH_LABEL, base.resolved_health_port()),
        ("Metrics Port:", METRICS_LABEL, base.resolved_metrics_port()),
    ];
    for (name, label, port) in resolved {
        println!("  {name} {port} ({})", source(label, &ProcessEnv));
    }
    println!();

    println!("Application Configuration:");
    println!("  Database URL:    {}", cfg.database_url);
    println!("  Max Connections: {}", cfg.max_connections);
    println!("  API Key:         {}", mask_api_key(&cfg.api_key));
    println!("  Cache TTL:       {}", cfg.cache_ttl);
    println!();

    println!("Environment Variable Overrides:");
    for var in OVERRIDABLE {
        report_override(var);
    }
    println!();

    println!("Nomad Dynamic Port Allocation:");
    for label in [HTTP_LABEL, HEALTH_LABEL, METRICS_LABEL] {
        report_override(&nomad_var(label));
    }
    println!();

    println!("✓ Configuration loaded successfully!");
    Ok(())
}

fn is_set(var: &str) -> bool {
    std::env::var(var).is_ok_and(|v| !v.is_empty())
}

/// Where the resolved port for `label` came from.
fn source(label: &str, env: &dyn EnvSource) -> String {
    if nomad_port(label, env).is_some() {
        format!("from {}", nomad_var(label))
    } else {
        "from config".to_string()
    }
}

fn report_override(var: &str) {
    if is_set(var) {
        println!("  ✓ {var} is overridden");
    } else {
        println!("    {var} (using TOML value)");
    }
}

fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    match chars.len() {
        0 => "(not set)".to_string(),
        1..=8 => "****".to_string(),
        n => {
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[n - 4..].iter().collect();
            format!("{head}****{tail}")
        }
    }
}
