//! TOML configuration parsing and validation.
//!
//! ```toml
//! [db]
//! path = "./data/reports.sqlite"
//!
//! [query]
//! default_limit = 20
//!
//! [events]
//! capacity = 256
//!
//! [log]
//! level = "info"
//! ```
//!
//! Only `[db]` is required.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use report_harness_core::query::{QueryParams, DEFAULT_QUERY_LIMIT};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub events: EventsConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct QueryConfig {
    #[serde(default = "default_limit")]
    pub default_limit: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
        }
    }
}

fn default_limit() -> usize {
    DEFAULT_QUERY_LIMIT
}

#[derive(Debug, Deserialize, Clone)]
pub struct EventsConfig {
    /// Broadcast channel capacity; slow subscribers lag beyond this.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

fn default_capacity() -> usize {
    256
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive. `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn query_params(&self) -> QueryParams {
        QueryParams {
            default_limit: self.query.default_limit,
        }
    }
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    if config.query.default_limit < 1 {
        anyhow::bail!("query.default_limit must be >= 1");
    }

    if config.events.capacity < 1 {
        anyhow::bail!("events.capacity must be >= 1");
    }

    if config.log.level.trim().is_empty() {
        anyhow::bail!("log.level must not be empty");
    }

    Ok(config)
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let cfg = parse_config("[db]\npath = \"./data/reports.sqlite\"\n").unwrap();
        assert_eq!(cfg.db.path, PathBuf::from("./data/reports.sqlite"));
        assert_eq!(cfg.query.default_limit, 20);
        assert_eq!(cfg.events.capacity, 256);
        assert_eq!(cfg.log.level, "info");
        assert_eq!(cfg.query_params().default_limit, 20);
    }

    #[test]
    fn test_overrides() {
        let cfg = parse_config(
            r#"
[db]
path = "/tmp/r.sqlite"

[query]
default_limit = 5

[log]
level = "report_harness=debug"
"#,
        )
        .unwrap();
        assert_eq!(cfg.query.default_limit, 5);
        assert_eq!(cfg.log.level, "report_harness=debug");
    }

    #[test]
    fn test_zero_limit_rejected() {
        let err = parse_config("[db]\npath = \"x\"\n[query]\ndefault_limit = 0\n").unwrap_err();
        assert!(err.to_string().contains("default_limit"));
    }

    #[test]
    fn test_missing_db_rejected() {
        assert!(parse_config("[query]\ndefault_limit = 3\n").is_err());
    }
}
