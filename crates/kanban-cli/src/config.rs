//! Server configuration file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use kanban_realtime::RealtimeConfig;

/// Config file read when `--config` is not given, if it exists.
pub const DEFAULT_CONFIG_FILE: &str = "kanban.toml";

pub const TEMPLATE: &str = r#"# Kanban Live configuration

[server]
# Address to bind.
host = "127.0.0.1"
port = 3030
# Token required by POST /api/boards/{id}/events in the x-admin-token header.
# Leave unset to disable the endpoint. Env: KANBAN_ADMIN_TOKEN
# admin_token = "change-me"

[store]
# "memory" keeps everything in process; "redis" persists to redis_url.
backend = "memory"
# Env: REDIS_URL
redis_url = "redis://127.0.0.1:6379"
key_prefix = "kanban"

[realtime]
# Seconds between stale connection sweeps.
sweep_interval_secs = 60
# Connections without a delivered event for this long are evicted.
# Keep-alives do not count.
stale_after_secs = 300
# Upper bound on a single write to one connection.
write_timeout_secs = 5
# Keep-alive comment frame period. 0 disables.
heartbeat_interval_secs = 30
# Frames buffered per connection.
sink_buffer = 64
# Seconds before an idle board's publish worker exits.
queue_idle_secs = 60
"#;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub realtime: RealtimeConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub admin_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3030,
            admin_token: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Redis,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Memory => "memory",
            StoreBackend::Redis => "redis",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub redis_url: String,
    pub key_prefix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: "kanban".to_string(),
        }
    }
}

impl Config {
    /// Load `path`, or `kanban.toml` in the working directory when it exists,
    /// or the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::parse(&raw).with_context(|| format!("Invalid config file {}", path.display()))?;
        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_matches_defaults() {
        let config = Config::parse(TEMPLATE).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::parse(
            r#"
            [server]
            port = 8080
            admin_token = "t0k"

            [store]
            backend = "redis"

            [realtime]
            heartbeat_interval_secs = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.admin_token.as_deref(), Some("t0k"));
        assert_eq!(config.store.backend, StoreBackend::Redis);
        assert_eq!(config.store.key_prefix, "kanban");
        assert_eq!(config.realtime.heartbeat_interval(), None);
        assert_eq!(config.realtime.stale_after_secs, 300);
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        assert!(Config::parse("[store]\nbackend = \"sqlite\"\n").is_err());
    }
}
