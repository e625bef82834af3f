use crate::error::{PagesmithError, PagesmithResult};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Snapshot cadence used when no configuration overrides it.
pub const DEFAULT_SNAPSHOT_INTERVAL: u32 = 20;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub history: HistoryConfig,
    pub log: LogConfig,
}

/// Reference version-store server settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Bearer token required on every request when set.
    pub api_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
            api_token: None,
        }
    }
}

/// Where the remote version store lives and how to reach it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub base_url: String,
    pub api_token: Option<String>,
    pub timeout_secs: u64,
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8787".to_string(),
            api_token: None,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// A full snapshot is written once the patch counter reaches this value.
    pub snapshot_interval: u32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            snapshot_interval: DEFAULT_SNAPSHOT_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive, e.g. `info` or `pagesmith=debug`.
    pub filter: String,
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

pub fn load_config(path: Option<&Path>) -> PagesmithResult<AppConfig> {
    let mut builder = Config::builder().add_source(File::with_name("pagesmith").required(false));

    if let Some(path) = path {
        builder = builder.add_source(File::from(path).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("PAGESMITH").separator("__"));

    let config = builder
        .build()
        .map_err(|err| PagesmithError::ConfigError(err.to_string()))?;

    let parsed: AppConfig = config
        .try_deserialize()
        .map_err(|err| PagesmithError::ConfigError(err.to_string()))?;

    if parsed.history.snapshot_interval == 0 {
        return Err(PagesmithError::ConfigError(
            "history.snapshot_interval must be at least 1".to_string(),
        ));
    }

    Ok(parsed)
}
