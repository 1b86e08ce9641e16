//! Core configuration types and loading.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use super::defaults::*;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Service configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Deployment identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,
    /// Inbound queue polling.
    #[serde(default)]
    pub queue: QueueConfig,
    /// Startup parameter fetch.
    #[serde(default)]
    pub parameters: ParametersConfig,
    /// Health/metrics HTTP listener.
    #[serde(default)]
    pub http: HttpConfig,
    /// Consumer loop restart policy.
    #[serde(default)]
    pub restart: RestartConfig,
    /// Signal handling.
    #[serde(default)]
    pub shutdown: ShutdownConfig,
    /// Local-mode transports.
    #[serde(default)]
    pub local: LocalConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Apply `STAGE` and `LOCAL` overrides.
    ///
    /// Takes a lookup function so callers decide where the environment comes
    /// from. Any non-empty `LOCAL` value enables local mode.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(stage) = lookup("STAGE").filter(|s| !s.is_empty()) {
            self.service.stage = stage;
        }
        if let Some(local) = lookup("LOCAL") {
            self.service.local = !local.is_empty();
        }
    }

    /// Parameter store path for the configured stage, e.g. `/pgc/test/`.
    pub fn parameter_path(&self) -> String {
        format!(
            "{}/{}/",
            self.parameters.path_prefix.trim_end_matches('/'),
            self.service.stage
        )
    }
}

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Deployment identity.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Stage used as the first segment of every topic.
    #[serde(default = "default_stage")]
    pub stage: String,
    /// Wire local transports instead of remote clients.
    #[serde(default)]
    pub local: bool,
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            stage: default_stage(),
            local: false,
            log_format: LogFormat::default(),
        }
    }
}

/// Inbound queue polling configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    /// Messages requested per receive call.
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
    /// Long-poll wait per receive call, in seconds.
    #[serde(default = "default_wait_time_secs")]
    pub wait_time_secs: u64,
}

impl QueueConfig {
    pub fn wait_time(&self) -> Duration {
        Duration::from_secs(self.wait_time_secs)
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_messages: default_max_messages(),
            wait_time_secs: default_wait_time_secs(),
        }
    }
}

/// Startup parameter fetch configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ParametersConfig {
    /// Namespace root; the stage is appended.
    #[serde(default = "default_path_prefix")]
    pub path_prefix: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Parameter that must be present before the loop starts (queue URL).
    #[serde(default = "default_required_key")]
    pub required_key: String,
    /// Values served by the local parameter store, keyed by full name.
    #[serde(default)]
    pub values: HashMap<String, String>,
}

impl Default for ParametersConfig {
    fn default() -> Self {
        Self {
            path_prefix: default_path_prefix(),
            page_size: default_page_size(),
            required_key: default_required_key(),
            values: HashMap::new(),
        }
    }
}

/// Health/metrics listener. Port 0 disables it.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_port")]
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: default_http_port(),
        }
    }
}

/// Consumer loop restart policy.
#[derive(Debug, Clone, Deserialize)]
pub struct RestartConfig {
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// A run lasting at least this long resets the backoff.
    #[serde(default = "default_stable_after_secs")]
    pub stable_after_secs: u64,
}

impl Default for RestartConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            stable_after_secs: default_stable_after_secs(),
        }
    }
}

/// Signal handling.
#[derive(Debug, Clone, Deserialize)]
pub struct ShutdownConfig {
    /// Delay between a termination signal and process exit.
    #[serde(default = "default_grace_ms")]
    pub grace_ms: u64,
}

impl ShutdownConfig {
    pub fn grace(&self) -> Duration {
        Duration::from_millis(self.grace_ms)
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            grace_ms: default_grace_ms(),
        }
    }
}

/// Local-mode transport configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LocalConfig {
    /// Directory polled for `*.json` raw queue messages.
    #[serde(default = "default_spool_dir")]
    pub spool_dir: String,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            spool_dir: default_spool_dir(),
        }
    }
}
