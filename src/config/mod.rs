// ABOUTME: Configuration types and parsing for kahu.yml.
// ABOUTME: Handles YAML parsing, endpoint resolution, and interval validation.

mod deserialize;
mod env_value;
mod init;
mod polling;
mod stream;

pub use env_value::EnvValue;
pub use init::{DEFAULT_ENDPOINT, init_config};
pub use polling::{OptimisticConfig, PollingConfig};
pub use stream::StreamConfig;

use crate::error::{Error, Result};
use crate::types::ResourceKind;
use deserialize::deserialize_resource_kind;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "kahu.yml";
pub const CONFIG_FILENAME_ALT: &str = "kahu.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".kahu/config.yml";

/// Overrides `endpoint` when set.
pub const ENDPOINT_ENV_VAR: &str = "KAHU_ENDPOINT";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub endpoint: EnvValue,

    #[serde(
        default = "ResourceKind::default",
        deserialize_with = "deserialize_resource_kind"
    )]
    pub resource: ResourceKind,

    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    #[serde(default)]
    pub polling: PollingConfig,

    #[serde(default)]
    pub optimistic: OptimisticConfig,

    #[serde(default)]
    pub stream: StreamConfig,
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Config with default policy talking to `endpoint`.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Config {
            endpoint: EnvValue::Literal(endpoint.into()),
            resource: ResourceKind::default(),
            request_timeout: default_request_timeout(),
            polling: PollingConfig::default(),
            optimistic: OptimisticConfig::default(),
            stream: StreamConfig::default(),
        }
    }

    /// Resolve the server base URL, honoring `KAHU_ENDPOINT`.
    pub fn endpoint(&self) -> Result<String> {
        let raw = match std::env::var(ENDPOINT_ENV_VAR) {
            Ok(value) if !value.trim().is_empty() => value,
            _ => self.endpoint.resolve()?,
        };
        let trimmed = raw.trim().trim_end_matches('/');
        if !trimmed.starts_with("http://") {
            return Err(Error::InvalidConfig(format!(
                "endpoint must be an http:// URL: {trimmed}"
            )));
        }
        Ok(trimmed.to_string())
    }

    fn validate(&self) -> Result<()> {
        let polling = &self.polling;
        let intervals = [
            ("polling.fast_interval", polling.fast_interval),
            ("polling.list_fast_interval", polling.list_fast_interval),
            ("polling.slow_interval", polling.slow_interval),
            ("polling.provisioning_interval", polling.provisioning_interval),
            ("optimistic.timeout", self.optimistic.timeout),
            ("request_timeout", self.request_timeout),
            ("stream.initial_backoff", self.stream.initial_backoff),
        ];
        for (name, value) in intervals {
            if value.is_zero() {
                return Err(Error::InvalidConfig(format!("{name} must be greater than zero")));
            }
        }

        if polling.fast_interval > polling.slow_interval {
            return Err(Error::InvalidConfig(
                "polling.fast_interval cannot exceed polling.slow_interval".to_string(),
            ));
        }

        if self.stream.max_backoff < self.stream.initial_backoff {
            return Err(Error::InvalidConfig(
                "stream.max_backoff cannot be less than stream.initial_backoff".to_string(),
            ));
        }

        Ok(())
    }
}
