//! Service configuration file
//!
//! A single JSON object. Every field has a default, so `{}` is a valid
//! configuration that serves from memory on port 8080.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::errors::{CliError, CliResult};
use crate::http_server::HttpServerConfig;

/// Longest accepted record TTL: ten years.
pub const MAX_RECORD_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Directory holding the record log (file backend only)
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            data_dir: default_data_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub http: HttpServerConfig,

    #[serde(default)]
    pub store: StoreConfig,

    /// Expiry applied to every record written, in seconds. 0 disables expiry.
    #[serde(default = "default_record_ttl_secs")]
    pub record_ttl_secs: u64,

    /// Seconds between sweeps that reclaim expired records. 0 disables sweeping.
    #[serde(default = "default_purge_interval_secs")]
    pub purge_interval_secs: u64,

    #[serde(default = "default_queue_name")]
    pub queue_name: String,

    /// Per-subscriber buffer size of the projection queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    #[serde(default = "default_index_name")]
    pub index_name: String,
}

fn default_data_dir() -> String {
    "./plandb-data".to_string()
}
fn default_record_ttl_secs() -> u64 {
    5 * 60 * 60
}
fn default_purge_interval_secs() -> u64 {
    60
}
fn default_queue_name() -> String {
    "plan_queue".to_string()
}
fn default_queue_capacity() -> usize {
    1024
}
fn default_index_name() -> String {
    "plans".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http: HttpServerConfig::default(),
            store: StoreConfig::default(),
            record_ttl_secs: default_record_ttl_secs(),
            purge_interval_secs: default_purge_interval_secs(),
            queue_name: default_queue_name(),
            queue_capacity: default_queue_capacity(),
            index_name: default_index_name(),
        }
    }
}

impl Config {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CliError::config_error(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> CliResult<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CliResult<()> {
        if self.queue_capacity == 0 {
            return Err(CliError::config_error("queue_capacity must be > 0"));
        }
        if self.record_ttl_secs > MAX_RECORD_TTL_SECS {
            return Err(CliError::config_error(format!(
                "record_ttl_secs must be at most {}",
                MAX_RECORD_TTL_SECS
            )));
        }
        if self.queue_name.trim().is_empty() {
            return Err(CliError::config_error("queue_name must not be empty"));
        }
        if self.index_name.trim().is_empty() {
            return Err(CliError::config_error("index_name must not be empty"));
        }
        if self.store.backend == StoreBackend::File && self.store.data_dir.trim().is_empty() {
            return Err(CliError::config_error(
                "store.data_dir is required for the file backend",
            ));
        }
        Ok(())
    }

    /// Record TTL, or `None` when expiry is disabled.
    pub fn record_ttl(&self) -> Option<Duration> {
        match self.record_ttl_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Expiry sweep period, or `None` when nothing expires or sweeping is off.
    pub fn purge_interval(&self) -> Option<Duration> {
        match (self.record_ttl(), self.purge_interval_secs) {
            (None, _) | (_, 0) => None,
            (Some(_), secs) => Some(Duration::from_secs(secs)),
        }
    }

    pub fn data_path(&self) -> &Path {
        Path::new(&self.store.data_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = Config::parse("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.http.port, 8080);
        assert_eq!(config.record_ttl(), Some(Duration::from_secs(18000)));
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.purge_interval(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_flattened_http_fields() {
        let config = Config::parse(
            r#"{"port": 9000, "store": {"backend": "file", "data_dir": "/var/lib/plandb"}, "record_ttl_secs": 0}"#,
        )
        .unwrap();
        assert_eq!(config.http.port, 9000);
        assert_eq!(config.store.backend, StoreBackend::File);
        assert_eq!(config.data_path(), Path::new("/var/lib/plandb"));
        assert_eq!(config.record_ttl(), None);
        assert_eq!(config.purge_interval(), None);
    }

    #[test]
    fn test_record_ttl_bounded() {
        let at_limit = format!(r#"{{"record_ttl_secs": {}}}"#, MAX_RECORD_TTL_SECS);
        assert!(Config::parse(&at_limit).is_ok());

        let huge = format!(r#"{{"record_ttl_secs": {}}}"#, u64::MAX);
        let err = Config::parse(&huge).unwrap_err();
        assert_eq!(err.code(), &crate::cli::CliErrorCode::ConfigError);
    }

    #[test]
    fn test_validation_failures() {
        for body in [
            r#"{"queue_capacity": 0}"#,
            r#"{"queue_name": " "}"#,
            r#"{"index_name": ""}"#,
            r#"{"store": {"backend": "file", "data_dir": ""}}"#,
            r#"{"store": {"backend": "redis"}}"#,
        ] {
            let err = Config::parse(body).unwrap_err();
            assert_eq!(err.code(), &crate::cli::CliErrorCode::ConfigError, "{}", body);
        }
    }

    #[test]
    fn test_default_roundtrips_through_json() {
        let text = serde_json::to_string_pretty(&Config::default()).unwrap();
        assert_eq!(Config::parse(&text).unwrap(), Config::default());
    }
}
