//! # Exporter Configuration
//!
//! Layered configuration built with the `config` crate:
//!
//! 1. compiled-in defaults (`Default` impls below)
//! 2. an optional TOML file (`zabbix-export.toml` in the working directory,
//!    or an explicit path)
//! 3. environment variables prefixed `ZABBIX_EXPORT__`, using `__` between
//!    section and key, e.g. `ZABBIX_EXPORT__SERVER__AUTH_TOKEN`
//!
//! ```toml
//! [server]
//! url = "http://zabbix.example.local"
//! auth_token = "..."
//!
//! [export]
//! export_dir = "./export"
//! worker_count = 4
//! ```

use chrono::FixedOffset;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default file name looked up (without extension) when no path is given
pub const DEFAULT_CONFIG_NAME: &str = "zabbix-export";
pub const ENV_PREFIX: &str = "ZABBIX_EXPORT";

pub type ConfigResult<T> = Result<T, ConfigurationError>;

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigurationError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ExporterConfig {
    pub server: ServerConfig,
    pub export: ExportConfig,
    pub archive: ArchiveConfig,
    pub logging: LoggingConfig,
}

/// Monitoring server connection settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the Zabbix frontend, e.g. `http://localhost`
    pub url: String,
    /// Path of the JSON-RPC endpoint below `url`
    pub api_path: String,
    /// API token sent in the `auth` member of every request
    pub auth_token: String,
    /// Per-request transport timeout
    pub timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost".to_string(),
            api_path: "/api_jsonrpc.php".to_string(),
            auth_token: String::new(),
            timeout_ms: 30_000,
        }
    }
}

impl ServerConfig {
    /// Full JSON-RPC endpoint URL
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.url.trim_end_matches('/'),
            self.api_path.trim_start_matches('/')
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory receiving `<label>/` trees and the final archives
    pub export_dir: PathBuf,
    /// Number of hosts exported concurrently
    pub worker_count: usize,
    /// Fixed offset used for window boundaries and rendered clocks
    pub utc_offset_hours: i32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            export_dir: PathBuf::from("./export"),
            worker_count: 4,
            utc_offset_hours: 9,
        }
    }
}

impl ExportConfig {
    pub fn utc_offset(&self) -> ConfigResult<FixedOffset> {
        if !(-23..=23).contains(&self.utc_offset_hours) {
            return Err(ConfigurationError::invalid(
                "export.utc_offset_hours",
                format!("{} is outside -23..=23", self.utc_offset_hours),
            ));
        }
        FixedOffset::east_opt(self.utc_offset_hours * 3600).ok_or_else(|| {
            ConfigurationError::invalid(
                "export.utc_offset_hours",
                format!("{} is not a valid offset", self.utc_offset_hours),
            )
        })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Compress the run directory into a zip and remove the tree afterwards
    pub enabled: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    pub file_enabled: bool,
    pub directory: PathBuf,
    pub file_prefix: String,
    /// Daily log files kept on disk; older ones are deleted on rotation
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_enabled: true,
            directory: PathBuf::from("log"),
            file_prefix: "zabbix_export.log".to_string(),
            max_files: 4,
        }
    }
}

impl ExporterConfig {
    /// Load from the default file name (optional) and the environment
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(None)
    }

    /// Load with an explicit file, which must exist when given
    pub fn load_from(path: Option<&Path>) -> ConfigResult<Self> {
        let file_source = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        let config: Self = Config::builder()
            .add_source(file_source)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;

        debug!(
            endpoint = %config.server.endpoint(),
            worker_count = config.export.worker_count,
            export_dir = %config.export.export_dir.display(),
            "Configuration loaded"
        );

        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.server.url.trim().is_empty() {
            return Err(ConfigurationError::invalid("server.url", "must not be empty"));
        }
        if self.export.worker_count == 0 {
            return Err(ConfigurationError::invalid(
                "export.worker_count",
                "must be at least 1",
            ));
        }
        if self.logging.max_files == 0 {
            return Err(ConfigurationError::invalid(
                "logging.max_files",
                "must be at least 1",
            ));
        }
        self.export.utc_offset()?;
        Ok(())
    }
}
