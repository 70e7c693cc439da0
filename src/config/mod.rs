//! Configuration module for the retention service.
//!
//! The service is configured via a TOML file, with support for environment
//! variable interpolation using `${VAR_NAME}` syntax.
//!
//! # Example
//!
//! ```toml
//! [database]
//! path = "tabularium.db"
//!
//! [retention]
//! enabled = true
//! interval_hours = 24
//!
//! [retention.policies]
//! BOOK_VIEWED = 30
//! USER_LOGIN = 90
//!
//! [archive]
//! archive_before_delete = true
//! path = "${ARCHIVE_DIR}"
//! ```

mod archive;
mod database;
mod observability;
mod retention;
mod server;

use std::path::Path;

pub use archive::*;
pub use database::*;
pub use observability::*;
pub use retention::*;
use serde::{Deserialize, Serialize};
pub use server::*;
use thiserror::Error;

/// Root configuration for the retention service.
///
/// All sections are optional with sensible defaults, allowing minimal
/// configuration for simple deployments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database holding the audit table.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Retention policies and cleanup scheduling.
    #[serde(default)]
    pub retention: RetentionConfig,

    /// Archive export and lifecycle settings.
    #[serde(default)]
    pub archive: ArchiveConfig,
}

/// Errors produced while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl Config {
    /// Load configuration from a TOML file, interpolating `${VAR}`
    /// references from the environment.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let interpolated = interpolate_env(&raw);
        let config: Config = toml::from_str(&interpolated)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.retention.validate().map_err(ConfigError::Invalid)?;
        self.archive.validate().map_err(ConfigError::Invalid)?;
        Ok(())
    }
}

static ENV_VAR: std::sync::LazyLock<regex::Regex> = std::sync::LazyLock::new(|| {
    regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
        .unwrap_or_else(|e| unreachable!("invalid env var pattern: {e}"))
});

/// Replace `${VAR}` references with environment variable values.
/// Unset variables are replaced with an empty string.
fn interpolate_env(raw: &str) -> String {
    ENV_VAR.replace_all(raw, |caps: &regex::Captures<'_>| {
        std::env::var(&caps[1]).unwrap_or_default()
    })
    .into_owned()
}
