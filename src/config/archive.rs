//! Archive export configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Serialization format for archive files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveFormat {
    /// Manifest followed by the record array in one JSON document
    #[default]
    Json,
    /// Fixed-header CSV, one row per record
    Csv,
}

impl ArchiveFormat {
    /// File extension for this format, without compression suffix.
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::Json => "json",
            ArchiveFormat::Csv => "csv",
        }
    }
}

/// Archive export and lifecycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArchiveConfig {
    /// Archive each expiring batch before deleting it. A failed archive
    /// write blocks deletion of that batch.
    /// Default: false
    #[serde(default)]
    pub archive_before_delete: bool,

    /// Directory archive files are written to.
    /// Default: archives
    #[serde(default = "default_path")]
    pub path: PathBuf,

    /// Serialization format.
    /// Default: json
    #[serde(default)]
    pub format: ArchiveFormat,

    /// Gzip-compress archive files.
    /// Default: false
    #[serde(default)]
    pub compress: bool,

    /// Days to keep archive files before age purging removes them.
    /// Default: 365
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    /// Purge old archives automatically after each scheduled run.
    /// Default: false
    #[serde(default)]
    pub auto_cleanup: bool,

    /// Maximum size of a single archive file in megabytes. Larger batches
    /// fail the write (and therefore block deletion).
    /// Default: 100
    #[serde(default = "default_max_size_mb")]
    pub max_size_mb: u64,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            archive_before_delete: false,
            path: default_path(),
            format: ArchiveFormat::default(),
            compress: false,
            retention_days: default_retention_days(),
            auto_cleanup: false,
            max_size_mb: default_max_size_mb(),
        }
    }
}

impl ArchiveConfig {
    /// Maximum archive size in bytes.
    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_mb * 1024 * 1024
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_size_mb == 0 {
            return Err("archive.max_size_mb must be positive".to_string());
        }
        if self.retention_days == 0 {
            return Err("archive.retention_days must be positive".to_string());
        }
        Ok(())
    }
}

fn default_path() -> PathBuf {
    PathBuf::from("archives")
}

fn default_retention_days() -> u32 {
    365
}

fn default_max_size_mb() -> u64 {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ArchiveConfig::default();
        assert!(!config.archive_before_delete);
        assert_eq!(config.format, ArchiveFormat::Json);
        assert!(!config.compress);
        assert_eq!(config.max_size_bytes(), 100 * 1024 * 1024);
        config.validate().unwrap();
    }

    #[test]
    fn format_parses_lowercase() {
        let config: ArchiveConfig = toml::from_str("format = \"csv\"").unwrap();
        assert_eq!(config.format, ArchiveFormat::Csv);
        assert_eq!(config.format.extension(), "csv");
    }

    #[test]
    fn validate_rejects_zero_max_size() {
        let config = ArchiveConfig {
            max_size_mb: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
