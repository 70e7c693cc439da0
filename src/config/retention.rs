//! Retention policy configuration.
//!
//! Controls which audit actions are purged, how old they must be, and how
//! the cleanup scheduler behaves.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Retention policies and cleanup scheduling.
///
/// When enabled, a background scheduler periodically deletes audit records
/// older than their resolved retention period, optionally archiving them
/// first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetentionConfig {
    /// Whether scheduled cleanup is enabled.
    /// Default: false (must be explicitly enabled)
    #[serde(default)]
    pub enabled: bool,

    /// How often the scheduler runs (in hours).
    /// Default: 24 (once per day)
    #[serde(default = "default_interval_hours")]
    pub interval_hours: u64,

    /// Retention period per action, in days. Must be positive.
    /// Actions without an entry use `default_retention_days`.
    #[serde(default)]
    pub policies: BTreeMap<String, u32>,

    /// Retention period for actions without an explicit policy, in days.
    /// Default: 365
    #[serde(default = "default_retention_days")]
    pub default_retention_days: u32,

    /// Batch size for delete operations. Records are deleted in batches
    /// to cap transaction duration.
    /// Default: 1000
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Maximum number of cleanup runs (scheduled or forced) that may
    /// execute simultaneously. Runs beyond this are rejected.
    /// Default: 1
    #[serde(default = "default_max_concurrent_tasks")]
    pub max_concurrent_tasks: usize,

    /// Flag runs that delete more than `large_cleanup_threshold` records.
    /// Default: true
    #[serde(default = "default_alert_on_large_cleanup")]
    pub alert_on_large_cleanup: bool,

    /// Deletion count above which a run is flagged for alerting.
    /// Default: 10000
    #[serde(default = "default_large_cleanup_threshold")]
    pub large_cleanup_threshold: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_hours: default_interval_hours(),
            policies: BTreeMap::new(),
            default_retention_days: default_retention_days(),
            batch_size: default_batch_size(),
            max_concurrent_tasks: default_max_concurrent_tasks(),
            alert_on_large_cleanup: default_alert_on_large_cleanup(),
            large_cleanup_threshold: default_large_cleanup_threshold(),
        }
    }
}

impl RetentionConfig {
    /// The scheduler interval as a Duration.
    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.interval_hours * 3600)
    }

    /// Reject non-positive retention periods and degenerate limits.
    pub fn validate(&self) -> Result<(), String> {
        if self.default_retention_days == 0 {
            return Err("retention.default_retention_days must be positive".to_string());
        }
        for (action, days) in &self.policies {
            if *days == 0 {
                return Err(format!(
                    "retention.policies.{action} must be positive, got 0"
                ));
            }
        }
        if self.batch_size == 0 {
            return Err("retention.batch_size must be positive".to_string());
        }
        if self.max_concurrent_tasks == 0 {
            return Err("retention.max_concurrent_tasks must be positive".to_string());
        }
        Ok(())
    }
}

fn default_interval_hours() -> u64 {
    24
}

fn default_retention_days() -> u32 {
    365
}

fn default_batch_size() -> u32 {
    1000
}

fn default_max_concurrent_tasks() -> usize {
    1
}

fn default_alert_on_large_cleanup() -> bool {
    true
}

fn default_large_cleanup_threshold() -> u64 {
    10_000
}
