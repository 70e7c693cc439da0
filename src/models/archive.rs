use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::AuditLog;

/// Number of action counts reported in manifest statistics.
const TOP_ACTIONS: usize = 5;

/// Count of entries for a single action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCount {
    /// The action name
    pub action: String,
    /// Number of entries with that action
    pub count: i64,
}

/// Aggregate statistics over one archived batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveStatistics {
    /// Total entries in the batch
    pub total_logs: u64,
    /// Number of distinct users appearing in the batch
    pub unique_users: u64,
    /// Number of distinct actions appearing in the batch
    pub unique_actions: u64,
    /// The most frequent actions in the batch, descending
    pub top_actions: Vec<ActionCount>,
}

/// Metadata written alongside the records of one archive file.
///
/// The manifest is immutable once written. Archive age purging works from
/// file metadata, not manifest content, so a corrupt manifest never blocks
/// lifecycle management.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveManifest {
    /// The action this archive covers
    pub action: String,
    /// Retention cutoff the batch was selected against
    pub cutoff_date: DateTime<Utc>,
    /// When the archive was written
    pub archive_date: DateTime<Utc>,
    /// Number of records in the archive
    pub log_count: u64,
    /// Aggregate statistics over the batch
    pub statistics: ArchiveStatistics,
}

impl ArchiveManifest {
    /// Build a manifest for a batch of records expiring before `cutoff`.
    pub fn build(
        action: &str,
        cutoff: DateTime<Utc>,
        archived_at: DateTime<Utc>,
        records: &[AuditLog],
    ) -> Self {
        let unique_users = records
            .iter()
            .filter_map(|r| r.user_id)
            .collect::<HashSet<_>>()
            .len() as u64;

        let mut counts: HashMap<&str, i64> = HashMap::new();
        for record in records {
            *counts.entry(record.action.as_str()).or_default() += 1;
        }
        let unique_actions = counts.len() as u64;

        let mut top_actions: Vec<ActionCount> = counts
            .into_iter()
            .map(|(action, count)| ActionCount {
                action: action.to_string(),
                count,
            })
            .collect();
        top_actions.sort_by(|a, b| b.count.cmp(&a.count).then(a.action.cmp(&b.action)));
        top_actions.truncate(TOP_ACTIONS);

        Self {
            action: action.to_string(),
            cutoff_date: cutoff,
            archive_date: archived_at,
            log_count: records.len() as u64,
            statistics: ArchiveStatistics {
                total_logs: records.len() as u64,
                unique_users,
                unique_actions,
                top_actions,
            },
        }
    }
}

/// A single archive file as reported by the lifecycle listing.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveInfo {
    /// File name under the archive directory
    pub name: String,
    /// File size in bytes
    pub size_bytes: u64,
    /// Filesystem modification time
    pub modified: DateTime<Utc>,
    /// Action covered by the archive, when the manifest could be read
    pub action: Option<String>,
    /// Record count, when the manifest could be read
    pub log_count: Option<u64>,
}
