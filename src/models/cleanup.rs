use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Options for a single cleanup run.
///
/// All fields have conservative defaults; an empty request processes every
/// configured policy with the configured archive behavior, without preview.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CleanupOptions {
    /// Restrict the run to a single action. None processes all configured
    /// policies.
    pub action: Option<String>,
    /// Override the resolved retention period. Only meaningful together
    /// with `action`.
    pub retention_days_override: Option<u32>,
    /// Override the configured archive-before-delete behavior.
    pub archive_before_delete: Option<bool>,
    /// Count matching records without mutating anything.
    #[serde(default)]
    pub preview_only: bool,
}

/// Outcome of processing one retention policy within a run.
///
/// Failures are folded in here rather than propagated: one policy's error
/// must never block cleanup of an unrelated policy.
#[derive(Debug, Clone, Serialize)]
pub struct PolicyOutcome {
    /// The action this policy covers
    pub action: String,
    /// Records older than this were eligible
    pub cutoff: DateTime<Utc>,
    /// Number of records matching the cutoff at the start of processing
    pub matched: u64,
    /// Number of records actually deleted
    pub deleted: u64,
    /// Whether an archive file was written for this batch
    pub archived: bool,
    /// Error that aborted this policy, if any
    pub error: Option<String>,
}

impl PolicyOutcome {
    pub(crate) fn new(action: &str, cutoff: DateTime<Utc>) -> Self {
        Self {
            action: action.to_string(),
            cutoff,
            matched: 0,
            deleted: 0,
            archived: false,
            error: None,
        }
    }
}

/// Result of one cleanup engine execution.
#[derive(Debug, Clone, Serialize)]
pub struct CleanupReport {
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
    /// Whether this was a preview (no mutation occurred)
    pub preview: bool,
    /// Per-policy outcomes, in processing order
    pub policies: Vec<PolicyOutcome>,
    /// Set when total deletions exceeded the alert threshold
    pub large_cleanup: bool,
}

impl CleanupReport {
    /// Total records deleted across all policies.
    pub fn total_deleted(&self) -> u64 {
        self.policies.iter().map(|p| p.deleted).sum()
    }

    /// Total records matched across all policies.
    pub fn total_matched(&self) -> u64 {
        self.policies.iter().map(|p| p.matched).sum()
    }

    /// Whether any policy recorded an error.
    pub fn has_errors(&self) -> bool {
        self.policies.iter().any(|p| p.error.is_some())
    }

    /// Wall-clock duration of the run in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}
