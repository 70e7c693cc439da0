use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An audit log entry recording a trackable action.
///
/// Entries are append-only: once written they are never updated. The one
/// exception is anonymization on a user erasure request, which scrubs the
/// actor reference while keeping the event itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    /// Unique identifier for this entry
    pub id: Uuid,
    /// The user that performed the action (None for system actions or
    /// after anonymization)
    pub user_id: Option<Uuid>,
    /// The action performed (e.g., "BOOK_VIEWED", "user.login")
    pub action: String,
    /// Human-readable description of the event
    pub message: String,
    /// When the action occurred (UTC)
    pub created_at: DateTime<Utc>,
    /// Client IP address, if known
    pub ip_address: Option<String>,
}

/// Input for appending a new audit log entry
#[derive(Debug, Clone)]
pub struct CreateAuditLog {
    /// The user that performed the action (None for system actions)
    pub user_id: Option<Uuid>,
    /// The action performed
    pub action: String,
    /// Human-readable description of the event
    pub message: String,
    /// Client IP address, if known
    pub ip_address: Option<String>,
}

/// Size and distribution report over the audit table.
#[derive(Debug, Clone, Serialize)]
pub struct AuditLogStats {
    /// Total number of entries
    pub total: i64,
    /// Entries written in the last 24 hours
    pub last_24h: i64,
    /// Entries written in the last 7 days
    pub last_7d: i64,
    /// Entries written in the last 30 days
    pub last_30d: i64,
    /// Entry counts per action, most frequent first
    pub by_action: Vec<super::ActionCount>,
    /// Rough on-disk size estimate in bytes, derived from column lengths
    pub estimated_size_bytes: i64,
}
