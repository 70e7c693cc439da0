use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    db::error::DbResult,
    models::{AuditLog, AuditLogStats, CreateAuditLog},
};

/// Storage access for the audit table.
///
/// The retention engine is the only component that deletes through this
/// trait; everything else in the system appends.
#[async_trait]
pub trait AuditLogRepo: Send + Sync {
    /// Append a new audit log entry.
    async fn create(&self, input: CreateAuditLog) -> DbResult<AuditLog>;

    /// Count entries for `action` created before `cutoff`.
    async fn count_expired(&self, action: &str, cutoff: DateTime<Utc>) -> DbResult<u64>;

    /// Fetch all entries for `action` created before `cutoff`, oldest
    /// first. Used to build the archive batch prior to deletion.
    async fn fetch_expired(&self, action: &str, cutoff: DateTime<Utc>)
    -> DbResult<Vec<AuditLog>>;

    /// Delete at most `limit` entries for `action` created before `cutoff`.
    ///
    /// Returns the number of rows deleted. Callers loop until a batch comes
    /// back short, so cancellation can be honored between batches.
    async fn delete_expired_batch(
        &self,
        action: &str,
        cutoff: DateTime<Utc>,
        limit: u32,
    ) -> DbResult<u64>;

    /// Scrub a user's identity from their audit trail: nulls `user_id` and
    /// clears `ip_address` while keeping the events. Returns the number of
    /// rows touched.
    async fn anonymize_user(&self, user_id: Uuid) -> DbResult<u64>;

    /// Size and distribution report over the whole table.
    async fn stats(&self) -> DbResult<AuditLogStats>;
}
