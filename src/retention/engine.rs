use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use super::policy::PolicySnapshot;
use crate::{
    archive::ArchiveWriter,
    config::{ArchiveConfig, RetentionConfig},
    db::AuditLogRepo,
    models::{CleanupOptions, CleanupReport, CreateAuditLog, PolicyOutcome},
};

/// Action under which the engine records its own cleanup runs.
pub const META_AUDIT_ACTION: &str = "retention.cleanup";

#[derive(Debug, Error)]
pub enum EngineError {
    /// The configured number of concurrent runs is already executing. The
    /// caller may retry once a run finishes.
    #[error("cleanup rejected: {limit} concurrent run(s) already executing")]
    Busy { limit: usize },
}

/// Executes cleanup runs against the audit table.
///
/// A run never fails as a whole once admitted: every per-policy failure is
/// folded into that policy's outcome and the remaining policies still run.
/// The only admission failure is [`EngineError::Busy`].
pub struct CleanupEngine {
    repo: Arc<dyn AuditLogRepo>,
    writer: ArchiveWriter,
    retention: RetentionConfig,
    archive: ArchiveConfig,
    permits: Arc<Semaphore>,
}

impl CleanupEngine {
    pub fn new(
        repo: Arc<dyn AuditLogRepo>,
        retention: RetentionConfig,
        archive: ArchiveConfig,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(retention.max_concurrent_tasks));
        let writer = ArchiveWriter::new(archive.clone());
        Self {
            repo,
            writer,
            retention,
            archive,
            permits,
        }
    }

    /// Execute one cleanup run.
    ///
    /// The cancellation token is honored between policies and between
    /// delete batches; an in-flight batch or archive write always completes.
    pub async fn run(
        &self,
        options: CleanupOptions,
        cancel: CancellationToken,
    ) -> Result<CleanupReport, EngineError> {
        let _permit = self
            .permits
            .clone()
            .try_acquire_owned()
            .map_err(|_| EngineError::Busy {
                limit: self.retention.max_concurrent_tasks,
            })?;

        let started_at = Utc::now();
        let snapshot = PolicySnapshot::from_config(&self.retention);

        // Targeted runs cover exactly one action; scheduled and forced runs
        // cover every configured policy.
        let targets: Vec<(String, u32)> = match &options.action {
            Some(action) => {
                let days = options
                    .retention_days_override
                    .unwrap_or_else(|| snapshot.resolve(action));
                vec![(action.clone(), days)]
            }
            None => snapshot.iter().map(|(a, d)| (a.to_string(), d)).collect(),
        };

        let archive_enabled = options
            .archive_before_delete
            .unwrap_or(self.archive.archive_before_delete);

        tracing::info!(
            policies = targets.len(),
            preview = options.preview_only,
            archive = archive_enabled,
            "Starting cleanup run"
        );

        let mut policies = Vec::with_capacity(targets.len());
        for (action, days) in targets {
            if cancel.is_cancelled() {
                tracing::info!(action = %action, "Cleanup cancelled before policy");
                break;
            }

            let outcome = self
                .process_policy(&action, days, archive_enabled, options.preview_only, &cancel)
                .await;
            if let Some(error) = &outcome.error {
                tracing::error!(action = %action, error = %error, "Policy cleanup failed");
            }
            policies.push(outcome);
        }

        let report = CleanupReport {
            started_at,
            finished_at: Utc::now(),
            preview: options.preview_only,
            large_cleanup: self.retention.alert_on_large_cleanup
                && policies.iter().map(|p| p.deleted).sum::<u64>()
                    > self.retention.large_cleanup_threshold,
            policies,
        };

        if !report.preview && report.total_deleted() > 0 {
            self.record_meta_audit(&report).await;
        }
        if report.large_cleanup {
            tracing::warn!(
                deleted = report.total_deleted(),
                threshold = self.retention.large_cleanup_threshold,
                "Large cleanup detected"
            );
        }

        tracing::info!(
            matched = report.total_matched(),
            deleted = report.total_deleted(),
            duration_ms = report.duration_ms(),
            errors = report.has_errors(),
            "Cleanup run finished"
        );

        Ok(report)
    }

    async fn process_policy(
        &self,
        action: &str,
        days: u32,
        archive_enabled: bool,
        preview: bool,
        cancel: &CancellationToken,
    ) -> PolicyOutcome {
        let cutoff = Utc::now() - Duration::days(i64::from(days));
        let mut outcome = PolicyOutcome::new(action, cutoff);

        outcome.matched = match self.repo.count_expired(action, cutoff).await {
            Ok(count) => count,
            Err(e) => {
                outcome.error = Some(e.to_string());
                return outcome;
            }
        };

        if preview || outcome.matched == 0 {
            return outcome;
        }

        if archive_enabled {
            match self.archive_batch(action, cutoff).await {
                Ok(()) => outcome.archived = true,
                Err(message) => {
                    // An unarchived batch must never be deleted
                    outcome.error = Some(message);
                    return outcome;
                }
            }
        }

        let batch_size = self.retention.batch_size;
        loop {
            if cancel.is_cancelled() {
                tracing::info!(action = %action, deleted = outcome.deleted, "Cleanup cancelled mid-policy");
                break;
            }
            match self.repo.delete_expired_batch(action, cutoff, batch_size).await {
                Ok(deleted) => {
                    outcome.deleted += deleted;
                    if deleted < u64::from(batch_size) {
                        break;
                    }
                }
                Err(e) => {
                    outcome.error = Some(e.to_string());
                    break;
                }
            }
        }

        outcome
    }

    /// Fetch the expiring batch and write it to an archive file. The write
    /// is synchronous I/O, so it runs on the blocking pool.
    async fn archive_batch(&self, action: &str, cutoff: DateTime<Utc>) -> Result<(), String> {
        let records = self
            .repo
            .fetch_expired(action, cutoff)
            .await
            .map_err(|e| format!("failed to fetch batch for archiving: {e}"))?;

        let writer = self.writer.clone();
        let action = action.to_string();
        let result =
            tokio::task::spawn_blocking(move || writer.write(&action, &records, cutoff)).await;

        match result {
            Ok(Ok(_path)) => Ok(()),
            Ok(Err(e)) => Err(format!("archive write failed: {e}")),
            Err(e) => Err(format!("archive task panicked: {e}")),
        }
    }

    /// Record the run itself in the audit table. Failure here is logged,
    /// not propagated; the cleanup already happened.
    async fn record_meta_audit(&self, report: &CleanupReport) {
        let breakdown: serde_json::Map<String, serde_json::Value> = report
            .policies
            .iter()
            .filter(|p| p.deleted > 0)
            .map(|p| (p.action.clone(), serde_json::json!(p.deleted)))
            .collect();
        let message = serde_json::json!({
            "total_deleted": report.total_deleted(),
            "duration_ms": report.duration_ms(),
            "deleted_by_action": breakdown,
        })
        .to_string();

        let result = self
            .repo
            .create(CreateAuditLog {
                user_id: None,
                action: META_AUDIT_ACTION.to_string(),
                message,
                ip_address: None,
            })
            .await;
        if let Err(e) = result {
            tracing::error!(error = %e, "Failed to record cleanup audit entry");
        }
    }
}
