use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio_util::sync::CancellationToken;

use super::engine::{CleanupEngine, EngineError};
use crate::{
    archive::ArchiveStore,
    config::{ArchiveConfig, RetentionConfig},
    models::CleanupOptions,
};

/// The scheduler is either waiting for the next tick or executing a run.
/// Cancellation is only observed while Idle or between an engine run's
/// policies, never mid-batch.
enum SchedulerState {
    Idle,
    Running,
}

/// Drives periodic cleanup runs against the engine.
pub struct CleanupScheduler {
    engine: Arc<CleanupEngine>,
    archives: Arc<ArchiveStore>,
    retention: RetentionConfig,
    archive: ArchiveConfig,
    interval: std::time::Duration,
}

impl CleanupScheduler {
    pub fn new(
        engine: Arc<CleanupEngine>,
        archives: Arc<ArchiveStore>,
        retention: RetentionConfig,
        archive: ArchiveConfig,
    ) -> Self {
        let interval = retention.interval();
        Self {
            engine,
            archives,
            retention,
            archive,
            interval,
        }
    }

    #[cfg(test)]
    fn with_interval(mut self, interval: std::time::Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run until cancelled. Returns immediately when scheduled cleanup is
    /// disabled or no policies are configured.
    pub async fn run(self, cancel: CancellationToken) {
        if !self.retention.enabled {
            tracing::info!("Scheduled cleanup is disabled");
            return;
        }
        if self.retention.policies.is_empty() {
            tracing::info!("Scheduled cleanup enabled but no policies configured");
            return;
        }

        tracing::info!(
            interval_hours = self.retention.interval_hours,
            policies = self.retention.policies.len(),
            "Starting cleanup scheduler"
        );

        let mut state = SchedulerState::Idle;
        loop {
            match state {
                SchedulerState::Idle => {
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            tracing::info!("Cleanup scheduler shutting down");
                            break;
                        }
                        _ = tokio::time::sleep(self.interval) => {
                            state = SchedulerState::Running;
                        }
                    }
                }
                SchedulerState::Running => {
                    self.run_once(&cancel).await;
                    state = SchedulerState::Idle;
                }
            }
        }
    }

    /// One scheduled cycle. Never panics the loop: a busy engine skips the
    /// cycle and any per-policy failure is already folded into the report.
    async fn run_once(&self, cancel: &CancellationToken) {
        match self
            .engine
            .run(CleanupOptions::default(), cancel.clone())
            .await
        {
            Ok(report) => {
                if report.total_deleted() > 0 {
                    tracing::info!(
                        deleted = report.total_deleted(),
                        duration_ms = report.duration_ms(),
                        "Scheduled cleanup deleted records"
                    );
                } else {
                    tracing::debug!("Scheduled cleanup found nothing to delete");
                }
                if report.has_errors() {
                    tracing::warn!("Scheduled cleanup completed with policy errors");
                }
                if self.archive.auto_cleanup && !cancel.is_cancelled() {
                    self.purge_expired_archives();
                }
            }
            Err(EngineError::Busy { limit }) => {
                tracing::warn!(limit = limit, "Cleanup already running, skipping cycle");
            }
        }
    }

    fn purge_expired_archives(&self) {
        let cutoff = Utc::now() - Duration::days(i64::from(self.archive.retention_days));
        match self.archives.purge_older_than(cutoff) {
            Ok(0) => {}
            Ok(removed) => {
                tracing::info!(removed = removed, "Purged expired archives");
            }
            Err(e) => {
                tracing::error!(error = %e, "Archive purge failed");
            }
        }
    }
}
