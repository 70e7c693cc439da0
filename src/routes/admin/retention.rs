//! Retention control endpoints: trigger runs, inspect configuration and
//! table statistics.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::{
    config::{ArchiveConfig, RetentionConfig},
    models::{AuditLogStats, CleanupOptions, CleanupReport, PolicyOutcome},
    routes::{AppState, error::AdminError},
};

/// Wire shape of a completed cleanup run.
#[derive(Serialize)]
pub struct CleanupResponse {
    pub started_at: DateTime<Utc>,
    pub is_preview: bool,
    pub total_matched: u64,
    pub total_deleted: u64,
    pub duration_ms: i64,
    pub large_cleanup: bool,
    pub policies: Vec<PolicyOutcome>,
}

impl From<CleanupReport> for CleanupResponse {
    fn from(report: CleanupReport) -> Self {
        Self {
            started_at: report.started_at,
            is_preview: report.preview,
            total_matched: report.total_matched(),
            total_deleted: report.total_deleted(),
            duration_ms: report.duration_ms(),
            large_cleanup: report.large_cleanup,
            policies: report.policies,
        }
    }
}

#[derive(Serialize)]
pub struct ConfigResponse {
    pub retention: RetentionConfig,
    pub archive: ArchiveConfig,
}

/// POST /admin/v1/retention/cleanup
///
/// Run cleanup with caller-supplied options: targeted action, retention
/// override, archive override, or preview.
pub async fn trigger_cleanup(
    State(state): State<AppState>,
    Json(options): Json<CleanupOptions>,
) -> Result<Json<CleanupResponse>, AdminError> {
    if options.retention_days_override.is_some() && options.action.is_none() {
        return Err(AdminError::Validation(
            "retention_days_override requires an action".to_string(),
        ));
    }

    let report = state.engine.run(options, CancellationToken::new()).await?;
    Ok(Json(report.into()))
}

/// POST /admin/v1/retention/run
///
/// Force an immediate full run over every configured policy, equivalent to
/// a scheduled cycle.
pub async fn force_run(
    State(state): State<AppState>,
) -> Result<Json<CleanupResponse>, AdminError> {
    let report = state
        .engine
        .run(CleanupOptions::default(), CancellationToken::new())
        .await?;
    Ok(Json(report.into()))
}

/// GET /admin/v1/retention/config
pub async fn get_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        retention: state.retention.clone(),
        archive: state.archive.clone(),
    })
}

/// GET /admin/v1/retention/stats
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<AuditLogStats>, AdminError> {
    let stats = state.db.audit_logs().stats().await?;
    Ok(Json(stats))
}
