//! Archive lifecycle endpoints: list, download, purge.

use axum::{
    Json,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use chrono::{Duration, Utc};
use serde::Serialize;

use crate::{
    archive::ArchiveStore,
    models::ArchiveInfo,
    routes::{AppState, error::AdminError},
};

#[derive(Serialize)]
pub struct PurgeResponse {
    pub removed: u64,
}

/// GET /admin/v1/archives
pub async fn list_archives(
    State(state): State<AppState>,
) -> Result<Json<Vec<ArchiveInfo>>, AdminError> {
    let archives = state.archives.list()?;
    Ok(Json(archives))
}

/// GET /admin/v1/archives/{name}
///
/// The name is validated against the writer's naming convention before any
/// filesystem access; anything else is a 400.
pub async fn download_archive(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, AdminError> {
    let bytes = state.archives.read(&name)?;
    let content_type = ArchiveStore::content_type(&name);

    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{name}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// POST /admin/v1/archives/purge
///
/// Delete archive files older than the configured archive retention.
pub async fn purge_archives(
    State(state): State<AppState>,
) -> Result<Json<PurgeResponse>, AdminError> {
    let cutoff = Utc::now() - Duration::days(i64::from(state.archive.retention_days));
    let removed = state.archives.purge_older_than(cutoff)?;
    Ok(Json(PurgeResponse { removed }))
}
