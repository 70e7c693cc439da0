//! Audit log administration.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::routes::{AppState, error::AdminError};

#[derive(Deserialize)]
pub struct AnonymizeRequest {
    pub user_id: Uuid,
}

#[derive(Serialize)]
pub struct AnonymizeResponse {
    pub anonymized: u64,
}

/// POST /admin/v1/audit-logs/anonymize
///
/// Scrub a user's identity from their audit trail while keeping the
/// events. Used to honor erasure requests without losing the audit record.
pub async fn anonymize_user(
    State(state): State<AppState>,
    Json(request): Json<AnonymizeRequest>,
) -> Result<Json<AnonymizeResponse>, AdminError> {
    let anonymized = state.db.audit_logs().anonymize_user(request.user_id).await?;
    tracing::info!(rows = anonymized, "Anonymized audit trail for user");
    Ok(Json(AnonymizeResponse { anonymized }))
}
