use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};

use super::AppState;

/// Liveness plus a database connectivity probe.
pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    match state.db.health_check().await {
        Ok(()) => Ok(Json(json!({ "status": "ok" }))),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}
