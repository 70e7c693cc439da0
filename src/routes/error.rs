use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::{archive::ArchiveError, db::DbError, retention::EngineError};

/// Errors surfaced by the admin API, mapped onto HTTP status codes.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    /// A cleanup run was rejected because the concurrency limit is
    /// reached. Retryable.
    #[error("{0}")]
    Busy(String),

    #[error("database error: {0}")]
    Database(#[from] DbError),

    #[error("archive error: {0}")]
    Archive(ArchiveError),
}

impl From<ArchiveError> for AdminError {
    fn from(e: ArchiveError) -> Self {
        match e {
            ArchiveError::InvalidName(name) => {
                AdminError::Validation(format!("invalid archive name: {name}"))
            }
            ArchiveError::NotFound(name) => {
                AdminError::NotFound(format!("archive not found: {name}"))
            }
            other => AdminError::Archive(other),
        }
    }
}

impl From<EngineError> for AdminError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Busy { .. } => AdminError::Busy(e.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AdminError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AdminError::Validation(_) => (StatusCode::BAD_REQUEST, "validation"),
            AdminError::Busy(_) => (StatusCode::TOO_MANY_REQUESTS, "busy"),
            AdminError::Database(_) | AdminError::Archive(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Admin request failed");
        }

        let body = ErrorBody {
            code,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
