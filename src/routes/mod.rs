//! HTTP control surface.
//!
//! All retention and archive management goes through the admin API; there
//! is no public write path into the audit table over HTTP.

pub mod admin;
mod error;
mod health;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use error::AdminError;

use crate::{
    archive::ArchiveStore,
    config::{ArchiveConfig, RetentionConfig},
    db::DbPool,
    retention::CleanupEngine,
};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub engine: Arc<CleanupEngine>,
    pub archives: Arc<ArchiveStore>,
    pub retention: RetentionConfig,
    pub archive: ArchiveConfig,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/admin/v1/retention/cleanup",
            post(admin::retention::trigger_cleanup),
        )
        .route("/admin/v1/retention/run", post(admin::retention::force_run))
        .route(
            "/admin/v1/retention/config",
            get(admin::retention::get_config),
        )
        .route("/admin/v1/retention/stats", get(admin::retention::get_stats))
        .route("/admin/v1/archives", get(admin::archives::list_archives))
        .route(
            "/admin/v1/archives/purge",
            post(admin::archives::purge_archives),
        )
        .route(
            "/admin/v1/archives/{name}",
            get(admin::archives::download_archive),
        )
        .route(
            "/admin/v1/audit-logs/anonymize",
            post(admin::audit_logs::anonymize_user),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
