mod error;
pub mod repos;
pub mod sqlite;

use std::sync::Arc;

pub use error::{DbError, DbResult};
pub use repos::AuditLogRepo;

use crate::config::DatabaseConfig;

/// Database pool plus the repository built over it.
///
/// The repository is cached at construction time to avoid allocation on
/// each access.
pub struct DbPool {
    pool: sqlx::SqlitePool,
    audit_logs: Arc<dyn AuditLogRepo>,
}

impl DbPool {
    /// Create a DbPool from an existing SQLite pool.
    /// Primarily useful for testing.
    pub fn from_sqlite(pool: sqlx::SqlitePool) -> Self {
        let audit_logs = Arc::new(sqlite::SqliteAuditLogRepo::new(pool.clone()));
        DbPool { pool, audit_logs }
    }

    /// Create a database pool from configuration.
    pub async fn from_config(config: &DatabaseConfig) -> DbResult<Self> {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(
                sqlx::sqlite::SqliteConnectOptions::new()
                    .filename(&config.path)
                    .create_if_missing(config.create_if_missing)
                    .journal_mode(if config.wal_mode {
                        sqlx::sqlite::SqliteJournalMode::Wal
                    } else {
                        sqlx::sqlite::SqliteJournalMode::Delete
                    })
                    .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms)),
            )
            .await?;

        Ok(Self::from_sqlite(pool))
    }

    /// Run database migrations using sqlx's migration runner.
    pub async fn run_migrations(&self) -> DbResult<()> {
        tracing::info!("Running SQLite migrations");
        sqlx::migrate!("./migrations_sqlx/sqlite")
            .run(&self.pool)
            .await?;
        tracing::info!("SQLite migrations completed successfully");
        Ok(())
    }

    /// Get the audit log repository.
    pub fn audit_logs(&self) -> Arc<dyn AuditLogRepo> {
        Arc::clone(&self.audit_logs)
    }

    /// Raw pool handle, for ad-hoc queries in tests.
    pub fn pool(&self) -> &sqlx::SqlitePool {
        &self.pool
    }

    /// Health check for database connectivity.
    pub async fn health_check(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
