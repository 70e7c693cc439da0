use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::{
    db::error::{DbError, DbResult},
    db::repos::AuditLogRepo,
    models::{ActionCount, AuditLog, AuditLogStats, CreateAuditLog},
};

pub struct SqliteAuditLogRepo {
    pool: SqlitePool,
}

impl SqliteAuditLogRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn parse_uuid(s: &str) -> DbResult<Uuid> {
    Uuid::parse_str(s).map_err(|e| DbError::Internal(format!("Invalid UUID in database: {e}")))
}

fn row_to_audit_log(row: &sqlx::sqlite::SqliteRow) -> DbResult<AuditLog> {
    let user_id: Option<String> = row.get("user_id");
    Ok(AuditLog {
        id: parse_uuid(&row.get::<String, _>("id"))?,
        user_id: user_id.map(|s| parse_uuid(&s)).transpose()?,
        action: row.get("action"),
        message: row.get("message"),
        created_at: row.get("created_at"),
        ip_address: row.get("ip_address"),
    })
}

#[async_trait]
impl AuditLogRepo for SqliteAuditLogRepo {
    async fn create(&self, input: CreateAuditLog) -> DbResult<AuditLog> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO audit_logs (id, user_id, action, message, created_at, ip_address)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(input.user_id.map(|id| id.to_string()))
        .bind(&input.action)
        .bind(&input.message)
        .bind(now)
        .bind(&input.ip_address)
        .execute(&self.pool)
        .await?;

        Ok(AuditLog {
            id,
            user_id: input.user_id,
            action: input.action,
            message: input.message,
            created_at: now,
            ip_address: input.ip_address,
        })
    }

    async fn count_expired(&self, action: &str, cutoff: DateTime<Utc>) -> DbResult<u64> {
        let row = sqlx::query(
            "SELECT COUNT(*) as count FROM audit_logs WHERE action = ? AND created_at < ?",
        )
        .bind(action)
        .bind(cutoff)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get::<i64, _>("count") as u64)
    }

    async fn fetch_expired(
        &self,
        action: &str,
        cutoff: DateTime<Utc>,
    ) -> DbResult<Vec<AuditLog>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, action, message, created_at, ip_address
            FROM audit_logs
            WHERE action = ? AND created_at < ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(action)
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_audit_log).collect()
    }

    async fn delete_expired_batch(
        &self,
        action: &str,
        cutoff: DateTime<Utc>,
        limit: u32,
    ) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM audit_logs
            WHERE id IN (
                SELECT id FROM audit_logs
                WHERE action = ? AND created_at < ?
                LIMIT ?
            )
            "#,
        )
        .bind(action)
        .bind(cutoff)
        .bind(limit as i64)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn anonymize_user(&self, user_id: Uuid) -> DbResult<u64> {
        let result =
            sqlx::query("UPDATE audit_logs SET user_id = NULL, ip_address = NULL WHERE user_id = ?")
                .bind(user_id.to_string())
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }

    async fn stats(&self) -> DbResult<AuditLogStats> {
        let now = Utc::now();

        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) as total,
                COALESCE(SUM(created_at >= ?), 0) as last_24h,
                COALESCE(SUM(created_at >= ?), 0) as last_7d,
                COALESCE(SUM(created_at >= ?), 0) as last_30d,
                COALESCE(SUM(LENGTH(message) + LENGTH(action)
                    + LENGTH(COALESCE(ip_address, '')) + 64), 0) as size_estimate
            FROM audit_logs
            "#,
        )
        .bind(now - Duration::hours(24))
        .bind(now - Duration::days(7))
        .bind(now - Duration::days(30))
        .fetch_one(&self.pool)
        .await?;

        let by_action = sqlx::query(
            r#"
            SELECT action, COUNT(*) as count
            FROM audit_logs
            GROUP BY action
            ORDER BY count DESC, action ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|r| ActionCount {
            action: r.get("action"),
            count: r.get("count"),
        })
        .collect();

        Ok(AuditLogStats {
            total: row.get("total"),
            last_24h: row.get("last_24h"),
            last_7d: row.get("last_7d"),
            last_30d: row.get("last_30d"),
            by_action,
            estimated_size_bytes: row.get("size_estimate"),
        })
    }
}
