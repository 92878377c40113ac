//! # Usage Repository
//!
//! Monthly session counters keyed by (tenant, `YYYY-MM`). Locations and
//! users are counted live from their own tables instead.

use chrono::Utc;
use sqlx::{Executor, Sqlite, SqlitePool};

use crate::error::DbResult;
use lotkeeper_core::{TenantScope, UsageRecord};

/// Repository for usage records.
#[derive(Debug, Clone)]
pub struct UsageRepository {
    pool: SqlitePool,
}

impl UsageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UsageRepository { pool }
    }

    /// Sessions recorded for the tenant in `period`; 0 when no row exists.
    pub async fn sessions_count(&self, scope: &TenantScope, period: &str) -> DbResult<i64> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT sessions_count FROM usage_records WHERE tenant_id = ? AND period = ?",
        )
        .bind(&scope.tenant_id)
        .bind(period)
        .fetch_optional(&self.pool)
        .await?;

        Ok(count.unwrap_or(0))
    }

    /// Adds one session to the tenant's counter for `period`, creating the
    /// row on first use. Runs inside the entry transaction.
    pub async fn increment_sessions<'e, E>(
        &self,
        executor: E,
        scope: &TenantScope,
        period: &str,
    ) -> DbResult<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let count: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO usage_records (tenant_id, period, sessions_count, updated_at)
            VALUES (?, ?, 1, ?)
            ON CONFLICT (tenant_id, period) DO UPDATE SET
                sessions_count = sessions_count + 1,
                updated_at = excluded.updated_at
            RETURNING sessions_count
            "#,
        )
        .bind(&scope.tenant_id)
        .bind(period)
        .bind(Utc::now())
        .fetch_one(executor)
        .await?;

        Ok(count)
    }

    pub async fn history(&self, scope: &TenantScope) -> DbResult<Vec<UsageRecord>> {
        let records = sqlx::query_as::<_, UsageRecord>(
            "SELECT * FROM usage_records WHERE tenant_id = ? ORDER BY period DESC",
        )
        .bind(&scope.tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
