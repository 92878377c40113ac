//! # System Setting Repository
//!
//! Rows for all three levels live in one table:
//!
//! ```text
//!   tenant_id  location_id   level
//!   NULL       NULL          Global
//!   t          NULL          Tenant
//!   t          l             Location
//! ```
//!
//! `list_visible` returns every row that can apply to a (tenant, location)
//! pair; the precedence itself is resolved in `lotkeeper_core::settings`.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use lotkeeper_core::SystemSetting;

/// Repository for hierarchical settings.
#[derive(Debug, Clone)]
pub struct SettingRepository {
    pool: SqlitePool,
}

impl SettingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SettingRepository { pool }
    }

    /// Global rows, plus the tenant's rows, plus the location's rows.
    ///
    /// Rows of other tenants and of other locations of the same tenant are
    /// never returned.
    pub async fn list_visible(
        &self,
        tenant_id: Option<&str>,
        location_id: Option<&str>,
    ) -> DbResult<Vec<SystemSetting>> {
        let rows = sqlx::query_as::<_, SystemSetting>(
            r#"
            SELECT * FROM system_settings
            WHERE (tenant_id IS NULL AND location_id IS NULL)
               OR (tenant_id = ? AND (location_id IS NULL OR location_id = ?))
            "#,
        )
        .bind(tenant_id)
        .bind(location_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Sets `key` at the level given by (`tenant_id`, `location_id`).
    pub async fn upsert(
        &self,
        tenant_id: Option<&str>,
        location_id: Option<&str>,
        key: &str,
        value: &str,
    ) -> DbResult<SystemSetting> {
        let now = Utc::now();
        debug!(?tenant_id, ?location_id, key, "Upserting setting");

        let updated = sqlx::query_as::<_, SystemSetting>(
            r#"
            UPDATE system_settings SET value = ?, updated_at = ?
            WHERE tenant_id IS ? AND location_id IS ? AND key = ?
            RETURNING *
            "#,
        )
        .bind(value)
        .bind(now)
        .bind(tenant_id)
        .bind(location_id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = updated {
            return Ok(row);
        }

        let inserted = sqlx::query_as::<_, SystemSetting>(
            r#"
            INSERT INTO system_settings (id, tenant_id, location_id, key, value, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(tenant_id)
        .bind(location_id)
        .bind(key)
        .bind(value)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(inserted)
    }
}
