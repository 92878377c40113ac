//! # Agreement Repository

use sqlx::SqlitePool;
use tracing::debug;

use super::scope_filter::{select_scoped, ScopeColumns};
use crate::error::{DbError, DbResult};
use lotkeeper_core::{Agreement, LocationScope, Scope};

/// Repository for partner agreements.
#[derive(Debug, Clone)]
pub struct AgreementRepository {
    pool: SqlitePool,
}

impl AgreementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AgreementRepository { pool }
    }

    pub async fn insert(&self, agreement: &Agreement) -> DbResult<()> {
        debug!(id = %agreement.id, name = %agreement.name, "Inserting agreement");

        sqlx::query(
            r#"
            INSERT INTO agreements (
                id, tenant_id, location_id, name, agreement_type, value, is_active, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&agreement.id)
        .bind(&agreement.tenant_id)
        .bind(&agreement.location_id)
        .bind(&agreement.name)
        .bind(agreement.agreement_type)
        .bind(agreement.value)
        .bind(agreement.is_active)
        .bind(agreement.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Loads an agreement at the scope's location, active or not.
    pub async fn get(&self, scope: &LocationScope, id: &str) -> DbResult<Option<Agreement>> {
        let agreement = sqlx::query_as::<_, Agreement>(
            "SELECT * FROM agreements WHERE id = ? AND tenant_id = ? AND location_id = ?",
        )
        .bind(id)
        .bind(&scope.tenant_id)
        .bind(&scope.location_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(agreement)
    }

    pub async fn set_active(&self, scope: &LocationScope, id: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE agreements SET is_active = ? WHERE id = ? AND tenant_id = ? AND location_id = ?",
        )
        .bind(active)
        .bind(id)
        .bind(&scope.tenant_id)
        .bind(&scope.location_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Agreement", id));
        }
        Ok(())
    }

    pub async fn list(&self, scope: &Scope) -> DbResult<Vec<Agreement>> {
        let mut query = select_scoped("agreements", scope, ScopeColumns::LOCATION_OWNED);
        query.push(" ORDER BY name");

        let agreements = query
            .build_query_as::<Agreement>()
            .fetch_all(&self.pool)
            .await?;

        Ok(agreements)
    }
}
