//! # Pricing Plan Repository
//!
//! Plans are platform-wide rows; they carry no tenant scope.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use lotkeeper_core::PricingPlan;

/// Repository for pricing plans.
#[derive(Debug, Clone)]
pub struct PlanRepository {
    pool: SqlitePool,
}

impl PlanRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PlanRepository { pool }
    }

    /// Inserts a plan. A duplicate `code` is reported as a unique violation.
    pub async fn insert(&self, plan: &PricingPlan) -> DbResult<()> {
        debug!(code = %plan.code, "Inserting pricing plan");

        sqlx::query(
            r#"
            INSERT INTO pricing_plans (
                id, code, name, max_locations, max_users, max_sessions,
                soft_limit_bps, hard_limit_bps, is_active, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&plan.id)
        .bind(&plan.code)
        .bind(&plan.name)
        .bind(plan.max_locations)
        .bind(plan.max_users)
        .bind(plan.max_sessions)
        .bind(plan.soft_limit_bps)
        .bind(plan.hard_limit_bps)
        .bind(plan.is_active)
        .bind(plan.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, plan.code.clone()),
            other => other,
        })?;

        Ok(())
    }

    /// Looks up an active plan by code.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<PricingPlan>> {
        let plan = sqlx::query_as::<_, PricingPlan>(
            "SELECT * FROM pricing_plans WHERE code = ? AND is_active = 1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(plan)
    }

    pub async fn list_active(&self) -> DbResult<Vec<PricingPlan>> {
        let plans = sqlx::query_as::<_, PricingPlan>(
            "SELECT * FROM pricing_plans WHERE is_active = 1 ORDER BY code",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(plans)
    }
}

#[cfg(test)]
mod tests {
    use crate::repository::test_support::{plan, test_db};

    #[tokio::test]
    async fn test_insert_and_lookup_by_code() {
        let db = test_db().await;
        db.plans().insert(&plan("pro", 5, 20, 1000)).await.unwrap();

        let found = db.plans().get_by_code("pro").await.unwrap().unwrap();
        assert_eq!(found.max_sessions, 1000);
        assert!(db.plans().get_by_code("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_code_rejected() {
        let db = test_db().await;
        db.plans().insert(&plan("basic", 1, 3, 100)).await.unwrap();

        let err = db.plans().insert(&plan("basic", 1, 3, 100)).await.unwrap_err();
        assert!(err.is_unique_violation());
    }
}
