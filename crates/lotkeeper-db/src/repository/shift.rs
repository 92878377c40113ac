//! # Shift Repository
//!
//! At most one open shift per (user, location), enforced by the partial
//! unique index `idx_shifts_one_active`.

use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use lotkeeper_core::{LocationScope, Shift, TenantScope};

/// Repository for cash-drawer shifts.
#[derive(Debug, Clone)]
pub struct ShiftRepository {
    pool: SqlitePool,
}

impl ShiftRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ShiftRepository { pool }
    }

    /// Inserts an open shift.
    ///
    /// A second open shift for the same user and location fails with
    /// `UniqueViolation` on `shifts`.
    pub async fn insert(&self, shift: &Shift) -> DbResult<()> {
        debug!(id = %shift.id, user_id = %shift.user_id, location_id = %shift.location_id, "Opening shift");

        sqlx::query(
            r#"
            INSERT INTO shifts (
                id, tenant_id, location_id, user_id, start_time, end_time,
                base_amount, total_income, total_expenses, declared_amount, is_active
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&shift.id)
        .bind(&shift.tenant_id)
        .bind(&shift.location_id)
        .bind(&shift.user_id)
        .bind(shift.start_time)
        .bind(shift.end_time)
        .bind(shift.base_amount)
        .bind(shift.total_income)
        .bind(shift.total_expenses)
        .bind(shift.declared_amount)
        .bind(shift.is_active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// The open shift of `user_id` at the scope's location.
    pub async fn find_active(&self, scope: &LocationScope, user_id: &str) -> DbResult<Option<Shift>> {
        let shift = sqlx::query_as::<_, Shift>(
            r#"
            SELECT * FROM shifts
            WHERE tenant_id = ? AND location_id = ? AND user_id = ? AND is_active = 1
            "#,
        )
        .bind(&scope.tenant_id)
        .bind(&scope.location_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(shift)
    }

    pub async fn get(&self, scope: &TenantScope, id: &str) -> DbResult<Option<Shift>> {
        let shift = sqlx::query_as::<_, Shift>("SELECT * FROM shifts WHERE id = ? AND tenant_id = ?")
            .bind(id)
            .bind(&scope.tenant_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(shift)
    }

    /// Persists a closed shift. Only an open shift can be closed; a shift
    /// already closed by a concurrent request yields `NotFound`.
    pub async fn close<'e, E>(&self, executor: E, shift: &Shift) -> DbResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            r#"
            UPDATE shifts
            SET end_time = ?, total_income = ?, total_expenses = ?,
                declared_amount = ?, is_active = 0
            WHERE id = ? AND tenant_id = ? AND is_active = 1
            "#,
        )
        .bind(shift.end_time)
        .bind(shift.total_income)
        .bind(shift.total_expenses)
        .bind(shift.declared_amount)
        .bind(&shift.id)
        .bind(&shift.tenant_id)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Active shift", shift.id.clone()));
        }

        debug!(id = %shift.id, "Shift closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::repository::test_support::{open_shift, seed_location, seed_operator, test_db};
    use lotkeeper_core::TenantScope;

    #[tokio::test]
    async fn test_one_open_shift_per_user_and_location() {
        let db = test_db().await;
        let scope = seed_location(&db, "t-1", "loc-1").await;
        seed_operator(&db, "t-1", "u-1").await;

        db.shifts().insert(&open_shift(&scope, "s-1", "u-1")).await.unwrap();
        let err = db.shifts().insert(&open_shift(&scope, "s-2", "u-1")).await.unwrap_err();
        assert!(err.is_unique_violation_on("shifts"));

        let active = db.shifts().find_active(&scope, "u-1").await.unwrap().unwrap();
        assert_eq!(active.id, "s-1");
    }

    #[tokio::test]
    async fn test_close_then_reopen() {
        let db = test_db().await;
        let scope = seed_location(&db, "t-1", "loc-1").await;
        seed_operator(&db, "t-1", "u-1").await;

        let mut shift = open_shift(&scope, "s-1", "u-1");
        db.shifts().insert(&shift).await.unwrap();

        shift.is_active = false;
        shift.end_time = Some(Utc::now());
        shift.declared_amount = Some(0);
        db.shifts().close(db.pool(), &shift).await.unwrap();

        assert!(db.shifts().find_active(&scope, "u-1").await.unwrap().is_none());
        let err = db.shifts().close(db.pool(), &shift).await.unwrap_err();
        assert!(err.is_not_found());

        db.shifts().insert(&open_shift(&scope, "s-2", "u-1")).await.unwrap();

        let tenant = TenantScope { tenant_id: "t-1".into() };
        let closed = db.shifts().get(&tenant, "s-1").await.unwrap().unwrap();
        assert!(!closed.is_active);
    }
}
