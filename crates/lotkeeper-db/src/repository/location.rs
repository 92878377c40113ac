//! # Location Repository
//!
//! Locations and the two sequential counters they own.
//!
//! ## Counter Locking
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 next_number inside the caller's tx                      │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │    UPDATE locations                                                    │
//! │       SET current_receipt_number = current_receipt_number + 1          │
//! │     WHERE id = ? AND tenant_id = ?                                     │
//! │    RETURNING current_receipt_number        ← takes the write lock      │
//! │                                                                         │
//! │    INSERT INTO transactions (... receipt_number ...)                   │
//! │  COMMIT                                    ← lock released             │
//! │                                                                         │
//! │  A second caller blocks at its UPDATE until the first commits or       │
//! │  rolls back, then reads the committed value. Rollback undoes the       │
//! │  increment together with the record that consumed it.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The counter UPDATE must be the first write of its transaction: once the
//! transaction holds the write lock no other writer can interleave.

use chrono::Utc;
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use super::scope_filter::{select_scoped, ScopeColumns};
use crate::error::{DbError, DbResult};
use lotkeeper_core::{CounterKind, Location, LocationScope, Scope, TenantScope};

/// Repository for locations.
#[derive(Debug, Clone)]
pub struct LocationRepository {
    pool: SqlitePool,
}

impl LocationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LocationRepository { pool }
    }

    pub async fn insert(&self, location: &Location) -> DbResult<()> {
        debug!(id = %location.id, tenant_id = %location.tenant_id, "Inserting location");

        sqlx::query(
            r#"
            INSERT INTO locations (
                id, tenant_id, name, address, settings, is_active,
                current_ticket_number, current_receipt_number, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&location.id)
        .bind(&location.tenant_id)
        .bind(&location.name)
        .bind(&location.address)
        .bind(&location.settings)
        .bind(location.is_active)
        .bind(location.current_ticket_number)
        .bind(location.current_receipt_number)
        .bind(location.created_at)
        .bind(location.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Loads a location only if it belongs to the scope's tenant.
    pub async fn get(&self, scope: &TenantScope, id: &str) -> DbResult<Option<Location>> {
        let location = sqlx::query_as::<_, Location>(
            "SELECT * FROM locations WHERE id = ? AND tenant_id = ?",
        )
        .bind(id)
        .bind(&scope.tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(location)
    }

    pub async fn list(&self, scope: &Scope) -> DbResult<Vec<Location>> {
        let mut query = select_scoped("locations", scope, ScopeColumns::LOCATION_ROW);
        query.push(" ORDER BY name");

        let locations = query
            .build_query_as::<Location>()
            .fetch_all(&self.pool)
            .await?;

        Ok(locations)
    }

    /// Live count of active locations for a tenant.
    pub async fn count_active(&self, scope: &TenantScope) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM locations WHERE tenant_id = ? AND is_active = 1",
        )
        .bind(&scope.tenant_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Increments a location counter and returns the new value.
    ///
    /// Run this on `&mut *tx` as the first write of the transaction that
    /// also stores the consuming record. The location must belong to the
    /// scope's tenant, otherwise `NotFound`.
    pub async fn next_number<'e, E>(
        &self,
        executor: E,
        scope: &LocationScope,
        kind: CounterKind,
    ) -> DbResult<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!(
            "UPDATE locations SET {col} = {col} + 1, updated_at = ? \
             WHERE id = ? AND tenant_id = ? RETURNING {col}",
            col = kind.column()
        );

        let number: i64 = sqlx::query_scalar(&sql)
            .bind(Utc::now())
            .bind(&scope.location_id)
            .bind(&scope.tenant_id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| DbError::not_found("Location", scope.location_id.clone()))?;

        debug!(
            location_id = %scope.location_id,
            counter = kind.column(),
            number,
            "Issued sequential number"
        );
        Ok(number)
    }
}

#[cfg(test)]
mod tests {
    use crate::repository::test_support::{location, seed_location, tenant, test_db};
    use lotkeeper_core::{CounterKind, LocationScope, Scope, TenantScope};

    #[tokio::test]
    async fn test_get_rejects_foreign_tenant() {
        let db = test_db().await;
        let scope = seed_location(&db, "t-a", "loc-a").await;
        db.tenants().insert(&tenant("t-b", "tenant-b")).await.unwrap();

        let own = TenantScope { tenant_id: "t-a".into() };
        let foreign = TenantScope { tenant_id: "t-b".into() };
        assert!(db.locations().get(&own, &scope.location_id).await.unwrap().is_some());
        assert!(db.locations().get(&foreign, &scope.location_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_counters_increment_independently() {
        let db = test_db().await;
        let scope = seed_location(&db, "t-1", "loc-1").await;
        let repo = db.locations();

        assert_eq!(repo.next_number(db.pool(), &scope, CounterKind::Ticket).await.unwrap(), 1);
        assert_eq!(repo.next_number(db.pool(), &scope, CounterKind::Ticket).await.unwrap(), 2);
        assert_eq!(repo.next_number(db.pool(), &scope, CounterKind::Receipt).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_rollback_undoes_increment() {
        let db = test_db().await;
        let scope = seed_location(&db, "t-1", "loc-1").await;
        let repo = db.locations();

        {
            let mut tx = db.begin().await.unwrap();
            let n = repo.next_number(&mut *tx, &scope, CounterKind::Receipt).await.unwrap();
            assert_eq!(n, 1);
            tx.rollback().await.unwrap();
        }

        let n = repo.next_number(db.pool(), &scope, CounterKind::Receipt).await.unwrap();
        assert_eq!(n, 1);
    }

    #[tokio::test]
    async fn test_counter_requires_matching_tenant() {
        let db = test_db().await;
        seed_location(&db, "t-1", "loc-1").await;

        let wrong = LocationScope::new("t-other", "loc-1");
        let err = db
            .locations()
            .next_number(db.pool(), &wrong, CounterKind::Ticket)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_list_and_count() {
        let db = test_db().await;
        seed_location(&db, "t-1", "loc-1").await;
        db.locations().insert(&location("t-1", "loc-2")).await.unwrap();

        let scope = TenantScope { tenant_id: "t-1".into() };
        assert_eq!(db.locations().count_active(&scope).await.unwrap(), 2);
        assert_eq!(db.locations().list(&Scope::tenant("t-1")).await.unwrap().len(), 2);
        assert_eq!(
            db.locations()
                .list(&Scope::location("t-1", "loc-2"))
                .await
                .unwrap()
                .len(),
            1
        );
    }
}
