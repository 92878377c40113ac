//! # Wash Entry Repository

use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use super::scope_filter::{select_scoped, ScopeColumns};
use crate::error::DbResult;
use lotkeeper_core::{Scope, WashEntry};

/// Repository for wash entries.
#[derive(Debug, Clone)]
pub struct WashRepository {
    pool: SqlitePool,
}

impl WashRepository {
    pub fn new(pool: SqlitePool) -> Self {
        WashRepository { pool }
    }

    /// Inserts a wash entry. Written in the same transaction as its
    /// WASH_REVENUE record and receipt number.
    pub async fn insert<'e, E>(&self, executor: E, entry: &WashEntry) -> DbResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        debug!(id = %entry.id, plate = %entry.plate, receipt_number = %entry.receipt_number, "Inserting wash entry");

        sqlx::query(
            r#"
            INSERT INTO wash_entries (
                id, tenant_id, location_id, shift_id, plate, service_name,
                price, receipt_number, created_by, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.tenant_id)
        .bind(&entry.location_id)
        .bind(&entry.shift_id)
        .bind(&entry.plate)
        .bind(&entry.service_name)
        .bind(entry.price)
        .bind(&entry.receipt_number)
        .bind(&entry.created_by)
        .bind(entry.created_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn list(&self, scope: &Scope) -> DbResult<Vec<WashEntry>> {
        let mut query = select_scoped("wash_entries", scope, ScopeColumns::LOCATION_OWNED);
        query.push(" ORDER BY created_at DESC");

        let entries = query
            .build_query_as::<WashEntry>()
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::repository::test_support::{seed_world, test_db};
    use lotkeeper_core::{Scope, WashEntry};

    #[tokio::test]
    async fn test_insert_and_list_scoped() {
        let db = test_db().await;
        let world = seed_world(&db, "t-1", "loc-1").await;

        let entry = WashEntry {
            id: "wash-1".into(),
            tenant_id: world.scope.tenant_id.clone(),
            location_id: world.scope.location_id.clone(),
            shift_id: world.shift_id.clone(),
            plate: "ABC123".into(),
            service_name: "Full wash".into(),
            price: 12000,
            receipt_number: "1".into(),
            created_by: world.user_id.clone(),
            created_at: Utc::now(),
        };
        db.washes().insert(db.pool(), &entry).await.unwrap();

        assert_eq!(db.washes().list(&Scope::tenant("t-1")).await.unwrap().len(), 1);
        assert!(db.washes().list(&Scope::tenant("t-2")).await.unwrap().is_empty());
    }
}
