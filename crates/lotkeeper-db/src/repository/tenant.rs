//! # Tenant Repository
//!
//! Tenants are archived through `set_status`, never deleted.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::scope_filter::{select_scoped, ScopeColumns};
use crate::error::{DbError, DbResult};
use lotkeeper_core::{Scope, Tenant, TenantStatus};

/// Repository for tenants.
#[derive(Debug, Clone)]
pub struct TenantRepository {
    pool: SqlitePool,
}

impl TenantRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TenantRepository { pool }
    }

    /// Inserts a tenant. A taken slug becomes `UniqueViolation { field: "slug" }`.
    pub async fn insert(&self, tenant: &Tenant) -> DbResult<()> {
        debug!(slug = %tenant.slug, plan = %tenant.plan_code, "Inserting tenant");

        sqlx::query(
            r#"
            INSERT INTO tenants (
                id, name, slug, plan_code, status,
                max_locations, max_users, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&tenant.id)
        .bind(&tenant.name)
        .bind(&tenant.slug)
        .bind(&tenant.plan_code)
        .bind(tenant.status)
        .bind(tenant.max_locations)
        .bind(tenant.max_users)
        .bind(tenant.created_at)
        .bind(tenant.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("slug", tenant.slug.clone()),
            other => other,
        })?;

        Ok(())
    }

    /// Loads a tenant by id without a scope check.
    ///
    /// Used by the scope guard, which needs the tenant row to decide the
    /// scope in the first place.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Tenant>> {
        let tenant = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(tenant)
    }

    pub async fn get_by_slug(&self, slug: &str) -> DbResult<Option<Tenant>> {
        let tenant = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        Ok(tenant)
    }

    /// Lists tenants visible to `scope`: every tenant when unscoped, else
    /// only the scope's own tenant.
    pub async fn list(&self, scope: &Scope) -> DbResult<Vec<Tenant>> {
        let mut query = select_scoped("tenants", scope, ScopeColumns::TENANT_ROW);
        query.push(" ORDER BY name");

        let tenants = query
            .build_query_as::<Tenant>()
            .fetch_all(&self.pool)
            .await?;

        Ok(tenants)
    }

    /// Changes a tenant's status and returns the updated row.
    pub async fn set_status(&self, id: &str, status: TenantStatus) -> DbResult<Tenant> {
        let tenant = sqlx::query_as::<_, Tenant>(
            "UPDATE tenants SET status = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Tenant", id))?;

        info!(tenant_id = %id, status = status.as_str(), "Tenant status changed");
        Ok(tenant)
    }
}

#[cfg(test)]
mod tests {
    use crate::repository::test_support::{tenant, test_db};
    use lotkeeper_core::{Scope, TenantStatus};

    #[tokio::test]
    async fn test_slug_is_unique() {
        let db = test_db().await;
        db.tenants().insert(&tenant("t-1", "north-lot")).await.unwrap();

        let err = db.tenants().insert(&tenant("t-2", "north-lot")).await.unwrap_err();
        assert!(err.is_unique_violation());
        assert!(db.tenants().get_by_slug("north-lot").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_list_is_tenant_scoped() {
        let db = test_db().await;
        db.tenants().insert(&tenant("t-a", "alpha")).await.unwrap();
        db.tenants().insert(&tenant("t-b", "bravo")).await.unwrap();

        let own = db.tenants().list(&Scope::tenant("t-a")).await.unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].id, "t-a");

        let all = db.tenants().list(&Scope::Unscoped).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_archive_keeps_row() {
        let db = test_db().await;
        db.tenants().insert(&tenant("t-1", "archived-co")).await.unwrap();

        let archived = db.tenants().set_status("t-1", TenantStatus::Archived).await.unwrap();
        assert!(!archived.is_active());
        assert!(db.tenants().get_by_id("t-1").await.unwrap().is_some());

        let err = db.tenants().set_status("nope", TenantStatus::Archived).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
