//! # User Repository

use sqlx::SqlitePool;
use tracing::debug;

use super::scope_filter::{select_scoped, ScopeColumns};
use crate::error::{DbError, DbResult};
use lotkeeper_core::{Scope, TenantScope, User};

/// Repository for users.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a user. A taken email becomes `UniqueViolation { field: "email" }`.
    pub async fn insert(&self, user: &User) -> DbResult<()> {
        debug!(id = %user.id, role = ?user.role, "Inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (
                id, tenant_id, location_id, name, email, role, is_active, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.tenant_id)
        .bind(&user.location_id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role)
        .bind(user.is_active)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("email", user.email.clone()),
            other => other,
        })?;

        Ok(())
    }

    /// Loads the authenticated principal. Not scoped: the user row is what
    /// the request scope is derived from.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn list(&self, scope: &Scope) -> DbResult<Vec<User>> {
        let mut query = select_scoped("users", scope, ScopeColumns::TENANT_OWNED);
        query.push(" ORDER BY name");

        let users = query.build_query_as::<User>().fetch_all(&self.pool).await?;
        Ok(users)
    }

    /// Live count of active users for a tenant.
    pub async fn count_active(&self, scope: &TenantScope) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE tenant_id = ? AND is_active = 1",
        )
        .bind(&scope.tenant_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
