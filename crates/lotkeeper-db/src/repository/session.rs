//! # Parking Session Repository
//!
//! ## Session Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Session Lifecycle in SQL                          │
//! │                                                                         │
//! │  ENTRY   insert()    INSERT ... status = 'ACTIVE'                      │
//! │                      └── idx_sessions_one_active_plate rejects a       │
//! │                          second ACTIVE row for (tenant_id, plate)      │
//! │                                                                         │
//! │  EXIT    complete()  UPDATE ... WHERE id = ? AND status = 'ACTIVE'     │
//! │                      └── 0 rows → someone else completed it first      │
//! │                                                                         │
//! │  Sessions are never deleted.                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use super::scope_filter::{select_scoped, ScopeColumns};
use crate::error::{DbError, DbResult};
use lotkeeper_core::{LocationScope, ParkingSession, Scope, SessionStatus, TenantScope, VehicleType};

/// Repository for parking sessions.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SessionRepository { pool }
    }

    /// Inserts a new session.
    ///
    /// ## Errors
    /// `UniqueViolation` on `parking_sessions` when the plate already has an
    /// ACTIVE session in the tenant.
    pub async fn insert<'e, E>(&self, executor: E, session: &ParkingSession) -> DbResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        debug!(id = %session.id, plate = %session.plate, "Inserting parking session");

        sqlx::query(
            r#"
            INSERT INTO parking_sessions (
                id, tenant_id, location_id, plate, vehicle_type, plan_type,
                entry_time, exit_time, cost, status,
                entry_shift_id, exit_shift_id, discount, discount_reason, agreement_id,
                ticket_number, created_by, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&session.id)
        .bind(&session.tenant_id)
        .bind(&session.location_id)
        .bind(&session.plate)
        .bind(session.vehicle_type)
        .bind(session.plan_type)
        .bind(session.entry_time)
        .bind(session.exit_time)
        .bind(session.cost)
        .bind(session.status)
        .bind(&session.entry_shift_id)
        .bind(&session.exit_shift_id)
        .bind(session.discount)
        .bind(&session.discount_reason)
        .bind(&session.agreement_id)
        .bind(&session.ticket_number)
        .bind(&session.created_by)
        .bind(session.created_at)
        .bind(session.updated_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// The ACTIVE session for a plate anywhere in the tenant.
    pub async fn find_active_by_plate(
        &self,
        scope: &TenantScope,
        plate: &str,
    ) -> DbResult<Option<ParkingSession>> {
        let session = sqlx::query_as::<_, ParkingSession>(
            r#"
            SELECT * FROM parking_sessions
            WHERE tenant_id = ? AND plate = ? AND status = 'ACTIVE'
            "#,
        )
        .bind(&scope.tenant_id)
        .bind(plate)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    pub async fn get(&self, scope: &TenantScope, id: &str) -> DbResult<Option<ParkingSession>> {
        let session = sqlx::query_as::<_, ParkingSession>(
            "SELECT * FROM parking_sessions WHERE id = ? AND tenant_id = ?",
        )
        .bind(id)
        .bind(&scope.tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// ACTIVE sessions of one vehicle type at the scope's location.
    pub async fn count_active(&self, scope: &LocationScope, vehicle_type: VehicleType) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM parking_sessions
            WHERE tenant_id = ? AND location_id = ? AND vehicle_type = ? AND status = 'ACTIVE'
            "#,
        )
        .bind(&scope.tenant_id)
        .bind(&scope.location_id)
        .bind(vehicle_type)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Sessions visible to `scope`, newest entry first.
    pub async fn list(
        &self,
        scope: &Scope,
        status: Option<SessionStatus>,
    ) -> DbResult<Vec<ParkingSession>> {
        let mut query = select_scoped("parking_sessions", scope, ScopeColumns::LOCATION_OWNED);
        if let Some(status) = status {
            query.push(" AND status = ").push_bind(status);
        }
        query.push(" ORDER BY entry_time DESC");

        let sessions = query
            .build_query_as::<ParkingSession>()
            .fetch_all(&self.pool)
            .await?;

        Ok(sessions)
    }

    /// Writes the terminal state of a session that is still ACTIVE.
    ///
    /// Returns `NotFound` when the row is no longer ACTIVE, which is how a
    /// concurrent second exit for the same plate loses.
    pub async fn complete<'e, E>(&self, executor: E, session: &ParkingSession) -> DbResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            r#"
            UPDATE parking_sessions
            SET status = ?, exit_time = ?, cost = ?, exit_shift_id = ?,
                discount = ?, discount_reason = ?, agreement_id = ?, updated_at = ?
            WHERE id = ? AND tenant_id = ? AND status = 'ACTIVE'
            "#,
        )
        .bind(session.status)
        .bind(session.exit_time)
        .bind(session.cost)
        .bind(&session.exit_shift_id)
        .bind(session.discount)
        .bind(&session.discount_reason)
        .bind(&session.agreement_id)
        .bind(session.updated_at)
        .bind(&session.id)
        .bind(&session.tenant_id)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Active session", session.id.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::repository::test_support::{active_session, seed_world, test_db};
    use lotkeeper_core::{Scope, SessionStatus, TenantScope, VehicleType};

    #[tokio::test]
    async fn test_one_active_session_per_plate_per_tenant() {
        let db = test_db().await;
        let world = seed_world(&db, "t-1", "loc-1").await;

        let first = active_session(&world, "sess-1", "ABC123", VehicleType::Car);
        db.sessions().insert(db.pool(), &first).await.unwrap();

        let dup = active_session(&world, "sess-2", "ABC123", VehicleType::Car);
        let err = db.sessions().insert(db.pool(), &dup).await.unwrap_err();
        assert!(err.is_unique_violation_on("parking_sessions"));

        let other = seed_world(&db, "t-2", "loc-2").await;
        let same_plate_elsewhere = active_session(&other, "sess-3", "ABC123", VehicleType::Car);
        db.sessions().insert(db.pool(), &same_plate_elsewhere).await.unwrap();
    }

    #[tokio::test]
    async fn test_complete_only_once() {
        let db = test_db().await;
        let world = seed_world(&db, "t-1", "loc-1").await;

        let mut session = active_session(&world, "sess-1", "XYZ9", VehicleType::Motorcycle);
        db.sessions().insert(db.pool(), &session).await.unwrap();

        session.status = SessionStatus::Completed;
        session.exit_time = Some(Utc::now());
        session.cost = Some(2000);
        session.exit_shift_id = Some(world.shift_id.clone());
        db.sessions().complete(db.pool(), &session).await.unwrap();

        let err = db.sessions().complete(db.pool(), &session).await.unwrap_err();
        assert!(err.is_not_found());

        let tenant = TenantScope { tenant_id: "t-1".into() };
        assert!(db.sessions().find_active_by_plate(&tenant, "XYZ9").await.unwrap().is_none());

        // Plate is free again after completion
        let again = active_session(&world, "sess-2", "XYZ9", VehicleType::Motorcycle);
        db.sessions().insert(db.pool(), &again).await.unwrap();
    }

    #[tokio::test]
    async fn test_queries_never_cross_tenants() {
        let db = test_db().await;
        let a = seed_world(&db, "t-a", "loc-a").await;
        let b = seed_world(&db, "t-b", "loc-b").await;

        db.sessions()
            .insert(db.pool(), &active_session(&a, "sess-a", "AAA111", VehicleType::Car))
            .await
            .unwrap();
        db.sessions()
            .insert(db.pool(), &active_session(&b, "sess-b", "BBB222", VehicleType::Car))
            .await
            .unwrap();

        let scope_a = TenantScope { tenant_id: "t-a".into() };
        assert!(db.sessions().find_active_by_plate(&scope_a, "BBB222").await.unwrap().is_none());
        assert!(db.sessions().get(&scope_a, "sess-b").await.unwrap().is_none());

        let listed = db.sessions().list(&Scope::tenant("t-a"), None).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed.iter().all(|s| s.tenant_id == "t-a"));

        let everything = db.sessions().list(&Scope::Unscoped, None).await.unwrap();
        assert_eq!(everything.len(), 2);

        assert_eq!(
            db.sessions().count_active(&a.scope, VehicleType::Car).await.unwrap(),
            1
        );
        assert_eq!(
            db.sessions().count_active(&a.scope, VehicleType::Motorcycle).await.unwrap(),
            0
        );
    }
}
