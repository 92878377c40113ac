//! # Tariff Repository
//!
//! One row per (location, vehicle_type, tariff_type). Writes go through
//! `upsert`, which replaces the pricing fields of an existing row instead
//! of creating a second one.

use sqlx::SqlitePool;
use tracing::debug;

use super::scope_filter::{select_scoped, ScopeColumns};
use crate::error::DbResult;
use lotkeeper_core::{LocationScope, Scope, Tariff, VehicleType};

/// Repository for tariffs.
#[derive(Debug, Clone)]
pub struct TariffRepository {
    pool: SqlitePool,
}

impl TariffRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TariffRepository { pool }
    }

    /// Inserts a tariff or updates the row holding the same
    /// (location, vehicle_type, tariff_type). Returns the stored row, whose
    /// `id` is the existing one on update.
    pub async fn upsert(&self, tariff: &Tariff) -> DbResult<Tariff> {
        debug!(
            location_id = %tariff.location_id,
            vehicle_type = %tariff.vehicle_type,
            tariff_type = ?tariff.tariff_type,
            "Upserting tariff"
        );

        let stored = sqlx::query_as::<_, Tariff>(
            r#"
            INSERT INTO tariffs (
                id, tenant_id, location_id, vehicle_type, tariff_type, pricing_model,
                base_price, base_time_minutes, extra_frac_price, extra_frac_time_minutes,
                day_max_price, day_min_hours, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (location_id, vehicle_type, tariff_type) DO UPDATE SET
                pricing_model = excluded.pricing_model,
                base_price = excluded.base_price,
                base_time_minutes = excluded.base_time_minutes,
                extra_frac_price = excluded.extra_frac_price,
                extra_frac_time_minutes = excluded.extra_frac_time_minutes,
                day_max_price = excluded.day_max_price,
                day_min_hours = excluded.day_min_hours,
                updated_at = excluded.updated_at
            RETURNING *
            "#,
        )
        .bind(&tariff.id)
        .bind(&tariff.tenant_id)
        .bind(&tariff.location_id)
        .bind(tariff.vehicle_type)
        .bind(tariff.tariff_type)
        .bind(tariff.pricing_model)
        .bind(tariff.base_price)
        .bind(tariff.base_time_minutes)
        .bind(tariff.extra_frac_price)
        .bind(tariff.extra_frac_time_minutes)
        .bind(tariff.day_max_price)
        .bind(tariff.day_min_hours)
        .bind(tariff.created_at)
        .bind(tariff.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(stored)
    }

    /// All tariffs for a vehicle type at the scope's location.
    pub async fn list_for_vehicle(
        &self,
        scope: &LocationScope,
        vehicle_type: VehicleType,
    ) -> DbResult<Vec<Tariff>> {
        let tariffs = sqlx::query_as::<_, Tariff>(
            r#"
            SELECT * FROM tariffs
            WHERE tenant_id = ? AND location_id = ? AND vehicle_type = ?
            "#,
        )
        .bind(&scope.tenant_id)
        .bind(&scope.location_id)
        .bind(vehicle_type)
        .fetch_all(&self.pool)
        .await?;

        Ok(tariffs)
    }

    pub async fn list(&self, scope: &Scope) -> DbResult<Vec<Tariff>> {
        let mut query = select_scoped("tariffs", scope, ScopeColumns::LOCATION_OWNED);
        query.push(" ORDER BY vehicle_type, tariff_type");

        let tariffs = query.build_query_as::<Tariff>().fetch_all(&self.pool).await?;
        Ok(tariffs)
    }
}

#[cfg(test)]
mod tests {
    use crate::repository::test_support::{hour_tariff, seed_location, test_db};
    use lotkeeper_core::{LocationScope, Scope, VehicleType};

    #[tokio::test]
    async fn test_upsert_keeps_one_row_per_key() {
        let db = test_db().await;
        let scope = seed_location(&db, "t-1", "loc-1").await;

        let first = db
            .tariffs()
            .upsert(&hour_tariff(&scope, "tar-1", VehicleType::Car, 3000))
            .await
            .unwrap();
        let second = db
            .tariffs()
            .upsert(&hour_tariff(&scope, "tar-2", VehicleType::Car, 3500))
            .await
            .unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.base_price, 3500);

        let cars = db.tariffs().list_for_vehicle(&scope, VehicleType::Car).await.unwrap();
        assert_eq!(cars.len(), 1);
        assert!(db
            .tariffs()
            .list_for_vehicle(&scope, VehicleType::Motorcycle)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_tariffs_are_location_scoped() {
        let db = test_db().await;
        let a = seed_location(&db, "t-1", "loc-a").await;
        let b = LocationScope::new("t-1", "loc-b");
        db.locations()
            .insert(&crate::repository::test_support::location("t-1", "loc-b"))
            .await
            .unwrap();

        db.tariffs().upsert(&hour_tariff(&a, "tar-a", VehicleType::Car, 3000)).await.unwrap();
        db.tariffs().upsert(&hour_tariff(&b, "tar-b", VehicleType::Car, 4000)).await.unwrap();

        let at_b = db.tariffs().list_for_vehicle(&b, VehicleType::Car).await.unwrap();
        assert_eq!(at_b.len(), 1);
        assert_eq!(at_b[0].base_price, 4000);

        assert_eq!(db.tariffs().list(&Scope::tenant("t-1")).await.unwrap().len(), 2);
        assert_eq!(db.tariffs().list(&Scope::tenant("t-other")).await.unwrap().len(), 0);
    }
}
