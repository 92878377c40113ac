//! Fixtures shared by the engine tests.

use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::Engine;
use lotkeeper_core::{
    Location, LocationScope, PricingModel, PricingPlan, RequestContext, Shift, Tariff, TariffType,
    Tenant, TenantStatus, User, UserRole, VehicleType,
};
use lotkeeper_db::{Database, DbConfig};

pub async fn test_engine() -> Engine {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    Engine::new(db, EngineConfig::default())
}

/// Engine on a temp-file database, for tests that need several
/// connections writing at once. Pair with [`remove_db_files`].
pub async fn file_engine() -> (Engine, PathBuf) {
    let path = std::env::temp_dir().join(format!("lotkeeper-{}.db", Uuid::new_v4()));
    let db = Database::new(DbConfig::new(&path).max_connections(8))
        .await
        .unwrap();
    (Engine::new(db, EngineConfig::default()), path)
}

pub fn remove_db_files(path: &Path) {
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
    }
}

/// One tenant with one location, an admin, and an operator pinned to the
/// location with an open shift. The tenant's plan is unlimited and CAR has
/// a 3000/hour tariff.
pub struct Lot {
    pub scope: LocationScope,
    pub admin: RequestContext,
    pub operator: RequestContext,
}

pub async fn insert_plan(engine: &Engine, code: &str, max_locations: i64, max_users: i64, max_sessions: i64) {
    engine
        .db()
        .plans()
        .insert(&PricingPlan {
            id: format!("plan-{code}"),
            code: code.to_string(),
            name: code.to_uppercase(),
            max_locations,
            max_users,
            max_sessions,
            soft_limit_bps: 8000,
            hard_limit_bps: 12000,
            is_active: true,
            created_at: Utc::now(),
        })
        .await
        .unwrap();
}

/// Inserts a plan and a tenant on it with one location `{tenant_id}-loc`.
pub async fn seed_tenant_on_plan(
    engine: &Engine,
    tenant_id: &str,
    plan_code: &str,
    max_locations: i64,
    max_users: i64,
    max_sessions: i64,
) -> LocationScope {
    insert_plan(engine, plan_code, max_locations, max_users, max_sessions).await;
    let now = Utc::now();
    engine
        .db()
        .tenants()
        .insert(&Tenant {
            id: tenant_id.to_string(),
            name: format!("Tenant {tenant_id}"),
            slug: tenant_id.to_string(),
            plan_code: plan_code.to_string(),
            status: TenantStatus::Active,
            max_locations,
            max_users,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();

    let location_id = format!("{tenant_id}-loc");
    insert_location(engine, tenant_id, &location_id).await;
    LocationScope::new(tenant_id, location_id)
}

pub async fn insert_location(engine: &Engine, tenant_id: &str, location_id: &str) {
    let now = Utc::now();
    engine
        .db()
        .locations()
        .insert(&Location {
            id: location_id.to_string(),
            tenant_id: tenant_id.to_string(),
            name: format!("Lot {location_id}"),
            address: None,
            settings: "{}".to_string(),
            is_active: true,
            current_ticket_number: 0,
            current_receipt_number: 0,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();
}

pub async fn insert_user(engine: &Engine, id: &str, tenant_id: &str, location_id: Option<&str>, role: UserRole) {
    engine
        .db()
        .users()
        .insert(&User {
            id: id.to_string(),
            tenant_id: Some(tenant_id.to_string()),
            location_id: location_id.map(String::from),
            name: format!("User {id}"),
            email: format!("{id}@lot.example"),
            role,
            is_active: true,
            created_at: Utc::now(),
        })
        .await
        .unwrap();
}

pub async fn insert_shift(engine: &Engine, scope: &LocationScope, id: &str, user_id: &str) {
    engine
        .db()
        .shifts()
        .insert(&Shift {
            id: id.to_string(),
            tenant_id: scope.tenant_id.clone(),
            location_id: scope.location_id.clone(),
            user_id: user_id.to_string(),
            start_time: Utc::now(),
            end_time: None,
            base_amount: 0,
            total_income: 0,
            total_expenses: 0,
            declared_amount: None,
            is_active: true,
        })
        .await
        .unwrap();
}

pub fn tariff(scope: &LocationScope, vehicle_type: VehicleType, tariff_type: TariffType, price: i64) -> Tariff {
    let now = Utc::now();
    Tariff {
        id: format!("{}-{}-{:?}", scope.location_id, vehicle_type.as_str(), tariff_type),
        tenant_id: scope.tenant_id.clone(),
        location_id: scope.location_id.clone(),
        vehicle_type,
        tariff_type,
        pricing_model: PricingModel::Traditional,
        base_price: price,
        base_time_minutes: 60,
        extra_frac_price: 0,
        extra_frac_time_minutes: 0,
        day_max_price: None,
        day_min_hours: None,
        created_at: now,
        updated_at: now,
    }
}

/// Seeds a [`Lot`]. Call once per tenant id.
pub async fn seed_lot(engine: &Engine, tenant_id: &str, location_id: &str) -> Lot {
    let plan_code = format!("{tenant_id}-unlimited");
    insert_plan(engine, &plan_code, -1, -1, -1).await;

    let now = Utc::now();
    engine
        .db()
        .tenants()
        .insert(&Tenant {
            id: tenant_id.to_string(),
            name: format!("Tenant {tenant_id}"),
            slug: tenant_id.to_string(),
            plan_code,
            status: TenantStatus::Active,
            max_locations: -1,
            max_users: -1,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();
    insert_location(engine, tenant_id, location_id).await;
    let scope = LocationScope::new(tenant_id, location_id);

    let admin_id = format!("admin-{tenant_id}");
    let operator_id = format!("op-{location_id}");
    insert_user(engine, &admin_id, tenant_id, None, UserRole::Admin).await;
    insert_user(engine, &operator_id, tenant_id, Some(location_id), UserRole::Operator).await;
    insert_shift(engine, &scope, &format!("shift-{location_id}"), &operator_id).await;

    engine
        .db()
        .tariffs()
        .upsert(&tariff(&scope, VehicleType::Car, TariffType::Hour, 3000))
        .await
        .unwrap();

    Lot {
        admin: RequestContext::at_location(admin_id, UserRole::Admin, scope.clone()),
        operator: RequestContext::at_location(operator_id, UserRole::Operator, scope.clone()),
        scope,
    }
}
