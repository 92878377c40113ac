//! Fixtures shared by the repository tests.

use chrono::Utc;

use crate::pool::{Database, DbConfig};
use lotkeeper_core::session::OpenSession;
use lotkeeper_core::{
    Agreement, AgreementType, Location, LocationScope, ParkingSession, PaymentMethod, PlanType,
    PricingModel, PricingPlan, Shift, Tariff, TariffType, Tenant, TenantStatus, Transaction,
    TransactionType, User, UserRole, VehicleType,
};

pub async fn test_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

pub fn plan(code: &str, max_locations: i64, max_users: i64, max_sessions: i64) -> PricingPlan {
    PricingPlan {
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
    }
}

pub fn tenant(id: &str, slug: &str) -> Tenant {
    let now = Utc::now();
    Tenant {
        id: id.to_string(),
        name: format!("Tenant {id}"),
        slug: slug.to_string(),
        plan_code: "basic".to_string(),
        status: TenantStatus::Active,
        max_locations: -1,
        max_users: -1,
        created_at: now,
        updated_at: now,
    }
}

pub fn location(tenant_id: &str, id: &str) -> Location {
    let now = Utc::now();
    Location {
        id: id.to_string(),
        tenant_id: tenant_id.to_string(),
        name: format!("Lot {id}"),
        address: None,
        settings: "{}".to_string(),
        is_active: true,
        current_ticket_number: 0,
        current_receipt_number: 0,
        created_at: now,
        updated_at: now,
    }
}

pub fn user(id: &str, tenant_id: &str, role: UserRole) -> User {
    User {
        id: id.to_string(),
        tenant_id: Some(tenant_id.to_string()),
        location_id: None,
        name: format!("User {id}"),
        email: format!("{id}@lot.example"),
        role,
        is_active: true,
        created_at: Utc::now(),
    }
}

/// Inserts a tenant (slug = id) and one location under it.
pub async fn seed_location(db: &Database, tenant_id: &str, location_id: &str) -> LocationScope {
    db.tenants().insert(&tenant(tenant_id, tenant_id)).await.unwrap();
    db.locations().insert(&location(tenant_id, location_id)).await.unwrap();
    LocationScope::new(tenant_id, location_id)
}

pub async fn seed_operator(db: &Database, tenant_id: &str, user_id: &str) {
    db.users().insert(&user(user_id, tenant_id, UserRole::Operator)).await.unwrap();
}

pub fn open_shift(scope: &LocationScope, id: &str, user_id: &str) -> Shift {
    Shift {
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
    }
}

/// A tenant with one location, one operator and that operator's open shift.
pub struct World {
    pub scope: LocationScope,
    pub user_id: String,
    pub shift_id: String,
}

pub async fn seed_world(db: &Database, tenant_id: &str, location_id: &str) -> World {
    let scope = seed_location(db, tenant_id, location_id).await;
    let user_id = format!("op-{location_id}");
    let shift_id = format!("shift-{location_id}");
    seed_operator(db, tenant_id, &user_id).await;
    db.shifts().insert(&open_shift(&scope, &shift_id, &user_id)).await.unwrap();
    World {
        scope,
        user_id,
        shift_id,
    }
}

pub fn active_session(world: &World, id: &str, plate: &str, vehicle_type: VehicleType) -> ParkingSession {
    ParkingSession::open(OpenSession {
        id: id.to_string(),
        tenant_id: world.scope.tenant_id.clone(),
        location_id: world.scope.location_id.clone(),
        plate: plate.to_string(),
        vehicle_type,
        plan_type: PlanType::Hour,
        entry_time: Utc::now(),
        entry_shift_id: world.shift_id.clone(),
        ticket_number: None,
        created_by: world.user_id.clone(),
    })
}

pub fn hour_tariff(scope: &LocationScope, id: &str, vehicle_type: VehicleType, price: i64) -> Tariff {
    let now = Utc::now();
    Tariff {
        id: id.to_string(),
        tenant_id: scope.tenant_id.clone(),
        location_id: scope.location_id.clone(),
        vehicle_type,
        tariff_type: TariffType::Hour,
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

pub fn agreement(scope: &LocationScope, id: &str, kind: AgreementType, value: i64) -> Agreement {
    Agreement {
        id: id.to_string(),
        tenant_id: scope.tenant_id.clone(),
        location_id: scope.location_id.clone(),
        name: format!("Agreement {id}"),
        agreement_type: kind,
        value,
        is_active: true,
        created_at: Utc::now(),
    }
}

pub fn expense(world: &World, id: &str, amount: i64) -> Transaction {
    Transaction {
        id: id.to_string(),
        tenant_id: world.scope.tenant_id.clone(),
        location_id: world.scope.location_id.clone(),
        shift_id: world.shift_id.clone(),
        transaction_type: TransactionType::Expense,
        description: "Supplies".to_string(),
        amount,
        discount: 0,
        payment_method: PaymentMethod::Cash,
        receipt_number: None,
        session_id: None,
        wash_entry_id: None,
        created_by: world.user_id.clone(),
        created_at: Utc::now(),
    }
}
