//! # Seed Data Generator
//!
//! Populates a database with a demo tenant for local development.
//!
//! ## Usage
//! ```bash
//! cargo run -p lotkeeper-db --bin seed
//!
//! # Specify database path
//! cargo run -p lotkeeper-db --bin seed -- --db ./data/lotkeeper.db
//! ```
//!
//! ## Generated Data
//! - Pricing plans `basic`, `pro`, `enterprise`
//! - Tenant `demo-parking` on `pro` with one location
//! - HOUR and DAY tariffs for cars and motorcycles
//! - One admin and one operator pinned to the location
//! - Global settings: grace period, capacity flag, per-vehicle capacities

use std::env;

use anyhow::Context;
use chrono::Utc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use lotkeeper_core::settings::keys;
use lotkeeper_core::{
    Location, LocationSettings, PricingModel, PricingPlan, Tariff, TariffType, Tenant,
    TenantStatus, User, UserRole, VehicleType,
};
use lotkeeper_db::{Database, DbConfig};

/// (code, name, max_locations, max_users, max_sessions per month)
const PLANS: &[(&str, &str, i64, i64, i64)] = &[
    ("basic", "Basic", 1, 3, 1_000),
    ("pro", "Pro", 5, 20, 20_000),
    ("enterprise", "Enterprise", -1, -1, -1),
];

/// (vehicle, tariff type, base price, day cap, min hours for cap)
const TARIFFS: &[(VehicleType, TariffType, i64, Option<i64>, Option<i64>)] = &[
    (VehicleType::Car, TariffType::Hour, 3_000, Some(15_000), Some(6)),
    (VehicleType::Car, TariffType::Day, 15_000, None, None),
    (VehicleType::Motorcycle, TariffType::Hour, 2_000, Some(8_000), Some(5)),
    (VehicleType::Motorcycle, TariffType::Day, 8_000, None, None),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./lotkeeper_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("lotkeeper seed data generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./lotkeeper_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(path = %db_path, "Seeding database");

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .context("opening database")?;

    if db.tenants().get_by_slug("demo-parking").await?.is_some() {
        warn!("Demo tenant already exists, skipping seed. Delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();

    for (code, name, max_locations, max_users, max_sessions) in PLANS {
        db.plans()
            .insert(&PricingPlan {
                id: Uuid::new_v4().to_string(),
                code: code.to_string(),
                name: name.to_string(),
                max_locations: *max_locations,
                max_users: *max_users,
                max_sessions: *max_sessions,
                soft_limit_bps: 8_000,
                hard_limit_bps: 12_000,
                is_active: true,
                created_at: now,
            })
            .await
            .with_context(|| format!("inserting plan {code}"))?;
    }
    info!(count = PLANS.len(), "Pricing plans created");

    let tenant = Tenant {
        id: Uuid::new_v4().to_string(),
        name: "Demo Parking".to_string(),
        slug: "demo-parking".to_string(),
        plan_code: "pro".to_string(),
        status: TenantStatus::Active,
        max_locations: 5,
        max_users: 20,
        created_at: now,
        updated_at: now,
    };
    db.tenants().insert(&tenant).await?;

    let settings = LocationSettings {
        ticket_header: Some("DEMO PARKING - DOWNTOWN".to_string()),
        ticket_footer: Some("Thank you for parking with us".to_string()),
        printer_name: None,
        tax_rate_bps: 1_900,
    };
    let location = Location {
        id: Uuid::new_v4().to_string(),
        tenant_id: tenant.id.clone(),
        name: "Downtown".to_string(),
        address: Some("1 Main Street".to_string()),
        settings: serde_json::to_string(&settings)?,
        is_active: true,
        current_ticket_number: 0,
        current_receipt_number: 0,
        created_at: now,
        updated_at: now,
    };
    db.locations().insert(&location).await?;
    info!(tenant_id = %tenant.id, location_id = %location.id, "Demo tenant and location created");

    for (vehicle_type, tariff_type, base_price, day_max_price, day_min_hours) in TARIFFS {
        db.tariffs()
            .upsert(&Tariff {
                id: Uuid::new_v4().to_string(),
                tenant_id: tenant.id.clone(),
                location_id: location.id.clone(),
                vehicle_type: *vehicle_type,
                tariff_type: *tariff_type,
                pricing_model: PricingModel::Traditional,
                base_price: *base_price,
                base_time_minutes: 60,
                extra_frac_price: 0,
                extra_frac_time_minutes: 0,
                day_max_price: *day_max_price,
                day_min_hours: *day_min_hours,
                created_at: now,
                updated_at: now,
            })
            .await?;
    }
    info!(count = TARIFFS.len(), "Tariffs created");

    for (name, email, role, pinned) in [
        ("Demo Admin", "admin@demo-parking.example", UserRole::Admin, false),
        ("Demo Operator", "operator@demo-parking.example", UserRole::Operator, true),
    ] {
        db.users()
            .insert(&User {
                id: Uuid::new_v4().to_string(),
                tenant_id: Some(tenant.id.clone()),
                location_id: pinned.then(|| location.id.clone()),
                name: name.to_string(),
                email: email.to_string(),
                role,
                is_active: true,
                created_at: now,
            })
            .await?;
    }
    info!("Users created");

    db.settings().upsert(None, None, keys::GRACE_PERIOD, "5").await?;
    db.settings().upsert(None, None, keys::CHECK_CAPACITY, "false").await?;
    db.settings()
        .upsert(None, None, VehicleType::Car.capacity_setting_key(), "50")
        .await?;
    db.settings()
        .upsert(None, None, VehicleType::Motorcycle.capacity_setting_key(), "30")
        .await?;
    info!("Global settings created");

    db.close().await;
    info!("Seed complete");
    Ok(())
}
