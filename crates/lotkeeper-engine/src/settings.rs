//! # Effective Settings
//!
//! Grace period, capacity flag and per-vehicle capacity for one location,
//! read fresh on every request. A Location row beats a Tenant row, which
//! beats a Global row; `[pricing]` / `[capacity]` in the config apply when
//! no level holds a usable value.

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{EngineError, EngineResult};
use crate::Engine;
use lotkeeper_core::settings::{keys, Resolved, SettingLevel, SettingsView};
use lotkeeper_core::{LocationScope, RequestContext, SystemSetting, ValidationError, VehicleType};

/// Settings in force at one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveSettings {
    pub grace_period_minutes: i64,
    pub check_capacity: bool,
    pub car_capacity: Option<i64>,
    pub motorcycle_capacity: Option<i64>,
    pub other_capacity: Option<i64>,
}

impl EffectiveSettings {
    pub fn capacity(&self, vehicle_type: VehicleType) -> Option<i64> {
        match vehicle_type {
            VehicleType::Car => self.car_capacity,
            VehicleType::Motorcycle => self.motorcycle_capacity,
            VehicleType::Other => self.other_capacity,
        }
    }
}

/// Keys [`Engine::put_setting`] accepts.
fn is_known_key(key: &str) -> bool {
    key == keys::GRACE_PERIOD
        || key == keys::CHECK_CAPACITY
        || [VehicleType::Car, VehicleType::Motorcycle, VehicleType::Other]
            .iter()
            .any(|vt| vt.capacity_setting_key() == key)
}

fn warn_rejected<T>(key: &str, resolved: &Resolved<T>) {
    for (level, raw) in &resolved.rejected {
        warn!(key, ?level, value = %raw, "Ignoring unparseable setting");
    }
}

impl Engine {
    /// Resolves the settings in force at `scope`.
    pub async fn effective_settings(&self, scope: &LocationScope) -> EngineResult<EffectiveSettings> {
        let rows = self
            .db
            .settings()
            .list_visible(Some(&scope.tenant_id), Some(&scope.location_id))
            .await?;
        let view = SettingsView::new(rows, Some(&scope.tenant_id), Some(&scope.location_id));

        let grace = view.resolve_count(keys::GRACE_PERIOD);
        warn_rejected(keys::GRACE_PERIOD, &grace);

        let check = view.resolve_flag(keys::CHECK_CAPACITY);
        warn_rejected(keys::CHECK_CAPACITY, &check);

        let capacity = |vehicle_type: VehicleType| {
            let key = vehicle_type.capacity_setting_key();
            let resolved = view.resolve_count(key);
            warn_rejected(key, &resolved);
            resolved
                .value
                .or_else(|| self.config.capacity.for_vehicle(vehicle_type))
        };

        Ok(EffectiveSettings {
            grace_period_minutes: grace
                .value
                .unwrap_or(self.config.pricing.default_grace_period_minutes),
            check_capacity: check.value.unwrap_or(false),
            car_capacity: capacity(VehicleType::Car),
            motorcycle_capacity: capacity(VehicleType::Motorcycle),
            other_capacity: capacity(VehicleType::Other),
        })
    }

    /// Writes a setting at `level`.
    ///
    /// Global rows need a Super Admin; Tenant and Location rows need an
    /// admin of that tenant, and land on the tenant/location of `ctx`.
    pub async fn put_setting(
        &self,
        ctx: &RequestContext,
        level: SettingLevel,
        key: &str,
        value: &str,
    ) -> EngineResult<SystemSetting> {
        if !is_known_key(key) {
            return Err(EngineError::validation(ValidationError::NotAllowed {
                field: "key".to_string(),
                allowed: vec![
                    keys::GRACE_PERIOD.to_string(),
                    keys::CHECK_CAPACITY.to_string(),
                    VehicleType::Car.capacity_setting_key().to_string(),
                    VehicleType::Motorcycle.capacity_setting_key().to_string(),
                    VehicleType::Other.capacity_setting_key().to_string(),
                ],
            }));
        }

        let repo = self.db.settings();
        let setting = match level {
            SettingLevel::Global => {
                self.require_super_admin(ctx)?;
                repo.upsert(None, None, key, value).await?
            }
            SettingLevel::Tenant => {
                self.require_admin(ctx)?;
                let tenant = self.guard_tenant(ctx).await?;
                repo.upsert(Some(&tenant.tenant_id), None, key, value).await?
            }
            SettingLevel::Location => {
                self.require_admin(ctx)?;
                let scope = self.guard_location(ctx).await?;
                repo.upsert(Some(&scope.tenant_id), Some(&scope.location_id), key, value)
                    .await?
            }
        };

        info!(key, value, ?level, user_id = %ctx.user_id, "Setting updated");
        Ok(setting)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorCode;
    use crate::test_support::{seed_lot, test_engine};
    use lotkeeper_core::settings::{keys, SettingLevel};
    use lotkeeper_core::VehicleType;

    #[tokio::test]
    async fn test_defaults_come_from_config() {
        let engine = test_engine().await;
        let lot = seed_lot(&engine, "t-1", "loc-1").await;

        let settings = engine.effective_settings(&lot.scope).await.unwrap();
        assert_eq!(settings.grace_period_minutes, 5);
        assert!(!settings.check_capacity);
        assert_eq!(settings.capacity(VehicleType::Car), Some(50));
        assert_eq!(settings.capacity(VehicleType::Other), None);
    }

    #[tokio::test]
    async fn test_location_beats_tenant_beats_global() {
        let engine = test_engine().await;
        let lot = seed_lot(&engine, "t-1", "loc-1").await;
        let db = engine.db().settings();

        db.upsert(None, None, keys::GRACE_PERIOD, "10").await.unwrap();
        let s = engine.effective_settings(&lot.scope).await.unwrap();
        assert_eq!(s.grace_period_minutes, 10);

        db.upsert(Some("t-1"), None, keys::GRACE_PERIOD, "15").await.unwrap();
        let s = engine.effective_settings(&lot.scope).await.unwrap();
        assert_eq!(s.grace_period_minutes, 15);

        db.upsert(Some("t-1"), Some("loc-1"), keys::GRACE_PERIOD, "0").await.unwrap();
        let s = engine.effective_settings(&lot.scope).await.unwrap();
        assert_eq!(s.grace_period_minutes, 0);
    }

    #[tokio::test]
    async fn test_unparseable_value_falls_through() {
        let engine = test_engine().await;
        let lot = seed_lot(&engine, "t-1", "loc-1").await;
        let db = engine.db().settings();

        db.upsert(Some("t-1"), None, keys::GRACE_PERIOD, "12").await.unwrap();
        db.upsert(Some("t-1"), Some("loc-1"), keys::GRACE_PERIOD, "ten").await.unwrap();
        db.upsert(None, None, keys::CHECK_CAPACITY, "maybe").await.unwrap();

        let s = engine.effective_settings(&lot.scope).await.unwrap();
        assert_eq!(s.grace_period_minutes, 12);
        assert!(!s.check_capacity);
    }

    #[tokio::test]
    async fn test_put_setting_permissions() {
        let engine = test_engine().await;
        let lot = seed_lot(&engine, "t-1", "loc-1").await;

        let err = engine
            .put_setting(&lot.operator, SettingLevel::Location, keys::CHECK_CAPACITY, "true")
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Forbidden);

        let err = engine
            .put_setting(&lot.admin, SettingLevel::Global, keys::CHECK_CAPACITY, "true")
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Forbidden);

        let err = engine
            .put_setting(&lot.admin, SettingLevel::Tenant, "theme", "dark")
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        let row = engine
            .put_setting(&lot.admin, SettingLevel::Location, keys::CHECK_CAPACITY, "true")
            .await
            .unwrap();
        assert_eq!(row.location_id.as_deref(), Some("loc-1"));
        assert!(engine.effective_settings(&lot.scope).await.unwrap().check_capacity);
    }
}
