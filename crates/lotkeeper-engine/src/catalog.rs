//! Tariff and agreement administration, and tariff lookup.
//!
//! Tariffs are unique per (location, vehicle type, tariff type); writing an
//! existing combination updates it in place. Agreements are deactivated,
//! never deleted, so completed sessions keep a valid `agreement_id`.

use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::error::EngineResult;
use crate::Engine;
use lotkeeper_core::pricing::PricingConfig;
use lotkeeper_core::tariff::TariffSet;
use lotkeeper_core::validation::{
    validate_amount, validate_name, validate_non_negative, validate_range, MAX_FREE_HOURS,
};
use lotkeeper_core::{
    Agreement, AgreementType, PricingModel, RequestContext, Tariff, TariffType, VehicleType,
};

/// Tariff fields an administrator sets.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TariffInput {
    pub vehicle_type: VehicleType,
    pub tariff_type: TariffType,
    #[serde(default)]
    pub pricing_model: PricingModel,
    pub base_price: i64,
    #[serde(default = "default_base_time")]
    pub base_time_minutes: i64,
    #[serde(default)]
    pub extra_frac_price: i64,
    #[serde(default)]
    pub extra_frac_time_minutes: i64,
    #[serde(default)]
    pub day_max_price: Option<i64>,
    #[serde(default)]
    pub day_min_hours: Option<i64>,
}

fn default_base_time() -> i64 {
    60
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAgreement {
    pub name: String,
    pub agreement_type: AgreementType,
    pub value: i64,
}

impl Engine {
    /// Creates or replaces the tariff for the input's vehicle and tariff
    /// type at the context location.
    pub async fn upsert_tariff(&self, ctx: &RequestContext, input: TariffInput) -> EngineResult<Tariff> {
        self.require_admin(ctx)?;
        validate_amount("base_price", input.base_price)?;
        validate_non_negative("base_time_minutes", input.base_time_minutes)?;
        validate_amount("extra_frac_price", input.extra_frac_price)?;
        if let Some(max) = input.day_max_price {
            validate_amount("day_max_price", max)?;
        }
        if let Some(hours) = input.day_min_hours {
            validate_non_negative("day_min_hours", hours)?;
        }
        let scope = self.guard_location(ctx).await?;

        let now = Utc::now();
        let tariff = Tariff {
            id: Uuid::new_v4().to_string(),
            tenant_id: scope.tenant_id.clone(),
            location_id: scope.location_id.clone(),
            vehicle_type: input.vehicle_type,
            tariff_type: input.tariff_type,
            pricing_model: input.pricing_model,
            base_price: input.base_price,
            base_time_minutes: input.base_time_minutes,
            extra_frac_price: input.extra_frac_price,
            extra_frac_time_minutes: input.extra_frac_time_minutes,
            day_max_price: input.day_max_price,
            day_min_hours: input.day_min_hours,
            created_at: now,
            updated_at: now,
        };
        // Reject rows the pricing engine could not bill with
        PricingConfig::from_tariff(&tariff)?;

        let stored = self.db.tariffs().upsert(&tariff).await?;
        info!(
            location_id = %scope.location_id,
            tariff_id = %stored.id,
            vehicle_type = %stored.vehicle_type,
            tariff_type = ?stored.tariff_type,
            base_price = stored.base_price,
            "Tariff saved"
        );
        Ok(stored)
    }

    /// Tariffs for `vehicle_type` at the context location. An empty set
    /// prices with the built-in default rates.
    pub async fn resolve_tariffs(&self, ctx: &RequestContext, vehicle_type: VehicleType) -> EngineResult<TariffSet> {
        let scope = self.guard_location(ctx).await?;
        let tariffs = self.db.tariffs().list_for_vehicle(&scope, vehicle_type).await?;
        Ok(TariffSet::new(vehicle_type, tariffs))
    }

    /// Every tariff visible to the context.
    pub async fn list_tariffs(&self, ctx: &RequestContext) -> EngineResult<Vec<Tariff>> {
        self.guard_tenant(ctx).await?;
        Ok(self.db.tariffs().list(&ctx.scope).await?)
    }

    pub async fn create_agreement(&self, ctx: &RequestContext, request: NewAgreement) -> EngineResult<Agreement> {
        self.require_admin(ctx)?;
        validate_name("name", &request.name)?;
        match request.agreement_type {
            AgreementType::Percentage => validate_range("value", request.value, 0, 100)?,
            AgreementType::FreeHours => validate_range("value", request.value, 1, MAX_FREE_HOURS)?,
            AgreementType::FlatDiscount => validate_amount("value", request.value)?,
        }
        let scope = self.guard_location(ctx).await?;

        let agreement = Agreement {
            id: Uuid::new_v4().to_string(),
            tenant_id: scope.tenant_id.clone(),
            location_id: scope.location_id.clone(),
            name: request.name.trim().to_string(),
            agreement_type: request.agreement_type,
            value: request.value,
            is_active: true,
            created_at: Utc::now(),
        };
        self.db.agreements().insert(&agreement).await?;

        info!(location_id = %scope.location_id, agreement_id = %agreement.id, "Agreement created");
        Ok(agreement)
    }

    pub async fn deactivate_agreement(&self, ctx: &RequestContext, agreement_id: &str) -> EngineResult<()> {
        self.require_admin(ctx)?;
        let scope = self.guard_location(ctx).await?;
        self.db
            .agreements()
            .set_active(&scope, agreement_id, false)
            .await?;

        info!(location_id = %scope.location_id, agreement_id, "Agreement deactivated");
        Ok(())
    }

    pub async fn list_agreements(&self, ctx: &RequestContext) -> EngineResult<Vec<Agreement>> {
        self.guard_tenant(ctx).await?;
        Ok(self.db.agreements().list(&ctx.scope).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::parking::ExitRequest;
    use crate::test_support::{seed_lot, test_engine};
    use lotkeeper_core::{PaymentMethod, Scope};

    fn hourly(vehicle_type: VehicleType, price: i64) -> TariffInput {
        TariffInput {
            vehicle_type,
            tariff_type: TariffType::Hour,
            pricing_model: PricingModel::Traditional,
            base_price: price,
            base_time_minutes: 60,
            extra_frac_price: 0,
            extra_frac_time_minutes: 0,
            day_max_price: None,
            day_min_hours: None,
        }
    }

    #[tokio::test]
    async fn test_upsert_replaces_same_combination() {
        let engine = test_engine().await;
        let lot = seed_lot(&engine, "t-1", "loc-1").await;

        let first = engine
            .upsert_tariff(&lot.admin, hourly(VehicleType::Motorcycle, 2000))
            .await
            .unwrap();
        let second = engine
            .upsert_tariff(&lot.admin, hourly(VehicleType::Motorcycle, 2500))
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.base_price, 2500);

        let set = engine
            .resolve_tariffs(&lot.operator, VehicleType::Motorcycle)
            .await
            .unwrap();
        assert_eq!(set.hour_rate().amount(), 2500);
    }

    #[tokio::test]
    async fn test_blocks_tariff_needs_extra_block_size() {
        let engine = test_engine().await;
        let lot = seed_lot(&engine, "t-1", "loc-1").await;

        let mut input = hourly(VehicleType::Car, 3000);
        input.pricing_model = PricingModel::Blocks;
        input.extra_frac_price = 1000;
        let err = engine.upsert_tariff(&lot.admin, input).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        let err = engine
            .upsert_tariff(&lot.admin, hourly(VehicleType::Car, -1))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_missing_tariffs_use_default_rates() {
        let engine = test_engine().await;
        let lot = seed_lot(&engine, "t-1", "loc-1").await;

        let set = engine
            .resolve_tariffs(&lot.operator, VehicleType::Motorcycle)
            .await
            .unwrap();
        assert!(set.is_empty());
        assert_eq!(set.hour_rate().amount(), 2000);
        assert_eq!(set.day_rate().amount(), 8000);
    }

    #[tokio::test]
    async fn test_tariff_listing_stays_in_tenant() {
        let engine = test_engine().await;
        let one = seed_lot(&engine, "t-1", "loc-1").await;
        seed_lot(&engine, "t-2", "loc-2").await;

        let tariffs = engine.list_tariffs(&one.admin).await.unwrap();
        assert_eq!(tariffs.len(), 1);
        assert!(tariffs.iter().all(|t| t.tenant_id == "t-1"));
    }

    #[tokio::test]
    async fn test_percentage_agreement_bounds() {
        let engine = test_engine().await;
        let lot = seed_lot(&engine, "t-1", "loc-1").await;

        let err = engine
            .create_agreement(
                &lot.admin,
                NewAgreement {
                    name: "Too generous".into(),
                    agreement_type: AgreementType::Percentage,
                    value: 150,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_oversized_values_rejected_at_creation() {
        let engine = test_engine().await;
        let lot = seed_lot(&engine, "t-1", "loc-1").await;

        let err = engine
            .create_agreement(
                &lot.admin,
                NewAgreement {
                    name: "Forever".into(),
                    agreement_type: AgreementType::FreeHours,
                    value: i64::MAX / 1000,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        let err = engine
            .upsert_tariff(&lot.admin, hourly(VehicleType::Car, i64::MAX / 2))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_exit_with_stored_oversized_agreement_is_free() {
        let engine = test_engine().await;
        let lot = seed_lot(&engine, "t-1", "loc-1").await;

        // Rows written before the bounds existed still have to bill cleanly
        let agreement = Agreement {
            id: "agr-huge".to_string(),
            tenant_id: "t-1".to_string(),
            location_id: "loc-1".to_string(),
            name: "Legacy".to_string(),
            agreement_type: AgreementType::FreeHours,
            value: i64::MAX / 1000,
            is_active: true,
            created_at: Utc::now(),
        };
        engine.db().agreements().insert(&agreement).await.unwrap();

        let entry = Utc::now() - chrono::Duration::minutes(130);
        engine
            .perform_entry_at(
                &lot.operator,
                crate::parking::EntryRequest {
                    plate: "ABC123".into(),
                    vehicle_type: VehicleType::Car,
                    plan_type: lotkeeper_core::PlanType::Hour,
                },
                entry,
            )
            .await
            .unwrap();
        let mut request = ExitRequest::new("ABC123", PaymentMethod::Cash);
        request.agreement_id = Some(agreement.id.clone());
        let summary = engine
            .perform_exit_at(&lot.operator, request, entry + chrono::Duration::minutes(130))
            .await
            .unwrap();
        assert_eq!(summary.original_cost.amount(), 9000);
        assert_eq!(summary.discount.amount(), 9000);
        assert!(summary.cost.is_zero());
    }

    #[tokio::test]
    async fn test_deactivated_agreement_no_longer_discounts() {
        let engine = test_engine().await;
        let lot = seed_lot(&engine, "t-1", "loc-1").await;

        let agreement = engine
            .create_agreement(
                &lot.admin,
                NewAgreement {
                    name: "Mall".into(),
                    agreement_type: AgreementType::FreeHours,
                    value: 1,
                },
            )
            .await
            .unwrap();
        engine.deactivate_agreement(&lot.admin, &agreement.id).await.unwrap();

        let stored = engine.list_agreements(&lot.admin).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert!(!stored[0].is_active);

        let entry = Utc::now() - chrono::Duration::minutes(60);
        engine
            .perform_entry_at(
                &lot.operator,
                crate::parking::EntryRequest {
                    plate: "ABC123".into(),
                    vehicle_type: VehicleType::Car,
                    plan_type: lotkeeper_core::PlanType::Hour,
                },
                entry,
            )
            .await
            .unwrap();
        let mut request = ExitRequest::new("ABC123", PaymentMethod::Cash);
        request.agreement_id = Some(agreement.id.clone());
        let summary = engine
            .perform_exit_at(&lot.operator, request, entry + chrono::Duration::minutes(60))
            .await
            .unwrap();
        assert_eq!(summary.discount.amount(), 0);
        assert_eq!(summary.cost.amount(), 3000);

        let err = engine.deactivate_agreement(&lot.admin, "missing").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);

        let all = engine.db().agreements().list(&Scope::tenant("t-1")).await.unwrap();
        assert_eq!(all.len(), 1);
    }
}
