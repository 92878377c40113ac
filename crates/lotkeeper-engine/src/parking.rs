//! # Parking Flows
//!
//! Exit preview, entry and exit.
//!
//! ## Entry
//! ```text
//! validate plate ─► guard location ─► usage gate (createSession)
//!      ─► active shift? ─► plate free in tenant? ─► capacity (if enabled)
//!      ─► BEGIN
//!           ticket number (location write lock)
//!           INSERT session            ◄── unique (tenant, plate) WHERE ACTIVE
//!           usage_records += 1
//!         COMMIT
//! ```
//!
//! ## Exit
//! ```text
//! validate plate ─► guard location ─► active shift? ─► active session?
//!      ─► tariffs + grace ─► quote ─► discount ─► session.complete()
//!      ─► BEGIN
//!           receipt number (location write lock)
//!           UPDATE session ... WHERE status = 'ACTIVE'
//!           INSERT transaction (PARKING_REVENUE)
//!         COMMIT
//! ```
//!
//! The pre-checks give friendly rejections; the unique index and the
//! `status = 'ACTIVE'` guard decide races between concurrent requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ConflictKind, EngineError, EngineResult};
use crate::Engine;
use lotkeeper_core::discount::DiscountSource;
use lotkeeper_core::pricing::{quote, PlanQuoteInput, PriceQuote};
use lotkeeper_core::session::{check_capacity, ensure_plate_free, ExitStamp, OpenSession};
use lotkeeper_core::tariff::TariffSet;
use lotkeeper_core::usage::{month_key, UsageAction, UsageDecision};
use lotkeeper_core::validation::{validate_non_negative, validate_plate};
use lotkeeper_core::{
    CounterKind, LocationScope, Money, ParkingSession, PaymentMethod, PlanType, RequestContext,
    Shift, TenantScope, Transaction, TransactionType, VehicleType,
};
use lotkeeper_db::DbError;

// =============================================================================
// Requests / Results
// =============================================================================

/// Input of [`Engine::perform_entry`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryRequest {
    pub plate: String,
    pub vehicle_type: VehicleType,
    pub plan_type: PlanType,
}

/// A created session plus the usage decision that admitted it, so the
/// caller can surface soft/critical warnings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryOutcome {
    pub session: ParkingSession,
    pub usage: UsageDecision,
}

/// Input of [`Engine::perform_exit`].
///
/// When both `agreement_id` and `discount` are given, an active agreement
/// wins and the manual amount is ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitRequest {
    pub plate: String,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub discount: Option<i64>,
    #[serde(default)]
    pub discount_reason: Option<String>,
    #[serde(default)]
    pub agreement_id: Option<String>,
}

impl ExitRequest {
    pub fn new(plate: impl Into<String>, payment_method: PaymentMethod) -> Self {
        Self {
            plate: plate.into(),
            payment_method,
            discount: None,
            discount_reason: None,
            agreement_id: None,
        }
    }
}

/// What an exit charged.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitSummary {
    pub session: ParkingSession,
    /// Amount charged, after discount.
    pub cost: Money,
    pub original_cost: Money,
    pub discount: Money,
    pub duration_minutes: i64,
    pub hourly_rate: Money,
    pub receipt_number: String,
    pub transaction_id: String,
}

// =============================================================================
// Operations
// =============================================================================

impl Engine {
    /// Prices the active session for `plate` as if it left now. Read-only.
    pub async fn compute_exit_preview(&self, ctx: &RequestContext, plate: &str) -> EngineResult<PriceQuote> {
        self.preview_at(ctx, plate, Utc::now()).await
    }

    /// [`Engine::compute_exit_preview`] at a given instant.
    pub async fn preview_at(
        &self,
        ctx: &RequestContext,
        plate: &str,
        now: DateTime<Utc>,
    ) -> EngineResult<PriceQuote> {
        let plate = validate_plate(plate)?;
        let tenant = self.guard_tenant(ctx).await?;
        let session = self
            .find_parked(&tenant, ctx.scope.location_id(), &plate)
            .await?;
        let (price, _) = self.price_session(&session, now).await?;

        debug!(plate = %plate, cost = price.cost.amount(), minutes = price.duration_minutes, "Exit preview");
        Ok(price)
    }

    /// Admits a vehicle.
    pub async fn perform_entry(&self, ctx: &RequestContext, request: EntryRequest) -> EngineResult<EntryOutcome> {
        self.perform_entry_at(ctx, request, Utc::now()).await
    }

    /// [`Engine::perform_entry`] with an explicit entry instant.
    pub async fn perform_entry_at(
        &self,
        ctx: &RequestContext,
        request: EntryRequest,
        now: DateTime<Utc>,
    ) -> EngineResult<EntryOutcome> {
        let plate = validate_plate(&request.plate)?;
        let scope = self.guard_location(ctx).await?;
        let tenant = scope.tenant();

        let usage = self
            .ensure_usage_allowed_at(&tenant, UsageAction::CreateSession, now)
            .await?;

        let shift = self.active_shift(&scope, &ctx.user_id).await?;

        let existing = self.db.sessions().find_active_by_plate(&tenant, &plate).await?;
        ensure_plate_free(existing.as_ref())?;

        let settings = self.effective_settings(&scope).await?;
        if settings.check_capacity {
            let capacity = settings.capacity(request.vehicle_type);
            let active = self
                .db
                .sessions()
                .count_active(&scope, request.vehicle_type)
                .await?;
            check_capacity(request.vehicle_type, active, capacity)?;
        }

        let mut tx = self.db.begin().await?;
        let ticket = self
            .db
            .locations()
            .next_number(&mut *tx, &scope, CounterKind::Ticket)
            .await?;

        let session = ParkingSession::open(OpenSession {
            id: Uuid::new_v4().to_string(),
            tenant_id: scope.tenant_id.clone(),
            location_id: scope.location_id.clone(),
            plate: plate.clone(),
            vehicle_type: request.vehicle_type,
            plan_type: request.plan_type,
            entry_time: now,
            entry_shift_id: shift.id.clone(),
            ticket_number: Some(ticket.to_string()),
            created_by: ctx.user_id.clone(),
        });

        if let Err(err) = self.db.sessions().insert(&mut *tx, &session).await {
            tx.rollback().await.map_err(DbError::from)?;
            return Err(self.entry_insert_failed(&tenant, &plate, err).await);
        }

        self.db
            .usage()
            .increment_sessions(&mut *tx, &tenant, &month_key(now))
            .await?;
        tx.commit().await.map_err(DbError::from)?;

        info!(
            tenant_id = %scope.tenant_id,
            location_id = %scope.location_id,
            session_id = %session.id,
            plate = %plate,
            ticket,
            "Vehicle entered"
        );

        Ok(EntryOutcome { session, usage })
    }

    /// Checks a vehicle out and records the revenue.
    pub async fn perform_exit(&self, ctx: &RequestContext, request: ExitRequest) -> EngineResult<ExitSummary> {
        self.perform_exit_at(ctx, request, Utc::now()).await
    }

    /// [`Engine::perform_exit`] with an explicit exit instant.
    pub async fn perform_exit_at(
        &self,
        ctx: &RequestContext,
        request: ExitRequest,
        now: DateTime<Utc>,
    ) -> EngineResult<ExitSummary> {
        let plate = validate_plate(&request.plate)?;
        if let Some(amount) = request.discount {
            validate_non_negative("discount", amount)?;
        }

        let scope = self.guard_location(ctx).await?;
        let shift = self.active_shift(&scope, &ctx.user_id).await?;
        let mut session = self
            .find_parked(&scope.tenant(), Some(scope.location_id.as_str()), &plate)
            .await?;

        let (price, tariffs) = self.price_session(&session, now).await?;

        let agreement = match &request.agreement_id {
            Some(id) => {
                let found = self.db.agreements().get(&scope, id).await?;
                if found.as_ref().map_or(true, |a| !a.is_active) {
                    debug!(agreement_id = %id, "Agreement missing or inactive, using manual discount");
                }
                found
            }
            None => None,
        };
        let source = DiscountSource::resolve(
            agreement,
            request.discount.map(Money::from_amount),
            request.discount_reason.clone(),
        );
        let applied = source.apply(price.cost, tariffs.hour_rate());

        session.complete(ExitStamp {
            exit_time: now,
            exit_shift_id: shift.id.clone(),
            applied: applied.clone(),
        })?;

        let mut tx = self.db.begin().await?;
        let receipt = self
            .db
            .locations()
            .next_number(&mut *tx, &scope, CounterKind::Receipt)
            .await?
            .to_string();

        match self.db.sessions().complete(&mut *tx, &session).await {
            Ok(()) => {}
            Err(err) if err.is_not_found() => {
                return Err(EngineError::conflict(
                    ConflictKind::SessionNotActive,
                    format!("Session for plate {plate} was already closed"),
                    Some(session.id.clone()),
                ));
            }
            Err(err) => return Err(err.into()),
        }

        let record = Transaction {
            id: Uuid::new_v4().to_string(),
            tenant_id: scope.tenant_id.clone(),
            location_id: scope.location_id.clone(),
            shift_id: shift.id.clone(),
            transaction_type: TransactionType::ParkingRevenue,
            description: format!("Parking {plate}"),
            amount: applied.final_cost.amount(),
            discount: applied.discount.amount(),
            payment_method: request.payment_method,
            receipt_number: Some(receipt.clone()),
            session_id: Some(session.id.clone()),
            wash_entry_id: None,
            created_by: ctx.user_id.clone(),
            created_at: now,
        };
        self.db.transactions().insert(&mut *tx, &record).await?;
        tx.commit().await.map_err(DbError::from)?;

        info!(
            tenant_id = %scope.tenant_id,
            location_id = %scope.location_id,
            session_id = %session.id,
            plate = %plate,
            cost = applied.final_cost.amount(),
            discount = applied.discount.amount(),
            receipt = %receipt,
            "Vehicle exited"
        );

        Ok(ExitSummary {
            session,
            cost: applied.final_cost,
            original_cost: applied.original,
            discount: applied.discount,
            duration_minutes: price.duration_minutes,
            hourly_rate: price.hourly_rate,
            receipt_number: receipt,
            transaction_id: record.id,
        })
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    pub(crate) async fn active_shift(&self, scope: &LocationScope, user_id: &str) -> EngineResult<Shift> {
        self.db
            .shifts()
            .find_active(scope, user_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Active shift", user_id))
    }

    /// The ACTIVE session for `plate`, restricted to `location_id` when the
    /// request carries one.
    async fn find_parked(
        &self,
        tenant: &TenantScope,
        location_id: Option<&str>,
        plate: &str,
    ) -> EngineResult<ParkingSession> {
        self.db
            .sessions()
            .find_active_by_plate(tenant, plate)
            .await?
            .filter(|s| location_id.map_or(true, |loc| s.location_id == loc))
            .ok_or_else(|| EngineError::not_found("Active session", plate))
    }

    /// Quotes `session` with its own location's tariffs and grace period.
    async fn price_session(
        &self,
        session: &ParkingSession,
        now: DateTime<Utc>,
    ) -> EngineResult<(PriceQuote, TariffSet)> {
        let scope = LocationScope::new(&session.tenant_id, &session.location_id);
        let tariffs = TariffSet::new(
            session.vehicle_type,
            self.db
                .tariffs()
                .list_for_vehicle(&scope, session.vehicle_type)
                .await?,
        );
        let settings = self.effective_settings(&scope).await?;

        let input = PlanQuoteInput {
            entry_time: session.entry_time,
            plan_type: session.plan_type,
            grace_period_minutes: settings.grace_period_minutes,
        };
        let price = quote(&input, &tariffs, now)?;
        Ok((price, tariffs))
    }

    /// Maps a failed session insert. A unique violation means another
    /// request parked the plate between our check and our insert.
    async fn entry_insert_failed(&self, tenant: &TenantScope, plate: &str, err: DbError) -> EngineError {
        if !err.is_unique_violation_on("parking_sessions") {
            return err.into();
        }

        let winner = match self.db.sessions().find_active_by_plate(tenant, plate).await {
            Ok(found) => found.map(|s| s.id),
            Err(lookup) => {
                debug!(error = %lookup, "Could not load the conflicting session");
                None
            }
        };
        info!(tenant_id = %tenant.tenant_id, plate, ?winner, "Lost concurrent entry race");

        EngineError::conflict(
            ConflictKind::ActiveSession,
            format!("Plate {plate} already has an active session"),
            winner,
        )
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
