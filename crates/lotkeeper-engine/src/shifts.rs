//! # Shifts
//!
//! An operator opens a shift with a cash float before taking entries, and
//! closes it with the counted cash.
//!
//! ```text
//! expected   = base + Σ income − Σ expenses      (this shift's transactions)
//! difference = declared − expected               (negative: cash missing)
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::error::{ConflictKind, EngineError, EngineResult};
use crate::Engine;
use lotkeeper_core::shift::ShiftSummary;
use lotkeeper_core::validation::validate_non_negative;
use lotkeeper_core::{LocationScope, Money, RequestContext, Shift};

/// A closed shift with its reconciliation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftClosure {
    pub shift: Shift,
    pub summary: ShiftSummary,
}

impl Engine {
    /// Opens a shift for the acting user at the context location.
    pub async fn open_shift(&self, ctx: &RequestContext, base_amount: i64) -> EngineResult<Shift> {
        validate_non_negative("base_amount", base_amount)?;
        let scope = self.guard_location(ctx).await?;

        if let Some(open) = self.db.shifts().find_active(&scope, &ctx.user_id).await? {
            return Err(active_shift_conflict(&ctx.user_id, Some(open.id)));
        }

        let shift = Shift {
            id: Uuid::new_v4().to_string(),
            tenant_id: scope.tenant_id.clone(),
            location_id: scope.location_id.clone(),
            user_id: ctx.user_id.clone(),
            start_time: Utc::now(),
            end_time: None,
            base_amount,
            total_income: 0,
            total_expenses: 0,
            declared_amount: None,
            is_active: true,
        };

        match self.db.shifts().insert(&shift).await {
            Ok(()) => {}
            Err(err) if err.is_unique_violation_on("shifts") => {
                let winner = self
                    .db
                    .shifts()
                    .find_active(&scope, &ctx.user_id)
                    .await?
                    .map(|s| s.id);
                return Err(active_shift_conflict(&ctx.user_id, winner));
            }
            Err(err) => return Err(err.into()),
        }

        info!(
            shift_id = %shift.id,
            user_id = %shift.user_id,
            location_id = %shift.location_id,
            base_amount,
            "Shift opened"
        );
        Ok(shift)
    }

    /// Closes the acting user's open shift at the context location.
    pub async fn close_shift(&self, ctx: &RequestContext, declared_amount: i64) -> EngineResult<ShiftClosure> {
        self.close_shift_at(ctx, declared_amount, Utc::now()).await
    }

    pub async fn close_shift_at(
        &self,
        ctx: &RequestContext,
        declared_amount: i64,
        at: DateTime<Utc>,
    ) -> EngineResult<ShiftClosure> {
        validate_non_negative("declared_amount", declared_amount)?;
        let scope = self.guard_location(ctx).await?;
        let mut shift = self.active_shift(&scope, &ctx.user_id).await?;

        let summary = self.reconcile(&scope, &shift, Money::from_amount(declared_amount)).await?;
        shift.close(&summary, at)?;

        match self.db.shifts().close(self.db.pool(), &shift).await {
            Ok(()) => {}
            Err(err) if err.is_not_found() => {
                return Err(EngineError::conflict(
                    ConflictKind::ShiftClosed,
                    format!("Shift {} was already closed", shift.id),
                    Some(shift.id.clone()),
                ));
            }
            Err(err) => return Err(err.into()),
        }

        info!(
            shift_id = %shift.id,
            expected = summary.expected.amount(),
            declared = summary.declared.amount(),
            difference = summary.difference.amount(),
            "Shift closed"
        );
        Ok(ShiftClosure { shift, summary })
    }

    async fn reconcile(
        &self,
        scope: &LocationScope,
        shift: &Shift,
        declared: Money,
    ) -> EngineResult<ShiftSummary> {
        let transactions = self
            .db
            .transactions()
            .list_for_shift(&scope.tenant(), &shift.id)
            .await?;
        Ok(ShiftSummary::reconcile(
            Money::from_amount(shift.base_amount),
            &transactions,
            declared,
        ))
    }
}

fn active_shift_conflict(user_id: &str, shift_id: Option<String>) -> EngineError {
    EngineError::conflict(
        ConflictKind::ActiveShift,
        format!("User {user_id} already has an open shift here"),
        shift_id,
    )
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use crate::error::{ConflictKind, ErrorCode};
    use crate::parking::{EntryRequest, ExitRequest};
    use crate::test_support::{seed_lot, test_engine};
    use lotkeeper_core::{PaymentMethod, PlanType, VehicleType};

    #[tokio::test]
    async fn test_second_open_shift_conflicts() {
        let engine = test_engine().await;
        let lot = seed_lot(&engine, "t-1", "loc-1").await;

        // The operator already holds shift-loc-1
        let err = engine.open_shift(&lot.operator, 10_000).await.unwrap_err();
        assert_eq!(err.conflict_kind(), Some(ConflictKind::ActiveShift));
        assert_eq!(err.to_rejection().details["conflictingId"], "shift-loc-1");

        let shift = engine.open_shift(&lot.admin, 10_000).await.unwrap();
        assert!(shift.is_active);
        assert_eq!(shift.user_id, lot.admin.user_id);
    }

    #[tokio::test]
    async fn test_negative_float_rejected() {
        let engine = test_engine().await;
        let lot = seed_lot(&engine, "t-1", "loc-1").await;

        let err = engine.open_shift(&lot.admin, -5).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_close_reconciles_shift_revenue() {
        let engine = test_engine().await;
        let lot = seed_lot(&engine, "t-1", "loc-1").await;
        engine.open_shift(&lot.admin, 50_000).await.unwrap();

        // 130 minutes at 3000/hour with 5 minutes grace: 9000
        let entry = Utc::now() - Duration::minutes(130);
        engine
            .perform_entry_at(
                &lot.admin,
                EntryRequest {
                    plate: "ABC123".into(),
                    vehicle_type: VehicleType::Car,
                    plan_type: PlanType::Hour,
                },
                entry,
            )
            .await
            .unwrap();
        engine
            .perform_exit_at(
                &lot.admin,
                ExitRequest::new("ABC123", PaymentMethod::Cash),
                entry + Duration::minutes(130),
            )
            .await
            .unwrap();

        let closure = engine.close_shift(&lot.admin, 58_000).await.unwrap();
        assert_eq!(closure.summary.income.amount(), 9000);
        assert_eq!(closure.summary.expected.amount(), 59_000);
        assert_eq!(closure.summary.difference.amount(), -1000);
        assert!(!closure.shift.is_active);
        assert_eq!(closure.shift.total_income, 9000);
        assert_eq!(closure.shift.declared_amount, Some(58_000));

        // Nothing left to close
        let err = engine.close_shift(&lot.admin, 0).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);

        // A new shift may be opened after closing
        engine.open_shift(&lot.admin, 0).await.unwrap();
    }
}
