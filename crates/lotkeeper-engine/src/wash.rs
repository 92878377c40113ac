//! Wash checkout.
//!
//! ```text
//! BEGIN
//!   receipt number (location write lock)
//!   INSERT wash_entries
//!   INSERT transactions (WASH_REVENUE, wash_entry_id)
//! COMMIT
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::EngineResult;
use crate::Engine;
use lotkeeper_core::validation::{validate_name, validate_non_negative, validate_plate};
use lotkeeper_core::{
    CounterKind, PaymentMethod, RequestContext, Transaction, TransactionType, WashEntry,
};
use lotkeeper_db::DbError;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WashCheckout {
    pub plate: String,
    pub service_name: String,
    pub price: i64,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WashReceipt {
    pub entry: WashEntry,
    pub transaction_id: String,
}

impl Engine {
    /// Records a paid wash at the context location.
    pub async fn perform_wash_checkout(&self, ctx: &RequestContext, checkout: WashCheckout) -> EngineResult<WashReceipt> {
        self.perform_wash_checkout_at(ctx, checkout, Utc::now()).await
    }

    pub async fn perform_wash_checkout_at(
        &self,
        ctx: &RequestContext,
        checkout: WashCheckout,
        now: DateTime<Utc>,
    ) -> EngineResult<WashReceipt> {
        let plate = validate_plate(&checkout.plate)?;
        validate_name("service_name", &checkout.service_name)?;
        validate_non_negative("price", checkout.price)?;

        let scope = self.guard_location(ctx).await?;
        let shift = self.active_shift(&scope, &ctx.user_id).await?;

        let mut tx = self.db.begin().await?;
        let receipt = self
            .db
            .locations()
            .next_number(&mut *tx, &scope, CounterKind::Receipt)
            .await?
            .to_string();

        let entry = WashEntry {
            id: Uuid::new_v4().to_string(),
            tenant_id: scope.tenant_id.clone(),
            location_id: scope.location_id.clone(),
            shift_id: shift.id.clone(),
            plate: plate.clone(),
            service_name: checkout.service_name.trim().to_string(),
            price: checkout.price,
            receipt_number: receipt.clone(),
            created_by: ctx.user_id.clone(),
            created_at: now,
        };
        self.db.washes().insert(&mut *tx, &entry).await?;

        let record = Transaction {
            id: Uuid::new_v4().to_string(),
            tenant_id: scope.tenant_id.clone(),
            location_id: scope.location_id.clone(),
            shift_id: shift.id,
            transaction_type: TransactionType::WashRevenue,
            description: format!("{} {plate}", entry.service_name),
            amount: entry.price,
            discount: 0,
            payment_method: checkout.payment_method,
            receipt_number: Some(receipt),
            session_id: None,
            wash_entry_id: Some(entry.id.clone()),
            created_by: ctx.user_id.clone(),
            created_at: now,
        };
        self.db.transactions().insert(&mut *tx, &record).await?;
        tx.commit().await.map_err(DbError::from)?;

        info!(
            location_id = %scope.location_id,
            wash_entry_id = %entry.id,
            plate = %plate,
            price = entry.price,
            receipt = %entry.receipt_number,
            "Wash checked out"
        );
        Ok(WashReceipt {
            entry,
            transaction_id: record.id,
        })
    }
}
