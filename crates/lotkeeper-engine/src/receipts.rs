//! Standalone receipt numbers for checkout flows that print a number
//! without going through [`Engine::perform_exit`].
//!
//! The counter increment is the only statement of its transaction, so the
//! SQLite write lock serialises concurrent callers and every caller sees a
//! distinct value.

use tracing::debug;

use crate::error::EngineResult;
use crate::Engine;
use lotkeeper_core::{CounterKind, RequestContext};
use lotkeeper_db::DbError;

impl Engine {
    /// Issues the next receipt number of `location_id`.
    pub async fn issue_receipt_number(&self, ctx: &RequestContext, location_id: &str) -> EngineResult<String> {
        let scope = self.guard_location_id(ctx, location_id).await?;

        let mut tx = self.db.begin().await?;
        let number = self
            .db
            .locations()
            .next_number(&mut *tx, &scope, CounterKind::Receipt)
            .await?;
        tx.commit().await.map_err(DbError::from)?;

        debug!(location_id = %scope.location_id, number, "Receipt number issued");
        Ok(number.to_string())
    }
}
