//! # Transaction Repository
//!
//! Financial records. Each one belongs to a shift; revenue records point
//! back at the session or wash entry they were charged for and are only
//! written inside the same database transaction as that entity.

use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use super::scope_filter::{select_scoped, ScopeColumns};
use crate::error::DbResult;
use lotkeeper_core::{Scope, TenantScope, Transaction};

/// Repository for financial transactions.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    pub async fn insert<'e, E>(&self, executor: E, record: &Transaction) -> DbResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        debug!(
            id = %record.id,
            transaction_type = ?record.transaction_type,
            amount = record.amount,
            receipt_number = ?record.receipt_number,
            "Inserting transaction"
        );

        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, tenant_id, location_id, shift_id, transaction_type, description,
                amount, discount, payment_method, receipt_number,
                session_id, wash_entry_id, created_by, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.tenant_id)
        .bind(&record.location_id)
        .bind(&record.shift_id)
        .bind(record.transaction_type)
        .bind(&record.description)
        .bind(record.amount)
        .bind(record.discount)
        .bind(record.payment_method)
        .bind(&record.receipt_number)
        .bind(&record.session_id)
        .bind(&record.wash_entry_id)
        .bind(&record.created_by)
        .bind(record.created_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Every transaction recorded during a shift, oldest first.
    pub async fn list_for_shift(&self, scope: &TenantScope, shift_id: &str) -> DbResult<Vec<Transaction>> {
        let records = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT * FROM transactions
            WHERE tenant_id = ? AND shift_id = ?
            ORDER BY created_at
            "#,
        )
        .bind(&scope.tenant_id)
        .bind(shift_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// The revenue record written for a session, if any.
    pub async fn find_for_session(
        &self,
        scope: &TenantScope,
        session_id: &str,
    ) -> DbResult<Option<Transaction>> {
        let record = sqlx::query_as::<_, Transaction>(
            "SELECT * FROM transactions WHERE tenant_id = ? AND session_id = ?",
        )
        .bind(&scope.tenant_id)
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    pub async fn list(&self, scope: &Scope) -> DbResult<Vec<Transaction>> {
        let mut query = select_scoped("transactions", scope, ScopeColumns::LOCATION_OWNED);
        query.push(" ORDER BY created_at");

        let records = query
            .build_query_as::<Transaction>()
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }
}
