//! # Shift Reconciliation
//!
//! ```text
//!   expected   = base + income − expenses
//!   difference = declared − expected      (negative ⇒ drawer is short)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Shift, Transaction};

/// Cash-reconciliation summary returned when a shift closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ShiftSummary {
    pub base: Money,
    pub income: Money,
    pub expenses: Money,
    pub expected: Money,
    pub declared: Money,
    pub difference: Money,
}

impl ShiftSummary {
    /// Totals the shift's transactions against the declared drawer amount.
    pub fn reconcile(base: Money, transactions: &[Transaction], declared: Money) -> Self {
        let (income, expenses) = transactions.iter().fold(
            (Money::zero(), Money::zero()),
            |(income, expenses), tx| {
                if tx.transaction_type.is_income() {
                    (income + tx.amount_money(), expenses)
                } else {
                    (income, expenses + tx.amount_money())
                }
            },
        );
        let expected = base + income - expenses;
        Self {
            base,
            income,
            expenses,
            expected,
            declared,
            difference: declared - expected,
        }
    }
}

impl Shift {
    /// Closes an open shift, recording totals from `summary`.
    pub fn close(&mut self, summary: &ShiftSummary, at: DateTime<Utc>) -> CoreResult<()> {
        if !self.is_active {
            return Err(CoreError::ShiftClosed {
                shift_id: self.id.clone(),
            });
        }
        self.is_active = false;
        self.end_time = Some(at);
        self.total_income = summary.income.amount();
        self.total_expenses = summary.expenses.amount();
        self.declared_amount = Some(summary.declared.amount());
        Ok(())
    }
}
