//! # Discount Resolution
//!
//! Exactly one discount source applies to an exit. Sources never stack.
//!
//! ```text
//!   agreement_id given and agreement ACTIVE? ──yes──► Agreement(agreement)
//!              │ no
//!              ▼
//!   manual amount > 0? ──────────────────────yes──► Manual(amount, reason)
//!              │ no
//!              ▼
//!            None
//! ```
//!
//! The resolved [`DiscountSource`] is then applied once to the calculated
//! cost. The discount is clamped to `[0, calculated]`, so the final cost is
//! never negative.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Agreement, AgreementType};

/// Where the exit discount comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum DiscountSource {
    None,
    Manual {
        amount: Money,
        reason: Option<String>,
    },
    Agreement {
        agreement: Agreement,
        /// Caller-supplied reason; the agreement name is used when absent.
        reason: Option<String>,
    },
}

impl DiscountSource {
    /// Resolves the single source to apply.
    ///
    /// An inactive agreement is ignored and resolution falls through to the
    /// manual discount.
    ///
    /// ## Example
    /// ```rust
    /// use lotkeeper_core::discount::DiscountSource;
    /// use lotkeeper_core::money::Money;
    ///
    /// let source = DiscountSource::resolve(None, Some(Money::from_amount(500)), Some("loyal".into()));
    /// assert!(matches!(source, DiscountSource::Manual { .. }));
    ///
    /// let none = DiscountSource::resolve(None, Some(Money::zero()), None);
    /// assert_eq!(none, DiscountSource::None);
    /// ```
    pub fn resolve(
        agreement: Option<Agreement>,
        manual_amount: Option<Money>,
        reason: Option<String>,
    ) -> Self {
        let reason = reason.filter(|r| !r.trim().is_empty());

        if let Some(agreement) = agreement.filter(|a| a.is_active) {
            return DiscountSource::Agreement { agreement, reason };
        }

        match manual_amount {
            Some(amount) if amount.is_positive() => DiscountSource::Manual { amount, reason },
            _ => DiscountSource::None,
        }
    }

    /// Applies the source to a calculated cost.
    ///
    /// `hour_rate` prices FREE_HOURS agreements.
    pub fn apply(&self, calculated: Money, hour_rate: Money) -> AppliedDiscount {
        let (raw, reason, agreement_id) = match self {
            DiscountSource::None => (Money::zero(), None, None),
            DiscountSource::Manual { amount, reason } => (*amount, reason.clone(), None),
            DiscountSource::Agreement { agreement, reason } => {
                let raw = match agreement.agreement_type {
                    AgreementType::FreeHours => hour_rate * agreement.value,
                    AgreementType::Percentage => calculated.percent(agreement.value),
                    AgreementType::FlatDiscount => Money::from_amount(agreement.value),
                };
                (
                    raw,
                    Some(reason.clone().unwrap_or_else(|| agreement.name.clone())),
                    Some(agreement.id.clone()),
                )
            }
        };

        let discount = raw.clamp_to(calculated);
        AppliedDiscount {
            original: calculated,
            discount,
            final_cost: calculated.saturating_sub(discount),
            reason,
            agreement_id,
        }
    }
}

/// Outcome of applying a discount source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AppliedDiscount {
    pub original: Money,
    pub discount: Money,
    pub final_cost: Money,
    pub reason: Option<String>,
    pub agreement_id: Option<String>,
}
