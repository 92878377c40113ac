//! # Repository Module
//!
//! One repository per table.
//!
//! ## Scoping Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How Repositories Take Scope                          │
//! │                                                                         │
//! │  List / search        → &Scope          (Unscoped = no tenant filter)  │
//! │  Tenant-wide lookups  → &TenantScope    (plate uniqueness, counts)     │
//! │  Location operations  → &LocationScope  (counters, shifts, tariffs)    │
//! │                                                                         │
//! │  Every statement against a tenant-owned table carries                   │
//! │  `tenant_id = ?` unless the caller passed Scope::Unscoped.             │
//! │                                                                         │
//! │  Reads      → &self.pool                                               │
//! │  Writes     → generic executor: pool or `&mut *tx`                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`PlanRepository`] - Pricing plans
//! - [`TenantRepository`] - Tenant registration and status
//! - [`LocationRepository`] - Locations and their ticket/receipt counters
//! - [`UserRepository`] - Users
//! - [`ShiftRepository`] - Cash-drawer shifts
//! - [`SessionRepository`] - Parking sessions
//! - [`TariffRepository`] - Tariff rows
//! - [`AgreementRepository`] - Partner agreements
//! - [`TransactionRepository`] - Financial transactions
//! - [`SettingRepository`] - Hierarchical settings rows
//! - [`UsageRepository`] - Monthly usage counters
//! - [`WashRepository`] - Wash entries

pub mod agreement;
pub mod location;
pub mod plan;
pub mod scope_filter;
pub mod session;
pub mod setting;
pub mod shift;
pub mod tariff;
pub mod tenant;
pub mod transaction;
pub mod usage;
pub mod user;
pub mod wash;

pub use agreement::AgreementRepository;
pub use location::LocationRepository;
pub use plan::PlanRepository;
pub use session::SessionRepository;
pub use setting::SettingRepository;
pub use shift::ShiftRepository;
pub use tariff::TariffRepository;
pub use tenant::TenantRepository;
pub use transaction::TransactionRepository;
pub use usage::UsageRepository;
pub use user::UserRepository;
pub use wash::WashRepository;

#[cfg(test)]
pub(crate) mod test_support;
