//! # lotkeeper-core: Pure Business Logic for the Parking Core
//!
//! This crate holds every rule of the parking core as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        lotkeeper Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │          HTTP controllers (out of this workspace)               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          lotkeeper-engine (scope guard, limiter, flows)         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ lotkeeper-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │ pricing  │ │ discount │ │ session  │ │  usage   │          │   │
//! │  │   │ tariff   │ │  money   │ │  shift   │ │  scope   │          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  lotkeeper-db (Database Layer)                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain entities (Tenant, Location, ParkingSession, Tariff, ...)
//! - [`money`] - Integer money type
//! - [`tariff`] - Tariff set indexing and hardcoded fallbacks
//! - [`pricing`] - The pricing engine (TRADITIONAL / MINUTE / BLOCKS / DAY)
//! - [`discount`] - Agreement vs. manual discount resolution
//! - [`session`] - Parking session state machine and capacity rule
//! - [`usage`] - Plan quota thresholds (soft / critical / blocked)
//! - [`scope`] - Tenant/location scope model and context resolution rules
//! - [`settings`] - Hierarchical system setting resolution
//! - [`shift`] - Cash reconciliation for shift close
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::{Duration, TimeZone, Utc};
//! use lotkeeper_core::pricing::{quote, PlanQuoteInput};
//! use lotkeeper_core::tariff::TariffSet;
//! use lotkeeper_core::{PlanType, VehicleType};
//!
//! let entry = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
//! let exit = entry + Duration::minutes(65);
//!
//! // No tariffs configured: CAR/HOUR falls back to 3000 per hour
//! let tariffs = TariffSet::new(VehicleType::Car, Vec::new());
//! let input = PlanQuoteInput { entry_time: entry, plan_type: PlanType::Hour, grace_period_minutes: 10 };
//! let result = quote(&input, &tariffs, exit).unwrap();
//!
//! assert_eq!(result.duration_minutes, 65);
//! assert_eq!(result.cost.amount(), 3000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod discount;
pub mod error;
pub mod money;
pub mod pricing;
pub mod scope;
pub mod session;
pub mod settings;
pub mod shift;
pub mod tariff;
pub mod types;
pub mod usage;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use scope::{LocationScope, RequestContext, Scope, TenantScope};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Grace period applied when no `grace_period` setting exists at any level.
pub const DEFAULT_GRACE_PERIOD_MINUTES: i64 = 5;

/// Default soft threshold (80% of the nominal plan limit), in basis points.
pub const DEFAULT_SOFT_LIMIT_BPS: u32 = 8_000;

/// Default hard threshold (120% of the nominal plan limit), in basis points.
pub const DEFAULT_HARD_LIMIT_BPS: u32 = 12_000;

/// A plan limit of `-1` means the quota is unlimited.
pub const UNLIMITED: i64 = -1;

/// Minutes in a billing day for the DAY plan.
pub const MINUTES_PER_DAY: i64 = 1_440;
