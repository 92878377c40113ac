//! # lotkeeper-engine: The Parking Core API
//!
//! What HTTP controllers call. Every operation takes a [`RequestContext`]
//! produced by [`Engine::authorize`], enforces the tenant/location boundary,
//! runs the usage limiter where a resource is created, and groups each
//! financial write with its domain write in one SQLite transaction.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          perform_exit                                   │
//! │                                                                         │
//! │  authorize(user, headers) ──► RequestContext { user, role, scope }      │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  guard_location ── tenant active? location belongs to tenant?           │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  reads (pool): active shift, active session, tariffs, settings          │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  pure core: quote() ──► DiscountSource::apply() ──► session.complete()  │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  BEGIN                                                                  │
//! │    UPDATE locations SET current_receipt_number + 1   (write lock)       │
//! │    UPDATE parking_sessions ... WHERE status = 'ACTIVE'                  │
//! │    INSERT INTO transactions (PARKING_REVENUE)                           │
//! │  COMMIT                  (any failure: nothing above is visible)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reads happen before `BEGIN` so the transaction's first statement is the
//! counter write and SQLite takes the write lock up front.
//!
//! ## Modules
//!
//! - [`scope`] - Context resolution and the tenant/location guard
//! - [`usage`] - Plan quota checks (soft / critical / blocked)
//! - [`settings`] - Effective grace period and capacity per location
//! - [`parking`] - Exit preview, entry, exit
//! - [`receipts`] - Standalone receipt numbers
//! - [`shifts`] - Shift open / close with cash reconciliation
//! - [`tenancy`] - Tenants, locations, users
//! - [`catalog`] - Tariffs and agreements
//! - [`wash`] - Wash checkout
//! - [`config`] - TOML / env configuration
//! - [`error`] - Rejection taxonomy

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod config;
pub mod error;
pub mod parking;
pub mod receipts;
pub mod scope;
pub mod settings;
pub mod shifts;
pub mod tenancy;
pub mod usage;
pub mod wash;

#[cfg(test)]
pub(crate) mod test_support;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::EngineConfig;
pub use error::{ConflictKind, EngineError, EngineResult, ErrorCode, Rejection};
pub use lotkeeper_core::scope::RequestHeaders;
pub use lotkeeper_core::RequestContext;

use std::sync::Arc;

use tracing::info;

use lotkeeper_db::Database;

// =============================================================================
// Engine
// =============================================================================

/// Shared handle to the parking core. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Engine {
    db: Database,
    config: Arc<EngineConfig>,
}

impl Engine {
    /// Validates `config`, opens the pool and runs migrations.
    pub async fn open(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let db = Database::new(config.db_config()).await?;
        info!(path = %config.database.path.display(), "Engine ready");
        Ok(Self::new(db, config))
    }

    /// Wraps an already-open database.
    pub fn new(db: Database, config: EngineConfig) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub async fn close(&self) {
        self.db.close().await;
    }
}
