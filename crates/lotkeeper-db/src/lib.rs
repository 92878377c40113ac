//! # lotkeeper-db: Database Layer for lotkeeper
//!
//! SQLite storage for tenants, locations, sessions, shifts and money
//! movements, accessed through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        lotkeeper Data Flow                              │
//! │                                                                         │
//! │  Engine operation (perform_exit)                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   lotkeeper-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐   │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │    │                │   │  (embedded)  │   │   │
//! │  │   │               │    │ SessionRepo    │   │              │   │   │
//! │  │   │ SqlitePool    │◄───│ LocationRepo   │   │ 001_init.sql │   │   │
//! │  │   │ begin() → tx  │    │ TransactionRepo│   │              │   │   │
//! │  │   └───────────────┘    └───────┬────────┘   └──────────────┘   │   │
//! │  │                                │ scope_filter                   │   │
//! │  │                                ▼ AND tenant_id = ? ...          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL)                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations, one per table
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lotkeeper_db::{Database, DbConfig};
//! use lotkeeper_core::TenantScope;
//!
//! let db = Database::new(DbConfig::new("lotkeeper.db")).await?;
//!
//! let scope = TenantScope { tenant_id: "t-1".into() };
//! let active = db.sessions().find_active_by_plate(&scope, "ABC123").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::agreement::AgreementRepository;
pub use repository::location::LocationRepository;
pub use repository::plan::PlanRepository;
pub use repository::session::SessionRepository;
pub use repository::setting::SettingRepository;
pub use repository::shift::ShiftRepository;
pub use repository::tariff::TariffRepository;
pub use repository::tenant::TenantRepository;
pub use repository::transaction::TransactionRepository;
pub use repository::usage::UsageRepository;
pub use repository::user::UserRepository;
pub use repository::wash::WashRepository;
