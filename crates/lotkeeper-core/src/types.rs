//! # Domain Types
//!
//! Core domain types used throughout lotkeeper.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Tenant      │──►│    Location     │──►│ ParkingSession  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  slug (unique)  │   │  settings blob  │   │  plate          │       │
//! │  │  plan_code      │   │  ticket counter │   │  status         │       │
//! │  │  status         │   │  receipt counter│   │  cost/discount  │       │
//! │  └─────────────────┘   └────────┬────────┘   └─────────────────┘       │
//! │                                 │                                       │
//! │            ┌────────────────────┼────────────────────┐                  │
//! │            ▼                    ▼                    ▼                  │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Tariff      │   │     Shift       │   │  Transaction    │       │
//! │  │  vehicle_type   │   │  user           │   │  PARKING_REVENUE│       │
//! │  │  tariff_type    │   │  base/income    │   │  WASH_REVENUE   │       │
//! │  │  pricing_model  │   │  expenses       │   │  receipt_number │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every entity has an `id` (UUID v4 string). Business identifiers such as
//! `slug`, `plate`, ticket and receipt numbers live beside it.
//!
//! All money columns are stored as plain `i64`; each entity exposes `Money`
//! accessors for arithmetic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Enumerations
// =============================================================================

/// Kind of vehicle entering the lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleType {
    Car,
    Motorcycle,
    Other,
}

impl VehicleType {
    /// Storage / wire representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            VehicleType::Car => "CAR",
            VehicleType::Motorcycle => "MOTORCYCLE",
            VehicleType::Other => "OTHER",
        }
    }

    /// Key of the per-vehicle capacity setting (`capacity_car`, ...).
    pub const fn capacity_setting_key(&self) -> &'static str {
        match self {
            VehicleType::Car => "capacity_car",
            VehicleType::Motorcycle => "capacity_motorcycle",
            VehicleType::Other => "capacity_other",
        }
    }
}

impl std::fmt::Display for VehicleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the stay is billed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanType {
    Hour,
    Day,
}

impl Default for PlanType {
    fn default() -> Self {
        PlanType::Hour
    }
}

/// Parking session lifecycle state.
///
/// ## State Machine
/// ```text
///            perform_entry
///                 │
///                 ▼
///            ┌─────────┐   perform_exit   ┌───────────┐
///            │ ACTIVE  │─────────────────►│ COMPLETED │
///            └────┬────┘                  └───────────┘
///                 │ cancel (reserved)
///                 ▼
///            ┌───────────┐
///            │ CANCELLED │
///            └───────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Active,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "ACTIVE",
            SessionStatus::Completed => "COMPLETED",
            SessionStatus::Cancelled => "CANCELLED",
        }
    }

    /// COMPLETED and CANCELLED accept no further transitions.
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, SessionStatus::Active)
    }
}

/// Time unit a tariff row prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TariffType {
    Minute,
    Hour,
    Day,
    Night,
    Month,
    Week,
    TwoWeeks,
}

/// Formula a tariff row is interpreted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PricingModel {
    Minute,
    Blocks,
    Traditional,
}

impl Default for PricingModel {
    fn default() -> Self {
        PricingModel::Traditional
    }
}

/// Partner discount arrangement kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgreementType {
    /// `value` = number of free hours, priced at the HOUR tariff.
    FreeHours,
    /// `value` = whole percent off.
    Percentage,
    /// `value` = fixed amount off.
    FlatDiscount,
}

/// Tenant account status. Tenants are archived, never hard-deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TenantStatus {
    Active,
    Suspended,
    Archived,
}

impl TenantStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TenantStatus::Active => "ACTIVE",
            TenantStatus::Suspended => "SUSPENDED",
            TenantStatus::Archived => "ARCHIVED",
        }
    }
}

/// Role of an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Platform operator; may run unscoped cross-tenant queries.
    SuperAdmin,
    /// Tenant administrator; may switch locations via headers.
    Admin,
    /// Lot operator; pinned to a fixed location when one is assigned.
    Operator,
}

impl UserRole {
    pub const fn is_super_admin(&self) -> bool {
        matches!(self, UserRole::SuperAdmin)
    }

    /// Admin roles may pick their location per request.
    pub const fn is_admin(&self) -> bool {
        matches!(self, UserRole::SuperAdmin | UserRole::Admin)
    }
}

/// How a checkout was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

/// Financial transaction category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    ParkingRevenue,
    WashRevenue,
    Income,
    Expense,
}

impl TransactionType {
    /// Whether the transaction adds cash to the drawer.
    pub const fn is_income(&self) -> bool {
        !matches!(self, TransactionType::Expense)
    }
}

/// Which per-location counter a sequential number is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterKind {
    Ticket,
    Receipt,
}

impl CounterKind {
    /// Column on `locations` holding the counter.
    pub const fn column(&self) -> &'static str {
        match self {
            CounterKind::Ticket => "current_ticket_number",
            CounterKind::Receipt => "current_receipt_number",
        }
    }
}

// =============================================================================
// Pricing Plan
// =============================================================================

/// A subscription plan with resource quotas.
///
/// A limit of `-1` means unlimited.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PricingPlan {
    pub id: String,
    /// Business code referenced by `Tenant.plan_code` (`basic`, `pro`, ...).
    pub code: String,
    pub name: String,
    pub max_locations: i64,
    pub max_users: i64,
    /// Sessions per calendar month.
    pub max_sessions: i64,
    /// Soft warning threshold in basis points of the limit (8000 = 80%).
    pub soft_limit_bps: i64,
    /// Hard block threshold in basis points of the limit (12000 = 120%).
    pub hard_limit_bps: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Tenant
// =============================================================================

/// A billed customer organisation.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Tenant {
    pub id: String,
    pub name: String,
    /// Unique, URL-safe.
    pub slug: String,
    pub plan_code: String,
    pub status: TenantStatus,
    /// Snapshot of the plan quota at registration.
    pub max_locations: i64,
    pub max_users: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Derived from status; only ACTIVE tenants may operate.
    pub fn is_active(&self) -> bool {
        self.status == TenantStatus::Active
    }
}

// =============================================================================
// User
// =============================================================================

/// An authenticated actor.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: String,
    /// `None` only for Super Admins.
    pub tenant_id: Option<String>,
    /// Fixed location assignment; overrides headers for non-admin roles.
    pub location_id: Option<String>,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Location
// =============================================================================

/// One physical parking site.
///
/// `current_ticket_number` and `current_receipt_number` are owned by this
/// row and only change inside a transaction holding the location write lock.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Location {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub address: Option<String>,
    /// JSON blob, see [`LocationSettings`].
    pub settings: String,
    pub is_active: bool,
    pub current_ticket_number: i64,
    pub current_receipt_number: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Location {
    /// Parses the settings blob. Unknown or malformed blobs yield defaults.
    pub fn parsed_settings(&self) -> LocationSettings {
        serde_json::from_str(&self.settings).unwrap_or_default()
    }
}

/// Per-location printing and tax settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct LocationSettings {
    pub ticket_header: Option<String>,
    pub ticket_footer: Option<String>,
    pub printer_name: Option<String>,
    /// Tax rate in basis points (1900 = 19%).
    pub tax_rate_bps: u32,
}

// =============================================================================
// Parking Session
// =============================================================================

/// One vehicle stay, from entry to exit.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ParkingSession {
    pub id: String,
    pub tenant_id: String,
    pub location_id: String,
    /// Normalised (trimmed, uppercase) plate.
    pub plate: String,
    pub vehicle_type: VehicleType,
    pub plan_type: PlanType,
    #[ts(as = "String")]
    pub entry_time: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub exit_time: Option<DateTime<Utc>>,
    /// Final charged amount; `None` while ACTIVE.
    pub cost: Option<i64>,
    pub status: SessionStatus,
    pub entry_shift_id: String,
    pub exit_shift_id: Option<String>,
    pub discount: i64,
    pub discount_reason: Option<String>,
    pub agreement_id: Option<String>,
    /// Per-location sequential ticket number stamped at entry.
    pub ticket_number: Option<String>,
    pub created_by: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl ParkingSession {
    pub fn cost_money(&self) -> Option<Money> {
        self.cost.map(Money::from_amount)
    }

    pub fn discount_money(&self) -> Money {
        Money::from_amount(self.discount)
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }
}

// =============================================================================
// Tariff
// =============================================================================

/// A priced rule for a vehicle type and time unit.
///
/// At most one row per (location, vehicle_type, tariff_type).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Tariff {
    pub id: String,
    pub tenant_id: String,
    pub location_id: String,
    pub vehicle_type: VehicleType,
    pub tariff_type: TariffType,
    pub pricing_model: PricingModel,
    /// TRADITIONAL: hour rate. MINUTE: per-minute price. BLOCKS: first block.
    pub base_price: i64,
    pub base_time_minutes: i64,
    pub extra_frac_price: i64,
    pub extra_frac_time_minutes: i64,
    /// Flat-rate cap.
    pub day_max_price: Option<i64>,
    /// Minimum stay (hours) before the cap applies.
    pub day_min_hours: Option<i64>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Tariff {
    pub fn base_price_money(&self) -> Money {
        Money::from_amount(self.base_price)
    }
}

// =============================================================================
// Agreement
// =============================================================================

/// A partner discount arrangement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Agreement {
    pub id: String,
    pub tenant_id: String,
    pub location_id: String,
    pub name: String,
    pub agreement_type: AgreementType,
    /// Meaning depends on `agreement_type`.
    pub value: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Shift
// =============================================================================

/// A cash-drawer session opened by an operator at one location.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Shift {
    pub id: String,
    pub tenant_id: String,
    pub location_id: String,
    pub user_id: String,
    #[ts(as = "String")]
    pub start_time: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub end_time: Option<DateTime<Utc>>,
    pub base_amount: i64,
    pub total_income: i64,
    pub total_expenses: i64,
    pub declared_amount: Option<i64>,
    pub is_active: bool,
}

// =============================================================================
// Transaction
// =============================================================================

/// A financial record. Amounts are always non-negative; the type carries
/// the direction.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Transaction {
    pub id: String,
    pub tenant_id: String,
    pub location_id: String,
    pub shift_id: String,
    pub transaction_type: TransactionType,
    pub description: String,
    pub amount: i64,
    pub discount: i64,
    pub payment_method: PaymentMethod,
    pub receipt_number: Option<String>,
    pub session_id: Option<String>,
    pub wash_entry_id: Option<String>,
    pub created_by: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn amount_money(&self) -> Money {
        Money::from_amount(self.amount)
    }
}

// =============================================================================
// System Setting
// =============================================================================

/// One key/value setting row at Global, Tenant or Location level.
///
/// | tenant_id | location_id | level    |
/// |-----------|-------------|----------|
/// | NULL      | NULL        | Global   |
/// | set       | NULL        | Tenant   |
/// | set       | set         | Location |
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SystemSetting {
    pub id: String,
    pub tenant_id: Option<String>,
    pub location_id: Option<String>,
    pub key: String,
    pub value: String,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Usage Record
// =============================================================================

/// Sessions created by a tenant in one calendar month.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct UsageRecord {
    pub tenant_id: String,
    /// `YYYY-MM`
    pub period: String,
    pub sessions_count: i64,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Wash Entry
// =============================================================================

/// A paid wash service.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct WashEntry {
    pub id: String,
    pub tenant_id: String,
    pub location_id: String,
    pub shift_id: String,
    pub plate: String,
    pub service_name: String,
    pub price: i64,
    pub receipt_number: String,
    pub created_by: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_wire_format() {
        assert_eq!(
            serde_json::to_string(&VehicleType::Motorcycle).unwrap(),
            "\"MOTORCYCLE\""
        );
        assert_eq!(
            serde_json::to_string(&TariffType::TwoWeeks).unwrap(),
            "\"TWO_WEEKS\""
        );
        assert_eq!(
            serde_json::to_string(&AgreementType::FreeHours).unwrap(),
            "\"FREE_HOURS\""
        );
        let parsed: TransactionType = serde_json::from_str("\"PARKING_REVENUE\"").unwrap();
        assert_eq!(parsed, TransactionType::ParkingRevenue);
    }

    #[test]
    fn test_session_status_terminal() {
        assert!(!SessionStatus::Active.is_terminal());
        assert!(SessionStatus::Completed.is_terminal());
        assert!(SessionStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_roles() {
        assert!(UserRole::SuperAdmin.is_super_admin());
        assert!(UserRole::Admin.is_admin());
        assert!(!UserRole::Operator.is_admin());
    }

    #[test]
    fn test_location_settings_parse() {
        let now = Utc::now();
        let mut location = Location {
            id: "loc-1".to_string(),
            tenant_id: "t-1".to_string(),
            name: "Downtown".to_string(),
            address: None,
            settings: r#"{"ticket_header":"PARKING DOWNTOWN","tax_rate_bps":1900}"#.to_string(),
            is_active: true,
            current_ticket_number: 0,
            current_receipt_number: 0,
            created_at: now,
            updated_at: now,
        };
        let settings = location.parsed_settings();
        assert_eq!(settings.ticket_header.as_deref(), Some("PARKING DOWNTOWN"));
        assert_eq!(settings.tax_rate_bps, 1900);

        location.settings = "not json".to_string();
        assert_eq!(location.parsed_settings(), LocationSettings::default());
    }

    #[test]
    fn test_counter_columns() {
        assert_eq!(CounterKind::Ticket.column(), "current_ticket_number");
        assert_eq!(CounterKind::Receipt.column(), "current_receipt_number");
    }
}
