//! # Usage Thresholds
//!
//! Pure quota math behind the usage limiter.
//!
//! ## Threshold Bands
//! ```text
//!   0 ─────────── soft ─────────── limit ─────────── hard ────────►  count
//!   │   NONE       │     SOFT        │    CRITICAL     │   BLOCKED
//!   │  proceed     │ proceed + warn  │ proceed + warn  │  reject (upgrade)
//!
//!   soft = floor(limit × soft_bps / 10000)    default 80%
//!   hard = floor(limit × hard_bps / 10000)    default 120%
//!   limit = -1  ⇒ unlimited, never warns, never blocks
//! ```
//!
//! Session counts are per tenant per calendar month ([`month_key`]);
//! location and user counts are live collection sizes.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::PricingPlan;
use crate::{DEFAULT_HARD_LIMIT_BPS, DEFAULT_SOFT_LIMIT_BPS, UNLIMITED};

/// A resource-creating action gated by the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub enum UsageAction {
    AddLocation,
    AddUser,
    CreateSession,
}

impl UsageAction {
    pub const fn as_str(&self) -> &'static str {
        match self {
            UsageAction::AddLocation => "addLocation",
            UsageAction::AddUser => "addUser",
            UsageAction::CreateSession => "createSession",
        }
    }
}

impl std::fmt::Display for UsageAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Warning band a count falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum WarningLevel {
    None,
    Soft,
    Critical,
    Blocked,
}

/// Quotas of a resolved plan. Negative limits mean unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLimits {
    pub max_locations: i64,
    pub max_users: i64,
    pub max_sessions: i64,
    pub soft_limit_bps: u32,
    pub hard_limit_bps: u32,
}

impl PlanLimits {
    /// Limits with the default 80% / 120% thresholds.
    pub const fn new(max_locations: i64, max_users: i64, max_sessions: i64) -> Self {
        Self {
            max_locations,
            max_users,
            max_sessions,
            soft_limit_bps: DEFAULT_SOFT_LIMIT_BPS,
            hard_limit_bps: DEFAULT_HARD_LIMIT_BPS,
        }
    }

    pub const fn limit_for(&self, action: UsageAction) -> i64 {
        match action {
            UsageAction::AddLocation => self.max_locations,
            UsageAction::AddUser => self.max_users,
            UsageAction::CreateSession => self.max_sessions,
        }
    }

    /// Evaluates `current_count` against the limit for `action`.
    pub fn evaluate(&self, action: UsageAction, current_count: i64) -> UsageDecision {
        evaluate(
            action,
            current_count,
            self.limit_for(action),
            self.soft_limit_bps,
            self.hard_limit_bps,
        )
    }
}

impl From<&PricingPlan> for PlanLimits {
    fn from(plan: &PricingPlan) -> Self {
        let bps = |value: i64, default: u32| u32::try_from(value).unwrap_or(default);
        Self {
            max_locations: plan.max_locations,
            max_users: plan.max_users,
            max_sessions: plan.max_sessions,
            soft_limit_bps: bps(plan.soft_limit_bps, DEFAULT_SOFT_LIMIT_BPS),
            hard_limit_bps: bps(plan.hard_limit_bps, DEFAULT_HARD_LIMIT_BPS),
        }
    }
}

/// Outcome of a quota check, returned to every creation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UsageDecision {
    pub action: UsageAction,
    pub allowed: bool,
    pub blocked: bool,
    pub current_count: i64,
    /// `None` when unlimited.
    pub limit: Option<i64>,
    pub soft_limit: Option<i64>,
    pub hard_limit: Option<i64>,
    pub warning_level: WarningLevel,
}

fn threshold(limit: i64, bps: u32) -> i64 {
    ((limit as i128 * bps as i128) / 10_000) as i64
}

/// Classifies `current_count` against `limit`.
///
/// ## Example
/// ```rust
/// use lotkeeper_core::usage::{evaluate, UsageAction, WarningLevel};
///
/// let d = evaluate(UsageAction::CreateSession, 85, 100, 8000, 12000);
/// assert!(d.allowed);
/// assert_eq!(d.warning_level, WarningLevel::Soft);
///
/// let d = evaluate(UsageAction::CreateSession, 120, 100, 8000, 12000);
/// assert!(d.blocked);
/// ```
pub fn evaluate(
    action: UsageAction,
    current_count: i64,
    limit: i64,
    soft_limit_bps: u32,
    hard_limit_bps: u32,
) -> UsageDecision {
    if limit <= UNLIMITED {
        return UsageDecision {
            action,
            allowed: true,
            blocked: false,
            current_count,
            limit: None,
            soft_limit: None,
            hard_limit: None,
            warning_level: WarningLevel::None,
        };
    }

    let soft = threshold(limit, soft_limit_bps);
    let hard = threshold(limit, hard_limit_bps);
    let blocked = current_count >= hard;

    let warning_level = if blocked {
        WarningLevel::Blocked
    } else if current_count >= limit {
        WarningLevel::Critical
    } else if current_count >= soft {
        WarningLevel::Soft
    } else {
        WarningLevel::None
    };

    UsageDecision {
        action,
        allowed: !blocked,
        blocked,
        current_count,
        limit: Some(limit),
        soft_limit: Some(soft),
        hard_limit: Some(hard),
        warning_level,
    }
}

/// Usage period key for an instant: `YYYY-MM`.
pub fn month_key(at: DateTime<Utc>) -> String {
    format!("{:04}-{:02}", at.year(), at.month())
}
