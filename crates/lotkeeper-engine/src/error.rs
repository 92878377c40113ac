//! # Engine Errors
//!
//! Every engine call returns [`EngineResult`]. The calling layer turns an
//! [`EngineError`] into a [`Rejection`] body without inspecting variants.
//!
//! ## Mapping
//! ```text
//! ┌──────────────────────────────┬─────────────────┬──────────────────────┐
//! │ Source                       │ EngineError     │ ErrorCode            │
//! ├──────────────────────────────┼─────────────────┼──────────────────────┤
//! │ ValidationError              │ Validation      │ VALIDATION_ERROR     │
//! │ ActiveSessionExists          │ Conflict        │ CONFLICT             │
//! │ DbError::UniqueViolation     │ Conflict        │ CONFLICT             │
//! │ DbError::NotFound            │ NotFound        │ NOT_FOUND            │
//! │ UsageDecision.blocked        │ QuotaExceeded   │ QUOTA_EXCEEDED       │
//! │ Missing context / mismatch   │ Forbidden       │ FORBIDDEN            │
//! │ Connection, query, pool      │ Infrastructure  │ INFRASTRUCTURE       │
//! │ Bad configuration            │ Config          │ INTERNAL             │
//! └──────────────────────────────┴─────────────────┴──────────────────────┘
//! ```

use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use lotkeeper_core::usage::UsageAction;
use lotkeeper_core::{CoreError, ValidationError};
use lotkeeper_db::DbError;

pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Error Code
// =============================================================================

/// Machine-readable error code for the calling layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    Conflict,
    NotFound,
    QuotaExceeded,
    Forbidden,
    Infrastructure,
    Internal,
}

/// What kind of conflict was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictKind {
    /// The plate already has an ACTIVE session in the tenant.
    ActiveSession,
    /// The user already has an open shift at the location.
    ActiveShift,
    /// Capacity for the vehicle type is exhausted.
    CapacityReached,
    /// The session left the ACTIVE state under us.
    SessionNotActive,
    ShiftClosed,
    /// Any other unique key (slug, email, plan code).
    Duplicate,
}

/// One offending input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl From<ValidationError> for FieldError {
    fn from(err: ValidationError) -> Self {
        FieldError {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Engine Error
// =============================================================================

/// Rejections and failures surfaced by the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed or missing input. No state changed.
    #[error("Validation failed: {}", join_fields(.fields))]
    Validation { fields: Vec<FieldError> },

    /// The operation collides with existing state.
    ///
    /// ## When This Occurs
    /// - Entry for a plate that is already parked (id of the parked session)
    /// - Opening a second shift at the same location
    /// - Losing a concurrent-entry race at the unique index
    #[error("{message}")]
    Conflict {
        kind: ConflictKind,
        message: String,
        conflicting_id: Option<String>,
    },

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The usage limiter hard-blocked the action.
    ///
    /// Carries the counts so the caller can prompt an upgrade.
    #[error("Plan limit reached for {}: {current}/{limit}", .action.as_str())]
    QuotaExceeded {
        action: UsageAction,
        current: i64,
        limit: i64,
        hard_limit: i64,
    },

    /// The request crossed a tenant or location boundary, or lacked the
    /// context or role the operation needs.
    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    /// Store unavailable or query failed. Not retried here.
    #[error("Infrastructure failure: {0}")]
    Infrastructure(#[source] DbError),

    #[error("Configuration error: {0}")]
    Config(String),
}

fn join_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| f.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl EngineError {
    pub fn validation(err: impl Into<FieldError>) -> Self {
        EngineError::Validation {
            fields: vec![err.into()],
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        EngineError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        EngineError::Forbidden {
            reason: reason.into(),
        }
    }

    pub fn conflict(kind: ConflictKind, message: impl Into<String>, conflicting_id: Option<String>) -> Self {
        EngineError::Conflict {
            kind,
            message: message.into(),
            conflicting_id,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::Validation { .. } => ErrorCode::ValidationError,
            EngineError::Conflict { .. } => ErrorCode::Conflict,
            EngineError::NotFound { .. } => ErrorCode::NotFound,
            EngineError::QuotaExceeded { .. } => ErrorCode::QuotaExceeded,
            EngineError::Forbidden { .. } => ErrorCode::Forbidden,
            EngineError::Infrastructure(_) => ErrorCode::Infrastructure,
            EngineError::Config(_) => ErrorCode::Internal,
        }
    }

    pub fn conflict_kind(&self) -> Option<ConflictKind> {
        match self {
            EngineError::Conflict { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Body for the calling layer.
    ///
    /// Infrastructure and configuration details stay in the logs.
    pub fn to_rejection(&self) -> Rejection {
        let (message, details) = match self {
            EngineError::Validation { fields } => (self.to_string(), json!({ "fields": fields })),
            EngineError::Conflict {
                kind,
                conflicting_id,
                ..
            } => (
                self.to_string(),
                json!({ "kind": kind, "conflictingId": conflicting_id }),
            ),
            EngineError::NotFound { entity, id } => {
                (self.to_string(), json!({ "entity": entity, "id": id }))
            }
            EngineError::QuotaExceeded {
                action,
                current,
                limit,
                hard_limit,
            } => (
                self.to_string(),
                json!({
                    "action": action,
                    "currentCount": current,
                    "limit": limit,
                    "hardLimit": hard_limit,
                    "upgradeRequired": true,
                }),
            ),
            EngineError::Forbidden { .. } => (self.to_string(), serde_json::Value::Null),
            EngineError::Infrastructure(_) => (
                "The service is temporarily unavailable".to_string(),
                serde_json::Value::Null,
            ),
            EngineError::Config(_) => ("Internal error".to_string(), serde_json::Value::Null),
        };

        Rejection {
            code: self.code(),
            message,
            details,
        }
    }
}

/// Serializable rejection body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rejection {
    pub code: ErrorCode,
    pub message: String,
    pub details: serde_json::Value,
}

impl From<&EngineError> for Rejection {
    fn from(err: &EngineError) -> Self {
        err.to_rejection()
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<DbError> for EngineError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => EngineError::NotFound { entity, id },
            DbError::UniqueViolation { field, value } => EngineError::Conflict {
                kind: ConflictKind::Duplicate,
                message: format!("{field} '{value}' already exists"),
                conflicting_id: None,
            },
            DbError::ForeignKeyViolation { message } => EngineError::Validation {
                fields: vec![FieldError {
                    field: "reference".to_string(),
                    message,
                }],
            },
            other => {
                error!(error = %other, "Database failure");
                EngineError::Infrastructure(other)
            }
        }
    }
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::validation(err)
    }
}

impl From<CoreError> for EngineError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(v) => EngineError::validation(v),
            CoreError::ActiveSessionExists { plate, session_id } => EngineError::Conflict {
                kind: ConflictKind::ActiveSession,
                message: format!("Plate {plate} already has an active session"),
                conflicting_id: Some(session_id),
            },
            CoreError::CapacityReached { .. } => EngineError::Conflict {
                kind: ConflictKind::CapacityReached,
                message: err.to_string(),
                conflicting_id: None,
            },
            CoreError::InvalidSessionStatus { ref session_id, .. } => EngineError::Conflict {
                kind: ConflictKind::SessionNotActive,
                message: err.to_string(),
                conflicting_id: Some(session_id.clone()),
            },
            CoreError::ShiftClosed { ref shift_id } => EngineError::Conflict {
                kind: ConflictKind::ShiftClosed,
                message: err.to_string(),
                conflicting_id: Some(shift_id.clone()),
            },
            CoreError::MissingTenantContext
            | CoreError::MissingLocationContext
            | CoreError::LocationTenantMismatch { .. }
            | CoreError::TenantMismatch { .. } => EngineError::Forbidden {
                reason: err.to_string(),
            },
            CoreError::InvalidTariff { .. } => EngineError::Validation {
                fields: vec![FieldError {
                    field: "tariff".to_string(),
                    message: err.to_string(),
                }],
            },
            CoreError::ExitBeforeEntry { .. } => EngineError::Validation {
                fields: vec![FieldError {
                    field: "exit_time".to_string(),
                    message: err.to_string(),
                }],
            },
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Config(format!("Config file I/O failed: {err}"))
    }
}

impl From<toml::de::Error> for EngineError {
    fn from(err: toml::de::Error) -> Self {
        EngineError::Config(format!("Failed to parse config: {err}"))
    }
}

impl From<toml::ser::Error> for EngineError {
    fn from(err: toml::ser::Error) -> Self {
        EngineError::Config(format!("Failed to serialize config: {err}"))
    }
}
