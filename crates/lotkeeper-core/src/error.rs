//! # Error Types
//!
//! Domain-specific error types for lotkeeper-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  lotkeeper-core errors (this file)                                     │
//! │  ├── CoreError        - Domain rule violations                         │
//! │  └── ValidationError  - Field-level input failures                     │
//! │                                                                         │
//! │  lotkeeper-db errors (separate crate)                                  │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  lotkeeper-engine errors                                               │
//! │  └── EngineError      - What controllers see (Rejection body)          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → Rejection           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Session is not in a state that allows the requested transition.
    ///
    /// ## When This Occurs
    /// - Completing a session that is already COMPLETED
    /// - Cancelling a session that already left the lot
    #[error("Session {session_id} is {current_status}, cannot perform operation")]
    InvalidSessionStatus {
        session_id: String,
        current_status: String,
    },

    /// Shift is already closed.
    #[error("Shift {shift_id} is already closed")]
    ShiftClosed { shift_id: String },

    /// A tenant-scoped operation ran without a tenant context.
    ///
    /// ## When This Occurs
    /// - Missing tenant header on a tenant-scoped write
    /// - A Super Admin request that forgot to pick a tenant before writing
    ///
    /// Never defaulted to a global write.
    #[error("Tenant context is required for this operation")]
    MissingTenantContext,

    /// A location-scoped operation ran without a location context.
    #[error("Location context is required for this operation")]
    MissingLocationContext,

    /// The requested location does not belong to the resolved tenant.
    #[error("Location {location_id} does not belong to tenant {tenant_id}")]
    LocationTenantMismatch {
        location_id: String,
        tenant_id: String,
    },

    /// The tenant requested in the headers is not the user's tenant.
    #[error("Tenant {requested} is not accessible to this user")]
    TenantMismatch { requested: String },

    /// A tariff row cannot be interpreted by its pricing model.
    ///
    /// ## When This Occurs
    /// - BLOCKS tariff with `extra_frac_time_minutes = 0`
    /// - Negative prices in a stored tariff
    #[error("Tariff {tariff_id} is invalid: {reason}")]
    InvalidTariff { tariff_id: String, reason: String },

    /// A vehicle with this plate already has an ACTIVE session.
    #[error("Plate {plate} already has an active session ({session_id})")]
    ActiveSessionExists { plate: String, session_id: String },

    /// Capacity for the vehicle type is exhausted.
    #[error("Capacity reached for {vehicle_type}: {active}/{capacity}")]
    CapacityReached {
        vehicle_type: String,
        active: i64,
        capacity: i64,
    },

    /// Exit instant precedes the entry instant.
    #[error("Exit time {exit_time} is before entry time {entry_time}")]
    ExitBeforeEntry {
        entry_time: String,
        exit_time: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Every variant carries the offending field name.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid plate, invalid slug).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    /// Name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooShort { field, .. }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustNotBeNegative { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::CapacityReached {
            vehicle_type: "CAR".to_string(),
            active: 50,
            capacity: 50,
        };
        assert_eq!(err.to_string(), "Capacity reached for CAR: 50/50");

        let err = CoreError::ActiveSessionExists {
            plate: "ABC123".to_string(),
            session_id: "s-1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Plate ABC123 already has an active session (s-1)"
        );
    }

    #[test]
    fn test_validation_error_field() {
        let err = ValidationError::TooLong {
            field: "plate".to_string(),
            max: 12,
        };
        assert_eq!(err.field(), "plate");
        assert_eq!(err.to_string(), "plate must be at most 12 characters");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "plate".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
