//! # Validation Module
//!
//! Input validation for values arriving from controllers.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Controller (out of this workspace)                           │
//! │  └── Deserialization, basic shape                                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Engine entry points                                          │
//! │  └── THIS MODULE: field rules (plate, slug, names, amounts)            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── UNIQUE and partial UNIQUE indexes                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum plate length after normalisation.
pub const MAX_PLATE_LEN: usize = 12;

/// Maximum length for names and free-text labels.
pub const MAX_NAME_LEN: usize = 120;

/// Largest price or discount an administrator may configure.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

/// Largest FREE_HOURS grant an agreement may carry (one leap year).
pub const MAX_FREE_HOURS: i64 = 8_784;

// =============================================================================
// Plates
// =============================================================================

/// Normalises a plate: trims, uppercases, and drops inner spaces and dashes.
///
/// ## Example
/// ```rust
/// use lotkeeper_core::validation::normalize_plate;
///
/// assert_eq!(normalize_plate(" abc-123 "), "ABC123");
/// ```
pub fn normalize_plate(plate: &str) -> String {
    plate
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .flat_map(char::to_uppercase)
        .collect()
}

/// Validates and normalises a plate.
///
/// ## Rules
/// - Not empty after normalisation
/// - At most 12 characters
/// - ASCII letters and digits only
pub fn validate_plate(plate: &str) -> ValidationResult<String> {
    let plate = normalize_plate(plate);

    if plate.is_empty() {
        return Err(ValidationError::Required {
            field: "plate".to_string(),
        });
    }

    if plate.len() > MAX_PLATE_LEN {
        return Err(ValidationError::TooLong {
            field: "plate".to_string(),
            max: MAX_PLATE_LEN,
        });
    }

    if !plate.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidFormat {
            field: "plate".to_string(),
            reason: "only letters and digits are allowed".to_string(),
        });
    }

    Ok(plate)
}

// =============================================================================
// Names and Identifiers
// =============================================================================

/// Validates a tenant slug: 3-50 chars of `a-z`, `0-9` and `-`, not starting
/// or ending with `-`.
///
/// ## Example
/// ```rust
/// use lotkeeper_core::validation::validate_slug;
///
/// assert!(validate_slug("central-parking").is_ok());
/// assert!(validate_slug("Central Parking").is_err());
/// assert!(validate_slug("-x-").is_err());
/// ```
pub fn validate_slug(slug: &str) -> ValidationResult<()> {
    let field = || "slug".to_string();

    if slug.is_empty() {
        return Err(ValidationError::Required { field: field() });
    }
    if slug.len() < 3 {
        return Err(ValidationError::TooShort { field: field(), min: 3 });
    }
    if slug.len() > 50 {
        return Err(ValidationError::TooLong { field: field(), max: 50 });
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(ValidationError::InvalidFormat {
            field: field(),
            reason: "use lowercase letters, digits and hyphens".to_string(),
        });
    }
    if slug.starts_with('-') || slug.ends_with('-') {
        return Err(ValidationError::InvalidFormat {
            field: field(),
            reason: "must not start or end with a hyphen".to_string(),
        });
    }
    Ok(())
}

/// Validates a required display name.
pub fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }
    Ok(())
}

/// Validates a minimal email shape (`local@domain`).
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "expected local@domain".to_string(),
        }),
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Amount fields that may be zero but never negative.
pub fn validate_non_negative(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Configured prices: zero up to [`MAX_AMOUNT`].
pub fn validate_amount(field: &str, value: i64) -> ValidationResult<()> {
    validate_range(field, value, 0, MAX_AMOUNT)
}

/// Inclusive range check.
pub fn validate_range(field: &str, value: i64, min: i64, max: i64) -> ValidationResult<()> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min,
            max,
        });
    }
    Ok(())
}
