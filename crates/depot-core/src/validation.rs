//! # Validation Module
//!
//! Input validation utilities for Depot POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Command (apps/depot-pos)                                     │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: shape and range checks                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Business rules (invoice, route, receivable modules)          │
//! │  ├── Stock availability, payment coverage                              │
//! │  └── Return bounds                                                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / UNIQUE / CHECK constraints                             │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validators that normalise their input (trimming, empty-to-`None`) return
//! the cleaned value so callers persist exactly what was checked.
//!
//! ## Usage
//! ```rust
//! use depot_core::validation::{validate_name, validate_quantity};
//!
//! let name = validate_name("name", "  Aceite 1L ").unwrap();
//! assert_eq!(name, "Aceite 1L");
//!
//! assert!(validate_quantity(5).is_ok());
//! assert!(validate_quantity(0).is_err());
//! ```

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::{MAX_AMOUNT_CENTS, MAX_ITEM_QUANTITY, MAX_LINES, MAX_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted name (products, customers, suppliers).
pub const MAX_NAME_LEN: usize = 200;

/// Longest accepted free-text field (notes, descriptions, addresses).
pub const MAX_TEXT_LEN: usize = 500;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required name and returns it trimmed.
///
/// ## Example
/// ```rust
/// use depot_core::validation::validate_name;
///
/// assert!(validate_name("name", "Distribuidora Lopez").is_ok());
/// assert!(validate_name("name", "   ").is_err());
/// ```
pub fn validate_name(field: &str, name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(name.to_string())
}

/// Normalises an optional free-text field.
///
/// Blank strings become `None`; the rest is trimmed and length-checked.
pub fn validate_optional_text(
    field: &str,
    value: Option<&str>,
) -> ValidationResult<Option<String>> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    if value.chars().count() > MAX_TEXT_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_TEXT_LEN,
        });
    }

    Ok(Some(value.to_string()))
}

/// Validates an optional barcode.
///
/// ## Rules
/// - Blank means "no barcode"
/// - At most 50 characters
/// - Letters, digits and hyphens only (EAN-13, UPC-A, internal codes)
pub fn validate_barcode(barcode: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(barcode) = barcode.map(str::trim).filter(|b| !b.is_empty()) else {
        return Ok(None);
    };

    if barcode.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "barcode".to_string(),
            max: 50,
        });
    }

    if !barcode.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must contain only letters, digits and hyphens".to_string(),
        });
    }

    Ok(Some(barcode.to_string()))
}

/// Validates a search query.
///
/// Empty is allowed (no filter). Returns the trimmed query.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed [`MAX_ITEM_QUANTITY`]
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates an absolute stock count (initial stock, physical count).
pub fn validate_stock_count(stock: i64) -> ValidationResult<()> {
    if !(0..=i64::from(i32::MAX)).contains(&stock) {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::from(i32::MAX),
        });
    }

    Ok(())
}

/// Validates a price or cost in cents. Zero is allowed (free items).
///
/// ## Example
/// ```rust
/// use depot_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents("price", 1099).is_ok());
/// assert!(validate_price_cents("price", 0).is_ok());
/// assert!(validate_price_cents("price", -100).is_err());
/// assert!(validate_price_cents("price", i64::MAX / 2).is_err());
/// ```
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates a payment or ledger amount in cents.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed [`MAX_AMOUNT_CENTS`]
pub fn validate_amount_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    if cents > MAX_AMOUNT_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_AMOUNT_CENTS,
        });
    }

    Ok(())
}

/// Validates an optional tender or down payment: `0..=MAX_AMOUNT_CENTS`.
pub fn validate_tender_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_AMOUNT_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT_CENTS,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of lines of a document.
pub fn validate_line_count(field: &str, count: usize) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::Empty {
            field: field.to_string(),
        });
    }

    if count > MAX_LINES {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_LINES as i64,
        });
    }

    Ok(())
}

/// Rejects a list that names the same key twice.
pub fn ensure_unique<'a, I>(field: &str, keys: I) -> ValidationResult<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    for key in keys {
        if !seen.insert(key) {
            return Err(ValidationError::Duplicate {
                field: field.to_string(),
                value: key.to_string(),
            });
        }
    }
    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string.
///
/// ## Example
/// ```rust
/// use depot_core::validation::validate_uuid;
///
/// assert!(validate_uuid("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("id", "not-a-uuid").is_err());
/// ```
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
