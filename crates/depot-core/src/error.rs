//! # Error Types
//!
//! Domain-specific error types for depot-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  depot-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  depot-db errors (separate crate)                                      │
//! │  └── DbError          - Database failures (wraps CoreError)            │
//! │                                                                         │
//! │  depot-pos errors (app)                                                │
//! │  └── ApiError         - What callers see: { code, message }            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Caller       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every business check runs before a mutation starts, so a `CoreError`
//! returned from a repository always means "nothing was written".

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    #[error("Supplier not found: {0}")]
    SupplierNotFound(String),

    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),

    #[error("Receivable not found: {0}")]
    ReceivableNotFound(String),

    #[error("Route not found: {0}")]
    RouteNotFound(String),

    /// A return entry names a line that does not belong to the route.
    #[error("Route line {line_id} not found on route {route_id}")]
    RouteLineNotFound { route_id: String, line_id: String },

    /// Insufficient stock to complete a sale, dispatch or return correction.
    ///
    /// ## User Workflow
    /// ```text
    /// Invoice line (qty: 5)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Aceite 1L", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Whole invoice is rejected, nothing is written
    /// ```
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// Cash tendered does not cover the invoice total.
    #[error("Insufficient cash: total {total_cents} cents, tendered {tendered_cents} cents")]
    InsufficientCash {
        total_cents: i64,
        tendered_cents: i64,
    },

    /// Payment amount is invalid (overpayment, down payment above total, ...).
    #[error("Invalid payment amount: {reason}")]
    InvalidPaymentAmount { reason: String },

    /// Receivable is already settled.
    #[error("Receivable {0} is already paid")]
    ReceivableAlreadyPaid(String),

    /// Product is deactivated and cannot be sold or dispatched.
    #[error("Product {0} is inactive")]
    ProductInactive(String),

    /// Operation not allowed on the walk-in customer.
    #[error("The walk-in customer cannot be {action}")]
    WalkInCustomer { action: String },

    /// Customer still referenced by invoices.
    #[error("Customer {0} has invoices and cannot be deleted")]
    CustomerInUse(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// True for the "referenced entity does not exist" family.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::ProductNotFound(_)
                | CoreError::CustomerNotFound(_)
                | CoreError::SupplierNotFound(_)
                | CoreError::InvoiceNotFound(_)
                | CoreError::ReceivableNotFound(_)
                | CoreError::RouteNotFound(_)
                | CoreError::RouteLineNotFound { .. }
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid barcode).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., duplicate product name, repeated line).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },

    /// A list that must have at least one element is empty.
    #[error("{field} must contain at least one item")]
    Empty { field: String },
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
        let err = CoreError::InsufficientStock {
            product: "Aceite 1L".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Aceite 1L: available 3, requested 5"
        );

        let err = CoreError::InsufficientCash {
            total_cents: 1500,
            tendered_cents: 1000,
        };
        assert!(err.to_string().starts_with("Insufficient cash"));
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::Empty {
            field: "lines".to_string(),
        };
        assert_eq!(err.to_string(), "lines must contain at least one item");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert!(!core_err.is_not_found());
    }

    #[test]
    fn test_not_found_family() {
        assert!(CoreError::RouteNotFound("r1".into()).is_not_found());
        assert!(CoreError::RouteLineNotFound {
            route_id: "r1".into(),
            line_id: "l1".into()
        }
        .is_not_found());
        assert!(!CoreError::ReceivableAlreadyPaid("x".into()).is_not_found());
    }
}
