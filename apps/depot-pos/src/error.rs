//! # API Error Type
//!
//! Unified error type for commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Depot POS                              │
//! │                                                                         │
//! │  Command Function  ──►  Result<T, ApiError>                             │
//! │                                                                         │
//! │  CoreError (rule rejected)                                              │
//! │     *NotFound, RouteLineNotFound   ──► NOT_FOUND                        │
//! │     InsufficientStock              ──► INSUFFICIENT_STOCK               │
//! │     everything else                ──► VALIDATION_ERROR                 │
//! │                                                                         │
//! │  DbError (infrastructure)                                               │
//! │     NotFound                       ──► NOT_FOUND                        │
//! │     UniqueViolation                ──► VALIDATION_ERROR                 │
//! │     the rest                       ──► INTERNAL  (logged, generic text) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rule violations are reported verbatim; database details never leave the
//! process.

use depot_core::{CoreError, ValidationError};
use depot_db::DbError;
use serde::Serialize;
use ts_rs::TS;

/// Error returned from commands.
///
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Insufficient stock for Aceite 1L: 2 available, 3 requested"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Referenced entity does not exist
    NotFound,

    /// Bad input or a business rule rejected the request
    ValidationError,

    /// Not enough stock; the message names the product
    InsufficientStock,

    /// Persistence failure
    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = if err.is_not_found() {
            ErrorCode::NotFound
        } else if matches!(err, CoreError::InsufficientStock { .. }) {
            ErrorCode::InsufficientStock
        } else {
            ErrorCode::ValidationError
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(core) => core.into(),
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => {
                ApiError::validation(format!("{} '{}' already exists", field, value))
            }
            other => {
                tracing::error!(error = %other, "Database operation failed");
                ApiError::internal("Database operation failed")
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_map_to_codes() {
        let err: ApiError = CoreError::ProductNotFound("p1".into()).into();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err: ApiError = CoreError::RouteLineNotFound {
            route_id: "r1".into(),
            line_id: "l9".into(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err: ApiError = CoreError::InsufficientStock {
            product: "Aceite 1L".into(),
            available: 2,
            requested: 3,
        }
        .into();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert!(err.message.contains("Aceite 1L"));

        let err: ApiError = CoreError::InsufficientCash {
            total_cents: 1500,
            tendered_cents: 1000,
        }
        .into();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err: ApiError = CoreError::ReceivableAlreadyPaid("r1".into()).into();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_internal_details_hidden() {
        let err: ApiError = DbError::QueryFailed("disk I/O error at page 42".into()).into();
        assert_eq!(err.code, ErrorCode::Internal);
        assert!(!err.message.contains("page 42"));

        let err: ApiError = DbError::Domain(CoreError::CustomerNotFound("c1".into())).into();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[test]
    fn test_serialized_shape() {
        let err = ApiError::validation("lines: must not be empty");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["message"], "lines: must not be empty");
    }
}
