//! # Engine Error Type
//!
//! What callers of [`crate::RentalEngine`] see when an operation fails.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Rental Engine                      │
//! │                                                                         │
//! │  ValidationError (rental-core) ─────────────────┐                      │
//! │                                                 ▼                      │
//! │  DbError (rental-db) ──► StoreError ──► EngineError ──► ApiError      │
//! │                                          │                {code,       │
//! │                                          │                 message}    │
//! │                                          ▼                              │
//! │                                    ErrorCode::NotFound                  │
//! │                                    ErrorCode::DeleteConstraintError     │
//! │                                    ...                                  │
//! │                                                                         │
//! │  "Not available" is never an error: it is an AvailabilityResult with   │
//! │  available = false.                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;

use rental_core::ValidationError;

use crate::config::ConfigError;
use crate::store::StoreError;

// =============================================================================
// Engine Error
// =============================================================================

/// Errors returned by engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A product (or pack, or component) does not exist.
    ///
    /// ## When This Occurs
    /// - Unknown id passed to any read or write
    /// - A concurrent hard delete removed the product first
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A pack operation named a product that is not a pack.
    #[error("Product {0} is not a pack")]
    NotAPack(String),

    /// A stock decrease asked for more than the counter holds.
    #[error("Insufficient stock for {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// Hard delete refused by the store because rows still reference the
    /// product.
    ///
    /// ## When This Occurs
    /// - `force = true` on a product with order items or pack memberships
    /// - An order item was created between the relation count and the delete
    #[error("Cannot delete product {product_id}: {message}")]
    DeleteConstraint { product_id: String, message: String },

    /// Any other deletion failure, including exhausted transaction budgets.
    #[error("Failed to delete product {product_id}: {message}")]
    Delete { product_id: String, message: String },

    /// Bad input, rejected before any storage access.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Storage failed on a read path.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// The engine could not start with the given configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The mutation guard is gone or the operation panicked.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        EngineError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        EngineError::Internal(message.into())
    }

    /// Machine-readable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::NotFound { .. } => ErrorCode::NotFound,
            EngineError::NotAPack(_) => ErrorCode::NotAPack,
            EngineError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            EngineError::DeleteConstraint { .. } => ErrorCode::DeleteConstraintError,
            EngineError::Delete { .. } => ErrorCode::DeleteError,
            EngineError::Validation(_) => ErrorCode::ValidationError,
            EngineError::Store(StoreError::NotFound { .. }) => ErrorCode::NotFound,
            EngineError::Store(_) => ErrorCode::StoreError,
            EngineError::Config(_) | EngineError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Serializable `{code, message}` pair for transport layers.
    pub fn to_api(&self) -> ApiError {
        ApiError::new(self.code(), self.to_string())
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        err.to_api()
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// API Error
// =============================================================================

/// Error payload for transport layers.
///
/// ```json
/// {
///   "code": "NOT_A_PACK",
///   "message": "Product speaker-01 is not a pack"
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

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Product or pack missing (404)
    NotFound,

    /// Pack operation on a plain product (422)
    NotAPack,

    /// Stock counter too low (409)
    InsufficientStock,

    /// Hard delete blocked by references (409)
    DeleteConstraintError,

    /// Deletion failed for another reason (500)
    DeleteError,

    /// Input validation failed (400)
    ValidationError,

    /// Storage failure (500)
    StoreError,

    /// Guard unavailable, operation panicked, or bad startup config (500)
    InternalError,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(
            EngineError::not_found("Product", "p-1").code(),
            ErrorCode::NotFound
        );
        assert_eq!(
            EngineError::NotAPack("p-1".into()).code(),
            ErrorCode::NotAPack
        );
        assert_eq!(
            EngineError::Store(StoreError::not_found("Product", "p-1")).code(),
            ErrorCode::NotFound
        );
        assert_eq!(
            EngineError::Store(StoreError::Backend("disk".into())).code(),
            ErrorCode::StoreError
        );
        let validation: EngineError = ValidationError::MustBePositive {
            field: "quantity".into(),
        }
        .into();
        assert_eq!(validation.code(), ErrorCode::ValidationError);
    }

    #[test]
    fn test_api_error_serialization() {
        let api = EngineError::DeleteConstraint {
            product_id: "speaker".into(),
            message: "FOREIGN KEY constraint failed".into(),
        }
        .to_api();

        let json = serde_json::to_value(&api).unwrap();
        assert_eq!(json["code"], "DELETE_CONSTRAINT_ERROR");
        assert_eq!(
            json["message"],
            "Cannot delete product speaker: FOREIGN KEY constraint failed"
        );
    }
}
