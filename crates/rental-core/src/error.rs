//! # Error Types
//!
//! Domain-specific error types for rental-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  rental-core errors (this file)                                        │
//! │  ├── CoreError        - Domain rule violations                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  rental-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  rental-engine errors                                                  │
//! │  ├── StoreError       - Storage trait failures                         │
//! │  └── EngineError      - What callers see (code + message)              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → transport layer     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::OrderStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Domain rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Order status change not allowed by the lifecycle.
    ///
    /// ## When This Occurs
    /// - Leaving a terminal state (COMPLETED, CANCELLED)
    /// - Skipping backwards (IN_PROGRESS → PENDING)
    /// - Completing an order that never started
    #[error("Order cannot move from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any storage access so bad requests never reach the ledger.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// End of a date range precedes its start.
    #[error("end date {end} is before start date {start}")]
    InvertedRange { start: String, end: String },

    /// The same component was listed twice for one pack.
    #[error("component '{component_id}' is listed more than once")]
    DuplicateComponent { component_id: String },

    /// A pack listed itself as a component, directly or through other packs.
    #[error("pack '{pack_id}' cannot contain itself (via '{component_id}')")]
    CyclicComponent {
        pack_id: String,
        component_id: String,
    },
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
    fn test_transition_message() {
        let err = CoreError::InvalidTransition {
            from: OrderStatus::Completed,
            to: OrderStatus::Pending,
        };
        assert_eq!(err.to_string(), "Order cannot move from COMPLETED to PENDING");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");

        let err = ValidationError::CyclicComponent {
            pack_id: "pack-a".to_string(),
            component_id: "pack-b".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "pack 'pack-a' cannot contain itself (via 'pack-b')"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "product_id".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
