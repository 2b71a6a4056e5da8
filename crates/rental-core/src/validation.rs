//! # Validation Module
//!
//! Request validation for the rental engine.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (storefront, admin)                                   │
//! │  └── Parses dates, picks products                                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: RentalEngine                                                 │
//! │  └── THIS MODULE: quantities, ids, spans, pack composition             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Store (SQLite)                                               │
//! │  ├── CHECK (available_stock >= 0)                                      │
//! │  ├── CHECK (quantity_per_pack > 0)                                     │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use rental_core::validation::{validate_id, validate_quantity};
//!
//! assert!(validate_id("product_id", "speaker-01").is_ok());
//! assert!(validate_quantity(0).is_err());
//! ```

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::types::ComponentSpec;
use crate::MAX_CALENDAR_DAYS;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Identifier Validators
// =============================================================================

/// Rejects blank identifiers before they reach the store.
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a requested quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - No upper bound: an oversized request is simply unavailable
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Storefront: "Can I rent 3 speakers from June 1st to June 3rd?"         │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(3) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0?      → Error: "quantity must be positive"          │
/// │       └── OK → ledger aggregation                                       │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Caps per-day calendars so a single request cannot expand unbounded.
pub fn validate_calendar_span(days: i64, max_days: u32) -> ValidationResult<()> {
    let max = i64::from(max_days.min(MAX_CALENDAR_DAYS));
    if days < 1 || days > max {
        return Err(ValidationError::OutOfRange {
            field: "calendar days".to_string(),
            min: 1,
            max,
        });
    }
    Ok(())
}

// =============================================================================
// Pack Composition
// =============================================================================

/// Validates a replacement component list for `pack_id`.
///
/// ## Rules
/// - Every component id is non-blank
/// - `quantity_per_pack >= 1`
/// - No component appears twice
/// - The pack does not list itself
///
/// Transitive cycles need the catalog and are checked by the engine.
pub fn validate_component_specs(pack_id: &str, specs: &[ComponentSpec]) -> ValidationResult<()> {
    let mut seen = HashSet::with_capacity(specs.len());

    for spec in specs {
        validate_id("component_id", &spec.component_id)?;

        if spec.quantity_per_pack < 1 {
            return Err(ValidationError::MustBePositive {
                field: "quantity_per_pack".to_string(),
            });
        }

        if spec.component_id == pack_id {
            return Err(ValidationError::CyclicComponent {
                pack_id: pack_id.to_string(),
                component_id: spec.component_id.clone(),
            });
        }

        if !seen.insert(spec.component_id.as_str()) {
            return Err(ValidationError::DuplicateComponent {
                component_id: spec.component_id.clone(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
