//! # rental-core: Pure Domain Logic for the Rental Engine
//!
//! This crate is the **heart** of the rental inventory engine. It contains the
//! availability math as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Rental Engine Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            Storefront / Admin (external collaborators)          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 rental-engine (RentalEngine)                    │   │
//! │  │   check_availability, check_pack_availability, delete_product   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ rental-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌──────────────┐  ┌──────────┐  ┌──────────┐  │   │
//! │  │   │   types   │  │ availability │  │   pack   │  │  money   │  │   │
//! │  │   │  Product  │  │  DateRange   │  │ Bottle-  │  │  Money   │  │   │
//! │  │   │ OrderItem │  │  Policy      │  │  neck    │  │          │  │   │
//! │  │   └───────────┘  └──────────────┘  └──────────┘  └──────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  rental-db (Database Layer)                     │   │
//! │  │          SQLite catalog, reservation ledger, migrations         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, PackComponent, OrderItem, ...)
//! - [`availability`] - Date ranges, overlap test, reservation policy
//! - [`pack`] - Per-component evaluation, bottleneck law, pack pricing
//! - [`money`] - Money type with integer arithmetic
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use rental_core::availability::{DateRange, StockWindow};
//!
//! let day = |d| NaiveDate::from_ymd_opt(2025, 6, d).unwrap();
//! let existing = DateRange::new(day(1), day(3)).unwrap();
//! let query = DateRange::new(day(2), day(4)).unwrap();
//! assert!(existing.overlaps(&query));
//!
//! // realStock=5, 2 units reserved in the window, 4 requested
//! let window = StockWindow::compute(5, 2, 4);
//! assert_eq!(window.available_quantity(), 3);
//! assert!(!window.is_available());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod availability;
pub mod error;
pub mod money;
pub mod pack;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use availability::{DateRange, ReservationPolicy, StockWindow};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default lead-time exemption, in days.
///
/// ## Business Reason
/// Bookings that start further out than this are always accepted: the rental
/// house can acquire or reallocate stock given enough lead time.
pub const DEFAULT_LEAD_TIME_EXEMPTION_DAYS: u32 = 30;

/// Maximum number of days a single availability calendar may cover.
pub const MAX_CALENDAR_DAYS: u32 = 366;
