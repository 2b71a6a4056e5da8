//! # Domain Types
//!
//! Core domain types used throughout the rental engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  CATALOG                               RESERVATION LEDGER               │
//! │  ┌─────────────────┐                   ┌─────────────────┐              │
//! │  │    Product      │◄──── product_id ──│   OrderItem     │              │
//! │  │  ─────────────  │                   │  ─────────────  │              │
//! │  │  id, sku, slug  │                   │  quantity       │              │
//! │  │  real_stock     │                   │  start_date     │              │
//! │  │  is_pack        │                   │  end_date       │              │
//! │  └───────┬─────────┘                   └───────┬─────────┘              │
//! │          │ pack_id / component_id              │ order_id               │
//! │  ┌───────▼──────────┐                  ┌───────▼─────────┐              │
//! │  │ PackComponent    │                  │     Order       │              │
//! │  │ quantity_per_pack│                  │  OrderStatus    │              │
//! │  └──────────────────┘                  └─────────────────┘              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::availability::DateRange;
use crate::error::CoreError;
use crate::money::Money;

// =============================================================================
// Product Status
// =============================================================================

/// Catalog status of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductStatus {
    /// Can be rented.
    #[default]
    Available,
    /// Denormalized counter reached zero.
    OutOfStock,
    /// Soft-deleted. Terminal.
    Discontinued,
}

impl ProductStatus {
    /// Status after a stock counter change, per the catalog's rules.
    ///
    /// ```text
    /// counter == 0                     → OUT_OF_STOCK
    /// counter  > 0 and was OUT_OF_STOCK → AVAILABLE
    /// otherwise                         → unchanged
    /// ```
    pub fn after_stock_change(self, available_stock: i64) -> Self {
        if self == ProductStatus::Discontinued {
            return self;
        }
        if available_stock == 0 {
            ProductStatus::OutOfStock
        } else if available_stock > 0 && self == ProductStatus::OutOfStock {
            ProductStatus::Available
        } else {
            self
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A rentable catalog entry. Packs are products too (`is_pack = true`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// URL slug.
    pub slug: String,

    /// Display name.
    pub name: String,

    /// Daily rental price in cents.
    pub price_per_day_cents: i64,

    /// Physical units owned. Reservations are checked against this.
    pub real_stock: i64,

    /// Denormalized stock counter.
    pub stock: i64,

    /// Denormalized counter decremented by direct stock adjustments.
    pub available_stock: i64,

    /// Whether this product is a bundle of components.
    pub is_pack: bool,

    /// Whether the product is listed (false after a soft delete).
    pub is_active: bool,

    pub status: ProductStatus,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the daily price as a Money type.
    #[inline]
    pub fn price_per_day(&self) -> Money {
        Money::from_cents(self.price_per_day_cents)
    }
}

// =============================================================================
// Pack Membership
// =============================================================================

/// A pack membership (`quantity_per_pack` units per pack) joined with the
/// component product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackComponent {
    pub quantity_per_pack: i64,
    pub component: Product,
}

/// Requested membership when (re)defining a pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSpec {
    pub component_id: String,
    pub quantity_per_pack: i64,
}

// =============================================================================
// Order Status
// =============================================================================

/// Order lifecycle.
///
/// ```text
/// PENDING ──► IN_PROGRESS ──► COMPLETED
///    │             │
///    └──────┬──────┘
///           ▼
///       CANCELLED
/// ```
///
/// COMPLETED and CANCELLED are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::InProgress,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::InProgress => "IN_PROGRESS",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Returns true for COMPLETED and CANCELLED.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Returns true if the lifecycle allows `self → next`.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::InProgress)
                | (OrderStatus::InProgress, OrderStatus::Completed)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
                | (OrderStatus::InProgress, OrderStatus::Cancelled)
        )
    }

    /// Statuses from which `next` may be entered.
    pub fn predecessors(next: OrderStatus) -> Vec<OrderStatus> {
        OrderStatus::ALL
            .into_iter()
            .filter(|s| s.can_transition_to(next))
            .collect()
    }

    /// Validates `self → next`.
    pub fn transition(self, next: OrderStatus) -> Result<OrderStatus, CoreError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "PENDING" => Ok(OrderStatus::Pending),
            "IN_PROGRESS" => Ok(OrderStatus::InProgress),
            "COMPLETED" => Ok(OrderStatus::Completed),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(format!(
                "Unknown order status: '{}'. Valid options: PENDING, IN_PROGRESS, COMPLETED, CANCELLED",
                other
            )),
        }
    }
}

// =============================================================================
// Order / Order Item
// =============================================================================

/// A customer order. Owns its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub status: OrderStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A reserved line: `quantity` units of a product for an inclusive day range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub quantity: i64,
    #[ts(as = "String")]
    pub start_date: NaiveDate,
    #[ts(as = "String")]
    pub end_date: NaiveDate,
}

/// Ledger view of an order item together with its order's status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub order_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: OrderStatus,
}

impl Reservation {
    /// The reserved day range. Falls back to a single day when the stored
    /// range is inverted.
    pub fn range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
            .unwrap_or_else(|_| DateRange::single_day(self.start_date))
    }
}

// =============================================================================
// Relation Counts
// =============================================================================

/// Rows referencing a product, as seen by the deletion path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct RelationCounts {
    pub order_items: i64,
    pub pack_memberships: i64,
    pub reviews: i64,
    pub favorites: i64,
    pub interactions: i64,
}

impl RelationCounts {
    /// Relations that carry history and force a soft delete.
    pub fn has_blocking_relations(&self) -> bool {
        self.order_items > 0 || self.pack_memberships > 0
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
