//! Pluggable storage for the catalog and the reservation ledger.
//!
//! The engine never talks SQL. Everything it needs from storage goes through
//! [`InventoryStore`], so the same availability and deletion logic runs
//! against SQLite in production and an in-memory fake in tests.
//!
//! ## Design Principles
//!
//! - **Typed methods**: one method per question the engine asks
//! - **Conditional writes**: stock changes are check-and-set in the store
//! - **Testability**: [`memory::InMemoryStore`] emulates foreign keys

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use thiserror::Error;

use rental_core::{
    ComponentSpec, DateRange, OrderStatus, PackComponent, Product, RelationCounts, Reservation,
};
use rental_db::DbError;

pub use rental_db::{StockChange, StockUpdate, TransactionBudget};

// =============================================================================
// Store Error
// =============================================================================

/// Backend-neutral storage failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The row was not there.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A delete or insert broke referential integrity.
    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// A transaction budget ran out.
    #[error("timed out: {0}")]
    Timeout(String),

    /// Anything else the backend reported.
    #[error("{0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => StoreError::NotFound { entity, id },
            DbError::ForeignKeyViolation { message } => StoreError::ForeignKeyViolation(message),
            err @ DbError::Timeout { .. } => StoreError::Timeout(err.to_string()),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Inventory Store
// =============================================================================

/// Storage abstraction for the rental engine.
///
/// ## Thread Safety
///
/// All methods are `Send + Sync`: availability reads run concurrently from
/// many tasks, and guarded mutations run on the guard's worker.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    // --- Catalog reads ---

    /// Point lookup. `None` if the product does not exist.
    async fn find_product(&self, id: &str) -> StoreResult<Option<Product>>;

    /// A pack's components joined with their products.
    async fn find_components_of_pack(&self, pack_id: &str) -> StoreResult<Vec<PackComponent>>;

    /// Ids of packs listing `component_id` as a component.
    async fn packs_containing(&self, component_id: &str) -> StoreResult<Vec<String>>;

    // --- Ledger reads ---

    /// Σ quantity of items for `product_id` overlapping `range` (inclusive
    /// bounds) whose order status is in `statuses`.
    async fn aggregate_reserved_quantity(
        &self,
        product_id: &str,
        range: &DateRange,
        statuses: &[OrderStatus],
    ) -> StoreResult<i64>;

    /// The reservations behind [`Self::aggregate_reserved_quantity`].
    async fn find_reservations(
        &self,
        product_id: &str,
        range: &DateRange,
        statuses: &[OrderStatus],
    ) -> StoreResult<Vec<Reservation>>;

    // --- Deletion ---

    /// Rows referencing a product.
    async fn relation_counts(&self, product_id: &str) -> StoreResult<RelationCounts>;

    /// Marks the product inactive and DISCONTINUED.
    async fn soft_delete_product(&self, id: &str) -> StoreResult<()>;

    /// Removes the product and its history-free dependents atomically.
    ///
    /// # Errors
    ///
    /// - `ForeignKeyViolation` if order items or pack rows reference it
    /// - `NotFound` if it was already gone
    /// - `Timeout` if `budget` ran out
    async fn hard_delete_product(&self, id: &str, budget: TransactionBudget) -> StoreResult<()>;

    // --- Catalog writes ---

    /// Conditional stock counter update.
    async fn adjust_stock(&self, id: &str, change: StockChange) -> StoreResult<StockUpdate>;

    /// Atomically replaces a pack's component set.
    async fn replace_pack_components(
        &self,
        pack_id: &str,
        components: &[ComponentSpec],
    ) -> StoreResult<()>;
}
