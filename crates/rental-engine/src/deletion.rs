//! # Product Deletion
//!
//! Soft or hard deletion, decided by what still references the product.
//!
//! ## Decision Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  order items or pack rows?   force?   outcome                           │
//! │  ─────────────────────────   ──────   ───────────────────────────────   │
//! │            no                  any    hard: remove analytics,          │
//! │                                       interactions, favorites,         │
//! │                                       reviews, then the product        │
//! │            yes                 no     soft: inactive + DISCONTINUED    │
//! │            yes                 yes    hard (the store's foreign keys   │
//! │                                       refuse it: DELETE_CONSTRAINT)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Hard-delete failures are never retried.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use ts_rs::TS;

use rental_core::validation::validate_id;

use crate::error::{EngineError, EngineResult};
use crate::store::{InventoryStore, StoreError, TransactionBudget};

// =============================================================================
// Outcome
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum DeleteKind {
    /// Kept for history, hidden from the catalog.
    Soft,
    /// Gone for good.
    Hard,
}

/// What `delete_product` did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DeletionOutcome {
    pub product_id: String,
    pub outcome: DeleteKind,
    pub message: String,
}

// =============================================================================
// Deleter
// =============================================================================

/// Runs one deletion. Callers must hold the mutation guard.
#[derive(Clone)]
pub struct ProductDeleter {
    store: Arc<dyn InventoryStore>,
    budget: TransactionBudget,
}

impl ProductDeleter {
    pub fn new(store: Arc<dyn InventoryStore>, budget: TransactionBudget) -> Self {
        ProductDeleter { store, budget }
    }

    pub async fn delete(&self, product_id: &str, force: bool) -> EngineResult<DeletionOutcome> {
        validate_id("product id", product_id)?;

        let product = self
            .store
            .find_product(product_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Product", product_id))?;
        let relations = self.store.relation_counts(&product.id).await?;

        if relations.has_blocking_relations() && !force {
            self.store
                .soft_delete_product(&product.id)
                .await
                .map_err(|e| delete_error(&product.id, e))?;

            info!(
                product_id = %product.id,
                name = %product.name,
                order_items = relations.order_items,
                pack_memberships = relations.pack_memberships,
                outcome = "soft",
                "Product soft deleted"
            );

            return Ok(DeletionOutcome {
                product_id: product.id,
                outcome: DeleteKind::Soft,
                message: "Product deactivated (it has orders or belongs to packs)".to_string(),
            });
        }

        if let Err(e) = self.store.hard_delete_product(&product.id, self.budget).await {
            warn!(
                product_id = %product.id,
                name = %product.name,
                error = %e,
                "Hard delete failed"
            );
            return Err(delete_error(&product.id, e));
        }

        info!(
            product_id = %product.id,
            name = %product.name,
            reviews = relations.reviews,
            favorites = relations.favorites,
            interactions = relations.interactions,
            outcome = "hard",
            "Product deleted"
        );

        Ok(DeletionOutcome {
            product_id: product.id,
            outcome: DeleteKind::Hard,
            message: "Product deleted".to_string(),
        })
    }
}

/// Maps a store failure during deletion to the caller-facing taxonomy.
fn delete_error(product_id: &str, err: StoreError) -> EngineError {
    match err {
        StoreError::ForeignKeyViolation(message) => EngineError::DeleteConstraint {
            product_id: product_id.to_string(),
            message,
        },
        StoreError::NotFound { .. } => EngineError::not_found("Product", product_id),
        other => EngineError::Delete {
            product_id: product_id.to_string(),
            message: other.to_string(),
        },
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::store::memory::{sample_pack, sample_product, DependentRows, InMemoryStore};
    use chrono::NaiveDate;
    use rental_core::{DateRange, OrderStatus, ProductStatus};

    fn deleter(store: Arc<InMemoryStore>) -> ProductDeleter {
        ProductDeleter::new(store, TransactionBudget::default())
    }

    fn june(d: u32) -> DateRange {
        DateRange::single_day(NaiveDate::from_ymd_opt(2025, 6, d).unwrap())
    }

    #[tokio::test]
    async fn test_hard_delete_removes_dependents() {
        let store = Arc::new(InMemoryStore::new());
        store.insert_product(sample_product("lamp", 3)).unwrap();
        store
            .add_dependents(
                "lamp",
                DependentRows {
                    reviews: 2,
                    favorites: 1,
                    interactions: 5,
                    analytics: true,
                },
            )
            .unwrap();

        let outcome = deleter(store.clone()).delete("lamp", false).await.unwrap();
        assert_eq!(outcome.outcome, DeleteKind::Hard);
        assert_eq!(store.product("lamp").unwrap(), None);
        assert_eq!(store.dependents("lamp").unwrap(), DependentRows::default());
    }

    #[tokio::test]
    async fn test_order_history_forces_soft_delete() {
        let store = Arc::new(InMemoryStore::new());
        store.insert_product(sample_product("lamp", 3)).unwrap();
        store
            .create_order(OrderStatus::Completed, &[("lamp", 1, june(1))])
            .unwrap();

        let outcome = deleter(store.clone()).delete("lamp", false).await.unwrap();
        assert_eq!(outcome.outcome, DeleteKind::Soft);

        let lamp = store.product("lamp").unwrap().unwrap();
        assert!(!lamp.is_active);
        assert_eq!(lamp.status, ProductStatus::Discontinued);
    }

    #[tokio::test]
    async fn test_pack_membership_forces_soft_delete() {
        let store = Arc::new(InMemoryStore::new());
        store.insert_product(sample_product("lamp", 3)).unwrap();
        store.insert_product(sample_pack("lights")).unwrap();
        store.set_components("lights", &[("lamp", 2)]).unwrap();

        // Both sides of the membership are protected.
        for id in ["lamp", "lights"] {
            let outcome = deleter(store.clone()).delete(id, false).await.unwrap();
            assert_eq!(outcome.outcome, DeleteKind::Soft, "{id}");
        }
    }

    #[tokio::test]
    async fn test_forced_delete_hits_constraint() {
        let store = Arc::new(InMemoryStore::new());
        store.insert_product(sample_product("lamp", 3)).unwrap();
        store
            .create_order(OrderStatus::Pending, &[("lamp", 1, june(1))])
            .unwrap();

        let err = deleter(store.clone()).delete("lamp", true).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::DeleteConstraintError);
        assert!(store.product("lamp").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_error_mapping() {
        let store = Arc::new(InMemoryStore::new());
        let err = deleter(store.clone()).delete("ghost", false).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);

        store.insert_product(sample_product("lamp", 3)).unwrap();
        store
            .fail_next_hard_delete(StoreError::Timeout(
                "hard delete exceeded its 10000ms budget".into(),
            ))
            .unwrap();
        let err = deleter(store.clone()).delete("lamp", false).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::DeleteError);
        assert!(err.to_string().contains("10000ms"));

        store
            .fail_next_hard_delete(StoreError::not_found("Product", "lamp"))
            .unwrap();
        let err = deleter(store).delete("lamp", false).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
