//! Direct stock counter adjustments.
//!
//! Each adjustment is one conditional update in the store, so two concurrent
//! decrements can never drive `available_stock` below zero. Adjustments do
//! not go through the mutation guard.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use ts_rs::TS;

use rental_core::validation::{validate_id, validate_quantity};
use rental_core::Product;

use crate::error::{EngineError, EngineResult};
use crate::store::{InventoryStore, StockChange, StockUpdate, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum StockOperation {
    Increase,
    Decrease,
}

impl StockOperation {
    fn change(self, quantity: i64) -> StockChange {
        match self {
            StockOperation::Increase => StockChange::Increase(quantity),
            StockOperation::Decrease => StockChange::Decrease(quantity),
        }
    }
}

/// Applies `operation` to the product's `stock` and `available_stock`.
pub async fn adjust_stock(
    store: &Arc<dyn InventoryStore>,
    product_id: &str,
    quantity: i64,
    operation: StockOperation,
) -> EngineResult<Product> {
    validate_id("product id", product_id)?;
    validate_quantity(quantity)?;

    let update = store
        .adjust_stock(product_id, operation.change(quantity))
        .await
        .map_err(|e| match e {
            StoreError::NotFound { .. } => EngineError::not_found("Product", product_id),
            other => EngineError::Store(other),
        })?;

    match update {
        StockUpdate::Applied(product) => {
            info!(
                product_id,
                ?operation,
                quantity,
                available_stock = product.available_stock,
                status = ?product.status,
                "Stock adjusted"
            );
            Ok(product)
        }
        StockUpdate::Insufficient { available } => {
            warn!(product_id, available, requested = quantity, "Stock decrease refused");
            Err(EngineError::InsufficientStock {
                product_id: product_id.to_string(),
                available,
                requested: quantity,
            })
        }
    }
}
