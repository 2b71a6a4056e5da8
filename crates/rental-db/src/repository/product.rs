//! # Product Repository
//!
//! Catalog operations for products.
//!
//! ## Key Operations
//! - Point lookups and inserts
//! - Relation counts for the deletion decision
//! - Soft delete and budgeted hard delete
//! - Atomic conditional stock updates
//!
//! ## Hard Delete
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    One transaction, two budgets                         │
//! │                                                                         │
//! │  pool.begin()              ◄── max_wait: time to get a connection       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌───────────────────────────────────────┐                             │
//! │  │ DELETE product_demand_analytics       │                             │
//! │  │ DELETE product_interactions           │ ◄── timeout: whole body     │
//! │  │ DELETE favorites                      │                             │
//! │  │ DELETE reviews                        │                             │
//! │  │ DELETE products                       │ ◄── FK failure if order     │
//! │  └───────────────────────────────────────┘     items or packs remain   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT (or rollback on drop)                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use rental_core::{Product, ProductStatus, RelationCounts};

const PRODUCT_COLUMNS: &str = "id, sku, slug, name, price_per_day_cents, real_stock, stock, \
     available_stock, is_pack, is_active, status, created_at, updated_at";

// =============================================================================
// Supporting Types
// =============================================================================

/// Time limits for the hard-delete transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionBudget {
    /// Longest wait for a pooled connection before the transaction starts.
    pub max_wait: Duration,
    /// Longest the transaction body may run.
    pub timeout: Duration,
}

impl Default for TransactionBudget {
    fn default() -> Self {
        TransactionBudget {
            max_wait: Duration::from_millis(5_000),
            timeout: Duration::from_millis(10_000),
        }
    }
}

/// Direction of a stock counter change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockChange {
    Increase(i64),
    Decrease(i64),
}

impl StockChange {
    /// Signed delta applied to the counters.
    pub fn delta(&self) -> i64 {
        match *self {
            StockChange::Increase(q) => q,
            StockChange::Decrease(q) => -q,
        }
    }
}

/// Result of a conditional stock update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockUpdate {
    /// The update matched; the product as stored afterwards.
    Applied(Product),
    /// The counter could not cover the decrease. Nothing was written.
    Insufficient { available: i64 },
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let product = repo.get_by_id("speaker-01").await?;
/// let counts = repo.relation_counts("speaker-01").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product by its slug.
    pub async fn get_by_slug(&self, slug: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE slug = ?1");

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product
    /// * `Err(DbError::UniqueViolation)` - SKU or slug already exists
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(sku = %product.sku, is_pack = product.is_pack, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, slug, name, price_per_day_cents,
                real_stock, stock, available_stock,
                is_pack, is_active, status, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8,
                ?9, ?10, ?11, ?12, ?13
            )
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.slug)
        .bind(&product.name)
        .bind(product.price_per_day_cents)
        .bind(product.real_stock)
        .bind(product.stock)
        .bind(product.available_stock)
        .bind(product.is_pack)
        .bind(product.is_active)
        .bind(product.status)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product.clone())
    }

    /// Counts the rows referencing a product.
    ///
    /// `pack_memberships` counts both directions: packs this product belongs
    /// to and, for a pack, its own component rows. Either one blocks a hard
    /// delete at the foreign-key level.
    pub async fn relation_counts(&self, id: &str) -> DbResult<RelationCounts> {
        let counts = sqlx::query_as::<_, RelationCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM order_items WHERE product_id = ?1) AS order_items,
                (SELECT COUNT(*) FROM product_components
                    WHERE component_id = ?1 OR pack_id = ?1) AS pack_memberships,
                (SELECT COUNT(*) FROM reviews WHERE product_id = ?1) AS reviews,
                (SELECT COUNT(*) FROM favorites WHERE product_id = ?1) AS favorites,
                (SELECT COUNT(*) FROM product_interactions WHERE product_id = ?1) AS interactions
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(counts)
    }

    /// Soft-deletes a product: inactive and DISCONTINUED.
    ///
    /// ## Why Soft Delete?
    /// - Past order items still reference this product
    /// - Packs still list it as a component
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET
                is_active = 0,
                status = ?2,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(ProductStatus::Discontinued)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Removes a product and its history-free dependents in one transaction.
    ///
    /// ## Errors
    /// * `DbError::Timeout` - `max_wait` or `timeout` exceeded (rolled back)
    /// * `DbError::ForeignKeyViolation` - order items or pack rows still
    ///   reference the product (rolled back)
    /// * `DbError::NotFound` - the product row was already gone
    pub async fn hard_delete(&self, id: &str, budget: TransactionBudget) -> DbResult<()> {
        debug!(id = %id, max_wait_ms = budget.max_wait.as_millis() as u64, "Hard-deleting product");

        let mut tx = tokio::time::timeout(budget.max_wait, self.pool.begin())
            .await
            .map_err(|_| DbError::Timeout {
                operation: "acquiring a connection for hard delete",
                budget: budget.max_wait,
            })??;

        let body = async {
            for table in [
                "product_demand_analytics",
                "product_interactions",
                "favorites",
                "reviews",
            ] {
                let sql = format!("DELETE FROM {table} WHERE product_id = ?1");
                sqlx::query(&sql).bind(id).execute(&mut *tx).await?;
            }

            let result = sqlx::query("DELETE FROM products WHERE id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await?;

            if result.rows_affected() == 0 {
                return Err(DbError::not_found("Product", id));
            }

            Ok::<(), DbError>(())
        };

        let outcome = tokio::time::timeout(budget.timeout, body).await;
        match outcome {
            Ok(Ok(())) => {
                tx.commit()
                    .await
                    .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
                Ok(())
            }
            // Dropping `tx` rolls the transaction back.
            Ok(Err(err)) => Err(err),
            Err(_) => Err(DbError::Timeout {
                operation: "hard delete",
                budget: budget.timeout,
            }),
        }
    }

    /// Applies a stock change as one conditional UPDATE.
    ///
    /// ## Atomic Check-and-Set
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  ❌ WRONG: read, compare in Rust, write                             │
    /// │     Two requests both read 3, both subtract 2 → -1                  │
    /// │                                                                     │
    /// │  ✅ CORRECT: the comparison lives in the WHERE clause               │
    /// │     UPDATE ... SET available_stock = available_stock - 2            │
    /// │     WHERE id = ? AND available_stock >= 2                           │
    /// │     Second request matches 0 rows → Insufficient                    │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    ///
    /// Status follows the counter: reaching 0 gives OUT_OF_STOCK, rising
    /// above 0 from OUT_OF_STOCK gives AVAILABLE. DISCONTINUED is kept.
    pub async fn adjust_stock(&self, id: &str, change: StockChange) -> DbResult<StockUpdate> {
        let delta = change.delta();
        debug!(id = %id, delta = delta, "Adjusting stock");

        let sql = format!(
            r#"
            UPDATE products
            SET
                stock = stock + ?2,
                available_stock = available_stock + ?2,
                status = CASE
                    WHEN status = 'DISCONTINUED' THEN status
                    WHEN available_stock + ?2 = 0 THEN 'OUT_OF_STOCK'
                    WHEN status = 'OUT_OF_STOCK' AND available_stock + ?2 > 0 THEN 'AVAILABLE'
                    ELSE status
                END,
                updated_at = ?3
            WHERE id = ?1 AND available_stock + ?2 >= 0
            RETURNING {PRODUCT_COLUMNS}
            "#
        );

        let updated = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(delta)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;

        match updated {
            Some(product) => Ok(StockUpdate::Applied(product)),
            None => match self.get_by_id(id).await? {
                Some(product) => Ok(StockUpdate::Insufficient {
                    available: product.available_stock,
                }),
                None => Err(DbError::not_found("Product", id)),
            },
        }
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
