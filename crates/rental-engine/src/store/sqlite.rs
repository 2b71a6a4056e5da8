//! [`InventoryStore`] over the `rental-db` repositories.

use async_trait::async_trait;

use rental_core::{
    ComponentSpec, DateRange, OrderStatus, PackComponent, Product, RelationCounts, Reservation,
};
use rental_db::Database;

use super::{InventoryStore, StockChange, StockUpdate, StoreResult, TransactionBudget};

/// SQLite-backed store. Cheap to clone (shares the pool).
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        SqliteStore { db }
    }

    /// The underlying database, for writes the engine does not own
    /// (creating orders, seeding).
    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl InventoryStore for SqliteStore {
    async fn find_product(&self, id: &str) -> StoreResult<Option<Product>> {
        Ok(self.db.products().get_by_id(id).await?)
    }

    async fn find_components_of_pack(&self, pack_id: &str) -> StoreResult<Vec<PackComponent>> {
        Ok(self.db.components().components_of_pack(pack_id).await?)
    }

    async fn packs_containing(&self, component_id: &str) -> StoreResult<Vec<String>> {
        Ok(self.db.components().packs_containing(component_id).await?)
    }

    async fn aggregate_reserved_quantity(
        &self,
        product_id: &str,
        range: &DateRange,
        statuses: &[OrderStatus],
    ) -> StoreResult<i64> {
        Ok(self
            .db
            .orders()
            .reserved_quantity(product_id, range, statuses)
            .await?)
    }

    async fn find_reservations(
        &self,
        product_id: &str,
        range: &DateRange,
        statuses: &[OrderStatus],
    ) -> StoreResult<Vec<Reservation>> {
        Ok(self
            .db
            .orders()
            .reservations(product_id, range, statuses)
            .await?)
    }

    async fn relation_counts(&self, product_id: &str) -> StoreResult<RelationCounts> {
        Ok(self.db.products().relation_counts(product_id).await?)
    }

    async fn soft_delete_product(&self, id: &str) -> StoreResult<()> {
        Ok(self.db.products().soft_delete(id).await?)
    }

    async fn hard_delete_product(&self, id: &str, budget: TransactionBudget) -> StoreResult<()> {
        Ok(self.db.products().hard_delete(id, budget).await?)
    }

    async fn adjust_stock(&self, id: &str, change: StockChange) -> StoreResult<StockUpdate> {
        Ok(self.db.products().adjust_stock(id, change).await?)
    }

    async fn replace_pack_components(
        &self,
        pack_id: &str,
        components: &[ComponentSpec],
    ) -> StoreResult<()> {
        Ok(self
            .db
            .components()
            .replace_components(pack_id, components)
            .await?)
    }
}
