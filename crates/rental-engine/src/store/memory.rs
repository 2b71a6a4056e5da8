//! In-memory store implementation for testing.
//!
//! This module provides [`InMemoryStore`], a simple in-memory implementation of
//! the [`InventoryStore`] trait suitable for testing and development.
//!
//! ## Limitations
//!
//! - **NOT suitable for production**: No durability
//! - **Budgets ignored**: hard deletes never time out on their own; use
//!   [`InMemoryStore::fail_next_hard_delete`] to simulate failures
//! - Foreign keys are emulated for hard deletes and component writes only

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use rental_core::{
    ComponentSpec, DateRange, OrderItem, OrderStatus, PackComponent, Product, ProductStatus,
    RelationCounts, Reservation,
};

use super::{
    InventoryStore, StockChange, StockUpdate, StoreError, StoreResult, TransactionBudget,
};

/// Reviews, favorites, interactions and the analytics snapshot of a product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DependentRows {
    pub reviews: i64,
    pub favorites: i64,
    pub interactions: i64,
    pub analytics: bool,
}

#[derive(Debug, Default)]
struct State {
    products: HashMap<String, Product>,
    /// pack id → (component id, quantity per pack), in insertion order
    components: HashMap<String, Vec<(String, i64)>>,
    orders: HashMap<String, OrderStatus>,
    items: Vec<OrderItem>,
    dependents: HashMap<String, DependentRows>,
    hard_delete_failure: Option<StoreError>,
}

impl State {
    fn status_of(&self, item: &OrderItem) -> Option<OrderStatus> {
        self.orders.get(&item.order_id).copied()
    }

    fn matching_items<'a>(
        &'a self,
        product_id: &'a str,
        range: &'a DateRange,
        statuses: &'a [OrderStatus],
    ) -> impl Iterator<Item = (&'a OrderItem, OrderStatus)> + 'a {
        self.items.iter().filter_map(move |item| {
            let status = self.status_of(item)?;
            let overlaps = item.start_date <= range.end() && item.end_date >= range.start();
            (item.product_id == product_id && overlaps && statuses.contains(&status))
                .then_some((item, status))
        })
    }

    fn pack_memberships(&self, product_id: &str) -> i64 {
        let own = self
            .components
            .get(product_id)
            .map_or(0, |list| list.len() as i64);
        let as_component = self
            .components
            .values()
            .flatten()
            .filter(|(component_id, _)| component_id == product_id)
            .count() as i64;
        own + as_component
    }
}

/// In-memory store for testing.
///
/// Thread-safe through a single `RwLock`, so every method is atomic with
/// respect to every other.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

/// Converts a lock poison error to a storage error.
fn poison_err<T>(_: PoisonError<T>) -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Fixture helpers ---

    /// Inserts or replaces a product.
    pub fn insert_product(&self, product: Product) -> StoreResult<()> {
        let mut state = self.state.write().map_err(poison_err)?;
        state.products.insert(product.id.clone(), product);
        Ok(())
    }

    /// Sets a pack's components without validation.
    pub fn set_components(&self, pack_id: &str, components: &[(&str, i64)]) -> StoreResult<()> {
        let mut state = self.state.write().map_err(poison_err)?;
        state.components.insert(
            pack_id.to_string(),
            components
                .iter()
                .map(|(id, qty)| (id.to_string(), *qty))
                .collect(),
        );
        Ok(())
    }

    /// Records an order with one item per `(product_id, quantity, range)`.
    /// Returns the order id.
    pub fn create_order(
        &self,
        status: OrderStatus,
        items: &[(&str, i64, DateRange)],
    ) -> StoreResult<String> {
        let mut state = self.state.write().map_err(poison_err)?;
        if let Some((missing, _, _)) = items
            .iter()
            .find(|(product_id, _, _)| !state.products.contains_key(*product_id))
        {
            return Err(StoreError::ForeignKeyViolation(format!(
                "order item references unknown product {missing}"
            )));
        }

        let order_id = Uuid::new_v4().to_string();
        state.orders.insert(order_id.clone(), status);
        for (product_id, quantity, range) in items {
            state.items.push(OrderItem {
                id: Uuid::new_v4().to_string(),
                order_id: order_id.clone(),
                product_id: product_id.to_string(),
                quantity: *quantity,
                start_date: range.start(),
                end_date: range.end(),
            });
        }
        Ok(order_id)
    }

    /// Attaches history-free rows to a product.
    pub fn add_dependents(&self, product_id: &str, rows: DependentRows) -> StoreResult<()> {
        let mut state = self.state.write().map_err(poison_err)?;
        state.dependents.insert(product_id.to_string(), rows);
        Ok(())
    }

    /// Makes the next hard delete fail with `err` without touching data.
    pub fn fail_next_hard_delete(&self, err: StoreError) -> StoreResult<()> {
        let mut state = self.state.write().map_err(poison_err)?;
        state.hard_delete_failure = Some(err);
        Ok(())
    }

    // --- Inspection ---

    pub fn product(&self, id: &str) -> StoreResult<Option<Product>> {
        let state = self.state.read().map_err(poison_err)?;
        Ok(state.products.get(id).cloned())
    }

    pub fn dependents(&self, product_id: &str) -> StoreResult<DependentRows> {
        let state = self.state.read().map_err(poison_err)?;
        Ok(state
            .dependents
            .get(product_id)
            .copied()
            .unwrap_or_default())
    }
}

#[async_trait]
impl InventoryStore for InMemoryStore {
    async fn find_product(&self, id: &str) -> StoreResult<Option<Product>> {
        self.product(id)
    }

    async fn find_components_of_pack(&self, pack_id: &str) -> StoreResult<Vec<PackComponent>> {
        let state = self.state.read().map_err(poison_err)?;
        let mut components: Vec<PackComponent> = state
            .components
            .get(pack_id)
            .into_iter()
            .flatten()
            .filter_map(|(component_id, qty)| {
                state.products.get(component_id).map(|component| PackComponent {
                    quantity_per_pack: *qty,
                    component: component.clone(),
                })
            })
            .collect();
        components.sort_by(|a, b| {
            (&a.component.name, &a.component.id).cmp(&(&b.component.name, &b.component.id))
        });
        Ok(components)
    }

    async fn packs_containing(&self, component_id: &str) -> StoreResult<Vec<String>> {
        let state = self.state.read().map_err(poison_err)?;
        let mut packs: Vec<String> = state
            .components
            .iter()
            .filter(|(_, list)| list.iter().any(|(id, _)| id == component_id))
            .map(|(pack_id, _)| pack_id.clone())
            .collect();
        packs.sort();
        Ok(packs)
    }

    async fn aggregate_reserved_quantity(
        &self,
        product_id: &str,
        range: &DateRange,
        statuses: &[OrderStatus],
    ) -> StoreResult<i64> {
        let state = self.state.read().map_err(poison_err)?;
        Ok(state
            .matching_items(product_id, range, statuses)
            .map(|(item, _)| item.quantity)
            .sum())
    }

    async fn find_reservations(
        &self,
        product_id: &str,
        range: &DateRange,
        statuses: &[OrderStatus],
    ) -> StoreResult<Vec<Reservation>> {
        let state = self.state.read().map_err(poison_err)?;
        let mut reservations: Vec<Reservation> = state
            .matching_items(product_id, range, statuses)
            .map(|(item, status)| Reservation {
                order_id: item.order_id.clone(),
                product_id: item.product_id.clone(),
                quantity: item.quantity,
                start_date: item.start_date,
                end_date: item.end_date,
                status,
            })
            .collect();
        reservations.sort_by_key(|r| r.start_date);
        Ok(reservations)
    }

    async fn relation_counts(&self, product_id: &str) -> StoreResult<RelationCounts> {
        let state = self.state.read().map_err(poison_err)?;
        let dependents = state
            .dependents
            .get(product_id)
            .copied()
            .unwrap_or_default();
        Ok(RelationCounts {
            order_items: state
                .items
                .iter()
                .filter(|item| item.product_id == product_id)
                .count() as i64,
            pack_memberships: state.pack_memberships(product_id),
            reviews: dependents.reviews,
            favorites: dependents.favorites,
            interactions: dependents.interactions,
        })
    }

    async fn soft_delete_product(&self, id: &str) -> StoreResult<()> {
        let mut state = self.state.write().map_err(poison_err)?;
        let product = state
            .products
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("Product", id))?;
        product.is_active = false;
        product.status = ProductStatus::Discontinued;
        product.updated_at = Utc::now();
        Ok(())
    }

    async fn hard_delete_product(&self, id: &str, _budget: TransactionBudget) -> StoreResult<()> {
        let mut state = self.state.write().map_err(poison_err)?;

        if let Some(err) = state.hard_delete_failure.take() {
            return Err(err);
        }

        if !state.products.contains_key(id) {
            return Err(StoreError::not_found("Product", id));
        }

        let referenced = state.items.iter().any(|item| item.product_id == id)
            || state.pack_memberships(id) > 0;
        if referenced {
            return Err(StoreError::ForeignKeyViolation(
                "FOREIGN KEY constraint failed".to_string(),
            ));
        }

        state.dependents.remove(id);
        state.products.remove(id);
        Ok(())
    }

    async fn adjust_stock(&self, id: &str, change: StockChange) -> StoreResult<StockUpdate> {
        let mut state = self.state.write().map_err(poison_err)?;
        let product = state
            .products
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("Product", id))?;

        let next = product.available_stock + change.delta();
        if next < 0 {
            return Ok(StockUpdate::Insufficient {
                available: product.available_stock,
            });
        }

        product.stock += change.delta();
        product.available_stock = next;
        product.status = product.status.after_stock_change(next);
        product.updated_at = Utc::now();
        Ok(StockUpdate::Applied(product.clone()))
    }

    async fn replace_pack_components(
        &self,
        pack_id: &str,
        components: &[ComponentSpec],
    ) -> StoreResult<()> {
        let mut state = self.state.write().map_err(poison_err)?;
        if let Some(missing) = components
            .iter()
            .find(|spec| !state.products.contains_key(&spec.component_id))
        {
            return Err(StoreError::ForeignKeyViolation(format!(
                "unknown component {}",
                missing.component_id
            )));
        }

        let list = components
            .iter()
            .map(|spec| (spec.component_id.clone(), spec.quantity_per_pack))
            .collect();
        state.components.insert(pack_id.to_string(), list);
        Ok(())
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// A plain product with `real_stock` units, all counters in sync.
pub fn sample_product(id: &str, real_stock: i64) -> Product {
    let now = Utc::now();
    Product {
        id: id.to_string(),
        sku: id.to_uppercase(),
        slug: id.to_string(),
        name: id.to_string(),
        price_per_day_cents: 1000,
        real_stock,
        stock: real_stock,
        available_stock: real_stock,
        is_pack: false,
        is_active: true,
        status: ProductStatus::Available,
        created_at: now,
        updated_at: now,
    }
}

/// A pack with no stock of its own.
pub fn sample_pack(id: &str) -> Product {
    Product {
        is_pack: true,
        ..sample_product(id, 0)
    }
}
