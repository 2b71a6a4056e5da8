//! # Rental Engine
//!
//! The one object callers hold. Wires a store, a clock, the reservation
//! policy and a mutation guard into the calculator, the pack resolver and
//! the deleter.
//!
//! ## Read vs. Guarded Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          RentalEngine                                   │
//! │                                                                         │
//! │  concurrent, unguarded                 serialized by MutationGuard      │
//! │  ──────────────────────                ──────────────────────────────   │
//! │  check_availability                    delete_product                   │
//! │  check_many                            set_pack_components              │
//! │  availability_calendar / booked_dates                                   │
//! │  availability_summary                  unguarded conditional write      │
//! │  check_pack_availability               ──────────────────────────────   │
//! │  pack_max_availability / pack_pricing  adjust_stock                     │
//! │                                                                         │
//! │                 └──────────────┬──────────────┘                         │
//! │                                ▼                                        │
//! │                    Arc<dyn InventoryStore>                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use rental_core::availability::{DailyAvailability, UtilizationSummary};
use rental_core::pack::PackPricing;
use rental_core::{ComponentSpec, DateRange, PackComponent, Product, ReservationPolicy};
use rental_db::Database;

use crate::availability::{
    AvailabilityCalculator, AvailabilityRequest, AvailabilityResult, MultiAvailability,
};
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::deletion::{DeletionOutcome, ProductDeleter};
use crate::error::EngineResult;
use crate::guard::MutationGuard;
use crate::pack::{PackAvailability, PackMaxAvailability, PackResolver};
use crate::stock::{self, StockOperation};
use crate::store::sqlite::SqliteStore;
use crate::store::{InventoryStore, StoreError};

// =============================================================================
// Builder
// =============================================================================

/// Assembles a [`RentalEngine`] around an existing store.
pub struct RentalEngineBuilder {
    store: Arc<dyn InventoryStore>,
    config: EngineConfig,
    clock: Option<Arc<dyn Clock>>,
    guard: Option<MutationGuard>,
}

impl RentalEngineBuilder {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides the source of "today" (tests pin it).
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Shares an existing guard instead of spawning a new one.
    pub fn guard(mut self, guard: MutationGuard) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Builds the engine.
    ///
    /// Spawns a guard worker on the current tokio runtime unless one was
    /// supplied with [`Self::guard`].
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime and no guard was supplied,
    /// because spawning the worker needs one. Build a [`MutationGuard`] from
    /// a `GuardWorker` run on your own runtime to avoid this.
    pub fn build(self) -> EngineResult<RentalEngine> {
        self.config.validate()?;

        let policy = self.config.policy();
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let guard = self.guard.unwrap_or_else(MutationGuard::spawn);

        let availability = AvailabilityCalculator::new(
            self.store.clone(),
            clock,
            policy,
            self.config.availability.max_calendar_days,
        );
        let packs = PackResolver::new(self.store.clone(), availability.clone());
        let deleter = ProductDeleter::new(self.store.clone(), self.config.budget());

        Ok(RentalEngine {
            store: self.store,
            availability,
            packs,
            deleter,
            guard,
        })
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Availability, pack resolution and guarded inventory mutations.
///
/// ## Usage
/// ```rust,ignore
/// let engine = RentalEngine::open(EngineConfig::load(None)?).await?;
///
/// let result = engine
///     .check_availability("speaker-15", start, end, 4)
///     .await?;
/// if !result.available {
///     println!("only {} free", result.available_quantity);
/// }
/// ```
pub struct RentalEngine {
    store: Arc<dyn InventoryStore>,
    availability: AvailabilityCalculator,
    packs: PackResolver,
    deleter: ProductDeleter,
    guard: MutationGuard,
}

impl RentalEngine {
    pub fn builder(store: Arc<dyn InventoryStore>) -> RentalEngineBuilder {
        RentalEngineBuilder {
            store,
            config: EngineConfig::default(),
            clock: None,
            guard: None,
        }
    }

    /// Opens the SQLite database named by `config` (running migrations) and
    /// builds an engine over it.
    pub async fn open(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;

        let db = Database::new(config.db_config())
            .await
            .map_err(StoreError::from)?;
        info!(path = ?config.database.path, "Rental engine database ready");

        Self::builder(Arc::new(SqliteStore::new(db)))
            .config(config)
            .build()
    }

    pub fn store(&self) -> &Arc<dyn InventoryStore> {
        &self.store
    }

    pub fn guard(&self) -> &MutationGuard {
        &self.guard
    }

    pub fn policy(&self) -> &ReservationPolicy {
        self.availability.policy()
    }

    // =========================================================================
    // Single Products
    // =========================================================================

    /// Can `quantity` units of `product_id` be rented from `start` to `end`
    /// (both inclusive)?
    pub async fn check_availability(
        &self,
        product_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        quantity: i64,
    ) -> EngineResult<AvailabilityResult> {
        let range = DateRange::new(start, end)?;
        self.availability.check(product_id, &range, quantity).await
    }

    pub async fn check_many(
        &self,
        requests: &[AvailabilityRequest],
    ) -> EngineResult<MultiAvailability> {
        self.availability.check_many(requests).await
    }

    pub async fn availability_calendar(
        &self,
        product_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<Vec<DailyAvailability>> {
        let range = DateRange::new(start, end)?;
        self.availability.calendar(product_id, &range).await
    }

    pub async fn booked_dates(
        &self,
        product_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<Vec<NaiveDate>> {
        let range = DateRange::new(start, end)?;
        self.availability.booked_dates(product_id, &range).await
    }

    /// Utilization over the next `days` days.
    pub async fn availability_summary(
        &self,
        product_id: &str,
        days: u32,
    ) -> EngineResult<UtilizationSummary> {
        self.availability.summary(product_id, days).await
    }

    // =========================================================================
    // Packs
    // =========================================================================

    pub async fn check_pack_availability(
        &self,
        pack_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        quantity: i64,
    ) -> EngineResult<PackAvailability> {
        let range = DateRange::new(start, end)?;
        self.packs.check(pack_id, &range, quantity).await
    }

    pub async fn pack_max_availability(
        &self,
        pack_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<PackMaxAvailability> {
        let range = DateRange::new(start, end)?;
        self.packs.max_availability(pack_id, &range).await
    }

    pub async fn pack_pricing(&self, pack_id: &str) -> EngineResult<PackPricing> {
        self.packs.pricing(pack_id).await
    }

    /// Replaces a pack's components. Serialized with deletions.
    pub async fn set_pack_components(
        &self,
        pack_id: &str,
        components: Vec<ComponentSpec>,
    ) -> EngineResult<Vec<PackComponent>> {
        let packs = self.packs.clone();
        let pack_id = pack_id.to_string();
        self.guard
            .acquire(async move { packs.set_components(&pack_id, &components).await })
            .await
    }

    // =========================================================================
    // Inventory Mutations
    // =========================================================================

    /// Soft- or hard-deletes a product. Serialized with every other guarded
    /// mutation.
    pub async fn delete_product(
        &self,
        product_id: &str,
        force: bool,
    ) -> EngineResult<DeletionOutcome> {
        let deleter = self.deleter.clone();
        let product_id = product_id.to_string();
        self.guard
            .acquire(async move { deleter.delete(&product_id, force).await })
            .await
    }

    /// Conditional stock counter update.
    pub async fn adjust_stock(
        &self,
        product_id: &str,
        quantity: i64,
        operation: StockOperation,
    ) -> EngineResult<Product> {
        stock::adjust_stock(&self.store, product_id, quantity, operation).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::deletion::DeleteKind;
    use crate::error::{EngineError, ErrorCode};
    use crate::store::memory::{sample_pack, sample_product, InMemoryStore};
    use crate::store::{StockChange, StockUpdate, StoreResult, TransactionBudget};
    use async_trait::async_trait;
    use rental_core::{OrderStatus, RelationCounts, Reservation};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn engine_over(store: Arc<dyn InventoryStore>) -> RentalEngine {
        RentalEngine::builder(store)
            .clock(Arc::new(FixedClock(day(1))))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_reads_through_facade() {
        let store = Arc::new(InMemoryStore::new());
        store.insert_product(sample_product("speaker", 5)).unwrap();
        store
            .create_order(
                OrderStatus::Pending,
                &[("speaker", 2, DateRange::new(day(1), day(3)).unwrap())],
            )
            .unwrap();
        let engine = engine_over(store);

        let overlap = engine
            .check_availability("speaker", day(2), day(4), 4)
            .await
            .unwrap();
        assert!(!overlap.available);
        assert_eq!(overlap.available_quantity, 3);

        let clear = engine
            .check_availability("speaker", day(4), day(6), 5)
            .await
            .unwrap();
        assert!(clear.available);
        assert_eq!(clear.available_quantity, 5);

        let err = engine
            .check_availability("speaker", day(4), day(2), 1)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_forty_five_days_out_is_exempt() {
        let store = Arc::new(InMemoryStore::new());
        store.insert_product(sample_product("tent", 1)).unwrap();
        let engine = engine_over(store);

        let start = day(1) + chrono::Duration::days(45);
        let result = engine
            .check_availability("tent", start, start + chrono::Duration::days(2), 10)
            .await
            .unwrap();
        assert!(result.available);
        assert_eq!(result.available_quantity, 10);
    }

    #[tokio::test]
    async fn test_set_components_then_check() {
        let store = Arc::new(InMemoryStore::new());
        store.insert_product(sample_product("speaker", 5)).unwrap();
        store.insert_product(sample_product("mixer", 10)).unwrap();
        store.insert_product(sample_pack("dj-set")).unwrap();
        let engine = engine_over(store);

        let components = engine
            .set_pack_components(
                "dj-set",
                vec![
                    ComponentSpec {
                        component_id: "speaker".into(),
                        quantity_per_pack: 2,
                    },
                    ComponentSpec {
                        component_id: "mixer".into(),
                        quantity_per_pack: 1,
                    },
                ],
            )
            .await
            .unwrap();
        assert_eq!(components.len(), 2);

        let max = engine
            .pack_max_availability("dj-set", day(1), day(3))
            .await
            .unwrap();
        assert_eq!(max.max_available_quantity, 2);

        let err = engine
            .check_pack_availability("speaker", day(1), day(3), 1)
            .await
            .unwrap_err();
        assert_eq!(err.to_api().code, ErrorCode::NotAPack);
    }

    /// Counts guarded operations that overlap in time.
    struct InFlightStore {
        inner: InMemoryStore,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl InFlightStore {
        async fn track<T>(&self, op: impl std::future::Future<Output = T>) -> T {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            let out = op.await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            out
        }
    }

    #[async_trait]
    impl InventoryStore for InFlightStore {
        async fn find_product(&self, id: &str) -> StoreResult<Option<Product>> {
            self.inner.find_product(id).await
        }

        async fn find_components_of_pack(&self, pack_id: &str) -> StoreResult<Vec<PackComponent>> {
            self.inner.find_components_of_pack(pack_id).await
        }

        async fn packs_containing(&self, component_id: &str) -> StoreResult<Vec<String>> {
            self.inner.packs_containing(component_id).await
        }

        async fn aggregate_reserved_quantity(
            &self,
            product_id: &str,
            range: &DateRange,
            statuses: &[OrderStatus],
        ) -> StoreResult<i64> {
            self.inner
                .aggregate_reserved_quantity(product_id, range, statuses)
                .await
        }

        async fn find_reservations(
            &self,
            product_id: &str,
            range: &DateRange,
            statuses: &[OrderStatus],
        ) -> StoreResult<Vec<Reservation>> {
            self.inner.find_reservations(product_id, range, statuses).await
        }

        async fn relation_counts(&self, product_id: &str) -> StoreResult<RelationCounts> {
            self.track(self.inner.relation_counts(product_id)).await
        }

        async fn soft_delete_product(&self, id: &str) -> StoreResult<()> {
            self.track(self.inner.soft_delete_product(id)).await
        }

        async fn hard_delete_product(
            &self,
            id: &str,
            budget: TransactionBudget,
        ) -> StoreResult<()> {
            self.track(self.inner.hard_delete_product(id, budget)).await
        }

        async fn adjust_stock(&self, id: &str, change: StockChange) -> StoreResult<StockUpdate> {
            self.inner.adjust_stock(id, change).await
        }

        async fn replace_pack_components(
            &self,
            pack_id: &str,
            components: &[ComponentSpec],
        ) -> StoreResult<()> {
            self.inner.replace_pack_components(pack_id, components).await
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_deletes_are_serialized() {
        let ids = ["speaker", "mixer", "light", "fog", "cable"];
        let inner = InMemoryStore::new();
        for id in ids {
            inner.insert_product(sample_product(id, 5)).unwrap();
            inner
                .create_order(
                    OrderStatus::Pending,
                    &[(id, 1, DateRange::new(day(3), day(5)).unwrap())],
                )
                .unwrap();
        }
        let store = Arc::new(InFlightStore {
            inner,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        });
        let engine = Arc::new(engine_over(store.clone()));

        let mut tasks = Vec::new();
        for id in ids {
            let engine = engine.clone();
            tasks.push(tokio::spawn(async move {
                engine.delete_product(id, false).await
            }));
        }

        for (task, id) in tasks.into_iter().zip(ids) {
            let outcome = task.await.unwrap().unwrap();
            assert_eq!(outcome.product_id, id);
            assert_eq!(outcome.outcome, DeleteKind::Soft);
        }

        // Relation count and soft delete of one request never overlap another's.
        assert_eq!(store.max_in_flight.load(Ordering::SeqCst), 1);
        for id in ids {
            let product = store.inner.product(id).unwrap().unwrap();
            assert!(!product.is_active);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_repeated_deletes_of_one_product_stay_soft() {
        let inner = InMemoryStore::new();
        inner.insert_product(sample_product("speaker", 5)).unwrap();
        inner
            .create_order(
                OrderStatus::Completed,
                &[("speaker", 1, DateRange::single_day(day(1)))],
            )
            .unwrap();
        let store = Arc::new(InFlightStore {
            inner,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        });
        let engine = Arc::new(engine_over(store.clone()));

        let mut tasks = Vec::new();
        for _ in 0..5 {
            let engine = engine.clone();
            tasks.push(tokio::spawn(async move {
                engine.delete_product("speaker", false).await
            }));
        }

        for task in tasks {
            let outcome = task.await.unwrap().unwrap();
            assert_eq!(outcome.outcome, DeleteKind::Soft);
        }
        assert_eq!(store.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_hard_deletes_succeed_once() {
        let store = Arc::new(InMemoryStore::new());
        store.insert_product(sample_product("lamp", 1)).unwrap();
        let engine = Arc::new(engine_over(store.clone()));

        let mut tasks = Vec::new();
        for _ in 0..4 {
            let engine = engine.clone();
            tasks.push(tokio::spawn(async move {
                engine.delete_product("lamp", false).await
            }));
        }

        let mut hard = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(outcome) => {
                    assert_eq!(outcome.outcome, DeleteKind::Hard);
                    hard += 1;
                }
                Err(EngineError::NotFound { .. }) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(hard, 1);
    }

    #[test]
    #[should_panic]
    fn test_build_outside_runtime_panics() {
        let _ = RentalEngine::builder(Arc::new(InMemoryStore::new())).build();
    }

    #[test]
    fn test_build_with_supplied_guard_needs_no_runtime() {
        let (_worker, guard) = crate::guard::GuardWorker::new();
        let engine = RentalEngine::builder(Arc::new(InMemoryStore::new()))
            .guard(guard)
            .build()
            .unwrap();
        assert!(!engine.guard().is_closed());
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let mut config = EngineConfig::default();
        config.availability.active_statuses.clear();

        let err = RentalEngine::builder(Arc::new(InMemoryStore::new()))
            .config(config)
            .build()
            .err()
            .unwrap();
        assert_eq!(err.code(), ErrorCode::InternalError);
    }
}
