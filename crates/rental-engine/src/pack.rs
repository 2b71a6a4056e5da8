//! # Pack Availability Resolver
//!
//! A pack is available only if every component is, simultaneously.
//!
//! ## Per-Component Evaluation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  required = quantity_per_pack × pack quantity                           │
//! │                                                                         │
//! │  realStock < required ?                                                 │
//! │     yes ──► "insufficient total stock"   (available = realStock)        │
//! │     no  ──► overlap availability for the dates                          │
//! │               < required ? ──► "unavailable for these dates"            │
//! │                                                                         │
//! │  Pack available ⇔ no component flagged                                  │
//! │  No components  ⇔ never available ("no components configured")        │
//! │  Inactive pack  ⇔ never available ("pack is not active")              │
//! │  The lead-time exemption never applies to packs.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ts_rs::TS;

use rental_core::pack::{
    bottleneck, dated_shortfall, packs_supported, physical_shortfall, required_units,
    ComponentShortfall, PackPricing,
};
use rental_core::validation::{validate_component_specs, validate_quantity};
use rental_core::{ComponentSpec, DateRange, PackComponent, Product, ValidationError};

use crate::availability::AvailabilityCalculator;
use crate::error::{EngineError, EngineResult};
use crate::store::InventoryStore;

/// Reason reported for a pack with an empty component set.
pub const NO_COMPONENTS_REASON: &str = "no components configured";

/// Reported when the pack itself has been deactivated or soft-deleted.
pub const INACTIVE_PACK_REASON: &str = "pack is not active";

// =============================================================================
// Result Types
// =============================================================================

/// A component that blocks a pack request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UnavailableComponent {
    pub component_id: String,
    pub component_name: String,
    pub required: i64,
    pub available: i64,
    pub shortfall: ComponentShortfall,
    pub reason: String,
}

/// Outcome of a pack availability check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PackAvailability {
    pub pack_id: String,
    pub available: bool,
    pub requested_quantity: i64,
    pub unavailable_components: Vec<UnavailableComponent>,
    /// Set when the pack as a whole cannot be evaluated.
    pub reason: Option<String>,
}

/// How many packs one component can supply over the window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ComponentCapacity {
    pub component_id: String,
    pub component_name: String,
    pub quantity_per_pack: i64,
    pub available: i64,
    pub packs_supported: i64,
    pub is_bottleneck: bool,
}

/// Largest pack quantity every component can cover at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PackMaxAvailability {
    pub pack_id: String,
    pub max_available_quantity: i64,
    pub bottleneck_component_id: Option<String>,
    pub components: Vec<ComponentCapacity>,
}

// =============================================================================
// Resolver
// =============================================================================

/// Pack reads plus the guarded composition write.
#[derive(Clone)]
pub struct PackResolver {
    store: Arc<dyn InventoryStore>,
    availability: AvailabilityCalculator,
}

impl PackResolver {
    pub fn new(store: Arc<dyn InventoryStore>, availability: AvailabilityCalculator) -> Self {
        PackResolver {
            store,
            availability,
        }
    }

    /// Loads a product and insists it is a pack.
    async fn load_pack(&self, pack_id: &str) -> EngineResult<Product> {
        let pack = self.availability.load_product(pack_id).await?;
        if !pack.is_pack {
            return Err(EngineError::NotAPack(pack.id));
        }
        Ok(pack)
    }

    /// Can `quantity` packs be rented over `range`?
    pub async fn check(
        &self,
        pack_id: &str,
        range: &DateRange,
        quantity: i64,
    ) -> EngineResult<PackAvailability> {
        validate_quantity(quantity)?;
        let pack = self.load_pack(pack_id).await?;

        if !pack.is_active {
            debug!(pack_id = %pack.id, status = ?pack.status, "Pack is inactive");
            return Ok(PackAvailability {
                pack_id: pack.id,
                available: false,
                requested_quantity: quantity,
                unavailable_components: Vec::new(),
                reason: Some(INACTIVE_PACK_REASON.to_string()),
            });
        }

        let components = self.store.find_components_of_pack(&pack.id).await?;

        if components.is_empty() {
            debug!(pack_id = %pack.id, "Pack has no components");
            return Ok(PackAvailability {
                pack_id: pack.id,
                available: false,
                requested_quantity: quantity,
                unavailable_components: Vec::new(),
                reason: Some(NO_COMPONENTS_REASON.to_string()),
            });
        }

        let mut unavailable_components = Vec::new();
        for PackComponent {
            quantity_per_pack,
            component,
        } in &components
        {
            let required = required_units(*quantity_per_pack, quantity);

            let (shortfall, available) = match physical_shortfall(component.real_stock, required)
            {
                Some(shortfall) => (Some(shortfall), component.real_stock),
                None => {
                    let window = self.availability.window(component, range, required).await?;
                    let free = window.available_quantity();
                    (dated_shortfall(free, required), free)
                }
            };

            if let Some(shortfall) = shortfall {
                unavailable_components.push(UnavailableComponent {
                    component_id: component.id.clone(),
                    component_name: component.name.clone(),
                    required,
                    available,
                    shortfall,
                    reason: shortfall.reason().to_string(),
                });
            }
        }

        debug!(
            pack_id = %pack.id,
            quantity,
            blocked = unavailable_components.len(),
            "Evaluated pack components"
        );

        Ok(PackAvailability {
            pack_id: pack.id,
            available: unavailable_components.is_empty(),
            requested_quantity: quantity,
            unavailable_components,
            reason: None,
        })
    }

    /// Largest satisfiable pack quantity over `range` (bottleneck law).
    pub async fn max_availability(
        &self,
        pack_id: &str,
        range: &DateRange,
    ) -> EngineResult<PackMaxAvailability> {
        let pack = self.load_pack(pack_id).await?;
        let components = self.store.find_components_of_pack(&pack.id).await?;

        let mut capacities = Vec::with_capacity(components.len());
        for entry in &components {
            let window = self.availability.window(&entry.component, range, 0).await?;
            let available = window.available_quantity();
            capacities.push(ComponentCapacity {
                component_id: entry.component.id.clone(),
                component_name: entry.component.name.clone(),
                quantity_per_pack: entry.quantity_per_pack,
                available,
                packs_supported: packs_supported(available, entry.quantity_per_pack),
                is_bottleneck: false,
            });
        }

        // An inactive pack rents nothing, whatever its components could cover.
        let (max_available_quantity, bottleneck_idx) = if pack.is_active {
            bottleneck(capacities.iter().map(|c| c.packs_supported))
        } else {
            (0, None)
        };

        let bottleneck_component_id = bottleneck_idx.and_then(|idx| {
            let capacity = capacities.get_mut(idx)?;
            capacity.is_bottleneck = true;
            Some(capacity.component_id.clone())
        });

        Ok(PackMaxAvailability {
            pack_id: pack.id,
            max_available_quantity,
            bottleneck_component_id,
            components: capacities,
        })
    }

    /// Pack price against renting its parts one by one.
    pub async fn pricing(&self, pack_id: &str) -> EngineResult<PackPricing> {
        let pack = self.load_pack(pack_id).await?;
        let components = self.store.find_components_of_pack(&pack.id).await?;

        Ok(PackPricing::compute(
            pack.price_per_day(),
            components
                .iter()
                .map(|c| (c.component.price_per_day(), c.quantity_per_pack)),
        ))
    }

    /// Replaces a pack's component set.
    ///
    /// Callers must run this through the mutation guard.
    pub async fn set_components(
        &self,
        pack_id: &str,
        specs: &[ComponentSpec],
    ) -> EngineResult<Vec<PackComponent>> {
        validate_component_specs(pack_id, specs)?;
        let pack = self.load_pack(pack_id).await?;

        for spec in specs {
            if self.store.find_product(&spec.component_id).await?.is_none() {
                return Err(EngineError::not_found("Product", &spec.component_id));
            }
        }

        let ancestors = self.ancestors(&pack.id).await?;
        if let Some(spec) = specs.iter().find(|s| ancestors.contains(&s.component_id)) {
            return Err(ValidationError::CyclicComponent {
                pack_id: pack.id,
                component_id: spec.component_id.clone(),
            }
            .into());
        }

        self.store.replace_pack_components(&pack.id, specs).await?;
        info!(pack_id = %pack.id, components = specs.len(), "Pack components replaced");

        Ok(self.store.find_components_of_pack(&pack.id).await?)
    }

    /// Every pack that contains `pack_id`, directly or through other packs.
    async fn ancestors(&self, pack_id: &str) -> EngineResult<HashSet<String>> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([pack_id.to_string()]);

        while let Some(current) = queue.pop_front() {
            for parent in self.store.packs_containing(&current).await? {
                if seen.insert(parent.clone()) {
                    queue.push_back(parent);
                }
            }
        }

        Ok(seen)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::store::memory::{sample_pack, sample_product, InMemoryStore};
    use chrono::NaiveDate;
    use rental_core::{Money, OrderStatus, ReservationPolicy};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn range(s: u32, e: u32) -> DateRange {
        DateRange::new(day(s), day(e)).unwrap()
    }

    fn spec(id: &str, qty: i64) -> ComponentSpec {
        ComponentSpec {
            component_id: id.to_string(),
            quantity_per_pack: qty,
        }
    }

    fn resolver(store: Arc<InMemoryStore>) -> PackResolver {
        let calc = AvailabilityCalculator::new(
            store.clone(),
            Arc::new(FixedClock(day(1))),
            ReservationPolicy::default(),
            366,
        );
        PackResolver::new(store, calc)
    }

    /// DJ set = 2 × speaker (5 owned) + 1 × mixer (10 owned).
    fn dj_store() -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        store.insert_product(sample_product("speaker", 5)).unwrap();
        store.insert_product(sample_product("mixer", 10)).unwrap();
        store.insert_product(sample_pack("dj-set")).unwrap();
        store
            .set_components("dj-set", &[("speaker", 2), ("mixer", 1)])
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_bottleneck() {
        let max = resolver(dj_store())
            .max_availability("dj-set", &range(1, 3))
            .await
            .unwrap();

        assert_eq!(max.max_available_quantity, 2);
        assert_eq!(max.bottleneck_component_id.as_deref(), Some("speaker"));
        let speaker = max
            .components
            .iter()
            .find(|c| c.component_id == "speaker")
            .unwrap();
        assert!(speaker.is_bottleneck);
        assert_eq!(speaker.packs_supported, 2);
    }

    #[tokio::test]
    async fn test_bottleneck_follows_reservations() {
        let store = dj_store();
        store
            .create_order(OrderStatus::Pending, &[("mixer", 9, range(2, 2))])
            .unwrap();

        let max = resolver(store)
            .max_availability("dj-set", &range(1, 3))
            .await
            .unwrap();
        assert_eq!(max.max_available_quantity, 1);
        assert_eq!(max.bottleneck_component_id.as_deref(), Some("mixer"));
    }

    #[tokio::test]
    async fn test_soft_deleted_pack_is_unavailable() {
        let store = dj_store();
        store.soft_delete_product("dj-set").await.unwrap();
        let resolver = resolver(store);

        let check = resolver.check("dj-set", &range(2, 3), 1).await.unwrap();
        assert!(!check.available);
        assert!(check.unavailable_components.is_empty());
        assert_eq!(check.reason.as_deref(), Some(INACTIVE_PACK_REASON));

        let max = resolver.max_availability("dj-set", &range(2, 3)).await.unwrap();
        assert_eq!(max.max_available_quantity, 0);
        assert_eq!(max.bottleneck_component_id, None);
        assert_eq!(max.components.len(), 2);
        assert!(max.components.iter().all(|c| !c.is_bottleneck));
    }

    #[tokio::test]
    async fn test_zero_components() {
        let store = Arc::new(InMemoryStore::new());
        store.insert_product(sample_pack("empty")).unwrap();
        let resolver = resolver(store);

        let check = resolver.check("empty", &range(1, 1), 1).await.unwrap();
        assert!(!check.available);
        assert_eq!(check.reason.as_deref(), Some(NO_COMPONENTS_REASON));

        let max = resolver.max_availability("empty", &range(1, 1)).await.unwrap();
        assert_eq!(max.max_available_quantity, 0);
        assert_eq!(max.bottleneck_component_id, None);
    }

    #[tokio::test]
    async fn test_check_reports_both_shortfall_kinds() {
        let store = dj_store();
        store
            .create_order(OrderStatus::InProgress, &[("mixer", 8, range(1, 5))])
            .unwrap();
        let resolver = resolver(store);

        // 3 sets: 6 speakers (only 5 owned), 3 mixers (2 free).
        let check = resolver.check("dj-set", &range(2, 3), 3).await.unwrap();
        assert!(!check.available);
        assert_eq!(check.unavailable_components.len(), 2);

        // Components come back ordered by name.
        let mixer = &check.unavailable_components[0];
        assert_eq!(mixer.component_id, "mixer");
        assert_eq!(mixer.reason, "unavailable for these dates");
        assert_eq!(mixer.available, 2);

        let speaker = &check.unavailable_components[1];
        assert_eq!(speaker.component_id, "speaker");
        assert_eq!(speaker.shortfall, ComponentShortfall::InsufficientTotalStock);
        assert_eq!(speaker.required, 6);
        assert_eq!(speaker.available, 5);

        let check = resolver.check("dj-set", &range(2, 3), 2).await.unwrap();
        assert!(check.available);
    }

    #[tokio::test]
    async fn test_no_lead_time_exemption_for_packs() {
        let store = dj_store();
        let far = DateRange::starting_at(day(1) + chrono::Duration::days(60), 2);
        store
            .create_order(OrderStatus::Pending, &[("speaker", 5, far)])
            .unwrap();

        let check = resolver(store).check("dj-set", &far, 1).await.unwrap();
        assert!(!check.available);
    }

    #[tokio::test]
    async fn test_not_a_pack() {
        let resolver = resolver(dj_store());
        let err = resolver.check("speaker", &range(1, 1), 1).await.unwrap_err();
        assert!(matches!(err, EngineError::NotAPack(_)));

        let err = resolver.max_availability("ghost", &range(1, 1)).await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_pricing() {
        let store = dj_store();
        let mut pack = store.product("dj-set").unwrap().unwrap();
        pack.price_per_day_cents = 2400;
        store.insert_product(pack).unwrap();

        // speakers and mixer rent at 10.00 each: 2 × 10 + 1 × 10 = 30
        let pricing = resolver(store).pricing("dj-set").await.unwrap();
        assert_eq!(pricing.individual_price, Money::from_cents(3000));
        assert_eq!(pricing.savings, Money::from_cents(600));
        assert_eq!(pricing.savings_percentage, 20);
    }

    #[tokio::test]
    async fn test_set_components() {
        let store = dj_store();
        let resolver = resolver(store);

        let components = resolver
            .set_components("dj-set", &[spec("speaker", 4)])
            .await
            .unwrap();
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].quantity_per_pack, 4);

        let err = resolver
            .set_components("dj-set", &[spec("ghost", 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));

        let err = resolver
            .set_components("dj-set", &[spec("speaker", 1), spec("speaker", 2)])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::DuplicateComponent { .. })
        ));

        let err = resolver
            .set_components("speaker", &[spec("mixer", 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotAPack(_)));
    }

    #[tokio::test]
    async fn test_transitive_cycle_rejected() {
        let store = dj_store();
        store.insert_product(sample_pack("stage")).unwrap();
        store.insert_product(sample_pack("festival")).unwrap();
        // festival ⊃ stage ⊃ dj-set
        store.set_components("stage", &[("dj-set", 1)]).unwrap();
        store.set_components("festival", &[("stage", 1)]).unwrap();
        let resolver = resolver(store);

        let err = resolver
            .set_components("dj-set", &[spec("festival", 1)])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::CyclicComponent { .. })
        ));

        let err = resolver
            .set_components("dj-set", &[spec("dj-set", 1)])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::CyclicComponent { .. })
        ));
    }
}
