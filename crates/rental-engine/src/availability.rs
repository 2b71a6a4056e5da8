//! # Availability Calculator
//!
//! Answers "can I rent N units of this product over these days?".
//!
//! ## Check Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  check(product, [start, end], quantity)                                 │
//! │       │                                                                 │
//! │       ├── validate quantity ──────────────────► VALIDATION_ERROR       │
//! │       ├── find_product ───────── None ────────► NOT_FOUND              │
//! │       ├── !is_active ─────────────────────────► unavailable            │
//! │       ├── start − today > lead-time days ─────► available (exempt)     │
//! │       ▼                                                                 │
//! │  reserved = Σ qty of active items overlapping [start, end]              │
//! │  raw      = realStock − reserved          (signed, for diagnostics)     │
//! │  free     = max(raw, 0)                                                 │
//! │  available = raw >= quantity                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use rental_core::availability::{
    booked_days, daily_availability, utilization_summary, DailyAvailability, UtilizationSummary,
};
use rental_core::validation::{validate_calendar_span, validate_id, validate_quantity};
use rental_core::{DateRange, Product, ReservationPolicy, StockWindow};

use crate::clock::Clock;
use crate::error::{EngineError, EngineResult};
use crate::store::InventoryStore;

/// Reason reported for a soft-deleted or otherwise deactivated product.
pub const INACTIVE_PRODUCT_REASON: &str = "product is not active";

// =============================================================================
// Result Types
// =============================================================================

/// Outcome of a single-product availability check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResult {
    pub product_id: String,
    pub product_name: String,
    pub available: bool,
    /// Free units in the window, never negative.
    pub available_quantity: i64,
    pub requested_quantity: i64,
    /// Units held by active overlapping reservations.
    pub reserved_quantity: i64,
    /// `realStock - reserved` before flooring. Negative means overbooked.
    pub raw_available: i64,
    /// True when the lead-time exemption answered without the ledger.
    pub lead_time_exempt: bool,
    /// Set when the product was refused without looking at the ledger.
    pub reason: Option<String>,
}

/// One line of a multi-product check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRequest {
    pub product_id: String,
    #[ts(as = "String")]
    pub start_date: NaiveDate,
    #[ts(as = "String")]
    pub end_date: NaiveDate,
    pub quantity: i64,
}

impl AvailabilityRequest {
    pub fn range(&self) -> EngineResult<DateRange> {
        Ok(DateRange::new(self.start_date, self.end_date)?)
    }
}

/// Outcome of a multi-product check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MultiAvailability {
    /// True only if every line is available.
    pub available: bool,
    /// Names of products that failed, in request order.
    pub unavailable_products: Vec<String>,
    pub results: Vec<AvailabilityResult>,
}

// =============================================================================
// Calculator
// =============================================================================

/// Read-only availability queries over an [`InventoryStore`].
#[derive(Clone)]
pub struct AvailabilityCalculator {
    store: Arc<dyn InventoryStore>,
    clock: Arc<dyn Clock>,
    policy: ReservationPolicy,
    max_calendar_days: u32,
}

impl AvailabilityCalculator {
    pub fn new(
        store: Arc<dyn InventoryStore>,
        clock: Arc<dyn Clock>,
        policy: ReservationPolicy,
        max_calendar_days: u32,
    ) -> Self {
        AvailabilityCalculator {
            store,
            clock,
            policy,
            max_calendar_days,
        }
    }

    pub fn policy(&self) -> &ReservationPolicy {
        &self.policy
    }

    /// Loads a product or fails with `NOT_FOUND`.
    pub(crate) async fn load_product(&self, product_id: &str) -> EngineResult<Product> {
        validate_id("product id", product_id)?;
        self.store
            .find_product(product_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Product", product_id))
    }

    /// Free stock of `product` over `range`, ignoring the lead-time
    /// exemption.
    pub(crate) async fn window(
        &self,
        product: &Product,
        range: &DateRange,
        requested: i64,
    ) -> EngineResult<StockWindow> {
        let reserved = self
            .store
            .aggregate_reserved_quantity(&product.id, range, &self.policy.active_statuses)
            .await?;

        debug!(
            product_id = %product.id,
            start = %range.start(),
            end = %range.end(),
            real_stock = product.real_stock,
            reserved,
            "Aggregated overlapping reservations"
        );

        Ok(StockWindow::compute(product.real_stock, reserved, requested))
    }

    /// Single-product availability.
    pub async fn check(
        &self,
        product_id: &str,
        range: &DateRange,
        quantity: i64,
    ) -> EngineResult<AvailabilityResult> {
        validate_quantity(quantity)?;
        let product = self.load_product(product_id).await?;

        if !product.is_active {
            debug!(product_id, status = ?product.status, "Product is inactive");
            return Ok(AvailabilityResult {
                product_id: product.id,
                product_name: product.name,
                available: false,
                available_quantity: 0,
                requested_quantity: quantity,
                reserved_quantity: 0,
                raw_available: 0,
                lead_time_exempt: false,
                reason: Some(INACTIVE_PRODUCT_REASON.to_string()),
            });
        }

        if self.policy.is_exempt(range.start(), self.clock.today()) {
            debug!(product_id, start = %range.start(), "Lead-time exemption applies");
            return Ok(AvailabilityResult {
                product_id: product.id,
                product_name: product.name,
                available: true,
                available_quantity: quantity,
                requested_quantity: quantity,
                reserved_quantity: 0,
                raw_available: quantity,
                lead_time_exempt: true,
                reason: None,
            });
        }

        let window = self.window(&product, range, quantity).await?;

        Ok(AvailabilityResult {
            product_id: product.id,
            product_name: product.name,
            available: window.is_available(),
            available_quantity: window.available_quantity(),
            requested_quantity: quantity,
            reserved_quantity: window.reserved(),
            raw_available: window.raw_available(),
            lead_time_exempt: false,
            reason: None,
        })
    }

    /// Checks every line; the whole request is available only if each line is.
    ///
    /// Lines are independent: two lines for the same product do not add up.
    pub async fn check_many(&self, requests: &[AvailabilityRequest]) -> EngineResult<MultiAvailability> {
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            let range = request.range()?;
            results.push(self.check(&request.product_id, &range, request.quantity).await?);
        }

        let unavailable_products: Vec<String> = results
            .iter()
            .filter(|r| !r.available)
            .map(|r| r.product_name.clone())
            .collect();

        Ok(MultiAvailability {
            available: unavailable_products.is_empty(),
            unavailable_products,
            results,
        })
    }

    /// Per-day reserved and free units.
    pub async fn calendar(
        &self,
        product_id: &str,
        range: &DateRange,
    ) -> EngineResult<Vec<DailyAvailability>> {
        validate_calendar_span(range.num_days(), self.max_calendar_days)?;
        let product = self.load_product(product_id).await?;

        let reservations = self
            .store
            .find_reservations(&product.id, range, &self.policy.active_statuses)
            .await?;

        Ok(daily_availability(
            product.real_stock,
            &reservations,
            range,
            &self.policy,
        ))
    }

    /// Days inside `range` covered by at least one active reservation.
    pub async fn booked_dates(
        &self,
        product_id: &str,
        range: &DateRange,
    ) -> EngineResult<Vec<NaiveDate>> {
        validate_calendar_span(range.num_days(), self.max_calendar_days)?;
        let product = self.load_product(product_id).await?;

        let reservations = self
            .store
            .find_reservations(&product.id, range, &self.policy.active_statuses)
            .await?;

        Ok(booked_days(&reservations, range, &self.policy))
    }

    /// Booking statistics over the next `days` days, today included.
    pub async fn summary(&self, product_id: &str, days: u32) -> EngineResult<UtilizationSummary> {
        validate_calendar_span(i64::from(days), self.max_calendar_days)?;
        let product = self.load_product(product_id).await?;

        let window = DateRange::starting_at(self.clock.today(), days);
        let reservations = self
            .store
            .find_reservations(&product.id, &window, &self.policy.active_statuses)
            .await?;

        Ok(utilization_summary(
            product.real_stock,
            &reservations,
            &window,
            &self.policy,
        ))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
