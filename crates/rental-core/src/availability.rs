//! # Availability Math
//!
//! Pure date-range and stock arithmetic behind every availability answer.
//!
//! ## The Overlap Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Two inclusive day ranges [s1, e1] and [s2, e2] overlap iff            │
//! │                                                                         │
//! │        s1 <= e2  AND  e1 >= s2                                          │
//! │                                                                         │
//! │  reservation   ├──────────┤              June 1 ─ June 3                │
//! │  query               ├──────────┤        June 2 ─ June 4   → overlap    │
//! │  query                          ├─────┤  June 3 ─ June 5   → overlap    │
//! │  query                               ├─┤ June 4 ─ June 6   → none      │
//! │                                                                         │
//! │  Touching on a single day counts: both bounds are inclusive.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Reservation Policy
//! Which order states still hold stock, and how far out the lead-time
//! exemption starts, are both explicit parameters of [`ReservationPolicy`].
//! Every read path (product and pack) uses the same policy value.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::{OrderStatus, Reservation};
use crate::DEFAULT_LEAD_TIME_EXEMPTION_DAYS;

// =============================================================================
// Date Range
// =============================================================================

/// An inclusive range of rental days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    #[ts(as = "String")]
    start: NaiveDate,
    #[ts(as = "String")]
    end: NaiveDate,
}

impl DateRange {
    /// Creates a range, rejecting `end < start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::InvertedRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(DateRange { start, end })
    }

    /// A range covering exactly one day.
    pub fn single_day(day: NaiveDate) -> Self {
        DateRange { start: day, end: day }
    }

    /// `days` consecutive days starting at `start` (at least one).
    pub fn starting_at(start: NaiveDate, days: u32) -> Self {
        let span = i64::from(days.max(1)) - 1;
        DateRange {
            start,
            end: start + Duration::days(span),
        }
    }

    #[inline]
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    #[inline]
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days covered, bounds included.
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Inclusive-bounds overlap test.
    #[inline]
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start <= other.end && self.end >= other.start
    }

    #[inline]
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// The days shared by both ranges, if any.
    pub fn intersection(&self, other: &DateRange) -> Option<DateRange> {
        if !self.overlaps(other) {
            return None;
        }
        Some(DateRange {
            start: self.start.max(other.start),
            end: self.end.min(other.end),
        })
    }

    /// Iterates every day in the range.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

// =============================================================================
// Reservation Policy
// =============================================================================

/// The single reservation policy applied to every availability path.
///
/// ## Defaults
/// - Active statuses: PENDING, IN_PROGRESS. A COMPLETED (returned) rental
///   frees its stock immediately.
/// - Lead-time exemption: 30 days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationPolicy {
    /// Order statuses whose items still count toward reserved stock.
    pub active_statuses: Vec<OrderStatus>,

    /// Bookings starting more than this many days after today are always
    /// available. `None` disables the exemption.
    pub lead_time_exemption_days: Option<u32>,
}

impl Default for ReservationPolicy {
    fn default() -> Self {
        ReservationPolicy {
            active_statuses: vec![OrderStatus::Pending, OrderStatus::InProgress],
            lead_time_exemption_days: Some(DEFAULT_LEAD_TIME_EXEMPTION_DAYS),
        }
    }
}

impl ReservationPolicy {
    /// Returns true if items of an order in `status` hold stock.
    pub fn counts(&self, status: OrderStatus) -> bool {
        self.active_statuses.contains(&status)
    }

    /// Lead-time exemption check.
    ///
    /// Exempt when the whole number of days between `today` and `start` is
    /// strictly greater than the threshold.
    pub fn is_exempt(&self, start: NaiveDate, today: NaiveDate) -> bool {
        match self.lead_time_exemption_days {
            Some(threshold) => (start - today).num_days() > i64::from(threshold),
            None => false,
        }
    }

    /// Sum of quantities of active reservations overlapping `range`.
    ///
    /// Reference implementation of the ledger aggregation; storage backends
    /// must agree with it.
    pub fn reserved_quantity<'a, I>(&self, reservations: I, range: &DateRange) -> i64
    where
        I: IntoIterator<Item = &'a Reservation>,
    {
        reservations
            .into_iter()
            .filter(|r| self.counts(r.status) && r.range().overlaps(range))
            .map(|r| r.quantity)
            .sum()
    }
}

// =============================================================================
// Stock Window
// =============================================================================

/// Free stock of one product over one query window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockWindow {
    real_stock: i64,
    reserved: i64,
    requested: i64,
}

impl StockWindow {
    pub fn compute(real_stock: i64, reserved: i64, requested: i64) -> Self {
        StockWindow {
            real_stock,
            reserved,
            requested,
        }
    }

    /// `real_stock - reserved`, signed. Negative means the ledger is
    /// overbooked for this window.
    #[inline]
    pub fn raw_available(&self) -> i64 {
        self.real_stock - self.reserved
    }

    /// Free units as reported to callers (never negative).
    #[inline]
    pub fn available_quantity(&self) -> i64 {
        self.raw_available().max(0)
    }

    #[inline]
    pub fn reserved(&self) -> i64 {
        self.reserved
    }

    #[inline]
    pub fn is_available(&self) -> bool {
        self.raw_available() >= self.requested
    }
}

// =============================================================================
// Calendar & Summary
// =============================================================================

/// One day of an availability calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DailyAvailability {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub reserved: i64,
    pub available: i64,
}

/// Per-day reserved/free units for every day of `range`.
///
/// Unlike the window aggregation, a reservation only counts on the days it
/// actually covers.
pub fn daily_availability(
    real_stock: i64,
    reservations: &[Reservation],
    range: &DateRange,
    policy: &ReservationPolicy,
) -> Vec<DailyAvailability> {
    range
        .days()
        .map(|date| {
            let reserved: i64 = reservations
                .iter()
                .filter(|r| policy.counts(r.status) && r.range().contains(date))
                .map(|r| r.quantity)
                .sum();
            DailyAvailability {
                date,
                reserved,
                available: (real_stock - reserved).max(0),
            }
        })
        .collect()
}

/// Days inside `range` covered by at least one active reservation, sorted.
pub fn booked_days(
    reservations: &[Reservation],
    range: &DateRange,
    policy: &ReservationPolicy,
) -> Vec<NaiveDate> {
    let days: BTreeSet<NaiveDate> = reservations
        .iter()
        .filter(|r| policy.counts(r.status))
        .filter_map(|r| r.range().intersection(range))
        .flat_map(|overlap| overlap.days().collect::<Vec<_>>())
        .collect();
    days.into_iter().collect()
}

/// Booking statistics for a product over an upcoming window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UtilizationSummary {
    pub total_stock: i64,
    pub window_days: i64,
    pub total_bookings: i64,
    pub total_quantity_booked: i64,
    /// Mean reservation length in rental days (both end days count), rounded.
    pub average_booking_days: i64,
    /// Booked quantity / (stock × days) × 100, two decimals.
    pub utilization_rate: f64,
}

/// Summarizes active reservations that start inside `window`.
pub fn utilization_summary(
    real_stock: i64,
    reservations: &[Reservation],
    window: &DateRange,
    policy: &ReservationPolicy,
) -> UtilizationSummary {
    let upcoming: Vec<&Reservation> = reservations
        .iter()
        .filter(|r| policy.counts(r.status) && window.contains(r.start_date))
        .collect();

    let total_bookings = upcoming.len() as i64;
    let total_quantity_booked: i64 = upcoming.iter().map(|r| r.quantity).sum();
    let total_days: i64 = upcoming.iter().map(|r| r.range().num_days()).sum();

    let average_booking_days = if total_bookings == 0 {
        0
    } else {
        (total_days as f64 / total_bookings as f64).round() as i64
    };

    let capacity = real_stock * window.num_days();
    let utilization_rate = if capacity <= 0 {
        0.0
    } else {
        let rate = total_quantity_booked as f64 / capacity as f64 * 100.0;
        (rate * 100.0).round() / 100.0
    };

    UtilizationSummary {
        total_stock: real_stock,
        window_days: window.num_days(),
        total_bookings,
        total_quantity_booked,
        average_booking_days,
        utilization_rate,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
