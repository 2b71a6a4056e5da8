//! # Money
//!
//! Daily rental prices held as integer cents.
//!
//! Pack pricing adds up `component price × quantity per pack` over every
//! component, so amounts stay integral. The only floating point step is the
//! savings percentage, which is rounded to a whole percent.
//!
//! ```rust
//! use rental_core::money::Money;
//!
//! let speaker = Money::from_cents(3500);
//! let pair = speaker.multiply_quantity(2);
//! assert_eq!(pair.cents(), 7000);
//! assert_eq!(pair.to_string(), "€70.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use ts_rs::TS;

/// An amount in cents. Negative values are legal (a pack can cost more than
/// its parts).
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Unit price times quantity. Saturates instead of wrapping.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// `self` as a whole percentage of `base`, rounded half away from zero.
    /// A zero base yields 0.
    ///
    /// ```rust
    /// use rental_core::money::Money;
    ///
    /// let saved = Money::from_cents(600);
    /// assert_eq!(saved.percent_of(Money::from_cents(3000)), 20);
    /// assert_eq!(saved.percent_of(Money::zero()), 0);
    /// ```
    pub fn percent_of(&self, base: Money) -> i64 {
        if base.is_zero() {
            return 0;
        }
        (self.0 as f64 / base.0 as f64 * 100.0).round() as i64
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}€{}.{:02}", abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}
