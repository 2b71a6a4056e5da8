//! # Pack Math
//!
//! A pack is only as available as its scarcest ingredient.
//!
//! ## Bottleneck Law
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Pack "DJ Set" = 2 × Speaker + 1 × Mixer                               │
//! │                                                                         │
//! │  Component   free   per pack   packs supported                          │
//! │  ─────────   ────   ────────   ───────────────                          │
//! │  Speaker       5        2       floor(5/2)  = 2   ◄── bottleneck        │
//! │  Mixer        10        1       floor(10/1) = 10                        │
//! │                                                                         │
//! │  max packs = min(2, 10) = 2                                             │
//! │  no components → 0 (never "unlimited")                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Component Evaluation
// =============================================================================

/// Why a component blocks a pack request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ComponentShortfall {
    /// The catalog does not own enough units, whatever the dates.
    InsufficientTotalStock,
    /// Enough units exist, but reservations hold them in this window.
    UnavailableForDates,
}

impl ComponentShortfall {
    pub fn reason(&self) -> &'static str {
        match self {
            ComponentShortfall::InsufficientTotalStock => "insufficient total stock",
            ComponentShortfall::UnavailableForDates => "unavailable for these dates",
        }
    }
}

/// Units of a component needed for `pack_quantity` packs.
#[inline]
pub fn required_units(quantity_per_pack: i64, pack_quantity: i64) -> i64 {
    quantity_per_pack.saturating_mul(pack_quantity)
}

/// Physical check that never needs the ledger.
///
/// Returns the shortfall when the component's owned units cannot cover
/// `required` on any date.
pub fn physical_shortfall(real_stock: i64, required: i64) -> Option<ComponentShortfall> {
    (real_stock < required).then_some(ComponentShortfall::InsufficientTotalStock)
}

/// Date check once the physical check passed.
pub fn dated_shortfall(available_for_dates: i64, required: i64) -> Option<ComponentShortfall> {
    (available_for_dates < required).then_some(ComponentShortfall::UnavailableForDates)
}

// =============================================================================
// Bottleneck
// =============================================================================

/// Whole packs a component can supply. Overbooked components supply none.
pub fn packs_supported(available: i64, quantity_per_pack: i64) -> i64 {
    if quantity_per_pack <= 0 {
        return 0;
    }
    available.max(0) / quantity_per_pack
}

/// Minimum over per-component pack counts, with the index of the first
/// component reaching it. Empty input yields `(0, None)`.
pub fn bottleneck<I>(packs_per_component: I) -> (i64, Option<usize>)
where
    I: IntoIterator<Item = i64>,
{
    packs_per_component
        .into_iter()
        .enumerate()
        .fold(None, |best: Option<(i64, usize)>, (idx, packs)| match best {
            Some((min, _)) if min <= packs => best,
            _ => Some((packs, idx)),
        })
        .map_or((0, None), |(min, idx)| (min, Some(idx)))
}

// =============================================================================
// Pricing
// =============================================================================

/// Price comparison between a pack and renting its parts individually.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PackPricing {
    pub pack_price: Money,
    pub individual_price: Money,
    /// Negative when the pack costs more than its parts.
    pub savings: Money,
    /// Rounded to a whole percent; 0 when the parts are free.
    pub savings_percentage: i64,
}

impl PackPricing {
    /// Builds the comparison from the pack's own daily price and
    /// `(component daily price, quantity per pack)` pairs.
    pub fn compute<I>(pack_price: Money, components: I) -> Self
    where
        I: IntoIterator<Item = (Money, i64)>,
    {
        let individual_price: Money = components
            .into_iter()
            .map(|(price, qty)| price.multiply_quantity(qty))
            .sum();

        let savings = individual_price - pack_price;
        let savings_percentage = savings.percent_of(individual_price);

        PackPricing {
            pack_price,
            individual_price,
            savings,
            savings_percentage,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bottleneck_scenario() {
        let packs = [packs_supported(5, 2), packs_supported(10, 1)];
        assert_eq!(packs, [2, 10]);
        assert_eq!(bottleneck(packs), (2, Some(0)));
    }

    #[test]
    fn test_bottleneck_empty_is_zero() {
        assert_eq!(bottleneck(Vec::<i64>::new()), (0, None));
    }

    #[test]
    fn test_bottleneck_first_minimum_wins() {
        assert_eq!(bottleneck([4, 1, 7, 1]), (1, Some(1)));
    }

    #[test]
    fn test_packs_supported_edges() {
        assert_eq!(packs_supported(-3, 2), 0);
        assert_eq!(packs_supported(7, 3), 2);
        assert_eq!(packs_supported(7, 0), 0);
    }

    #[test]
    fn test_shortfalls() {
        let required = required_units(2, 3);
        assert_eq!(required, 6);
        assert_eq!(
            physical_shortfall(5, required),
            Some(ComponentShortfall::InsufficientTotalStock)
        );
        assert_eq!(physical_shortfall(6, required), None);
        assert_eq!(
            dated_shortfall(4, required),
            Some(ComponentShortfall::UnavailableForDates)
        );
        assert_eq!(dated_shortfall(6, required), None);
    }

    #[test]
    fn test_pricing() {
        let pricing = PackPricing::compute(
            Money::from_cents(8000),
            [(Money::from_cents(3000), 2), (Money::from_cents(4000), 1)],
        );
        assert_eq!(pricing.individual_price.cents(), 10000);
        assert_eq!(pricing.savings.cents(), 2000);
        assert_eq!(pricing.savings_percentage, 20);
    }

    #[test]
    fn test_pricing_without_component_prices() {
        let pricing = PackPricing::compute(Money::from_cents(500), Vec::new());
        assert!(pricing.individual_price.is_zero());
        assert_eq!(pricing.savings.cents(), -500);
        assert_eq!(pricing.savings_percentage, 0);
    }
}
