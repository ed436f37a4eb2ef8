//! Rounding of output amounts to the currency's smallest unit.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds half away from zero to `minor_units` decimal places.
///
/// # Examples
///
/// ```
/// use hr_engine::calculation::round_to_minor_units;
/// use rust_decimal::Decimal;
///
/// assert_eq!(round_to_minor_units(Decimal::new(145, 1), 0), Decimal::new(15, 0));
/// assert_eq!(round_to_minor_units(Decimal::new(1245, 3), 2), Decimal::new(125, 2));
/// ```
pub fn round_to_minor_units(value: Decimal, minor_units: u32) -> Decimal {
    value.round_dp_with_strategy(minor_units, RoundingStrategy::MidpointAwayFromZero)
}
