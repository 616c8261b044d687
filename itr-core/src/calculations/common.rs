//! Rounding and clamping helpers shared by the calculation modules.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds to two decimal places, half away from zero.
///
/// ```
/// use rust_decimal_macros::dec;
/// use itr_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds to whole rupees, half away from zero.
pub fn round_rupee(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds to the nearest multiple of ten rupees, fives going up.
///
/// Applied to total income (s.288A) and to the tax payable (s.288B).
///
/// ```
/// use rust_decimal_macros::dec;
/// use itr_core::calculations::common::round_to_nearest_ten;
///
/// assert_eq!(round_to_nearest_ten(dec!(75404)), dec!(75400));
/// assert_eq!(round_to_nearest_ten(dec!(75405)), dec!(75410));
/// ```
pub fn round_to_nearest_ten(value: Decimal) -> Decimal {
    let ten = Decimal::TEN;
    (value / ten).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero) * ten
}

pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}

pub fn min(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a < b { a } else { b }
}

/// `max(value, 0)`.
pub fn clamp_non_negative(value: Decimal) -> Decimal {
    max(value, Decimal::ZERO)
}

/// `value * rate`, rounded to two places.
pub fn percent_of(
    value: Decimal,
    rate: Decimal,
) -> Decimal {
    round_half_up(value * rate)
}
