//! Discounts
//!
//! Percentage arithmetic on money. Every rate in the engine (tier discounts, customer tier
//! discounts, customization premiums, tax) is applied through these helpers so rounding is
//! identical everywhere.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

/// Errors specific to percentage calculations.
#[derive(Debug, Error, PartialEq)]
pub enum DiscountError {
    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Calculate a percentage of an amount given in minor units.
///
/// Results are rounded half away from zero to whole minor units.
///
/// # Errors
///
/// Returns [`DiscountError::PercentConversion`] if the calculation overflows or cannot be
/// represented as `i64`.
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, DiscountError> {
    let minor = Decimal::from_i64(minor).ok_or(DiscountError::PercentConversion)?;

    fraction(percent)
        .checked_mul(minor)
        .ok_or(DiscountError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(DiscountError::PercentConversion)
}

/// Calculate a percentage of a money amount, in the same currency.
///
/// # Errors
///
/// See [`percent_of_minor`].
pub fn percent_of<'a>(
    percent: &Percentage,
    amount: Money<'a, Currency>,
) -> Result<Money<'a, Currency>, DiscountError> {
    let minor = percent_of_minor(percent, amount.to_minor_units())?;

    Ok(Money::from_minor(minor, amount.currency()))
}

/// The fractional value of a percentage (0.05 for 5%).
pub fn fraction(percent: &Percentage) -> Decimal {
    (*percent) * Decimal::ONE
}

/// Converts a fractional percentage to percent points for display.
pub fn percent_points(percent: &Percentage) -> Decimal {
    (fraction(percent) * Decimal::ONE_HUNDRED).round_dp(2)
}

/// Sum of several percentages.
pub fn sum_percentages<'p>(percentages: impl IntoIterator<Item = &'p Percentage>) -> Percentage {
    Percentage::from(percentages.into_iter().map(fraction).sum::<Decimal>())
}
