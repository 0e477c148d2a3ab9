//! Pricing
//!
//! All amounts are kopecks held in `u64`.

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{Money, iso};
use thiserror::Error;

/// Errors raised by money arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PricingError {
    /// An intermediate amount left the representable range.
    #[error("amount overflowed")]
    Overflow,
}

/// Unit price multiplied by quantity.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] when the product does not fit in `u64`.
pub fn line_total(unit_price: u64, quantity: u32) -> Result<u64, PricingError> {
    unit_price
        .checked_mul(u64::from(quantity))
        .ok_or(PricingError::Overflow)
}

/// Sum of amounts.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] when the sum does not fit in `u64`.
pub fn sum<I>(amounts: I) -> Result<u64, PricingError>
where
    I: IntoIterator<Item = u64>,
{
    amounts
        .into_iter()
        .try_fold(0_u64, u64::checked_add)
        .ok_or(PricingError::Overflow)
}

/// `percent`% of `amount`, rounded to the kopeck with halves away from zero.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] when the result is negative or too large.
pub fn percent_of_minor(amount: u64, percent: Decimal) -> Result<u64, PricingError> {
    let Some(applied) = Decimal::from(amount).checked_mul(percent) else {
        return Err(PricingError::Overflow);
    };

    let Some(applied) = applied.checked_div(Decimal::ONE_HUNDRED) else {
        return Err(PricingError::Overflow);
    };

    applied
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
        .ok_or(PricingError::Overflow)
}

/// Render kopecks as roubles for customer-facing messages.
#[must_use]
pub fn format_rub(amount: u64) -> String {
    match i64::try_from(amount) {
        Ok(minor) => Money::from_minor(minor, iso::RUB).to_string(),
        Err(_overflow) => format!("{amount} коп."),
    }
}
