//! Pricing
//!
//! The tiered pricing engine is the single place where quantity discounts, tax and order totals
//! are computed. Cart display, checkout and quotations all go through it.

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, RoundingStrategy};
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

use crate::{
    discounts::{DiscountError, percent_of_minor},
    items::LineItem,
};

pub mod adjustments;
pub mod schedule;
pub mod summary;

pub use adjustments::{CustomerTier, OrderAdjustments, VolumeDiscount};
pub use schedule::{DiscountSchedule, DiscountTier, ScheduleError};
pub use summary::{PricedLineItem, PricingSummary};

/// Errors raised while pricing line items.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// Quantities start at one.
    #[error("quantity must be at least 1, got {0}")]
    InvalidQuantity(u32),

    /// Unit prices must not be negative.
    #[error("unit price for {0:?} must not be negative")]
    InvalidPrice(String),

    /// Nothing to price.
    #[error("no line items to price")]
    EmptyCart,

    /// A total component came out negative.
    #[error("{0} must not be negative")]
    NegativeAmount(&'static str),

    /// Multiplying a price by a quantity overflowed.
    #[error("line amount overflowed")]
    Overflow,

    /// Malformed discount schedule.
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    /// Percentage arithmetic failed.
    #[error(transparent)]
    Discount(#[from] DiscountError),

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Applies a [`DiscountSchedule`] to line items and assembles order totals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TieredPricingEngine {
    schedule: DiscountSchedule,
}

impl TieredPricingEngine {
    /// Creates an engine using `schedule`.
    pub fn new(schedule: DiscountSchedule) -> Self {
        Self { schedule }
    }

    /// The discount schedule in use
    pub fn schedule(&self) -> &DiscountSchedule {
        &self.schedule
    }

    /// Discount rate for `quantity` units of one product.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::InvalidQuantity`] when `quantity` is zero.
    pub fn discount_rate(&self, quantity: u32) -> Result<Percentage, PricingError> {
        self.schedule.rate_for(quantity)
    }

    /// Amount payable for `quantity` units at `unit_price`, after the quantity discount.
    ///
    /// # Errors
    ///
    /// - [`PricingError::InvalidQuantity`]: `quantity` is zero.
    /// - [`PricingError::InvalidPrice`]: `unit_price` is negative.
    /// - [`PricingError::Overflow`]: the line amount does not fit in minor units.
    pub fn line_total(
        &self,
        unit_price: Money<'static, Currency>,
        quantity: u32,
    ) -> Result<Money<'static, Currency>, PricingError> {
        if unit_price.is_negative() {
            return Err(PricingError::InvalidPrice(String::from("unit price")));
        }

        let (_, _, total) = self.line_amounts(unit_price, quantity)?;

        Ok(Money::from_minor(total, unit_price.currency()))
    }

    /// Prices a single line.
    ///
    /// # Errors
    ///
    /// See [`TieredPricingEngine::line_total`].
    pub fn price_line(&self, item: &LineItem) -> Result<PricedLineItem, PricingError> {
        let unit_price = item.unit_price();
        let currency = unit_price.currency();
        let rate = self.discount_rate(item.quantity())?;
        let (gross, discount, total) = self.line_amounts(unit_price, item.quantity())?;

        Ok(PricedLineItem::new(
            item.clone(),
            rate,
            Money::from_minor(gross, currency),
            Money::from_minor(discount, currency),
            Money::from_minor(total, currency),
        ))
    }

    /// Prices every line, in order.
    ///
    /// # Errors
    ///
    /// - [`PricingError::EmptyCart`]: `items` is empty.
    /// - [`PricingError::Money`]: the lines are not all in one currency.
    /// - Any error from [`TieredPricingEngine::price_line`].
    pub fn price_lines(&self, items: &[LineItem]) -> Result<Vec<PricedLineItem>, PricingError> {
        let first = items.first().ok_or(PricingError::EmptyCart)?;
        let currency = first.unit_price().currency();

        items
            .iter()
            .map(|item| {
                let found = item.unit_price().currency();

                if found == currency {
                    self.price_line(item)
                } else {
                    Err(PricingError::Money(MoneyError::CurrencyMismatch {
                        expected: currency.iso_alpha_code,
                        actual: found.iso_alpha_code,
                    }))
                }
            })
            .collect()
    }

    /// Totals for already-priced lines plus any order-level discount.
    ///
    /// The subtotal is the sum of the discounted line totals, so quantity discounts are already
    /// inside it; `order_discount` is the only discount reported on the summary.
    ///
    /// # Errors
    ///
    /// - [`PricingError::EmptyCart`]: `lines` is empty.
    /// - Any error from [`PricingSummary::assemble`].
    pub fn summarize(
        &self,
        lines: &[PricedLineItem],
        order_discount: Money<'static, Currency>,
        shipping_cost: Money<'static, Currency>,
        tax_rate: &Percentage,
    ) -> Result<PricingSummary, PricingError> {
        PricingSummary::assemble(net_total(lines)?, order_discount, tax_rate, shipping_cost)
    }

    /// Prices `items` and assembles their totals.
    ///
    /// # Errors
    ///
    /// See [`TieredPricingEngine::price_lines`] and [`PricingSummary::assemble`].
    pub fn compute_pricing(
        &self,
        items: &[LineItem],
        shipping_cost: Money<'static, Currency>,
        tax_rate: &Percentage,
    ) -> Result<PricingSummary, PricingError> {
        let lines = self.price_lines(items)?;
        let currency = shipping_cost.currency();

        self.summarize(
            &lines,
            Money::from_minor(0, currency),
            shipping_cost,
            tax_rate,
        )
    }

    /// Gross, discount and net amounts in minor units.
    fn line_amounts(
        &self,
        unit_price: Money<'static, Currency>,
        quantity: u32,
    ) -> Result<(i64, i64, i64), PricingError> {
        let rate = self.discount_rate(quantity)?;

        let gross = unit_price
            .to_minor_units()
            .checked_mul(i64::from(quantity))
            .ok_or(PricingError::Overflow)?;

        let discount = percent_of_minor(&rate, gross)?;
        let total = gross.checked_sub(discount).ok_or(PricingError::Overflow)?;

        Ok((gross, discount, total))
    }
}

/// Converts a major-unit amount into money, rounded to the currency's minor unit.
pub fn money_from_major(
    amount: Decimal,
    currency: &'static Currency,
) -> Money<'static, Currency> {
    Money::from_decimal(
        amount.round_dp_with_strategy(currency.exponent, RoundingStrategy::MidpointAwayFromZero),
        currency,
    )
}

/// Discount rate for `quantity` units under the standard schedule.
///
/// # Errors
///
/// Returns [`PricingError::InvalidQuantity`] when `quantity` is zero.
pub fn discount_rate(quantity: u32) -> Result<Percentage, PricingError> {
    TieredPricingEngine::default().discount_rate(quantity)
}

/// Line total for `quantity` units at `unit_price` under the standard schedule.
///
/// # Errors
///
/// See [`TieredPricingEngine::line_total`].
pub fn line_total(
    unit_price: Money<'static, Currency>,
    quantity: u32,
) -> Result<Money<'static, Currency>, PricingError> {
    TieredPricingEngine::default().line_total(unit_price, quantity)
}

/// Sum of the discounted line totals, before order-level adjustments, tax and shipping.
///
/// # Errors
///
/// - [`PricingError::EmptyCart`]: `lines` is empty.
/// - [`PricingError::Money`]: the lines are in different currencies.
pub fn net_total(lines: &[PricedLineItem]) -> Result<Money<'static, Currency>, PricingError> {
    let first = lines.first().ok_or(PricingError::EmptyCart)?;
    let zero = Money::from_minor(0, first.line_total().currency());

    let total = lines
        .iter()
        .try_fold(zero, |total, line| total.add(line.line_total()))?;

    Ok(total)
}

#[cfg(test)]
mod tests {
    use rusty_money::iso;
    use testresult::TestResult;

    use crate::{discounts::fraction, items::ProductId};

    use super::*;

    fn pkr(major: i64) -> Money<'static, Currency> {
        Money::from_major(major, iso::PKR)
    }

    fn item(price: Money<'static, Currency>, quantity: u32) -> Result<LineItem, PricingError> {
        LineItem::new(ProductId::generate(), "Office Chair", price, quantity)
    }

    fn tax() -> Percentage {
        Percentage::from(Decimal::new(17, 2))
    }

    #[test]
    fn line_total_applies_tier() -> TestResult {
        assert_eq!(line_total(pkr(1_000), 5)?, pkr(5_000));
        assert_eq!(line_total(pkr(1_000), 6)?, pkr(5_700));
        assert_eq!(line_total(pkr(1_000), 21)?, pkr(18_900));
        assert_eq!(line_total(pkr(1_000), 51)?, pkr(43_350));
        assert_eq!(line_total(pkr(5_000), 60)?, pkr(255_000));

        Ok(())
    }

    #[test]
    fn bulk_unit_price_never_exceeds_list_price() -> TestResult {
        let list = pkr(4_999);

        for quantity in 1..=120 {
            let total = line_total(list, quantity)?;

            assert!(
                total.to_minor_units() <= list.to_minor_units() * i64::from(quantity),
                "quantity {quantity} costs more than list"
            );
        }

        Ok(())
    }

    #[test]
    fn line_total_rejects_zero_quantity() {
        let result = line_total(pkr(1_000), 0);

        assert_eq!(result, Err(PricingError::InvalidQuantity(0)));
    }

    #[test]
    fn line_total_rejects_negative_price() {
        let result = line_total(Money::from_minor(-100, iso::PKR), 1);

        assert!(
            matches!(result, Err(PricingError::InvalidPrice(_))),
            "expected InvalidPrice, got {result:?}"
        );
    }

    #[test]
    fn line_total_overflow_is_reported() {
        let result = line_total(Money::from_minor(i64::MAX, iso::PKR), 2);

        assert_eq!(result, Err(PricingError::Overflow));
    }

    #[test]
    fn discount_rate_uses_standard_schedule() -> TestResult {
        assert_eq!(fraction(&discount_rate(7)?), Decimal::new(5, 2));

        Ok(())
    }

    #[test]
    fn compute_pricing_matches_checkout_scenario() -> TestResult {
        let engine = TieredPricingEngine::default();
        let items = [item(pkr(10_000), 8)?];

        let summary = engine.compute_pricing(&items, pkr(2_000), &tax())?;

        assert_eq!(summary.subtotal(), pkr(76_000));
        assert_eq!(summary.total_discount(), pkr(0));
        assert_eq!(summary.tax_amount(), pkr(12_920));
        assert_eq!(summary.shipping_cost(), pkr(2_000));
        assert_eq!(summary.final_total(), pkr(90_920));

        Ok(())
    }

    #[test]
    fn line_totals_sum_to_summary_subtotal() -> TestResult {
        let engine = TieredPricingEngine::default();
        let items = [
            item(pkr(3_499), 3)?,
            item(pkr(12_000), 12)?,
            item(pkr(799), 25)?,
        ];

        let lines = engine.price_lines(&items)?;
        let summary = engine.summarize(&lines, pkr(500), pkr(0), &tax())?;

        let line_totals: i64 = lines
            .iter()
            .map(|line| line.line_total().to_minor_units())
            .sum();

        assert_eq!(summary.subtotal().to_minor_units(), line_totals);
        assert_eq!(summary.total_discount(), pkr(500), "only the order discount");

        Ok(())
    }

    #[test]
    fn net_total_sums_discounted_lines() -> TestResult {
        let engine = TieredPricingEngine::default();
        let lines = engine.price_lines(&[item(pkr(10_000), 8)?, item(pkr(1_000), 1)?])?;

        assert_eq!(net_total(&lines)?, pkr(77_000));

        Ok(())
    }

    #[test]
    fn net_total_of_nothing_is_an_error() {
        assert_eq!(net_total(&[]), Err(PricingError::EmptyCart));
    }

    #[test]
    fn price_lines_rejects_empty_input() {
        let result = TieredPricingEngine::default().price_lines(&[]);

        assert_eq!(result, Err(PricingError::EmptyCart));
    }

    #[test]
    fn price_lines_rejects_mixed_currencies() -> TestResult {
        let items = [
            item(pkr(100), 1)?,
            item(Money::from_major(1, iso::USD), 1)?,
        ];

        let result = TieredPricingEngine::default().price_lines(&items);

        assert_eq!(
            result,
            Err(PricingError::Money(MoneyError::CurrencyMismatch {
                expected: iso::PKR.iso_alpha_code,
                actual: iso::USD.iso_alpha_code,
            }))
        );

        Ok(())
    }

    #[test]
    fn money_from_major_rounds_to_minor_unit() {
        let amount = money_from_major(Decimal::new(12_345, 3), iso::PKR);

        assert_eq!(amount, Money::from_minor(1_235, iso::PKR));
    }

    #[test]
    fn custom_schedule_is_honoured() -> TestResult {
        let schedule = DiscountSchedule::new([
            DiscountTier::new(1, Percentage::from(Decimal::ZERO)),
            DiscountTier::new(2, Percentage::from(Decimal::new(50, 2))),
        ])?;

        let engine = TieredPricingEngine::new(schedule);

        assert_eq!(engine.line_total(pkr(100), 2)?, pkr(100));

        Ok(())
    }
}
