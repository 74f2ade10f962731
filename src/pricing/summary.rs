//! Priced lines and order totals

use decimal_percentage::Percentage;
use rusty_money::{Money, iso::Currency};

use crate::{discounts::percent_of, items::LineItem, pricing::PricingError};

/// A line item with its quantity discount applied.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLineItem {
    item: LineItem,
    discount_rate: Percentage,
    line_subtotal: Money<'static, Currency>,
    discount: Money<'static, Currency>,
    line_total: Money<'static, Currency>,
}

impl PricedLineItem {
    pub(crate) fn new(
        item: LineItem,
        discount_rate: Percentage,
        line_subtotal: Money<'static, Currency>,
        discount: Money<'static, Currency>,
        line_total: Money<'static, Currency>,
    ) -> Self {
        Self {
            item,
            discount_rate,
            line_subtotal,
            discount,
            line_total,
        }
    }

    /// The item that was priced
    pub fn item(&self) -> &LineItem {
        &self.item
    }

    /// Quantity discount rate applied to the line
    pub fn discount_rate(&self) -> Percentage {
        self.discount_rate
    }

    /// Unit price times quantity, before discount
    pub fn line_subtotal(&self) -> Money<'static, Currency> {
        self.line_subtotal
    }

    /// Amount taken off the line by the quantity discount
    pub fn discount(&self) -> Money<'static, Currency> {
        self.discount
    }

    /// Amount payable for the line
    pub fn line_total(&self) -> Money<'static, Currency> {
        self.line_total
    }
}

/// Totals for an order or quotation.
///
/// `final_total` is always `subtotal - total_discount + tax_amount + shipping_cost`, and every
/// component is non-negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingSummary {
    subtotal: Money<'static, Currency>,
    total_discount: Money<'static, Currency>,
    tax_amount: Money<'static, Currency>,
    shipping_cost: Money<'static, Currency>,
    final_total: Money<'static, Currency>,
}

impl PricingSummary {
    /// Builds a summary, taxing the discounted subtotal at `tax_rate`.
    ///
    /// # Errors
    ///
    /// - [`PricingError::NegativeAmount`]: a component is negative or the discount exceeds the
    ///   subtotal.
    /// - [`PricingError::Discount`]: the tax calculation overflowed.
    /// - [`PricingError::Money`]: the amounts are in different currencies.
    pub fn assemble(
        subtotal: Money<'static, Currency>,
        total_discount: Money<'static, Currency>,
        tax_rate: &Percentage,
        shipping_cost: Money<'static, Currency>,
    ) -> Result<Self, PricingError> {
        for (label, amount) in [
            ("subtotal", subtotal),
            ("discount", total_discount),
            ("shipping", shipping_cost),
        ] {
            if amount.is_negative() {
                return Err(PricingError::NegativeAmount(label));
            }
        }

        let taxable = subtotal.sub(total_discount)?;

        if taxable.is_negative() {
            return Err(PricingError::NegativeAmount("discounted subtotal"));
        }

        let tax_amount = percent_of(tax_rate, taxable)?;
        let final_total = taxable.add(tax_amount)?.add(shipping_cost)?;

        Ok(Self {
            subtotal,
            total_discount,
            tax_amount,
            shipping_cost,
            final_total,
        })
    }

    /// Sum of the line totals, after quantity discounts
    pub fn subtotal(&self) -> Money<'static, Currency> {
        self.subtotal
    }

    /// Order-level discounts taken off the subtotal
    pub fn total_discount(&self) -> Money<'static, Currency> {
        self.total_discount
    }

    /// Subtotal less discounts; the amount tax is charged on.
    ///
    /// # Errors
    ///
    /// Never fails for a summary built by [`PricingSummary::assemble`]; the result type mirrors
    /// money arithmetic.
    pub fn discounted_subtotal(&self) -> Result<Money<'static, Currency>, PricingError> {
        Ok(self.subtotal.sub(self.total_discount)?)
    }

    /// Tax charged
    pub fn tax_amount(&self) -> Money<'static, Currency> {
        self.tax_amount
    }

    /// Shipping charged
    pub fn shipping_cost(&self) -> Money<'static, Currency> {
        self.shipping_cost
    }

    /// Amount payable
    pub fn final_total(&self) -> Money<'static, Currency> {
        self.final_total
    }

    /// Currency of every amount in the summary
    pub fn currency(&self) -> &'static Currency {
        self.subtotal.currency()
    }
}
