//! Quotation pricing

use decimal_percentage::Percentage;

use crate::{
    discounts::percent_of,
    items::{LineItem, total_quantity},
    pricing::{
        CustomerTier, OrderAdjustments, PricingError, PricingSummary, TieredPricingEngine,
        VolumeDiscount, net_total,
    },
    quotations::QuotationItem,
    shipping::ShippingEstimate,
};

/// A priced quotation that has not been stored.
#[derive(Debug, Clone, PartialEq)]
pub struct QuotationDraft {
    items: Vec<QuotationItem>,
    adjustments: OrderAdjustments,
    pricing: PricingSummary,
    customer_tier: CustomerTier,
    total_quantity: u64,
}

impl QuotationDraft {
    /// Priced lines
    pub fn items(&self) -> &[QuotationItem] {
        &self.items
    }

    /// Volume and customer tier discounts
    pub fn adjustments(&self) -> &OrderAdjustments {
        &self.adjustments
    }

    /// Totals
    pub fn pricing(&self) -> &PricingSummary {
        &self.pricing
    }

    /// Tier the draft was priced at
    pub fn customer_tier(&self) -> CustomerTier {
        self.customer_tier
    }

    /// Units across all lines
    pub fn total_quantity(&self) -> u64 {
        self.total_quantity
    }

    /// Consumes the draft, returning its lines.
    pub fn into_items(self) -> Vec<QuotationItem> {
        self.items
    }
}

/// Prices quotations without touching any external service.
#[derive(Debug, Clone, PartialEq)]
pub struct QuotationCalculator {
    pricing: TieredPricingEngine,
    volume: VolumeDiscount,
    shipping: ShippingEstimate,
    tax_rate: Percentage,
}

impl QuotationCalculator {
    /// Standard schedule, volume discount and shipping bands, taxed at `tax_rate`.
    pub fn new(tax_rate: Percentage) -> Self {
        Self {
            pricing: TieredPricingEngine::default(),
            volume: VolumeDiscount::default(),
            shipping: ShippingEstimate::default(),
            tax_rate,
        }
    }

    /// Replaces the pricing engine.
    #[must_use]
    pub fn with_pricing(mut self, pricing: TieredPricingEngine) -> Self {
        self.pricing = pricing;
        self
    }

    /// Replaces the volume discount rule.
    #[must_use]
    pub fn with_volume_discount(mut self, volume: VolumeDiscount) -> Self {
        self.volume = volume;
        self
    }

    /// Replaces the shipping estimate bands.
    #[must_use]
    pub fn with_shipping_estimate(mut self, shipping: ShippingEstimate) -> Self {
        self.shipping = shipping;
        self
    }

    /// Prices `items` for a customer on `customer_tier`.
    ///
    /// Customization premiums are added to each unit price first. Quantity tiers then apply per
    /// line, volume and customer tier discounts on the discounted subtotal, tax on what remains,
    /// and a banded shipping estimate last.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if there are no items, the currencies differ, or an amount
    /// overflows.
    pub fn build_quotation(
        &self,
        items: &[LineItem],
        customer_tier: CustomerTier,
    ) -> Result<QuotationDraft, PricingError> {
        let adjusted = items
            .iter()
            .map(with_premium)
            .collect::<Result<Vec<_>, _>>()?;

        let lines = self.pricing.price_lines(&adjusted)?;
        let net = net_total(&lines)?;
        let total_quantity = total_quantity(items);

        let adjustments =
            OrderAdjustments::compute(&self.volume, customer_tier, net, total_quantity)?;

        let order_discount = adjustments.total()?;
        let shipping = self.shipping.estimate(net.sub(order_discount)?);

        let pricing = self
            .pricing
            .summarize(&lines, order_discount, shipping, &self.tax_rate)?;

        let items = items
            .iter()
            .zip(&lines)
            .map(|(requested, priced)| QuotationItem::new(requested, priced))
            .collect();

        Ok(QuotationDraft {
            items,
            adjustments,
            pricing,
            customer_tier,
            total_quantity,
        })
    }
}

/// `item` with its customization premium folded into the unit price.
fn with_premium(item: &LineItem) -> Result<LineItem, PricingError> {
    let base = item.unit_price();
    let premium = percent_of(&item.customizations().premium_rate(), base)?;

    Ok(LineItem::new(
        item.product_id(),
        item.product_name(),
        base.add(premium)?,
        item.quantity(),
    )?
    .with_customizations(item.customizations().clone()))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rusty_money::{Money, iso};
    use testresult::TestResult;

    use crate::items::{Customizations, Material, ProductId, SizeOption};

    use super::*;

    fn pkr(major: i64) -> Money<'static, iso::Currency> {
        Money::from_major(major, iso::PKR)
    }

    fn calculator() -> QuotationCalculator {
        QuotationCalculator::new(Percentage::from(Decimal::new(17, 2)))
    }

    #[test]
    fn premium_is_charged_before_tiers() -> TestResult {
        let chair = LineItem::new(ProductId::generate(), "Executive Chair", pkr(10_000), 2)?
            .with_customizations(Customizations {
                material: Some(Material::PremiumLeather),
                ..Customizations::default()
            });

        let draft = calculator().build_quotation(&[chair], CustomerTier::Standard)?;
        let pricing = draft.pricing();

        assert_eq!(draft.items().first().map(|item| item.unit_price), Some(pkr(12_500)));
        assert_eq!(pricing.subtotal(), pkr(25_000));
        assert_eq!(pricing.total_discount(), pkr(0));
        assert_eq!(pricing.tax_amount(), pkr(4_250));
        assert_eq!(pricing.shipping_cost(), pkr(2_500));
        assert_eq!(pricing.final_total(), pkr(31_750));

        Ok(())
    }

    #[test]
    fn stacked_premiums_add_up() -> TestResult {
        let desk = LineItem::new(ProductId::generate(), "Desk", pkr(10_000), 1)?
            .with_customizations(Customizations {
                material: Some(Material::HighGradeWood),
                color: Some("walnut".into()),
                size: Some(SizeOption::Executive),
            });

        let draft = calculator().build_quotation(&[desk], CustomerTier::Standard)?;

        assert_eq!(
            draft.items().first().map(|item| item.unit_price),
            Some(pkr(16_000))
        );

        Ok(())
    }

    #[test]
    fn volume_and_tier_discounts_stack_on_discounted_subtotal() -> TestResult {
        let desks = LineItem::new(ProductId::generate(), "Desk", pkr(1_000), 100)?;

        let draft = calculator().build_quotation(&[desks], CustomerTier::Enterprise)?;
        let pricing = draft.pricing();

        assert_eq!(draft.adjustments().volume(), pkr(4_250));
        assert_eq!(draft.adjustments().tier(), pkr(6_800));
        assert_eq!(pricing.subtotal(), pkr(85_000), "15% tier already applied");
        assert_eq!(pricing.total_discount(), pkr(11_050));
        assert_eq!(pricing.tax_amount(), Money::from_minor(1_257_150, iso::PKR));
        assert_eq!(pricing.shipping_cost(), pkr(2_500));
        assert_eq!(pricing.final_total(), Money::from_minor(8_902_150, iso::PKR));

        Ok(())
    }

    #[test]
    fn large_quotations_ship_free() -> TestResult {
        let sofas = LineItem::new(ProductId::generate(), "Sofa", pkr(50_000), 12)?;

        let draft = calculator().build_quotation(&[sofas], CustomerTier::Standard)?;

        assert_eq!(draft.pricing().shipping_cost(), pkr(0));

        Ok(())
    }

    #[test]
    fn empty_request_is_rejected() {
        let result = calculator().build_quotation(&[], CustomerTier::Premium);

        assert_eq!(result, Err(PricingError::EmptyCart));
    }
}
