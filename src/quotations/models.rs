//! Quotation models

use decimal_percentage::Percentage;
use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};

use crate::{
    customers::CustomerInfo,
    ids::TypedUuid,
    items::{Customizations, LineItem, ProductId},
    pricing::{CustomerTier, PricedLineItem, PricingSummary},
    quotations::QuotationStatus,
};

/// Quotation identifier.
pub type QuotationId = TypedUuid<Quotation>;

/// A priced offer made to a customer.
#[derive(Debug, Clone, PartialEq)]
pub struct Quotation {
    /// Identifier
    pub id: QuotationId,

    /// Human-readable reference, unique across quotations
    pub quote_number: String,

    /// Lifecycle status
    pub status: QuotationStatus,

    /// Customer the offer is for
    pub customer: CustomerInfo,

    /// Account tier the offer was priced at
    pub customer_tier: CustomerTier,

    /// Totals
    pub pricing: PricingSummary,

    /// Lines, in request order
    pub items: Vec<QuotationItem>,

    /// Free-text notes
    pub notes: Option<String>,

    /// Last moment the offer can be accepted
    pub valid_until: Timestamp,

    /// When the quotation was created
    pub created_at: Timestamp,

    /// When the quotation last changed
    pub updated_at: Timestamp,

    /// When the customer first opened it
    pub viewed_at: Option<Timestamp>,
}

impl Quotation {
    /// Whether the offer has lapsed at `now`.
    pub fn is_due_to_expire(&self, now: Timestamp) -> bool {
        self.status.can_expire() && now > self.valid_until
    }
}

/// Header fields for a new quotation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewQuotation {
    /// Identifier, generated by the engine
    pub id: QuotationId,

    /// Human-readable reference
    pub quote_number: String,

    /// Customer
    pub customer: CustomerInfo,

    /// Account tier
    pub customer_tier: CustomerTier,

    /// Totals
    pub pricing: PricingSummary,

    /// Free-text notes
    pub notes: Option<String>,

    /// Expiry
    pub valid_until: Timestamp,

    /// Creation time
    pub created_at: Timestamp,
}

impl NewQuotation {
    /// The quotation as it exists once the header is stored, before items are attached.
    pub fn into_quotation(self) -> Quotation {
        Quotation {
            id: self.id,
            quote_number: self.quote_number,
            status: QuotationStatus::Draft,
            customer: self.customer,
            customer_tier: self.customer_tier,
            pricing: self.pricing,
            items: Vec::new(),
            notes: self.notes,
            valid_until: self.valid_until,
            created_at: self.created_at,
            updated_at: self.created_at,
            viewed_at: None,
        }
    }
}

/// One line of a quotation.
#[derive(Debug, Clone, PartialEq)]
pub struct QuotationItem {
    /// Product quoted
    pub product_id: ProductId,

    /// Product name at the time of quoting
    pub product_name: String,

    /// Units quoted
    pub quantity: u32,

    /// Catalogue unit price
    pub base_unit_price: Money<'static, Currency>,

    /// Unit price including customization premiums
    pub unit_price: Money<'static, Currency>,

    /// Customizations requested
    pub customizations: Customizations,

    /// Quantity discount rate applied
    pub discount_rate: Percentage,

    /// Quantity discount amount
    pub discount: Money<'static, Currency>,

    /// Amount quoted for the line
    pub line_total: Money<'static, Currency>,
}

impl QuotationItem {
    /// Combines a requested line with its priced, premium-adjusted counterpart.
    pub fn new(requested: &LineItem, priced: &PricedLineItem) -> Self {
        Self {
            product_id: requested.product_id(),
            product_name: requested.product_name().to_string(),
            quantity: requested.quantity(),
            base_unit_price: requested.unit_price(),
            unit_price: priced.item().unit_price(),
            customizations: requested.customizations().clone(),
            discount_rate: priced.discount_rate(),
            discount: priced.discount(),
            line_total: priced.line_total(),
        }
    }

    /// Premium added per unit by the customizations
    pub fn premium_per_unit(&self) -> Money<'static, Currency> {
        self.unit_price
            .sub(self.base_unit_price)
            .unwrap_or_else(|_err| Money::from_minor(0, self.unit_price.currency()))
    }
}

/// An entry in a quotation's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotationActivity {
    /// Quotation the entry belongs to
    pub quotation_id: QuotationId,

    /// Machine-readable kind, e.g. `created` or `status_changed_to_viewed`
    pub activity_type: String,

    /// Human-readable description
    pub description: String,

    /// Status before the change, for status changes
    pub previous_status: Option<QuotationStatus>,

    /// When it happened
    pub at: Timestamp,
}

impl QuotationActivity {
    /// The quotation was created.
    pub fn created(quotation_id: QuotationId, quote_number: &str, at: Timestamp) -> Self {
        Self {
            quotation_id,
            activity_type: String::from("created"),
            description: format!("Quotation {quote_number} created"),
            previous_status: None,
            at,
        }
    }

    /// The quotation moved from `from` to `to`.
    pub fn status_changed(
        quotation_id: QuotationId,
        from: QuotationStatus,
        to: QuotationStatus,
        at: Timestamp,
    ) -> Self {
        Self {
            quotation_id,
            activity_type: format!("status_changed_to_{to}"),
            description: format!("Status changed to {to}"),
            previous_status: Some(from),
            at,
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn status_change_activity_names_the_new_status() -> TestResult {
        let at = Timestamp::from_second(1_760_000_000)?;
        let activity = QuotationActivity::status_changed(
            QuotationId::generate(),
            QuotationStatus::Sent,
            QuotationStatus::Viewed,
            at,
        );

        assert_eq!(activity.activity_type, "status_changed_to_viewed");
        assert_eq!(activity.previous_status, Some(QuotationStatus::Sent));

        Ok(())
    }

    #[test]
    fn created_activity_mentions_reference() -> TestResult {
        let activity = QuotationActivity::created(
            QuotationId::generate(),
            "QT-00000123-0042",
            Timestamp::from_second(1_760_000_000)?,
        );

        assert_eq!(activity.activity_type, "created");
        assert!(
            activity.description.contains("QT-00000123-0042"),
            "{}",
            activity.description
        );

        Ok(())
    }
}
