//! Items

use rusty_money::{Money, iso::Currency};

use crate::{ids::TypedUuid, pricing::PricingError};

pub mod customizations;

pub use customizations::{Customizations, Material, SizeOption};

/// Catalogue product.
#[derive(Debug)]
pub enum Product {}

/// Catalogue product identifier.
pub type ProductId = TypedUuid<Product>;

/// A product and quantity requested by the customer, before any discount.
#[derive(Clone, Debug, PartialEq)]
pub struct LineItem {
    product_id: ProductId,
    product_name: String,
    unit_price: Money<'static, Currency>,
    quantity: u32,
    customizations: Customizations,
}

impl LineItem {
    /// Creates a new line item.
    ///
    /// # Errors
    ///
    /// - [`PricingError::InvalidQuantity`]: `quantity` is zero.
    /// - [`PricingError::InvalidPrice`]: `unit_price` is negative.
    pub fn new(
        product_id: ProductId,
        product_name: impl Into<String>,
        unit_price: Money<'static, Currency>,
        quantity: u32,
    ) -> Result<Self, PricingError> {
        let product_name = product_name.into();

        if quantity == 0 {
            return Err(PricingError::InvalidQuantity(quantity));
        }

        if unit_price.is_negative() {
            return Err(PricingError::InvalidPrice(product_name));
        }

        Ok(Self {
            product_id,
            product_name,
            unit_price,
            quantity,
            customizations: Customizations::default(),
        })
    }

    /// Attaches customization choices.
    #[must_use]
    pub fn with_customizations(mut self, customizations: Customizations) -> Self {
        self.customizations = customizations;
        self
    }

    /// Changes the quantity.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::InvalidQuantity`] if `quantity` is zero.
    pub fn set_quantity(&mut self, quantity: u32) -> Result<(), PricingError> {
        if quantity == 0 {
            return Err(PricingError::InvalidQuantity(quantity));
        }

        self.quantity = quantity;

        Ok(())
    }

    /// Product identifier
    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    /// Product display name
    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    /// Catalogue unit price
    pub fn unit_price(&self) -> Money<'static, Currency> {
        self.unit_price
    }

    /// Requested quantity, always at least one
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Customization choices
    pub fn customizations(&self) -> &Customizations {
        &self.customizations
    }
}

/// Total units across all lines.
pub fn total_quantity(items: &[LineItem]) -> u64 {
    items.iter().map(|item| u64::from(item.quantity())).sum()
}
