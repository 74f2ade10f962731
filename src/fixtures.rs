//! Cart fixtures
//!
//! Carts can be described in YAML for the CLI and for tests:
//!
//! ```yaml
//! items:
//!   - name: Office Chair
//!     price: 10000 PKR
//!     quantity: 8
//!   - name: Executive Desk
//!     price: 45000 PKR
//!     quantity: 1
//!     customizations:
//!       material: high_grade_wood
//!       size: executive
//! ```

use std::{fs, path::Path};

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    items::{Customizations, LineItem, ProductId},
    pricing::PricingError,
};

/// Fixture parsing errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("invalid price format: {0}")]
    InvalidPrice(String),

    /// Unknown currency code
    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Lines priced in different currencies
    #[error("currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// A line was rejected
    #[error("invalid line {line}: {error}")]
    InvalidLine {
        /// One-based position in the fixture
        line: usize,

        /// Why it was rejected
        #[source]
        error: PricingError,
    },

    /// The cart has no lines
    #[error("cart fixture has no items")]
    NoItems,
}

/// Wrapper for cart lines in YAML
#[derive(Debug, Deserialize)]
pub struct CartFixture {
    /// Cart lines
    #[serde(default)]
    pub items: Vec<LineFixture>,
}

/// Cart line fixture
#[derive(Debug, Deserialize)]
pub struct LineFixture {
    /// Product identifier; one is generated when absent
    #[serde(default)]
    pub product_id: Option<Uuid>,

    /// Product name
    pub name: String,

    /// Unit price (e.g., "10000 PKR")
    pub price: String,

    /// Units
    pub quantity: u32,

    /// Customization choices
    #[serde(default)]
    pub customizations: Customizations,
}

impl CartFixture {
    /// Reads a cart fixture from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::Io`] or [`FixtureError::Yaml`] if the file cannot be read or
    /// parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml(&contents)
    }

    /// Parses a cart fixture from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::Yaml`] if the document is malformed.
    pub fn from_yaml(yaml: &str) -> Result<Self, FixtureError> {
        Ok(serde_norway::from_str(yaml)?)
    }

    /// Converts the fixture into line items in a single currency.
    ///
    /// # Errors
    ///
    /// - [`FixtureError::NoItems`]: the fixture lists no lines.
    /// - [`FixtureError::InvalidPrice`] or [`FixtureError::UnknownCurrency`]: a price is
    ///   malformed.
    /// - [`FixtureError::CurrencyMismatch`]: lines are priced in different currencies.
    /// - [`FixtureError::InvalidLine`]: a line has a zero quantity or negative price.
    pub fn into_line_items(self) -> Result<Vec<LineItem>, FixtureError> {
        if self.items.is_empty() {
            return Err(FixtureError::NoItems);
        }

        let mut currency: Option<&'static Currency> = None;
        let mut items = Vec::with_capacity(self.items.len());

        for (idx, fixture) in self.items.into_iter().enumerate() {
            let price = parse_price(&fixture.price)?;

            match currency {
                Some(expected) if expected != price.currency() => {
                    return Err(FixtureError::CurrencyMismatch(
                        expected.iso_alpha_code.to_string(),
                        price.currency().iso_alpha_code.to_string(),
                    ));
                }
                Some(_) => {}
                None => currency = Some(price.currency()),
            }

            let product_id = fixture
                .product_id
                .map_or_else(ProductId::generate, ProductId::from_uuid);

            let item = LineItem::new(product_id, fixture.name, price, fixture.quantity)
                .map_err(|error| FixtureError::InvalidLine {
                    line: idx + 1,
                    error,
                })?
                .with_customizations(fixture.customizations);

            items.push(item);
        }

        Ok(items)
    }
}

/// Loads line items from a YAML cart file.
///
/// # Errors
///
/// See [`CartFixture::from_file`] and [`CartFixture::into_line_items`].
pub fn load_cart(path: impl AsRef<Path>) -> Result<Vec<LineItem>, FixtureError> {
    CartFixture::from_file(path)?.into_line_items()
}

/// Parse price string (e.g., "2999.50 PKR") into money.
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY", if the amount is not
/// a decimal with at most the currency's minor digits, or if the currency code is not an ISO
/// 4217 code.
pub fn parse_price(s: &str) -> Result<Money<'static, Currency>, FixtureError> {
    let mut parts = s.split_whitespace();

    let (Some(amount), Some(code), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(FixtureError::InvalidPrice(s.to_string()));
    };

    let amount: Decimal = amount
        .parse()
        .map_err(|_err| FixtureError::InvalidPrice(s.to_string()))?;

    let currency = iso::find(&code.to_ascii_uppercase())
        .ok_or_else(|| FixtureError::UnknownCurrency(code.to_string()))?;

    if amount.round_dp_with_strategy(currency.exponent, RoundingStrategy::ToZero) != amount {
        return Err(FixtureError::InvalidPrice(s.to_string()));
    }

    let minor = Decimal::from(10_i64.pow(currency.exponent))
        .checked_mul(amount)
        .and_then(|minor| minor.to_i64())
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    Ok(Money::from_minor(minor, currency))
}
