//! Shipping
//!
//! Delivery cost comes from an external calculator. When the calculator is slow, down, or
//! returns nonsense, checkout still proceeds with a flat fallback fee and the quote is marked
//! degraded.

use std::{fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use mockall::automock;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};
use thiserror::Error;
use tracing::{Span, info, warn};

use crate::{
    collaborators::{CollaboratorError, within},
    pricing::money_from_major,
};

/// Shipping destination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Street and house number
    pub street: String,

    /// City
    pub city: String,

    /// State or province
    pub state: String,

    /// Postal code
    pub postal_code: String,

    /// Country
    pub country: String,
}

impl Address {
    /// Postal code, if one was given
    pub fn postal_code(&self) -> Option<&str> {
        non_blank(&self.postal_code)
    }

    /// City, if one was given
    pub fn city(&self) -> Option<&str> {
        non_blank(&self.city)
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let value = value.trim();

    (!value.is_empty()).then_some(value)
}

/// Delivery speed.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryType {
    /// Regular delivery.
    #[default]
    Standard,

    /// Faster delivery.
    Express,

    /// Delivered the day the order is placed.
    SameDay,
}

impl DeliveryType {
    /// Wire name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Express => "express",
            Self::SameDay => "same_day",
        }
    }

    /// Longest expected transit time in days
    pub fn transit_days(self) -> i64 {
        match self {
            Self::Standard => 5,
            Self::Express => 2,
            Self::SameDay => 0,
        }
    }
}

impl fmt::Display for DeliveryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request sent to a delivery cost provider.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryCostRequest {
    /// Destination postal code
    pub postal_code: Option<String>,

    /// Destination city
    pub city: Option<String>,

    /// Requested delivery speed
    pub delivery_type: DeliveryType,

    /// Merchandise total the cost may depend on
    pub cart_total: Money<'static, Currency>,
}

/// Answer from a delivery cost provider.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryCost {
    /// Cost to deliver
    pub cost: Money<'static, Currency>,

    /// Whether the provider waived the fee
    pub free_delivery: bool,
}

/// Computes delivery cost for a destination.
#[automock]
#[async_trait]
pub trait DeliveryCostProvider: Send + Sync {
    /// Quotes the cost of delivering a cart.
    async fn delivery_cost(
        &self,
        request: DeliveryCostRequest,
    ) -> Result<DeliveryCost, CollaboratorError>;
}

/// Errors that stop shipping from being resolved at all.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShippingError {
    /// Neither a postal code nor a city was given.
    #[error("address needs a postal code or a city")]
    MissingDestination,
}

/// Shipping cost for one destination, delivery type and cart total.
#[derive(Debug, Clone, PartialEq)]
pub struct ShippingQuote {
    cost: Money<'static, Currency>,
    free_delivery_applied: bool,
    degraded: bool,
    delivery_type: DeliveryType,
    postal_code: Option<String>,
    city: Option<String>,
    cart_total: Money<'static, Currency>,
}

impl ShippingQuote {
    /// Cost to charge
    pub fn cost(&self) -> Money<'static, Currency> {
        self.cost
    }

    /// Whether the fee was waived
    pub fn free_delivery_applied(&self) -> bool {
        self.free_delivery_applied
    }

    /// Whether the fallback fee was used because the provider failed
    pub fn degraded(&self) -> bool {
        self.degraded
    }

    /// Delivery speed the quote is for
    pub fn delivery_type(&self) -> DeliveryType {
        self.delivery_type
    }

    /// Whether this quote was computed for the same inputs and can be reused.
    pub fn is_fresh_for(
        &self,
        address: &Address,
        delivery_type: DeliveryType,
        cart_total: Money<'static, Currency>,
    ) -> bool {
        !self.degraded
            && self.delivery_type == delivery_type
            && self.cart_total == cart_total
            && self.postal_code.as_deref() == address.postal_code()
            && self.city.as_deref() == address.city()
    }
}

/// Resolves the shipping cost of a cart, falling back to a flat fee.
#[derive(Clone)]
pub struct ShippingCostResolver {
    provider: Arc<dyn DeliveryCostProvider>,
    fallback_cost: Decimal,
    timeout: Duration,
}

impl fmt::Debug for ShippingCostResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShippingCostResolver")
            .field("fallback_cost", &self.fallback_cost)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ShippingCostResolver {
    /// Creates a resolver. `fallback_cost` is in major units of the cart currency.
    pub fn new(
        provider: Arc<dyn DeliveryCostProvider>,
        fallback_cost: Decimal,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            fallback_cost,
            timeout,
        }
    }

    /// Resolves the cost of delivering `cart_total` worth of goods to `address`.
    ///
    /// Provider failures, timeouts, negative costs and currency mismatches all produce the
    /// fallback fee with `degraded` set.
    ///
    /// # Errors
    ///
    /// Returns [`ShippingError::MissingDestination`] when the address has neither a postal code
    /// nor a city.
    #[tracing::instrument(
        name = "shipping.resolver.resolve",
        skip(self, address, cart_total),
        fields(
            delivery_type = %delivery_type,
            city = tracing::field::Empty,
            degraded = tracing::field::Empty
        ),
        err
    )]
    pub async fn resolve(
        &self,
        address: &Address,
        delivery_type: DeliveryType,
        cart_total: Money<'static, Currency>,
    ) -> Result<ShippingQuote, ShippingError> {
        let postal_code = address.postal_code().map(str::to_string);
        let city = address.city().map(str::to_string);

        if postal_code.is_none() && city.is_none() {
            return Err(ShippingError::MissingDestination);
        }

        let span = Span::current();

        if let Some(city) = &city {
            span.record("city", tracing::field::display(city));
        }

        let request = DeliveryCostRequest {
            postal_code: postal_code.clone(),
            city: city.clone(),
            delivery_type,
            cart_total,
        };

        let answer = within(self.timeout, self.provider.delivery_cost(request)).await;

        let (cost, free_delivery_applied, degraded) = match answer {
            Ok(answer) if answer.cost.is_negative() => {
                warn!(cost = %answer.cost, "delivery calculator returned a negative cost");
                (self.fallback(cart_total), false, true)
            }
            Ok(answer) if answer.cost.currency() != cart_total.currency() => {
                warn!(
                    expected = cart_total.currency().iso_alpha_code,
                    actual = answer.cost.currency().iso_alpha_code,
                    "delivery calculator answered in another currency"
                );
                (self.fallback(cart_total), false, true)
            }
            Ok(answer) => (answer.cost, answer.free_delivery, false),
            Err(error) => {
                warn!(%error, "delivery calculator failed, using fallback fee");
                (self.fallback(cart_total), false, true)
            }
        };

        span.record("degraded", tracing::field::display(degraded));

        info!(cost = %cost, free_delivery_applied, "resolved shipping cost");

        Ok(ShippingQuote {
            cost,
            free_delivery_applied,
            degraded,
            delivery_type,
            postal_code,
            city,
            cart_total,
        })
    }

    fn fallback(&self, cart_total: Money<'static, Currency>) -> Money<'static, Currency> {
        money_from_major(self.fallback_cost, cart_total.currency())
    }
}

/// Banded shipping estimate used on quotations, before a destination is known.
///
/// Each band charges a flat fee for amounts below its ceiling; anything above the last ceiling
/// ships at `above_cost`.
#[derive(Debug, Clone, PartialEq)]
pub struct ShippingEstimate {
    bands: SmallVec<[(Decimal, Decimal); 3]>,
    above_cost: Decimal,
}

impl ShippingEstimate {
    /// Creates an estimate table from `(ceiling, cost)` bands in ascending order.
    pub fn new(bands: impl IntoIterator<Item = (Decimal, Decimal)>, above_cost: Decimal) -> Self {
        Self {
            bands: bands.into_iter().collect(),
            above_cost,
        }
    }

    /// Estimated shipping for goods worth `amount`.
    pub fn estimate(&self, amount: Money<'static, Currency>) -> Money<'static, Currency> {
        let cost = self
            .bands
            .iter()
            .find(|(ceiling, _)| amount.amount() < ceiling)
            .map_or(self.above_cost, |(_, cost)| *cost);

        money_from_major(cost, amount.currency())
    }
}

impl Default for ShippingEstimate {
    /// 2,500 below 100,000; 5,000 below 500,000; free above.
    fn default() -> Self {
        Self {
            bands: smallvec![
                (Decimal::from(100_000), Decimal::from(2_500)),
                (Decimal::from(500_000), Decimal::from(5_000)),
            ],
            above_cost: Decimal::ZERO,
        }
    }
}
