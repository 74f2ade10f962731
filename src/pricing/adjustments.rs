//! Order-level adjustments
//!
//! Quotations earn two discounts on top of the per-line quantity tiers: a volume discount when
//! the whole request is large, and a standing discount for the customer's account tier. Both
//! are computed on the line-discounted subtotal.

use std::fmt;

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};

use crate::{discounts::percent_of, pricing::PricingError};

/// Customer account tier.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum CustomerTier {
    /// No standing discount.
    #[default]
    Standard,

    /// 5% standing discount.
    Premium,

    /// 8% standing discount.
    Enterprise,
}

impl CustomerTier {
    /// Standing discount for the tier.
    pub fn discount(self) -> Percentage {
        Percentage::from(match self {
            Self::Standard => Decimal::ZERO,
            Self::Premium => Decimal::new(5, 2),
            Self::Enterprise => Decimal::new(8, 2),
        })
    }

    /// Stable lowercase name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Premium => "premium",
            Self::Enterprise => "enterprise",
        }
    }
}

impl fmt::Display for CustomerTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discount for large requests, based on total units across all lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeDiscount {
    min_total_quantity: u64,
    rate: Percentage,
}

impl VolumeDiscount {
    /// Creates a volume discount rule.
    pub fn new(min_total_quantity: u64, rate: Percentage) -> Self {
        Self {
            min_total_quantity,
            rate,
        }
    }

    /// Whether `total_quantity` units qualify
    pub fn applies_to(&self, total_quantity: u64) -> bool {
        total_quantity >= self.min_total_quantity
    }

    /// Rate earned by `total_quantity` units
    pub fn rate_for(&self, total_quantity: u64) -> Percentage {
        if self.applies_to(total_quantity) {
            self.rate
        } else {
            Percentage::from(Decimal::ZERO)
        }
    }
}

impl Default for VolumeDiscount {
    /// 5% once a request reaches 100 units.
    fn default() -> Self {
        Self::new(100, Percentage::from(Decimal::new(5, 2)))
    }
}

/// Order-level discount amounts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderAdjustments {
    volume: Money<'static, Currency>,
    tier: Money<'static, Currency>,
}

impl OrderAdjustments {
    /// Computes both adjustments against the line-discounted subtotal.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Discount`] if a percentage calculation overflows.
    pub fn compute(
        volume: &VolumeDiscount,
        tier: CustomerTier,
        discounted_subtotal: Money<'static, Currency>,
        total_quantity: u64,
    ) -> Result<Self, PricingError> {
        Ok(Self {
            volume: percent_of(&volume.rate_for(total_quantity), discounted_subtotal)?,
            tier: percent_of(&tier.discount(), discounted_subtotal)?,
        })
    }

    /// Volume discount amount
    pub fn volume(&self) -> Money<'static, Currency> {
        self.volume
    }

    /// Customer tier discount amount
    pub fn tier(&self) -> Money<'static, Currency> {
        self.tier
    }

    /// Both adjustments together.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Money`] on currency mismatch.
    pub fn total(&self) -> Result<Money<'static, Currency>, PricingError> {
        Ok(self.volume.add(self.tier)?)
    }
}
