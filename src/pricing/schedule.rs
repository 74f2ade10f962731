//! Quantity discount schedule

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use smallvec::{SmallVec, smallvec};
use thiserror::Error;

use crate::{discounts::fraction, pricing::PricingError};

/// Errors raised when a discount schedule is malformed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    /// No tiers were supplied.
    #[error("discount schedule has no tiers")]
    Empty,

    /// The lowest tier must cover a single unit.
    #[error("first tier must start at quantity 1, starts at {0}")]
    FirstTierNotOne(u32),

    /// Tier thresholds must strictly increase.
    #[error("tier thresholds must strictly increase ({previous} then {next})")]
    NotIncreasing {
        /// Threshold of the earlier tier.
        previous: u32,

        /// Threshold of the offending tier.
        next: u32,
    },

    /// Buying more must never cost more per unit.
    #[error("tier starting at {0} has a lower rate than the tier before it")]
    RateDecreases(u32),

    /// Rates are fractions in `[0, 1]`.
    #[error("tier starting at {0} has a rate outside 0%..=100%")]
    RateOutOfRange(u32),
}

/// One row of the schedule: quantities from `min_quantity` upward earn `rate`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscountTier {
    min_quantity: u32,
    rate: Percentage,
}

impl DiscountTier {
    /// Creates a tier.
    pub fn new(min_quantity: u32, rate: Percentage) -> Self {
        Self { min_quantity, rate }
    }

    /// Smallest quantity this tier applies to
    pub fn min_quantity(&self) -> u32 {
        self.min_quantity
    }

    /// Discount rate for the tier
    pub fn rate(&self) -> Percentage {
        self.rate
    }
}

/// Ordered quantity discount tiers.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountSchedule {
    tiers: SmallVec<[DiscountTier; 4]>,
}

impl DiscountSchedule {
    /// Builds a schedule from tiers in ascending threshold order.
    ///
    /// # Errors
    ///
    /// Returns a [`ScheduleError`] unless the tiers start at one, strictly increase, carry rates
    /// within `0..=1` and never decrease in rate.
    pub fn new(tiers: impl IntoIterator<Item = DiscountTier>) -> Result<Self, ScheduleError> {
        let tiers: SmallVec<[DiscountTier; 4]> = tiers.into_iter().collect();

        let first = tiers.first().ok_or(ScheduleError::Empty)?;

        if first.min_quantity != 1 {
            return Err(ScheduleError::FirstTierNotOne(first.min_quantity));
        }

        for tier in &tiers {
            let rate = fraction(&tier.rate);

            if rate < Decimal::ZERO || rate > Decimal::ONE {
                return Err(ScheduleError::RateOutOfRange(tier.min_quantity));
            }
        }

        for pair in tiers.windows(2) {
            let [previous, next] = pair else {
                continue;
            };

            if next.min_quantity <= previous.min_quantity {
                return Err(ScheduleError::NotIncreasing {
                    previous: previous.min_quantity,
                    next: next.min_quantity,
                });
            }

            if fraction(&next.rate) < fraction(&previous.rate) {
                return Err(ScheduleError::RateDecreases(next.min_quantity));
            }
        }

        Ok(Self { tiers })
    }

    /// The storefront schedule: 1-5 units 0%, 6-20 units 5%, 21-50 units 10%, 51+ units 15%.
    pub fn standard() -> Self {
        let tier = |min_quantity, points| {
            DiscountTier::new(min_quantity, Percentage::from(Decimal::new(points, 2)))
        };

        Self {
            tiers: smallvec![tier(1, 0), tier(6, 5), tier(21, 10), tier(51, 15)],
        }
    }

    /// Discount rate earned by buying `quantity` units of one product.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::InvalidQuantity`] when `quantity` is zero.
    pub fn rate_for(&self, quantity: u32) -> Result<Percentage, PricingError> {
        if quantity == 0 {
            return Err(PricingError::InvalidQuantity(quantity));
        }

        Ok(self
            .tiers
            .iter()
            .rev()
            .find(|tier| tier.min_quantity <= quantity)
            .map_or_else(|| Percentage::from(Decimal::ZERO), DiscountTier::rate))
    }

    /// The tiers in ascending order
    pub fn tiers(&self) -> &[DiscountTier] {
        &self.tiers
    }
}

impl Default for DiscountSchedule {
    fn default() -> Self {
        Self::standard()
    }
}
