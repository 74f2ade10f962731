//! Inventory
//!
//! Availability is checked against stock minus outstanding reservations. Reservations
//! themselves are managed by an external inventory service; checkout asks it to reserve stock
//! once an order exists.

use std::{fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use futures::future::join_all;
use mockall::automock;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    collaborators::{CollaboratorError, within},
    items::{LineItem, ProductId},
    orders::OrderId,
};

/// Stock position of one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventoryRecord {
    /// Units on hand
    pub stock_quantity: u32,

    /// Units promised to placed orders
    pub reserved_quantity: u32,
}

impl InventoryRecord {
    /// Units that can still be sold.
    pub fn available(&self) -> u32 {
        self.stock_quantity.saturating_sub(self.reserved_quantity)
    }
}

/// Reads stock positions.
#[automock]
#[async_trait]
pub trait InventoryProvider: Send + Sync {
    /// Stock position for `product_id`, or `None` when the product has no inventory record.
    async fn inventory(
        &self,
        product_id: ProductId,
    ) -> Result<Option<InventoryRecord>, CollaboratorError>;
}

/// Reservation lifecycle actions understood by the inventory service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationAction {
    /// Hold stock for an order.
    Reserve,

    /// Return held stock.
    Release,

    /// Turn held stock into a sale.
    Confirm,
}

impl ReservationAction {
    /// Wire name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reserve => "reserve",
            Self::Release => "release",
            Self::Confirm => "confirm",
        }
    }
}

impl fmt::Display for ReservationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Holds and releases stock for orders.
#[automock]
#[async_trait]
pub trait ReservationService: Send + Sync {
    /// Applies `action` to every line of `order_id`.
    async fn apply(
        &self,
        order_id: OrderId,
        action: ReservationAction,
    ) -> Result<(), CollaboratorError>;
}

/// A product that cannot be supplied in the requested quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortage {
    /// Product that is short
    pub product_id: ProductId,

    /// Product display name
    pub product_name: String,

    /// Units requested across the whole cart
    pub requested: u32,

    /// Units that can be sold
    pub available: u32,
}

/// Result of an availability check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Availability {
    shortages: Vec<Shortage>,
}

impl Availability {
    /// Whether every product can be supplied
    pub fn all_available(&self) -> bool {
        self.shortages.is_empty()
    }

    /// Products that cannot be supplied, in cart order
    pub fn shortages(&self) -> &[Shortage] {
        &self.shortages
    }

    /// Takes the shortages
    pub fn into_shortages(self) -> Vec<Shortage> {
        self.shortages
    }
}

/// Errors that leave availability unknown.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InventoryError {
    /// Stock for a product could not be read.
    #[error("could not read inventory for product {product_id}")]
    CheckFailed {
        /// Product whose inventory read failed
        product_id: ProductId,

        /// Underlying failure
        #[source]
        source: CollaboratorError,
    },

    /// More units requested than can be represented.
    #[error("requested quantity for product {0} overflowed")]
    QuantityOverflow(ProductId),
}

/// Checks that a cart can be supplied from stock.
#[derive(Clone)]
pub struct InventoryAvailabilityChecker {
    provider: Arc<dyn InventoryProvider>,
    timeout: Duration,
}

impl fmt::Debug for InventoryAvailabilityChecker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InventoryAvailabilityChecker")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Units requested per product, in first-seen order.
struct Demand {
    product_id: ProductId,
    product_name: String,
    requested: u32,
}

impl InventoryAvailabilityChecker {
    /// Creates a checker.
    pub fn new(provider: Arc<dyn InventoryProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Checks every product in `items`. Lines for the same product are summed first.
    ///
    /// A product without an inventory record counts as having nothing available. Reads run
    /// concurrently.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::CheckFailed`] if any read fails or times out; availability is
    /// then unknown and the caller must not proceed as if stock were there.
    #[tracing::instrument(
        name = "inventory.checker.check_all",
        skip(self, items),
        fields(line_count = items.len()),
        err
    )]
    pub async fn check_all(&self, items: &[LineItem]) -> Result<Availability, InventoryError> {
        let demand = aggregate(items)?;

        let records = join_all(
            demand
                .iter()
                .map(|line| within(self.timeout, self.provider.inventory(line.product_id))),
        )
        .await;

        let mut shortages = Vec::new();

        for (line, record) in demand.into_iter().zip(records) {
            let record = record.map_err(|source| InventoryError::CheckFailed {
                product_id: line.product_id,
                source,
            })?;

            let available = record.map_or(0, |record| record.available());

            if line.requested > available {
                warn!(
                    product_id = %line.product_id,
                    requested = line.requested,
                    available,
                    "insufficient stock"
                );

                shortages.push(Shortage {
                    product_id: line.product_id,
                    product_name: line.product_name,
                    requested: line.requested,
                    available,
                });
            }
        }

        info!(shortage_count = shortages.len(), "checked inventory");

        Ok(Availability { shortages })
    }
}

fn aggregate(items: &[LineItem]) -> Result<Vec<Demand>, InventoryError> {
    let mut positions: FxHashMap<ProductId, usize> = FxHashMap::default();
    let mut demand: Vec<Demand> = Vec::with_capacity(items.len());

    for item in items {
        let product_id = item.product_id();

        match positions.get(&product_id).and_then(|&at| demand.get_mut(at)) {
            Some(line) => {
                line.requested = line
                    .requested
                    .checked_add(item.quantity())
                    .ok_or(InventoryError::QuantityOverflow(product_id))?;
            }
            None => {
                positions.insert(product_id, demand.len());
                demand.push(Demand {
                    product_id,
                    product_name: item.product_name().to_string(),
                    requested: item.quantity(),
                });
            }
        }
    }

    Ok(demand)
}
