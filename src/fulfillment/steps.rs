//! Checkout steps

use std::fmt;

use crate::steps::Criticality;

/// A step of order submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckoutStep {
    /// Check every product can be supplied.
    VerifyInventory,

    /// Work out the shipping cost.
    ResolveShipping,

    /// Store the order header.
    PersistOrder,

    /// Store the order lines.
    PersistOrderItems,

    /// Ask the inventory service to hold stock.
    ReserveInventory,

    /// Store the delivery record.
    PersistDelivery,

    /// Empty the customer's cart.
    ClearCart,

    /// Tell the customer the order was placed.
    SendConfirmation,
}

/// Checkout steps in execution order, with how each failure is treated.
pub const CHECKOUT_STEPS: [(CheckoutStep, Criticality); 8] = [
    (CheckoutStep::VerifyInventory, Criticality::Critical),
    (CheckoutStep::ResolveShipping, Criticality::Critical),
    (CheckoutStep::PersistOrder, Criticality::Critical),
    (CheckoutStep::PersistOrderItems, Criticality::Critical),
    (CheckoutStep::ReserveInventory, Criticality::BestEffort),
    (CheckoutStep::PersistDelivery, Criticality::BestEffort),
    (CheckoutStep::ClearCart, Criticality::Critical),
    (CheckoutStep::SendConfirmation, Criticality::BestEffort),
];

impl CheckoutStep {
    /// How a failure of this step is treated
    pub fn criticality(self) -> Criticality {
        CHECKOUT_STEPS
            .iter()
            .find(|(step, _)| *step == self)
            .map_or(Criticality::Critical, |(_, criticality)| *criticality)
    }

    /// Whether later steps consume this step's result, so its failure always aborts.
    pub fn is_prerequisite(self) -> bool {
        matches!(
            self,
            Self::VerifyInventory | Self::ResolveShipping | Self::PersistOrder
        )
    }

    /// Stable snake_case name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::VerifyInventory => "verify_inventory",
            Self::ResolveShipping => "resolve_shipping",
            Self::PersistOrder => "persist_order",
            Self::PersistOrderItems => "persist_order_items",
            Self::ReserveInventory => "reserve_inventory",
            Self::PersistDelivery => "persist_delivery",
            Self::ClearCart => "clear_cart",
            Self::SendConfirmation => "send_confirmation",
        }
    }
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Side effects of moving an order through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderEffect {
    /// Tell the customer about the new status.
    NotifyCustomer,

    /// Turn held stock into a sale.
    ConfirmReservation,

    /// Return held stock.
    ReleaseReservation,
}

impl fmt::Display for OrderEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotifyCustomer => "notify_customer",
            Self::ConfirmReservation => "confirm_reservation",
            Self::ReleaseReservation => "release_reservation",
        })
    }
}
