//! Checkout requests and results

use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    carts::CartHandle,
    collaborators::CollaboratorError,
    customers::{ContactError, CustomerInfo},
    fulfillment::{CheckoutStep, OrderEffect},
    inventory::{InventoryError, Shortage},
    orders::{Order, OrderId, OrderStatus, PaymentMethod, PaymentStatus},
    pricing::{PricingError, PricingSummary},
    shipping::{Address, DeliveryType, ShippingError, ShippingQuote},
    steps::StepFailure,
};

/// Outcome reported by the payment gateway for prepaid methods.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PaymentSignal {
    /// Nothing collected yet. Valid only for cash on delivery.
    #[default]
    Pending,

    /// The gateway captured payment.
    Succeeded {
        /// Gateway reference
        reference: String,
    },

    /// The gateway declined payment.
    Failed {
        /// Gateway reason
        reason: String,
    },
}

/// How the order is being paid for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentInfo {
    /// Payment method
    pub method: PaymentMethod,

    /// Gateway outcome
    pub signal: PaymentSignal,
}

impl PaymentInfo {
    /// Cash on delivery.
    pub fn cash_on_delivery() -> Self {
        Self::default()
    }

    /// Payment status the order starts in.
    ///
    /// # Errors
    ///
    /// Returns [`OrderRejected::PaymentDeclined`] if the gateway declined, or if a prepaid
    /// method has no successful capture.
    pub fn initial_status(&self) -> Result<PaymentStatus, OrderRejected> {
        match (&self.signal, self.method.is_prepaid()) {
            (PaymentSignal::Failed { reason }, _) => {
                Err(OrderRejected::PaymentDeclined(reason.clone()))
            }
            (PaymentSignal::Succeeded { .. }, _) => Ok(PaymentStatus::Paid),
            (PaymentSignal::Pending, false) => Ok(PaymentStatus::Pending),
            (PaymentSignal::Pending, true) => Err(OrderRejected::PaymentDeclined(String::from(
                "payment has not been completed",
            ))),
        }
    }
}

/// Everything needed to place an order.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    /// Cart being checked out
    pub cart: CartHandle,

    /// Buyer
    pub customer: CustomerInfo,

    /// Destination
    pub shipping_address: Address,

    /// Delivery speed
    pub delivery_type: DeliveryType,

    /// Payment
    pub payment: PaymentInfo,

    /// Shipping quote shown to the customer, reused when still valid
    pub shipping_quote: Option<ShippingQuote>,

    /// Free-text notes
    pub notes: Option<String>,
}

/// A successfully placed order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderCreated {
    /// The stored order with its items
    pub order: Order,

    /// Shipping quote the order was charged
    pub shipping: ShippingQuote,

    /// Best-effort steps that failed; the order stands regardless
    pub best_effort_failures: Vec<StepFailure<CheckoutStep>>,
}

impl OrderCreated {
    /// Order identifier
    pub fn order_id(&self) -> OrderId {
        self.order.id
    }

    /// Order reference
    pub fn order_number(&self) -> &str {
        &self.order.order_number
    }

    /// Order totals
    pub fn pricing(&self) -> &PricingSummary {
        &self.order.pricing
    }

    /// Amount payable
    pub fn final_total(&self) -> Money<'static, Currency> {
        self.order.pricing.final_total()
    }
}

/// Reasons an order was not placed.
#[derive(Debug, Error, PartialEq)]
pub enum OrderRejected {
    /// The cart could not be priced.
    #[error("invalid cart: {0}")]
    InvalidInput(#[from] PricingError),

    /// Contact details are unusable.
    #[error("invalid customer details: {0}")]
    InvalidCustomer(#[from] ContactError),

    /// Payment was not collected.
    #[error("payment declined: {0}")]
    PaymentDeclined(String),

    /// Some products cannot be supplied.
    #[error("insufficient stock for {} product(s)", .0.len())]
    InsufficientStock(Vec<Shortage>),

    /// Stock could not be checked.
    #[error("inventory could not be verified")]
    InventoryUnverified(#[source] InventoryError),

    /// Shipping could not be resolved.
    #[error(transparent)]
    Shipping(#[from] ShippingError),

    /// A critical step failed before the order existed.
    #[error("checkout step {step} failed")]
    StepFailed {
        /// Failed step
        step: CheckoutStep,

        /// Why it failed
        #[source]
        error: CollaboratorError,
    },

    /// Every order number tried was already taken.
    #[error("no unique order number after {0} attempts")]
    NumberExhausted(u32),

    /// The header was stored but its lines were not.
    #[error("order {order_number} was stored without its items")]
    ItemsNotPersisted {
        /// Orphaned order
        order_id: OrderId,

        /// Orphaned order reference
        order_number: String,

        /// Why it failed
        #[source]
        error: CollaboratorError,
    },

    /// The order was stored but a later critical step failed.
    #[error("order {order_number} was stored but step {step} failed")]
    Incomplete {
        /// Stored order
        order_id: OrderId,

        /// Stored order reference
        order_number: String,

        /// Failed step
        step: CheckoutStep,

        /// Why it failed
        #[source]
        error: CollaboratorError,
    },

    /// The order was placed but the cart still holds its lines.
    #[error("order {order_number} was placed but the cart could not be cleared")]
    CartNotCleared {
        /// Placed order
        order_id: OrderId,

        /// Placed order reference
        order_number: String,

        /// Why it failed
        #[source]
        error: CollaboratorError,
    },
}

impl OrderRejected {
    /// Step the rejection happened at, if it came from a collaborator.
    pub fn step(&self) -> Option<CheckoutStep> {
        match self {
            Self::InsufficientStock(_) | Self::InventoryUnverified(_) => {
                Some(CheckoutStep::VerifyInventory)
            }
            Self::Shipping(_) => Some(CheckoutStep::ResolveShipping),
            Self::StepFailed { step, .. } | Self::Incomplete { step, .. } => Some(*step),
            Self::NumberExhausted(_) => Some(CheckoutStep::PersistOrder),
            Self::ItemsNotPersisted { .. } => Some(CheckoutStep::PersistOrderItems),
            Self::CartNotCleared { .. } => Some(CheckoutStep::ClearCart),
            Self::InvalidInput(_) | Self::InvalidCustomer(_) | Self::PaymentDeclined(_) => None,
        }
    }
}

/// An order moved to a new status.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderAdvanced {
    /// The order after the transition
    pub order: Order,

    /// Side effects that failed; the transition stands regardless
    pub best_effort_failures: Vec<StepFailure<OrderEffect>>,
}

/// Errors moving an order through its lifecycle.
#[derive(Debug, Error, PartialEq)]
pub enum OrderError {
    /// No such order.
    #[error("order not found")]
    NotFound(OrderId),

    /// The lifecycle does not allow the move.
    #[error("order cannot move from {from} to {to}")]
    InvalidTransition {
        /// Current status
        from: OrderStatus,

        /// Requested status
        to: OrderStatus,
    },

    /// Someone else changed the order first.
    #[error("order was updated concurrently")]
    ConcurrentUpdate(OrderId),

    /// Storage failed.
    #[error("storage error")]
    Store(#[source] CollaboratorError),
}

impl OrderError {
    pub(crate) fn from_store(order_id: OrderId, error: CollaboratorError) -> Self {
        match error {
            CollaboratorError::NotFound => Self::NotFound(order_id),
            CollaboratorError::Conflict(_) => Self::ConcurrentUpdate(order_id),
            other => Self::Store(other),
        }
    }
}
