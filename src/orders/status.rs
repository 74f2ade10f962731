//! Order, payment and delivery statuses

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::notifications::NotificationEvent;

/// Order lifecycle.
///
/// Orders move forward one step at a time through `pending`, `confirmed`, `processing`,
/// `shipped` and `delivered`. Any order not yet delivered may be cancelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed, awaiting confirmation.
    #[default]
    Pending,

    /// Accepted by the store.
    Confirmed,

    /// Being prepared.
    Processing,

    /// Handed to the courier.
    Shipped,

    /// Received by the customer.
    Delivered,

    /// Abandoned before delivery.
    Cancelled,
}

impl OrderStatus {
    /// The status an order moves to next, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::Confirmed),
            Self::Confirmed => Some(Self::Processing),
            Self::Processing => Some(Self::Shipped),
            Self::Shipped => Some(Self::Delivered),
            Self::Delivered | Self::Cancelled => None,
        }
    }

    /// Whether moving from `self` to `to` is allowed.
    pub fn can_transition_to(self, to: Self) -> bool {
        match to {
            Self::Cancelled => !self.is_terminal(),
            _ => self.next() == Some(to),
        }
    }

    /// Whether no further transition is possible
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Customer notification sent on entering this status
    pub fn notification(self) -> Option<NotificationEvent> {
        match self {
            Self::Shipped => Some(NotificationEvent::OrderShipped),
            Self::Delivered => Some(NotificationEvent::OrderDelivered),
            _ => None,
        }
    }

    /// Wire name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment state of an order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Not yet paid; cash on delivery stays here until delivery.
    #[default]
    Pending,

    /// Paid in full.
    Paid,

    /// Payment attempt failed.
    Failed,

    /// Money returned.
    Refunded,
}

/// How the customer pays.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash on delivery.
    #[default]
    CashOnDelivery,

    /// Card via the payment gateway.
    Card,

    /// Bank transfer.
    BankTransfer,
}

impl PaymentMethod {
    /// Whether payment is collected through the gateway before the order is placed
    pub fn is_prepaid(self) -> bool {
        !matches!(self, Self::CashOnDelivery)
    }
}

/// Delivery progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Waiting for pickup.
    #[default]
    Pending,

    /// Collected by the courier.
    PickedUp,

    /// On the way.
    InTransit,

    /// On the final leg.
    OutForDelivery,

    /// Handed over.
    Delivered,

    /// Delivery attempt failed.
    Failed,
}
