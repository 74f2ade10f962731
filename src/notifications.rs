//! Notifications

use std::fmt;

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::collaborators::CollaboratorError;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationEvent {
    /// An order was placed.
    OrderConfirmation,

    /// An order left the warehouse.
    OrderShipped,

    /// An order reached the customer.
    OrderDelivered,

    /// A quotation was requested.
    QuotationCreated,

    /// A quotation was sent to the customer.
    QuotationSent,

    /// The customer approved a quotation.
    QuotationApproved,
}

impl NotificationEvent {
    /// Wire name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OrderConfirmation => "order_confirmation",
            Self::OrderShipped => "order_shipped",
            Self::OrderDelivered => "order_delivered",
            Self::QuotationCreated => "created",
            Self::QuotationSent => "sent",
            Self::QuotationApproved => "approved",
        }
    }

    /// Whether the event concerns a quotation rather than an order
    pub fn is_quotation_event(self) -> bool {
        matches!(
            self,
            Self::QuotationCreated | Self::QuotationSent | Self::QuotationApproved
        )
    }
}

impl fmt::Display for NotificationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who should hear about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recipient {
    /// The customer who placed the order or requested the quote.
    Customer,

    /// Storefront staff.
    Staff,
}

impl Recipient {
    /// Wire name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Staff => "admin",
        }
    }
}

/// A notification request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notification {
    /// Order or quotation the notification is about
    pub entity_id: Uuid,

    /// What happened
    pub event: NotificationEvent,

    /// Who to tell
    pub recipient: Recipient,
}

impl Notification {
    /// Creates a notification request.
    pub fn new(entity_id: impl Into<Uuid>, event: NotificationEvent, recipient: Recipient) -> Self {
        Self {
            entity_id: entity_id.into(),
            event,
            recipient,
        }
    }
}

/// Delivers notifications (email, SMS, dashboards).
#[automock]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends one notification.
    async fn notify(&self, notification: Notification) -> Result<(), CollaboratorError>;
}
