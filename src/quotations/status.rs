//! Quotation statuses

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::notifications::NotificationEvent;

/// Quotation lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotationStatus {
    /// Created, not yet sent to the customer.
    #[default]
    Draft,

    /// Sent to the customer.
    Sent,

    /// Opened by the customer.
    Viewed,

    /// Accepted by the customer.
    Approved,

    /// Declined by the customer.
    Rejected,

    /// Lapsed without a decision.
    Expired,

    /// Turned into an order.
    Converted,
}

impl QuotationStatus {
    /// Whether moving from `self` to `to` is allowed.
    pub fn can_transition_to(self, to: Self) -> bool {
        match (self, to) {
            (Self::Draft, Self::Sent)
            | (Self::Sent, Self::Viewed)
            | (Self::Viewed, Self::Approved | Self::Rejected)
            | (Self::Approved, Self::Converted) => true,
            (from, Self::Expired) => from.can_expire(),
            _ => false,
        }
    }

    /// Whether the quotation is still awaiting a decision and may lapse
    pub fn can_expire(self) -> bool {
        matches!(self, Self::Draft | Self::Sent | Self::Viewed)
    }

    /// Whether no further transition is possible
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Expired | Self::Converted)
    }

    /// Customer notification sent on entering this status
    pub fn notification(self) -> Option<NotificationEvent> {
        match self {
            Self::Sent => Some(NotificationEvent::QuotationSent),
            Self::Approved => Some(NotificationEvent::QuotationApproved),
            _ => None,
        }
    }

    /// Wire name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Viewed => "viewed",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
            Self::Converted => "converted",
        }
    }
}

impl fmt::Display for QuotationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
