//! Quotation requests and results

use thiserror::Error;

use crate::{
    carts::{CartHandle, CartId},
    collaborators::CollaboratorError,
    customers::{ContactError, CustomerInfo},
    items::LineItem,
    pricing::{CustomerTier, PricingError},
    quotations::{Quotation, QuotationId, QuotationStatus, QuotationStep},
    steps::StepFailure,
};

/// Everything needed to issue a quotation.
#[derive(Debug, Clone, PartialEq)]
pub struct QuotationRequest {
    /// Lines to quote
    pub items: Vec<LineItem>,

    /// Customer
    pub customer: CustomerInfo,

    /// Customer account tier
    pub customer_tier: CustomerTier,

    /// Free-text notes
    pub notes: Option<String>,

    /// Cart the request came from, emptied once the quotation is stored
    pub source_cart: Option<CartId>,
}

impl QuotationRequest {
    /// A request for the contents of `cart`.
    pub fn from_cart(cart: CartHandle, customer: CustomerInfo, customer_tier: CustomerTier) -> Self {
        let source_cart = Some(cart.id());

        Self {
            items: cart.items().to_vec(),
            customer,
            customer_tier,
            notes: None,
            source_cart,
        }
    }
}

/// A successfully issued quotation.
#[derive(Debug, Clone, PartialEq)]
pub struct QuotationCreated {
    /// The stored quotation with its items
    pub quotation: Quotation,

    /// Best-effort steps that failed; the quotation stands regardless
    pub best_effort_failures: Vec<StepFailure<QuotationStep>>,
}

impl QuotationCreated {
    /// Quotation identifier
    pub fn quotation_id(&self) -> QuotationId {
        self.quotation.id
    }

    /// Quotation reference
    pub fn quote_number(&self) -> &str {
        &self.quotation.quote_number
    }
}

/// Reasons a quotation was not issued.
#[derive(Debug, Error, PartialEq)]
pub enum QuotationRejected {
    /// The lines could not be priced.
    #[error("invalid quotation request: {0}")]
    InvalidInput(#[from] PricingError),

    /// Contact details are unusable.
    #[error("invalid customer details: {0}")]
    InvalidCustomer(#[from] ContactError),

    /// The header could not be stored.
    #[error("quotation step {step} failed")]
    StepFailed {
        /// Failed step
        step: QuotationStep,

        /// Why it failed
        #[source]
        error: CollaboratorError,
    },

    /// Every quote number tried was already taken.
    #[error("no unique quote number after {0} attempts")]
    NumberExhausted(u32),

    /// The header was stored but its lines were not.
    #[error("quotation {quote_number} was stored without its items")]
    Orphaned {
        /// Orphaned quotation
        quotation_id: QuotationId,

        /// Orphaned quotation reference
        quote_number: String,

        /// Whether the header was flagged for follow-up
        flagged: bool,

        /// Why it failed
        #[source]
        error: CollaboratorError,
    },

    /// The quotation was stored but a later critical step failed.
    #[error("quotation {quote_number} was stored but step {step} failed")]
    Incomplete {
        /// Stored quotation
        quotation_id: QuotationId,

        /// Stored quotation reference
        quote_number: String,

        /// Failed step
        step: QuotationStep,

        /// Why it failed
        #[source]
        error: CollaboratorError,
    },
}

/// A quotation moved to a new status.
#[derive(Debug, Clone, PartialEq)]
pub struct QuotationUpdated {
    /// The quotation after the change
    pub quotation: Quotation,

    /// Whether the status actually changed
    pub changed: bool,

    /// Side effects that failed; the change stands regardless
    pub best_effort_failures: Vec<StepFailure<QuotationStep>>,
}

impl QuotationUpdated {
    pub(crate) fn unchanged(quotation: Quotation) -> Self {
        Self {
            quotation,
            changed: false,
            best_effort_failures: Vec::new(),
        }
    }
}

/// Errors moving a quotation through its lifecycle.
#[derive(Debug, Error, PartialEq)]
pub enum QuotationError {
    /// No such quotation.
    #[error("quotation not found")]
    NotFound(QuotationId),

    /// The lifecycle does not allow the move.
    #[error("quotation cannot move from {from} to {to}")]
    InvalidTransition {
        /// Current status
        from: QuotationStatus,

        /// Requested status
        to: QuotationStatus,
    },

    /// Someone else changed the quotation first.
    #[error("quotation was updated concurrently")]
    ConcurrentUpdate(QuotationId),

    /// The status changed but a critical follow-up step failed.
    #[error("quotation step {step} failed after the status change")]
    StepFailed {
        /// Failed step
        step: QuotationStep,

        /// Why it failed
        #[source]
        error: CollaboratorError,
    },

    /// Storage failed.
    #[error("storage error")]
    Store(#[source] CollaboratorError),
}

impl QuotationError {
    pub(crate) fn from_store(quotation_id: QuotationId, error: CollaboratorError) -> Self {
        match error {
            CollaboratorError::NotFound => Self::NotFound(quotation_id),
            CollaboratorError::Conflict(_) => Self::ConcurrentUpdate(quotation_id),
            other => Self::Store(other),
        }
    }
}
