//! Fulfillment
//!
//! Order placement and the order lifecycle. Submission runs a fixed table of steps against the
//! external collaborators; see [`CHECKOUT_STEPS`] for which failures abort and which are only
//! recorded.

mod orchestrator;
mod outcome;
mod steps;

pub use orchestrator::{CheckoutCollaborators, FulfillmentOrchestrator};
pub use outcome::{
    CheckoutRequest, OrderAdvanced, OrderCreated, OrderError, OrderRejected, PaymentInfo,
    PaymentSignal,
};
pub use steps::{CHECKOUT_STEPS, CheckoutStep, OrderEffect};
