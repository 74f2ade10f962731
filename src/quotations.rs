//! Quotations
//!
//! Business customers ask for a priced offer before ordering. A quotation is priced like an
//! order, plus customization premiums, volume and account-tier discounts and a banded shipping
//! estimate, then stored, synced to the CRM and announced to the customer and the sales team.

mod calculator;
mod engine;
mod models;
mod outcome;
mod status;
mod steps;
mod store;

pub use calculator::{QuotationCalculator, QuotationDraft};
pub use engine::{QuotationCollaborators, QuotationEngine};
pub use models::{NewQuotation, Quotation, QuotationActivity, QuotationId, QuotationItem};
pub use outcome::{
    QuotationCreated, QuotationError, QuotationRejected, QuotationRequest, QuotationUpdated,
};
pub use status::QuotationStatus;
pub use steps::{QUOTATION_STEPS, QuotationStep};
pub use store::{MockQuotationStore, QuotationStore};
