//! Quotation steps

use std::fmt;

use crate::steps::Criticality;

/// A step of quotation submission, or a side effect of a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuotationStep {
    /// Store the quotation header.
    PersistQuotation,

    /// Store the quotation lines.
    PersistItems,

    /// Append a history entry.
    RecordActivity,

    /// Push the quotation to the CRM.
    SyncCrm,

    /// Tell the customer.
    NotifyCustomer,

    /// Tell the sales team.
    NotifyStaff,

    /// Empty the cart the quotation was requested from.
    ClearCart,
}

/// Submission steps in execution order, with how each failure is treated.
///
/// The two notifications run concurrently.
pub const QUOTATION_STEPS: [(QuotationStep, Criticality); 7] = [
    (QuotationStep::PersistQuotation, Criticality::Critical),
    (QuotationStep::PersistItems, Criticality::Critical),
    (QuotationStep::RecordActivity, Criticality::BestEffort),
    (QuotationStep::SyncCrm, Criticality::BestEffort),
    (QuotationStep::NotifyCustomer, Criticality::BestEffort),
    (QuotationStep::NotifyStaff, Criticality::BestEffort),
    (QuotationStep::ClearCart, Criticality::BestEffort),
];

impl QuotationStep {
    /// How a failure of this step is treated
    pub fn criticality(self) -> Criticality {
        QUOTATION_STEPS
            .iter()
            .find(|(step, _)| *step == self)
            .map_or(Criticality::Critical, |(_, criticality)| *criticality)
    }

    /// Whether later steps need this step to have succeeded, so its failure always aborts.
    pub fn is_prerequisite(self) -> bool {
        self == Self::PersistQuotation
    }

    /// Stable snake_case name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PersistQuotation => "persist_quotation",
            Self::PersistItems => "persist_items",
            Self::RecordActivity => "record_activity",
            Self::SyncCrm => "sync_crm",
            Self::NotifyCustomer => "notify_customer",
            Self::NotifyStaff => "notify_staff",
            Self::ClearCart => "clear_cart",
        }
    }
}

impl fmt::Display for QuotationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
