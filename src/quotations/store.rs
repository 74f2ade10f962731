//! Quotation persistence

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;

use crate::{
    collaborators::CollaboratorError,
    quotations::{
        NewQuotation, Quotation, QuotationActivity, QuotationId, QuotationItem, QuotationStatus,
    },
};

/// Storage for quotations, their items and history.
#[automock]
#[async_trait]
pub trait QuotationStore: Send + Sync {
    /// Stores a quotation header in `draft` status.
    ///
    /// Fails with [`CollaboratorError::Conflict`] when the quote number is already taken.
    async fn insert_quotation(&self, quotation: NewQuotation)
    -> Result<Quotation, CollaboratorError>;

    /// Stores the lines of a quotation.
    async fn insert_quotation_items(
        &self,
        quotation_id: QuotationId,
        items: Vec<QuotationItem>,
    ) -> Result<(), CollaboratorError>;

    /// Flags a header whose items could not be stored, for operator follow-up.
    async fn mark_orphaned(&self, quotation_id: QuotationId) -> Result<(), CollaboratorError>;

    /// Appends a history entry.
    async fn record_activity(&self, activity: QuotationActivity) -> Result<(), CollaboratorError>;

    /// Loads a quotation with its items.
    async fn get_quotation(&self, quotation_id: QuotationId)
    -> Result<Quotation, CollaboratorError>;

    /// Moves a quotation from `from` to `to`, stamping `viewed_at` when `to` is `viewed`.
    ///
    /// Fails with [`CollaboratorError::Conflict`] when the stored status is no longer `from`.
    async fn update_quotation_status(
        &self,
        quotation_id: QuotationId,
        from: QuotationStatus,
        to: QuotationStatus,
        at: Timestamp,
    ) -> Result<Quotation, CollaboratorError>;
}
