//! CRM synchronisation

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::{collaborators::CollaboratorError, quotations::QuotationId};

/// How much of a quotation to push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncType {
    /// Customer, header and items.
    Full,

    /// Status only.
    Status,
}

impl SyncType {
    /// Wire name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Status => "status",
        }
    }
}

/// Pushes quotations to the CRM.
#[automock]
#[async_trait]
pub trait CrmSync: Send + Sync {
    /// Synchronises one quotation.
    async fn sync_quotation(
        &self,
        quotation_id: QuotationId,
        sync_type: SyncType,
    ) -> Result<(), CollaboratorError>;
}
