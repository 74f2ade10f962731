//! External collaborators
//!
//! Everything the engine talks to (the order and quotation stores, the delivery calculator, the
//! inventory service, notifications, the CRM) reports failure through one error type so the
//! orchestrators can classify it uniformly.

use std::{future::Future, time::Duration};

use thiserror::Error;

/// Failure reported by, or while calling, an external collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CollaboratorError {
    /// The collaborator could not be reached.
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    /// The collaborator did not answer in time.
    #[error("collaborator timed out after {0:?}")]
    Timeout(Duration),

    /// A uniqueness constraint was violated.
    #[error("conflicting record: {0}")]
    Conflict(String),

    /// The requested record does not exist.
    #[error("record not found")]
    NotFound,

    /// The collaborator refused the request.
    #[error("request rejected: {0}")]
    Rejected(String),
}

impl CollaboratorError {
    /// Whether the failure is a uniqueness conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

/// Awaits a collaborator call, giving up after `limit`.
///
/// # Errors
///
/// Returns [`CollaboratorError::Timeout`] when `limit` elapses, otherwise the call's own error.
pub async fn within<T, F>(limit: Duration, call: F) -> Result<T, CollaboratorError>
where
    F: Future<Output = Result<T, CollaboratorError>>,
{
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_elapsed| CollaboratorError::Timeout(limit))?
}
