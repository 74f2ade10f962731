//! Customers

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Contact details problems.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ContactError {
    /// Name is blank.
    #[error("customer name is required")]
    MissingName,

    /// Email is blank or malformed.
    #[error("a valid customer email is required")]
    InvalidEmail,
}

/// Who is buying.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    /// Full name
    pub name: String,

    /// Email address
    pub email: String,

    /// Phone number
    #[serde(default)]
    pub phone: Option<String>,

    /// Company, for business buyers
    #[serde(default)]
    pub company: Option<String>,
}

impl CustomerInfo {
    /// Checks the details are usable for contacting the customer.
    ///
    /// # Errors
    ///
    /// Returns a [`ContactError`] if the name is blank or the email is not plausibly an address.
    pub fn validate(&self) -> Result<(), ContactError> {
        if self.name.trim().is_empty() {
            return Err(ContactError::MissingName);
        }

        let email = self.email.trim();

        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
            _ => Err(ContactError::InvalidEmail),
        }
    }
}
