//! # Installation Registry
//!
//! Maps Hud customer identifiers to the GitHub installation that customer
//! created, plus the repositories Hud may file issues into.
//!
//! The registry is an injected trait object so a persistent store can
//! replace the in-memory one without touching callers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{parse_installation_id, CustomerId, InstallationId, ValidationError};

/// Installation details registered for one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub customer_id: CustomerId,
    pub installation_id: InstallationId,
    /// Repositories in registration order
    pub repos: Vec<String>,
    /// Time of the latest registration
    pub created_at: DateTime<Utc>,
}

impl CustomerRecord {
    /// Create a record stamped with the current time.
    pub fn new(
        customer_id: CustomerId,
        installation_id: InstallationId,
        repos: Vec<String>,
    ) -> Self {
        Self {
            customer_id,
            installation_id,
            repos,
            created_at: Utc::now(),
        }
    }
}

/// Validated registration, ready for [`InstallationRegistry::register`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub customer_id: CustomerId,
    pub installation_id: InstallationId,
    pub repos: Vec<String>,
}

/// Registration body as received from callers.
///
/// Fields are optional so missing ones can be reported together.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterCustomerPayload {
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub installation_id: Option<serde_json::Value>,
    #[serde(default)]
    pub repos: Option<Vec<String>>,
}

impl RegisterCustomerPayload {
    /// Validate the payload.
    ///
    /// A missing `repos` list registers no repositories. Repositories are
    /// stored exactly as sent.
    pub fn validate(self) -> Result<Registration, ValidationError> {
        let mut missing = Vec::new();
        if !matches!(self.customer_id.as_deref(), Some(c) if !c.trim().is_empty()) {
            missing.push("customer_id".to_string());
        }
        if matches!(self.installation_id, None | Some(serde_json::Value::Null)) {
            missing.push("installation_id".to_string());
        }
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields { fields: missing });
        }

        let customer_id = CustomerId::new(self.customer_id.unwrap_or_default())?;
        let installation_id =
            parse_installation_id(&self.installation_id.unwrap_or(serde_json::Value::Null))?;

        Ok(Registration {
            customer_id,
            installation_id,
            repos: self.repos.unwrap_or_default(),
        })
    }
}

/// Registry errors.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Customer not found: {customer_id}")]
    NotFound { customer_id: CustomerId },

    #[error("Invalid registration: {0}")]
    Invalid(#[from] ValidationError),

    #[error("Registry storage failure: {message}")]
    Storage { message: String },
}

/// Customer to installation mapping.
///
/// Every operation is a single atomic read or write; concurrent
/// registrations for the same customer resolve as last write wins.
#[async_trait]
pub trait InstallationRegistry: Send + Sync {
    /// Store a record for `customer_id`, replacing any previous one.
    ///
    /// Nothing is merged: the new repository list replaces the old one and
    /// `created_at` is reset. Returns the record as stored.
    async fn register(
        &self,
        customer_id: CustomerId,
        installation_id: InstallationId,
        repos: Vec<String>,
    ) -> Result<CustomerRecord, RegistryError>;

    /// Find the record for `customer_id`.
    async fn lookup(&self, customer_id: &CustomerId) -> Result<CustomerRecord, RegistryError>;

    /// Number of registered customers.
    async fn count(&self) -> Result<usize, RegistryError>;
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
