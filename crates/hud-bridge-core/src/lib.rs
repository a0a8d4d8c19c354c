//! # Hud Bridge Core
//!
//! Domain logic of the bridge between Hud and GitHub.
//!
//! - [`relay`]: turns a create-issue request into exactly one GitHub issue,
//!   authenticated as the named installation.
//! - [`registry`]: maps Hud customer identifiers to GitHub installations.
//! - [`webhook`]: checks the framing and signature of webhook deliveries.
//! - [`access`]: the static bearer-token check guarding the relay.
//!
//! Everything that talks to the network sits behind the traits of
//! `hud-bridge-github`, so the logic here is exercised with mocks.

use serde::{Deserialize, Serialize};
use std::fmt;

pub use hud_bridge_github::InstallationId;

pub mod access;
pub mod adapters;
pub mod registry;
pub mod relay;
pub mod webhook;

pub use access::{AccessError, ApiKeyAuthenticator};
pub use adapters::InMemoryInstallationRegistry;
pub use registry::{
    CustomerRecord, InstallationRegistry, RegisterCustomerPayload, Registration, RegistryError,
};
pub use relay::{CreateIssuePayload, IssueRelay, IssueRequest, IssueResult, RelayError};
pub use webhook::{VerifiedEvent, WebhookRejection, WebhookVerifier};

// ============================================================================
// Domain Identifier Types
// ============================================================================

/// Opaque identifier Hud assigns to a customer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CustomerId(String);

impl CustomerId {
    /// Maximum accepted length.
    pub const MAX_LENGTH: usize = 256;

    /// Create a customer ID. Surrounding whitespace is trimmed.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::Required` for a blank value and
    /// `ValidationError::TooLong` above [`Self::MAX_LENGTH`] characters.
    pub fn new(value: impl AsRef<str>) -> Result<Self, ValidationError> {
        let value = value.as_ref().trim();

        if value.is_empty() {
            return Err(ValidationError::Required {
                field: "customer_id".to_string(),
            });
        }

        if value.chars().count() > Self::MAX_LENGTH {
            return Err(ValidationError::TooLong {
                field: "customer_id".to_string(),
                max_length: Self::MAX_LENGTH,
            });
        }

        Ok(Self(value.to_string()))
    }

    /// Get the string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parse an installation ID the way callers send it: a JSON number or a
/// numeric string, strictly positive.
///
/// ```
/// use hud_bridge_core::parse_installation_id;
/// use serde_json::json;
///
/// assert_eq!(parse_installation_id(&json!(42)).unwrap().as_u64(), 42);
/// assert_eq!(parse_installation_id(&json!("42")).unwrap().as_u64(), 42);
/// assert!(parse_installation_id(&json!(-1)).is_err());
/// assert!(parse_installation_id(&json!("abc")).is_err());
/// ```
pub fn parse_installation_id(value: &serde_json::Value) -> Result<InstallationId, ValidationError> {
    let invalid = || ValidationError::InvalidInstallationId;

    match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .and_then(|id| InstallationId::try_new(id).ok())
            .ok_or_else(invalid),
        serde_json::Value::String(s) => s.parse::<InstallationId>().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Input validation failures, reported to callers as 400.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Field '{field}' is required")]
    Required { field: String },

    #[error("Missing required fields: {}", .fields.join(", "))]
    MissingFields { fields: Vec<String> },

    #[error("Invalid installation_id. Must be a number.")]
    InvalidInstallationId,

    #[error("Field '{field}' has invalid format: {message}")]
    InvalidFormat { field: String, message: String },

    #[error("Field '{field}' exceeds maximum length of {max_length}")]
    TooLong { field: String, max_length: usize },
}

impl From<hud_bridge_github::ValidationError> for ValidationError {
    fn from(error: hud_bridge_github::ValidationError) -> Self {
        use hud_bridge_github::ValidationError as GitHubValidation;

        match error {
            GitHubValidation::Required { field } => Self::Required { field },
            GitHubValidation::InvalidFormat { field, message } => {
                Self::InvalidFormat { field, message }
            }
            GitHubValidation::InvalidSignatureFormat { message } => Self::InvalidFormat {
                field: "signature".to_string(),
                message,
            },
        }
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
