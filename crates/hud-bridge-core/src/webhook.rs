//! # Webhook Verifier
//!
//! Decides whether a webhook delivery really came from GitHub: the three
//! GitHub headers must be present and the HMAC-SHA256 signature over the
//! raw body must match the shared secret. The verdict never depends on the
//! body's content; a correctly signed body that is not JSON is accepted with
//! an empty summary.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use hud_bridge_github::webhook::{DELIVERY_HEADER, EVENT_HEADER, SIGNATURE_HEADER};
use hud_bridge_github::SignatureValidator;

use crate::InstallationId;

/// Why a delivery was turned away.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WebhookRejection {
    #[error("Missing required header: {header}")]
    MissingHeader { header: String },

    #[error("Malformed signature: {message}")]
    MalformedSignature { message: String },

    #[error("Signature does not match payload")]
    SignatureMismatch,
}

/// Summary of an accepted delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedEvent {
    pub delivery_id: String,
    pub event_type: String,
    pub action: Option<String>,
    pub installation_id: Option<InstallationId>,
    /// `owner/repo` of the repository the event concerns
    pub repository: Option<String>,
}

impl VerifiedEvent {
    /// Whether this is an app install or uninstall notification.
    pub fn is_installation_lifecycle(&self) -> bool {
        self.event_type == "installation"
            && matches!(self.action.as_deref(), Some("created") | Some("deleted"))
    }
}

/// Minimal view of the fields summarized from a payload.
#[derive(Debug, Default, Deserialize)]
struct PayloadSummary {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    installation: Option<IdField>,
    #[serde(default)]
    repository: Option<RepositoryField>,
}

#[derive(Debug, Deserialize)]
struct IdField {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct RepositoryField {
    full_name: String,
}

/// Checks deliveries against the app's webhook secret.
#[derive(Debug, Clone)]
pub struct WebhookVerifier {
    validator: SignatureValidator,
}

impl WebhookVerifier {
    /// Create a verifier for the given shared secret.
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            validator: SignatureValidator::new(secret),
        }
    }

    /// Verify a delivery.
    ///
    /// `headers` keys are matched case-insensitively. `payload` must be the
    /// bytes exactly as received.
    pub fn verify(
        &self,
        headers: &HashMap<String, String>,
        payload: &[u8],
    ) -> Result<VerifiedEvent, WebhookRejection> {
        let delivery_id = required_header(headers, DELIVERY_HEADER)?;
        let event_type = required_header(headers, EVENT_HEADER)?;
        let signature = required_header(headers, SIGNATURE_HEADER)?;

        let valid = self
            .validator
            .validate(payload, &signature)
            .map_err(|e| WebhookRejection::MalformedSignature {
                message: e.to_string(),
            })?;

        if !valid {
            return Err(WebhookRejection::SignatureMismatch);
        }

        let summary: PayloadSummary = serde_json::from_slice(payload).unwrap_or_default();

        Ok(VerifiedEvent {
            delivery_id,
            event_type,
            action: summary.action,
            installation_id: summary
                .installation
                .and_then(|i| InstallationId::try_new(i.id).ok()),
            repository: summary.repository.map(|r| r.full_name),
        })
    }
}

fn required_header(
    headers: &HashMap<String, String>,
    name: &str,
) -> Result<String, WebhookRejection> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| WebhookRejection::MissingHeader {
            header: name.to_string(),
        })
}

#[cfg(test)]
#[path = "webhook_tests.rs"]
mod tests;
