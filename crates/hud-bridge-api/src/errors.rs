//! Error types for the HTTP service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use hud_bridge_core::{AccessError, RegistryError, RelayError, ValidationError, WebhookRejection};
use tracing::{error, warn};

/// Handler errors with HTTP status code mapping
///
/// - `400 Bad Request`: malformed or incomplete input, and webhook
///   deliveries that fail verification
/// - `401 Unauthorized`: missing or wrong bearer token
/// - `404 Not Found`: unknown customer
/// - `500 Internal Server Error`: GitHub or the token exchange failed, or
///   the server itself misbehaved
///
/// Every response body is JSON of the form
/// `{"error": ..., "details": ..., "status": ..., "timestamp": ...}` with
/// `details` present only where it is safe to show.
#[derive(Debug, thiserror::Error)]
pub enum ApiHandlerError {
    /// Caller failed the bearer-token check
    ///
    /// Maps to: `401 Unauthorized`
    #[error("Unauthorized")]
    Unauthorized(#[from] AccessError),

    /// Request body is not the expected JSON
    ///
    /// Maps to: `400 Bad Request`
    #[error("Invalid request body: {message}")]
    MalformedBody { message: String },

    /// Request content failed validation
    ///
    /// Maps to: `400 Bad Request`
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Issue relay failure
    ///
    /// Maps to `400` for validation failures and `500` for upstream ones.
    #[error("Failed to create issue: {0}")]
    Relay(#[from] RelayError),

    /// Registry failure
    ///
    /// Maps to `404` for unknown customers, `400` for invalid
    /// registrations and `500` for storage failures.
    #[error("Registry operation failed: {0}")]
    Registry(#[from] RegistryError),

    /// Webhook delivery rejected by the verifier
    ///
    /// Maps to: `400 Bad Request`
    #[error("Webhook verification failed: {0}")]
    WebhookRejected(#[from] WebhookRejection),

    /// Unexpected internal server error
    ///
    /// Maps to: `500 Internal Server Error`. Details are logged, never
    /// returned.
    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl ApiHandlerError {
    /// HTTP status this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::MalformedBody { .. } | Self::Validation(_) | Self::WebhookRejected(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Relay(RelayError::Validation(_)) => StatusCode::BAD_REQUEST,
            Self::Relay(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Registry(RegistryError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Registry(RegistryError::Invalid(_)) => StatusCode::BAD_REQUEST,
            Self::Registry(RegistryError::Storage { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing `error` and optional `details`.
    fn public_message(&self) -> (String, Option<String>) {
        match self {
            Self::Unauthorized(_) => ("Unauthorized".to_string(), None),
            Self::MalformedBody { message } => {
                ("Invalid request body".to_string(), Some(message.clone()))
            }
            Self::Validation(e) => (e.to_string(), None),
            Self::Relay(RelayError::Validation(e)) => (e.to_string(), None),
            Self::Relay(e) => ("Failed to create issue".to_string(), Some(e.details())),
            Self::Registry(RegistryError::NotFound { .. }) => {
                ("Customer not found".to_string(), None)
            }
            Self::Registry(RegistryError::Invalid(e)) => (e.to_string(), None),
            Self::Registry(RegistryError::Storage { .. }) | Self::Internal { .. } => (
                "Internal server error occurred. Please try again later.".to_string(),
                None,
            ),
            Self::WebhookRejected(e) => {
                ("Webhook verification failed".to_string(), Some(e.to_string()))
            }
        }
    }
}

impl IntoResponse for ApiHandlerError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!(error = %self, status = status.as_u16(), "Request failed");
        } else {
            warn!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let (message, details) = self.public_message();
        error_response(status, message, details)
    }
}

/// Build the JSON error body shared by handlers and the panic handler.
pub fn error_response(status: StatusCode, message: String, details: Option<String>) -> Response {
    let mut body = serde_json::json!({
        "error": message,
        "status": status.as_u16(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    if let Some(details) = details {
        body["details"] = serde_json::Value::String(details);
    }

    (status, Json(body)).into_response()
}

/// Service-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Failed to initialize GitHub client: {message}")]
    GitHubSetup { message: String },
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },

    #[error("Configuration loading failed: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
