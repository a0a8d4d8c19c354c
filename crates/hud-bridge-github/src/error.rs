//! Error types for GitHub App operations.
//!
//! Authentication failures, REST API failures and input validation failures
//! are kept apart so callers can map each to the right outward behaviour.

use thiserror::Error;

use crate::auth::InstallationId;

/// Authentication-related errors.
///
/// Covers everything between "we hold a private key" and "we hold an
/// installation token": key parsing, JWT signing and the token exchange.
#[derive(Debug, Error)]
pub enum AuthError {
    /// GitHub rejected the app JWT (401/403 on the token exchange).
    #[error("Invalid GitHub App credentials")]
    InvalidCredentials,

    /// Installation not found or not accessible to this app.
    #[error("Installation {installation_id} not found or access denied")]
    InstallationNotFound { installation_id: InstallationId },

    /// Invalid private key format or data.
    #[error("Invalid private key: {message}")]
    InvalidPrivateKey { message: String },

    /// JWT generation failed.
    #[error("JWT generation failed: {message}")]
    JwtGenerationFailed { message: String },

    /// GitHub API returned an unexpected error response.
    #[error("GitHub API error: {status} - {message}")]
    GitHubApiError { status: u16, message: String },

    /// The token exchange response could not be understood.
    #[error("Invalid token response: {message}")]
    InvalidResponse { message: String },

    /// Network connectivity or transport error.
    #[error("Network error: {0}")]
    NetworkError(String),
}

impl AuthError {
    /// Check if this error represents a transient condition that may succeed if retried.
    ///
    /// The bridge never retries on its own; this is surfaced to callers so
    /// they can decide.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::InvalidCredentials => false,
            Self::InstallationNotFound { .. } => false,
            Self::InvalidPrivateKey { .. } => false,
            Self::JwtGenerationFailed { .. } => false,
            Self::GitHubApiError { status, .. } => *status >= 500 || *status == 429,
            Self::InvalidResponse { .. } => false,
            Self::NetworkError(_) => true,
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::NetworkError(format!("request timed out: {}", error))
        } else {
            Self::NetworkError(error.to_string())
        }
    }
}

/// Errors during GitHub REST API operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP error response from GitHub API.
    #[error("HTTP error: {status} - {message}")]
    HttpError { status: u16, message: String },

    /// Rate limit exceeded (429, or 403 with an exhausted quota).
    #[error("Rate limit exceeded: {message}")]
    RateLimitExceeded { message: String },

    /// Request to GitHub API timed out.
    #[error("Request timeout")]
    Timeout,

    /// GitHub refused the request content (422).
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Authentication to GitHub API failed.
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// Authorization check failed (insufficient permissions).
    #[error("Authorization failed: {message}")]
    AuthorizationFailed { message: String },

    /// The requested resource was not found.
    #[error("Resource not found")]
    NotFound,

    /// App-level authentication failed before the request was sent.
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Failed to parse JSON response from GitHub API.
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// HTTP client error (network, TLS, etc.).
    #[error("HTTP client error: {0}")]
    HttpClientError(reqwest::Error),
}

impl ApiError {
    /// Check if this error represents a transient condition that may succeed if retried.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::HttpError { status, .. } => *status >= 500 || *status == 429,
            Self::RateLimitExceeded { .. } => true,
            Self::Timeout => true,
            Self::InvalidRequest { .. } => false,
            Self::AuthenticationFailed => false,
            Self::AuthorizationFailed { .. } => false,
            Self::NotFound => false,
            Self::Auth(e) => e.is_transient(),
            Self::JsonError(_) => false,
            Self::HttpClientError(_) => true,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::HttpClientError(error)
        }
    }
}

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing.
    #[error("Required field missing: {field}")]
    Required { field: String },

    /// A field has an invalid format.
    #[error("Invalid format for {field}: {message}")]
    InvalidFormat { field: String, message: String },

    /// A webhook signature header is not `sha256=` followed by 64 hex digits.
    #[error("Invalid signature format: {message}")]
    InvalidSignatureFormat { message: String },
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
