//! GitHub REST client.
//!
//! App-level calls (app metadata, installation listing) authenticate with a
//! JWT from the [`CredentialProvider`]. Installation-level calls take an
//! [`InstallationToken`](crate::auth::InstallationToken) from the caller, so
//! the caller decides when a token is minted.

mod app;
mod issue;

use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::auth::CredentialProvider;
use crate::error::ApiError;
use crate::{DEFAULT_GITHUB_API_URL, GITHUB_ACCEPT, GITHUB_API_VERSION};

pub use app::{Account, App, Installation};
pub use issue::{is_repository_segment, CreateIssueRequest, Issue, IssueApi, IssueUser, Label};

/// Configuration for GitHub API client behavior.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// User agent string for API requests
    pub user_agent: String,

    /// Request timeout
    pub timeout: Duration,

    /// GitHub API base URL
    pub github_api_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("hud-bridge/{}", env!("CARGO_PKG_VERSION")),
            timeout: Duration::from_secs(30),
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
        }
    }
}

impl ClientConfig {
    /// Set the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the GitHub API base URL (GitHub Enterprise or a test stub).
    pub fn with_github_api_url(mut self, url: impl Into<String>) -> Self {
        self.github_api_url = url.into();
        self
    }
}

/// GitHub API client.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone)]
pub struct GitHubClient {
    credentials: Arc<dyn CredentialProvider>,
    http_client: reqwest::Client,
    config: ClientConfig,
}

impl GitHubClient {
    /// Start building a client that authenticates app-level calls with `credentials`.
    pub fn builder(credentials: Arc<dyn CredentialProvider>) -> GitHubClientBuilder {
        GitHubClientBuilder {
            credentials,
            config: ClientConfig::default(),
        }
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the credential provider.
    pub fn credentials(&self) -> &dyn CredentialProvider {
        self.credentials.as_ref()
    }

    pub(crate) fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }

    pub(crate) fn api_url(&self, path: &str) -> String {
        format!(
            "{}{}",
            self.config.github_api_url.trim_end_matches('/'),
            path
        )
    }

    // ========================================================================
    // App-Level Operations (authenticated with JWT)
    // ========================================================================

    /// Get metadata for the authenticated app (`GET /app`).
    #[instrument(skip(self))]
    pub async fn get_app(&self) -> Result<App, ApiError> {
        self.get_as_app("/app").await
    }

    /// List every installation of the authenticated app (`GET /app/installations`).
    #[instrument(skip(self))]
    pub async fn list_installations(&self) -> Result<Vec<Installation>, ApiError> {
        let installations: Vec<Installation> = self.get_as_app("/app/installations").await?;
        debug!(count = installations.len(), "Listed app installations");
        Ok(installations)
    }

    async fn get_as_app<T>(&self, path: &str) -> Result<T, ApiError>
    where
        T: serde::de::DeserializeOwned,
    {
        let jwt = self.credentials.app_token().await?;

        let response = self
            .http_client
            .get(self.api_url(path))
            .header("Authorization", format!("Bearer {}", jwt.token()))
            .header("Accept", GITHUB_ACCEPT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Builder for [`GitHubClient`].
pub struct GitHubClientBuilder {
    credentials: Arc<dyn CredentialProvider>,
    config: ClientConfig,
}

impl GitHubClientBuilder {
    /// Use the given configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::HttpClientError` if the HTTP client cannot be built.
    pub fn build(self) -> Result<GitHubClient, ApiError> {
        let http_client = reqwest::Client::builder()
            .user_agent(&self.config.user_agent)
            .timeout(self.config.timeout)
            .build()
            .map_err(ApiError::HttpClientError)?;

        Ok(GitHubClient {
            credentials: self.credentials,
            http_client,
            config: self.config,
        })
    }
}

/// Error body GitHub returns for failed requests.
#[derive(Debug, Deserialize)]
struct GitHubErrorBody {
    message: String,
    #[serde(default)]
    errors: Vec<serde_json::Value>,
}

/// Translate a non-success response into an [`ApiError`].
pub(crate) async fn error_from_response(response: reqwest::Response) -> ApiError {
    let status = response.status().as_u16();
    let quota_exhausted = response
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "0");

    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error body".to_string());
    let message = describe_error_body(&text);

    match status {
        401 => ApiError::AuthenticationFailed,
        403 if quota_exhausted => ApiError::RateLimitExceeded { message },
        403 => ApiError::AuthorizationFailed { message },
        404 => ApiError::NotFound,
        422 => ApiError::InvalidRequest { message },
        429 => ApiError::RateLimitExceeded { message },
        _ => ApiError::HttpError { status, message },
    }
}

fn describe_error_body(text: &str) -> String {
    match serde_json::from_str::<GitHubErrorBody>(text) {
        Ok(body) if body.errors.is_empty() => body.message,
        Ok(body) => {
            let details: Vec<String> = body.errors.iter().map(describe_error_detail).collect();
            format!("{} ({})", body.message, details.join("; "))
        }
        Err(_) => text.to_string(),
    }
}

fn describe_error_detail(detail: &serde_json::Value) -> String {
    if let Some(message) = detail.get("message").and_then(|m| m.as_str()) {
        return message.to_string();
    }
    match (
        detail.get("field").and_then(|f| f.as_str()),
        detail.get("code").and_then(|c| c.as_str()),
    ) {
        (Some(field), Some(code)) => format!("{}: {}", field, code),
        _ => detail.to_string(),
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
