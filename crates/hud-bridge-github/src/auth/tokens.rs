//! GitHub App credential provider.
//!
//! Signs app JWTs and exchanges them for installation access tokens at
//! `POST /app/installations/{id}/access_tokens`. Nothing is cached: every
//! call performs a fresh exchange.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::{
    CredentialProvider, GitHubAppId, InstallationId, InstallationToken, JsonWebToken,
    JwtGenerator,
};
use crate::error::AuthError;
use crate::{DEFAULT_GITHUB_API_URL, GITHUB_ACCEPT, GITHUB_API_VERSION};

/// Configuration for the token exchange.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// GitHub API endpoint (for GitHub Enterprise support or test stubs)
    pub github_api_url: String,

    /// User agent for GitHub API requests
    pub user_agent: String,

    /// Timeout for the token exchange request
    pub timeout: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            user_agent: format!("hud-bridge/{}", env!("CARGO_PKG_VERSION")),
            timeout: Duration::from_secs(30),
        }
    }
}

impl AuthConfig {
    /// Set the GitHub API base URL.
    pub fn with_github_api_url(mut self, url: impl Into<String>) -> Self {
        self.github_api_url = url.into();
        self
    }

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
}

/// Body of a successful access token exchange.
#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Credential provider backed by the GitHub App's private key.
pub struct GitHubAppAuth {
    app_id: GitHubAppId,
    jwt_generator: Arc<dyn JwtGenerator>,
    http_client: reqwest::Client,
    config: AuthConfig,
}

impl GitHubAppAuth {
    /// Create a new credential provider.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NetworkError` if the HTTP client cannot be built.
    pub fn new(
        app_id: GitHubAppId,
        jwt_generator: Arc<dyn JwtGenerator>,
        config: AuthConfig,
    ) -> Result<Self, AuthError> {
        let http_client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .build()
            .map_err(|e| AuthError::NetworkError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            app_id,
            jwt_generator,
            http_client,
            config,
        })
    }

    /// Get configuration.
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    fn access_tokens_url(&self, installation_id: InstallationId) -> String {
        format!(
            "{}/app/installations/{}/access_tokens",
            self.config.github_api_url.trim_end_matches('/'),
            installation_id
        )
    }
}

#[async_trait]
impl CredentialProvider for GitHubAppAuth {
    fn app_id(&self) -> GitHubAppId {
        self.app_id
    }

    async fn app_token(&self) -> Result<JsonWebToken, AuthError> {
        self.jwt_generator.generate_jwt(self.app_id).await
    }

    #[instrument(skip(self), fields(app_id = %self.app_id))]
    async fn installation_token(
        &self,
        installation_id: InstallationId,
    ) -> Result<InstallationToken, AuthError> {
        let jwt = self.app_token().await?;

        let response = self
            .http_client
            .post(self.access_tokens_url(installation_id))
            .header("Authorization", format!("Bearer {}", jwt.token()))
            .header("Accept", GITHUB_ACCEPT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            warn!(
                installation_id = %installation_id,
                status = status.as_u16(),
                "Installation token exchange rejected"
            );

            return Err(match status.as_u16() {
                404 => AuthError::InstallationNotFound { installation_id },
                401 | 403 => AuthError::InvalidCredentials,
                code => AuthError::GitHubApiError {
                    status: code,
                    message,
                },
            });
        }

        let body: AccessTokenResponse =
            response
                .json()
                .await
                .map_err(|e| AuthError::InvalidResponse {
                    message: e.to_string(),
                })?;

        debug!(
            installation_id = %installation_id,
            expires_at = %body.expires_at,
            "Installation token issued"
        );

        Ok(InstallationToken::new(
            body.token,
            installation_id,
            body.expires_at,
        ))
    }
}

#[cfg(test)]
#[path = "tokens_tests.rs"]
mod tests;
