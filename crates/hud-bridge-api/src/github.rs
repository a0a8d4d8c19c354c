//! Wiring of the GitHub App credentials and REST client from configuration.

use std::sync::Arc;
use std::time::Duration;

use hud_bridge_github::{
    AuthConfig, ClientConfig, CredentialProvider, GitHubAppAuth, GitHubClient, RS256JwtGenerator,
};
use tracing::info;

use crate::config::ServiceConfig;
use crate::errors::ServiceError;

/// Credential provider and client sharing one app identity.
#[derive(Clone)]
pub struct GitHubBackend {
    pub credentials: Arc<dyn CredentialProvider>,
    pub client: Arc<GitHubClient>,
}

impl GitHubBackend {
    /// Load the private key and build the app's credential provider and client.
    ///
    /// # Errors
    ///
    /// `ServiceError::Configuration` when the app ID or key is missing or
    /// unreadable, `ServiceError::GitHubSetup` when an HTTP client cannot be
    /// built.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ServiceError> {
        let app_id = config.app_id()?;
        let private_key = config.load_private_key()?;
        info!(
            app_id = %app_id,
            key_length = private_key.len(),
            "Loaded GitHub App private key"
        );

        let timeout = Duration::from_secs(config.github.timeout_seconds);
        let auth = GitHubAppAuth::new(
            app_id,
            Arc::new(RS256JwtGenerator::new(private_key)),
            AuthConfig::default()
                .with_github_api_url(&config.github.api_url)
                .with_user_agent(&config.github.user_agent)
                .with_timeout(timeout),
        )
        .map_err(|e| ServiceError::GitHubSetup {
            message: e.to_string(),
        })?;
        let credentials: Arc<dyn CredentialProvider> = Arc::new(auth);

        let client = GitHubClient::builder(credentials.clone())
            .config(
                ClientConfig::default()
                    .with_github_api_url(&config.github.api_url)
                    .with_user_agent(&config.github.user_agent)
                    .with_timeout(timeout),
            )
            .build()
            .map_err(|e| ServiceError::GitHubSetup {
                message: e.to_string(),
            })?;

        Ok(Self {
            credentials,
            client: Arc::new(client),
        })
    }
}
