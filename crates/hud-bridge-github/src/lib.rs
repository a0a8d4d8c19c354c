//! GitHub App plumbing for the Hud bridge.
//!
//! This crate knows how to talk to GitHub as a GitHub App:
//!
//! - [`auth`]: app and installation identifiers, private keys, RS256 JWT
//!   signing and the [`auth::CredentialProvider`] that exchanges an app JWT
//!   for an installation access token.
//! - [`client`]: a thin REST client for the handful of endpoints the bridge
//!   uses (app metadata, installation listing, issue creation).
//! - [`webhook`]: HMAC-SHA256 signature validation for webhook deliveries.
//! - [`error`]: the error taxonomy shared by all of the above.

pub mod auth;
pub mod client;
pub mod error;
pub mod webhook;

pub use auth::{
    AuthConfig, CredentialProvider, GitHubAppAuth, GitHubAppId, InstallationId,
    InstallationToken, JsonWebToken, PrivateKey, RS256JwtGenerator,
};
pub use client::{App, ClientConfig, CreateIssueRequest, GitHubClient, Installation, Issue, IssueApi};
pub use error::{ApiError, AuthError, ValidationError};
pub use webhook::SignatureValidator;

/// Media type GitHub recommends for REST API v3 requests.
pub const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// REST API version pinned on every outbound request.
pub const GITHUB_API_VERSION: &str = "2022-11-28";

/// Public GitHub REST endpoint.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
