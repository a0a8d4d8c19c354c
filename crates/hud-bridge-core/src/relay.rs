//! # Issue Relay
//!
//! Turns a create-issue request from Hud into one GitHub issue:
//!
//! 1. validate the request (before any network traffic),
//! 2. obtain a token for the named installation,
//! 3. make a single create-issue call with that token,
//! 4. return the issue number, URL and title.
//!
//! There is no retry and no idempotency key; two identical requests create
//! two issues.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};

use hud_bridge_github::client::is_repository_segment;
use hud_bridge_github::{ApiError, AuthError, CreateIssueRequest, CredentialProvider, IssueApi};

use crate::{parse_installation_id, InstallationId, ValidationError};

/// Labels applied when the caller sends none.
pub const DEFAULT_LABELS: [&str; 2] = ["bug", "hud-detected"];

/// Create-issue body as received from callers.
///
/// Every field is optional here so missing ones can be reported together.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateIssuePayload {
    /// JSON number or numeric string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installation_id: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

impl CreateIssuePayload {
    /// Validate the payload, falling back to `default_labels` when the
    /// caller sent no `labels` field.
    pub fn into_request(self, default_labels: &[String]) -> Result<IssueRequest, ValidationError> {
        fn present(value: &Option<String>) -> bool {
            value.as_deref().is_some_and(|v| !v.trim().is_empty())
        }

        let mut missing = Vec::new();
        if matches!(self.installation_id, None | Some(serde_json::Value::Null)) {
            missing.push("installation_id");
        }
        for (name, value) in [
            ("owner", &self.owner),
            ("repo", &self.repo),
            ("title", &self.title),
            ("body", &self.body),
        ] {
            if !present(value) {
                missing.push(name);
            }
        }
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields {
                fields: missing.into_iter().map(String::from).collect(),
            });
        }

        let installation_id =
            parse_installation_id(&self.installation_id.unwrap_or(serde_json::Value::Null))?;

        let request = IssueRequest::new(
            installation_id,
            self.owner.unwrap_or_default(),
            self.repo.unwrap_or_default(),
            self.title.unwrap_or_default(),
            self.body.unwrap_or_default(),
        )?;

        Ok(match self.labels {
            Some(labels) => request.with_labels(labels),
            None => request.with_labels(default_labels.iter().cloned()),
        })
    }
}

/// Validated request to create one issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRequest {
    installation_id: InstallationId,
    owner: String,
    repo: String,
    title: String,
    body: String,
    labels: Vec<String>,
}

impl IssueRequest {
    /// Create a request without labels.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` when a field is blank or `owner`/`repo`
    /// is not a single path segment.
    pub fn new(
        installation_id: InstallationId,
        owner: impl Into<String>,
        repo: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let owner = repository_segment("owner", owner.into())?;
        let repo = repository_segment("repo", repo.into())?;
        let title = title.into();
        let body = body.into();

        for (field, value) in [("title", &title), ("body", &body)] {
            if value.trim().is_empty() {
                return Err(ValidationError::Required {
                    field: field.to_string(),
                });
            }
        }

        Ok(Self {
            installation_id: InstallationId::try_new(installation_id.as_u64())?,
            owner,
            repo,
            title,
            body,
            labels: Vec::new(),
        })
    }

    /// Replace the labels. Blank labels are dropped and duplicates removed,
    /// keeping first-seen order.
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels.clear();
        for label in labels {
            let label = label.into().trim().to_string();
            if !label.is_empty() && !self.labels.contains(&label) {
                self.labels.push(label);
            }
        }
        self
    }

    pub fn installation_id(&self) -> InstallationId {
        self.installation_id
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// `owner/repo`
    pub fn repository(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

fn repository_segment(field: &str, value: String) -> Result<String, ValidationError> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if !is_repository_segment(value) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            message: "must be a GitHub name of letters, digits, '.', '-' or '_'".to_string(),
        });
    }

    Ok(value.to_string())
}

/// Normalized outcome of a successful relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueResult {
    pub number: u64,
    /// Browser URL of the issue
    pub url: String,
    pub title: String,
}

/// Relay failures.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The request was rejected before any network call.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No installation token could be obtained.
    #[error("Failed to obtain installation token: {0}")]
    Credentials(#[from] AuthError),

    /// GitHub refused or failed the create-issue call.
    #[error("GitHub request failed: {0}")]
    Upstream(#[from] ApiError),
}

impl RelayError {
    /// Human-readable failure description for callers.
    pub fn details(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::Credentials(e) => e.to_string(),
            Self::Upstream(e) => e.to_string(),
        }
    }

    /// Whether the failure came from GitHub or the token exchange.
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Credentials(_) | Self::Upstream(_))
    }

    /// Check if a retry by the caller could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Validation(_) => false,
            Self::Credentials(e) => e.is_transient(),
            Self::Upstream(e) => e.is_transient(),
        }
    }
}

/// Creates GitHub issues on behalf of installations.
#[derive(Clone)]
pub struct IssueRelay {
    credentials: Arc<dyn CredentialProvider>,
    issues: Arc<dyn IssueApi>,
    default_labels: Vec<String>,
}

impl IssueRelay {
    /// Create a relay applying [`DEFAULT_LABELS`] to unlabeled requests.
    pub fn new(credentials: Arc<dyn CredentialProvider>, issues: Arc<dyn IssueApi>) -> Self {
        Self {
            credentials,
            issues,
            default_labels: DEFAULT_LABELS.iter().map(|l| l.to_string()).collect(),
        }
    }

    /// Replace the labels applied to unlabeled requests.
    pub fn with_default_labels(mut self, labels: Vec<String>) -> Self {
        self.default_labels = labels;
        self
    }

    pub fn default_labels(&self) -> &[String] {
        &self.default_labels
    }

    /// Validate a raw payload and create the issue.
    pub async fn relay(&self, payload: CreateIssuePayload) -> Result<IssueResult, RelayError> {
        let request = payload.into_request(&self.default_labels)?;
        self.create_issue(request).await
    }

    /// Create one issue for a validated request.
    #[instrument(
        skip(self, request),
        fields(
            installation_id = %request.installation_id(),
            repository = %request.repository(),
        )
    )]
    pub async fn create_issue(&self, request: IssueRequest) -> Result<IssueResult, RelayError> {
        let token = self
            .credentials
            .installation_token(request.installation_id())
            .await
            .map_err(|e| {
                error!(error = %e, "Installation token exchange failed");
                RelayError::Credentials(e)
            })?;

        let labels = if request.labels().is_empty() {
            None
        } else {
            Some(request.labels().to_vec())
        };

        let issue = self
            .issues
            .create_issue(
                &token,
                request.owner(),
                request.repo(),
                CreateIssueRequest {
                    title: request.title().to_string(),
                    body: Some(request.body().to_string()),
                    labels,
                },
            )
            .await
            .map_err(|e| {
                error!(error = %e, "Error creating issue");
                RelayError::Upstream(e)
            })?;

        info!(
            "Created issue #{} in {}",
            issue.number,
            request.repository()
        );

        Ok(IssueResult {
            number: issue.number,
            url: issue.html_url,
            title: issue.title,
        })
    }
}

#[cfg(test)]
#[path = "relay_tests.rs"]
mod tests;
