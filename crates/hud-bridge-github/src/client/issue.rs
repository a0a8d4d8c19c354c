//! Issue creation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{error_from_response, GitHubClient};
use crate::auth::InstallationToken;
use crate::error::ApiError;
use crate::{GITHUB_ACCEPT, GITHUB_API_VERSION};

/// GitHub issue, trimmed to the fields the bridge reads.
///
/// Only `number`, `title` and `html_url` are required. The issue already
/// exists once GitHub answers, so the rest must never fail the parse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Issue {
    #[serde(default)]
    pub id: Option<u64>,

    /// Issue number (repository-specific)
    pub number: u64,

    pub title: String,

    #[serde(default)]
    pub body: Option<String>,

    /// "open" or "closed"
    #[serde(default)]
    pub state: Option<String>,

    /// Browser URL of the issue
    pub html_url: String,

    #[serde(default)]
    pub user: Option<IssueUser>,

    #[serde(default)]
    pub labels: Vec<Label>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Author of an issue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IssueUser {
    pub login: String,

    pub id: u64,

    #[serde(rename = "type")]
    pub user_type: String,
}

/// Label attached to an issue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Label {
    pub name: String,

    #[serde(default)]
    pub color: Option<String>,
}

/// Request to create an issue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateIssueRequest {
    /// Issue title (required)
    pub title: String,

    /// Issue body content (Markdown)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    /// Labels to apply; GitHub creates missing labels on the fly
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

/// Installation-scoped issue operations.
///
/// The caller passes the installation token explicitly: one token, one call.
/// Whether `value` can be used as the owner or repository part of a
/// `/repos/{owner}/{repo}` path.
///
/// GitHub names use ASCII letters, digits, `.`, `-` and `_`; `.` and `..`
/// are path navigation and never names.
///
/// ```
/// use hud_bridge_github::client::is_repository_segment;
///
/// assert!(is_repository_segment("hud.io-web_2"));
/// assert!(!is_repository_segment(".."));
/// assert!(!is_repository_segment("repo?x"));
/// ```
pub fn is_repository_segment(value: &str) -> bool {
    !value.is_empty()
        && value != "."
        && value != ".."
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}

#[async_trait]
pub trait IssueApi: Send + Sync {
    /// Create an issue in `owner/repo` (`POST /repos/{owner}/{repo}/issues`).
    async fn create_issue(
        &self,
        token: &InstallationToken,
        owner: &str,
        repo: &str,
        request: CreateIssueRequest,
    ) -> Result<Issue, ApiError>;
}

#[async_trait]
impl IssueApi for GitHubClient {
    #[instrument(skip(self, token, request), fields(installation_id = %token.installation_id()))]
    async fn create_issue(
        &self,
        token: &InstallationToken,
        owner: &str,
        repo: &str,
        request: CreateIssueRequest,
    ) -> Result<Issue, ApiError> {
        for segment in [owner, repo] {
            if !is_repository_segment(segment) {
                return Err(ApiError::InvalidRequest {
                    message: format!("'{}' is not a valid owner or repository name", segment),
                });
            }
        }

        let url = self.api_url(&format!("/repos/{}/{}/issues", owner, repo));

        let response = self
            .http_client()
            .post(&url)
            .header("Authorization", format!("Bearer {}", token.token()))
            .header("Accept", GITHUB_ACCEPT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body = response.bytes().await?;
        let issue: Issue = serde_json::from_slice(&body)?;

        debug!(number = issue.number, "Issue created");
        Ok(issue)
    }
}

#[cfg(test)]
#[path = "issue_tests.rs"]
mod tests;
