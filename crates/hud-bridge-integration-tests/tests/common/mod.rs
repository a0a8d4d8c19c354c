//! Common test utilities for hud-bridge-api integration tests
//!
//! This module provides:
//! - Recording implementations of the GitHub-facing traits
//! - A registry that panics, for exercising panic isolation
//! - Helpers for building app state, requests and signed webhooks

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use chrono::Utc;
use hud_bridge_api::{AppState, Secret, ServiceConfig};
use hud_bridge_core::{
    CustomerId, CustomerRecord, InMemoryInstallationRegistry, InstallationRegistry, RegistryError,
};
use hud_bridge_github::{
    webhook::compute_signature, ApiError, AuthError, CreateIssueRequest, CredentialProvider,
    GitHubAppId, InstallationId, InstallationToken, Issue, IssueApi, JsonWebToken,
};
use std::sync::{Arc, Mutex};

pub const API_SECRET: &str = "integration-api-secret";
pub const WEBHOOK_SECRET: &str = "integration-webhook-secret";

// ============================================================================
// Recording Credential Provider
// ============================================================================

/// Hands out tokens for every installation and records who asked.
#[derive(Clone, Default)]
pub struct RecordingCredentials {
    requested: Arc<Mutex<Vec<InstallationId>>>,
    missing: Arc<Mutex<Vec<InstallationId>>>,
}

impl RecordingCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make token requests for `installation_id` fail as unknown.
    pub fn without_installation(self, installation_id: InstallationId) -> Self {
        self.missing.lock().unwrap().push(installation_id);
        self
    }

    pub fn requested(&self) -> Vec<InstallationId> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl CredentialProvider for RecordingCredentials {
    fn app_id(&self) -> GitHubAppId {
        GitHubAppId::new(1001)
    }

    async fn app_token(&self) -> Result<JsonWebToken, AuthError> {
        let now = Utc::now();
        Ok(JsonWebToken::new(
            "app.jwt".to_string(),
            self.app_id(),
            now,
            now + chrono::Duration::minutes(9),
        ))
    }

    async fn installation_token(
        &self,
        installation_id: InstallationId,
    ) -> Result<InstallationToken, AuthError> {
        self.requested.lock().unwrap().push(installation_id);

        if self.missing.lock().unwrap().contains(&installation_id) {
            return Err(AuthError::InstallationNotFound { installation_id });
        }

        Ok(InstallationToken::new(
            format!("ghs_{}", installation_id),
            installation_id,
            Utc::now() + chrono::Duration::hours(1),
        ))
    }
}

// ============================================================================
// Recording Issue API
// ============================================================================

/// One create-issue call as seen by the fake GitHub.
#[derive(Debug, Clone)]
pub struct RecordedIssue {
    pub token: String,
    pub owner: String,
    pub repo: String,
    pub request: CreateIssueRequest,
}

/// Accepts every issue, numbering them from 1.
#[derive(Clone, Default)]
pub struct RecordingIssues {
    calls: Arc<Mutex<Vec<RecordedIssue>>>,
}

impl RecordingIssues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<RecordedIssue> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl IssueApi for RecordingIssues {
    async fn create_issue(
        &self,
        token: &InstallationToken,
        owner: &str,
        repo: &str,
        request: CreateIssueRequest,
    ) -> Result<Issue, ApiError> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(RecordedIssue {
            token: token.token().to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            request: request.clone(),
        });
        let number = calls.len() as u64;

        let issue = serde_json::json!({
            "id": 9000 + number,
            "number": number,
            "title": request.title,
            "body": request.body,
            "state": "open",
            "html_url": format!("https://github.com/{}/{}/issues/{}", owner, repo, number),
            "user": null,
            "labels": [],
            "created_at": Utc::now().to_rfc3339(),
        });
        Ok(serde_json::from_value(issue)?)
    }
}

// ============================================================================
// Panicking Registry
// ============================================================================

/// Registry whose every operation panics.
pub struct PanickingRegistry;

#[async_trait]
impl InstallationRegistry for PanickingRegistry {
    async fn register(
        &self,
        _customer_id: CustomerId,
        _installation_id: InstallationId,
        _repos: Vec<String>,
    ) -> Result<CustomerRecord, RegistryError> {
        panic!("registry exploded");
    }

    async fn lookup(&self, _customer_id: &CustomerId) -> Result<CustomerRecord, RegistryError> {
        panic!("registry exploded");
    }

    async fn count(&self) -> Result<usize, RegistryError> {
        panic!("registry exploded");
    }
}

// ============================================================================
// Builders
// ============================================================================

pub fn test_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.github.app_id = Some(1001);
    config.github.webhook_secret = Some(Secret::new(WEBHOOK_SECRET));
    config.security.api_secret = Some(Secret::new(API_SECRET));
    config.server.max_body_size = 16 * 1024;
    config
}

/// App state over recording fakes and an empty in-memory registry.
pub fn create_test_app_state() -> AppState {
    create_app_state_with(
        RecordingCredentials::new(),
        RecordingIssues::new(),
        Arc::new(InMemoryInstallationRegistry::new()),
    )
}

pub fn create_app_state_with(
    credentials: RecordingCredentials,
    issues: RecordingIssues,
    registry: Arc<dyn InstallationRegistry>,
) -> AppState {
    AppState::from_config(
        test_config(),
        Arc::new(credentials),
        Arc::new(issues),
        registry,
    )
    .unwrap()
}

// ============================================================================
// Request Helpers
// ============================================================================

pub fn json_request(method: &str, uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn authorized_issue_request(body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/create-issue")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", API_SECRET))
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Webhook delivery signed with [`WEBHOOK_SECRET`].
pub fn signed_webhook(event: &str, delivery_id: &str, payload: &[u8]) -> Request<Body> {
    let signature = compute_signature(WEBHOOK_SECRET, payload).unwrap();

    Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json")
        .header("X-GitHub-Event", event)
        .header("X-GitHub-Delivery", delivery_id)
        .header("X-Hub-Signature-256", signature)
        .body(Body::from(payload.to_vec()))
        .unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn issue_payload() -> serde_json::Value {
    serde_json::json!({
        "installation_id": 42,
        "owner": "acme",
        "repo": "web",
        "title": "Null pointer in checkout",
        "body": "Stack trace attached"
    })
}
