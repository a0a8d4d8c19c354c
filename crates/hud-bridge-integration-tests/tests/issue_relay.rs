//! Integration tests for `POST /api/create-issue`

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{
    authorized_issue_request, body_json, create_app_state_with, issue_payload, json_request,
    RecordingCredentials, RecordingIssues,
};
use hud_bridge_api::create_router;
use hud_bridge_core::InMemoryInstallationRegistry;
use hud_bridge_github::InstallationId;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

fn fakes() -> (RecordingCredentials, RecordingIssues) {
    (RecordingCredentials::new(), RecordingIssues::new())
}

fn router_over(credentials: &RecordingCredentials, issues: &RecordingIssues) -> axum::Router {
    create_router(create_app_state_with(
        credentials.clone(),
        issues.clone(),
        Arc::new(InMemoryInstallationRegistry::new()),
    ))
}

#[tokio::test]
async fn test_issue_is_created_with_default_labels() {
    let (credentials, issues) = fakes();
    let app = router_over(&credentials, &issues);

    let response = app
        .oneshot(authorized_issue_request(&issue_payload()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["issue"]["number"], 1);
    assert_eq!(body["issue"]["url"], "https://github.com/acme/web/issues/1");
    assert_eq!(body["issue"]["title"], "Null pointer in checkout");

    assert_eq!(credentials.requested(), vec![InstallationId::new(42)]);
    let calls = issues.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].token, "ghs_42");
    assert_eq!(calls[0].owner, "acme");
    assert_eq!(calls[0].repo, "web");
    assert_eq!(
        calls[0].request.labels,
        Some(vec!["bug".to_string(), "hud-detected".to_string()])
    );
}

#[tokio::test]
async fn test_caller_labels_replace_defaults() {
    let (credentials, issues) = fakes();
    let app = router_over(&credentials, &issues);

    let mut payload = issue_payload();
    payload["labels"] = json!(["bug", "hud-detected", "high-priority"]);
    payload["installation_id"] = json!("42");

    let response = app.oneshot(authorized_issue_request(&payload)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        issues.calls()[0].request.labels,
        Some(vec![
            "bug".to_string(),
            "hud-detected".to_string(),
            "high-priority".to_string()
        ])
    );
}

#[tokio::test]
async fn test_missing_bearer_token_never_reaches_github() {
    let (credentials, issues) = fakes();
    let app = router_over(&credentials, &issues);

    let response = app
        .oneshot(json_request("POST", "/api/create-issue", &issue_payload()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Unauthorized");
    assert!(body.get("details").is_none());
    assert!(credentials.requested().is_empty());
    assert!(issues.calls().is_empty());
}

#[tokio::test]
async fn test_wrong_scheme_is_unauthorized() {
    let (credentials, issues) = fakes();
    let app = router_over(&credentials, &issues);

    let request = Request::builder()
        .method("POST")
        .uri("/api/create-issue")
        .header("authorization", format!("Basic {}", common::API_SECRET))
        .body(Body::from(issue_payload().to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(issues.calls().is_empty());
}

#[tokio::test]
async fn test_unauthorized_wins_over_malformed_body() {
    let (credentials, issues) = fakes();
    let app = router_over(&credentials, &issues);

    let request = Request::builder()
        .method("POST")
        .uri("/api/create-issue")
        .header("authorization", "Bearer nope")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_fields_are_listed() {
    let (credentials, issues) = fakes();
    let app = router_over(&credentials, &issues);

    let response = app
        .oneshot(authorized_issue_request(&json!({
            "installation_id": 42,
            "owner": "acme",
            "repo": "web"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Missing required fields: title, body");
    assert_eq!(body["status"], 400);
    assert!(credentials.requested().is_empty());
}

#[tokio::test]
async fn test_non_numeric_installation_id_is_rejected() {
    let (credentials, issues) = fakes();
    let app = router_over(&credentials, &issues);

    let mut payload = issue_payload();
    payload["installation_id"] = json!("forty-two");

    let response = app.oneshot(authorized_issue_request(&payload)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid installation_id. Must be a number.");
    assert!(issues.calls().is_empty());
}

#[tokio::test]
async fn test_unknown_installation_is_server_error_with_details() {
    let credentials = RecordingCredentials::new().without_installation(InstallationId::new(42));
    let issues = RecordingIssues::new();
    let app = router_over(&credentials, &issues);

    let response = app
        .oneshot(authorized_issue_request(&issue_payload()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Failed to create issue");
    assert!(body["details"]
        .as_str()
        .unwrap()
        .contains("Installation 42 not found"));
    assert!(issues.calls().is_empty());
}

#[tokio::test]
async fn test_each_request_is_relayed_independently() {
    let (credentials, issues) = fakes();
    let app = router_over(&credentials, &issues);

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(authorized_issue_request(&issue_payload()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(issues.calls().len(), 2);
}
