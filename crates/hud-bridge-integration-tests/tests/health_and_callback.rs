//! Integration tests for the health check and the installation callback page

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{body_json, body_text, create_test_app_state};
use hud_bridge_api::create_router;
use tower::ServiceExt;

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_endpoint_returns_ok_json() {
    let app = create_router(create_test_app_state());

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("application/json"));

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_health_needs_no_credentials() {
    let app = create_router(create_test_app_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("authorization", "Bearer wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_callback_after_install_shows_installation_id() {
    let app = create_router(create_test_app_state());

    let response = app
        .oneshot(get("/auth/callback?installation_id=12345&setup_action=install"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("Hud Bug Reporter Installed!"));
    assert!(page.contains("Installation ID: 12345"));
}

#[tokio::test]
async fn test_callback_escapes_installation_id() {
    let app = create_router(create_test_app_state());

    let response = app
        .oneshot(get(
            "/auth/callback?installation_id=%3Cscript%3Ealert(1)%3C%2Fscript%3E&setup_action=install",
        ))
        .await
        .unwrap();

    let page = body_text(response).await;
    assert!(!page.contains("<script>"));
    assert!(page.contains("&lt;script&gt;"));
}

#[tokio::test]
async fn test_callback_without_install_action_is_cancelled() {
    let app = create_router(create_test_app_state());

    for uri in [
        "/auth/callback",
        "/auth/callback?installation_id=12345&setup_action=update",
    ] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Installation cancelled"));
    }
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = create_router(create_test_app_state());

    let response = app.oneshot(get("/nope")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
