//! # Hud Bridge HTTP Service
//!
//! HTTP boundary of the bridge between Hud and GitHub.
//!
//! This service provides:
//! - the issue relay endpoint Hud calls, guarded by a bearer token
//! - the GitHub webhook endpoint with signature verification
//! - the post-installation redirect page
//! - customer-to-installation registration
//! - a health check endpoint

pub mod config;
pub mod errors;
pub mod github;
pub mod responses;

pub use config::{ServiceConfig, Secret};
pub use errors::{ApiHandlerError, ConfigError, ServiceError};
pub use github::GitHubBackend;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware,
    response::{Html, Json, Response},
    routing::{get, post},
    Router,
};
use hud_bridge_core::{
    ApiKeyAuthenticator, CreateIssuePayload, CustomerId, CustomerRecord, InstallationRegistry,
    IssueRelay, RegisterCustomerPayload, WebhookVerifier,
};
use hud_bridge_github::{CredentialProvider, IssueApi};
use responses::{
    CallbackParams, CreateIssueResponse, HealthResponse, RegisterCustomerResponse, WebhookResponse,
};
use std::{any::Any, collections::HashMap, future::IntoFuture, sync::Arc};
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{debug, error, info, instrument, warn};

/// Header carrying the per-request correlation ID.
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

// ============================================================================
// Application State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration for the service
    pub config: Arc<ServiceConfig>,

    /// Issue relay for `/api/create-issue`
    pub relay: Arc<IssueRelay>,

    /// Customer to installation mapping
    pub registry: Arc<dyn InstallationRegistry>,

    /// Webhook signature verification
    pub webhook_verifier: Arc<WebhookVerifier>,

    /// Bearer-token check for the relay
    pub authenticator: Arc<ApiKeyAuthenticator>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        config: Arc<ServiceConfig>,
        relay: Arc<IssueRelay>,
        registry: Arc<dyn InstallationRegistry>,
        webhook_verifier: Arc<WebhookVerifier>,
        authenticator: Arc<ApiKeyAuthenticator>,
    ) -> Self {
        Self {
            config,
            relay,
            registry,
            webhook_verifier,
            authenticator,
        }
    }

    /// Assemble the state from configuration and the GitHub-facing dependencies.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` when the webhook or API secret is absent.
    pub fn from_config(
        config: ServiceConfig,
        credentials: Arc<dyn CredentialProvider>,
        issues: Arc<dyn IssueApi>,
        registry: Arc<dyn InstallationRegistry>,
    ) -> Result<Self, ConfigError> {
        let webhook_secret = config
            .github
            .webhook_secret
            .as_ref()
            .filter(|s| !s.is_blank())
            .ok_or_else(|| ConfigError::Missing {
                key: "github.webhook_secret".to_string(),
            })?;
        let api_secret = config
            .security
            .api_secret
            .as_ref()
            .filter(|s| !s.is_blank())
            .ok_or_else(|| ConfigError::Missing {
                key: "security.api_secret".to_string(),
            })?;

        let webhook_verifier = Arc::new(WebhookVerifier::new(webhook_secret.expose()));
        let authenticator = Arc::new(ApiKeyAuthenticator::new(api_secret.expose()));
        let relay = Arc::new(
            IssueRelay::new(credentials, issues)
                .with_default_labels(config.issues.default_labels.clone()),
        );

        Ok(Self::new(
            Arc::new(config),
            relay,
            registry,
            webhook_verifier,
            authenticator,
        ))
    }
}

// ============================================================================
// HTTP Server
// ============================================================================

/// Create HTTP router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let max_body_size = state.config.server.max_body_size;

    let public_routes = Router::new()
        .route("/health", get(handle_health_check))
        .route("/auth/callback", get(handle_install_callback))
        .route("/webhook", post(handle_webhook));

    let api_routes = Router::new()
        .route("/api/create-issue", post(handle_create_issue))
        .route("/api/customers", post(handle_register_customer))
        .route("/api/customers/{customer_id}", get(handle_get_customer));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(request_logging_middleware))
                .layer(CatchPanicLayer::custom(handle_panic))
                .layer(DefaultBodyLimit::max(max_body_size))
                .into_inner(),
        )
        .with_state(state)
}

/// Start HTTP server
///
/// Runs until SIGINT or SIGTERM. In-flight requests then get
/// `server.shutdown_timeout_seconds` to finish before the server returns.
pub async fn start_server(state: AppState) -> Result<(), ServiceError> {
    let host = state.config.server.host.clone();
    let port = state.config.server.port;
    let shutdown_timeout =
        std::time::Duration::from_secs(state.config.server.shutdown_timeout_seconds);
    let app = create_router(state);

    let address = format!("{}:{}", host, port);
    let listener =
        tokio::net::TcpListener::bind((host.as_str(), port))
            .await
            .map_err(|e| ServiceError::BindFailed {
                address: address.clone(),
                message: e.to_string(),
            })?;

    info!("Starting HTTP server on {}", address);

    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!(
                "Initiating graceful shutdown with {}s timeout",
                shutdown_timeout.as_secs()
            );
            let _ = shutdown_tx.send(true);
        })
        .into_future();

    let drain_deadline = async move {
        if shutdown_rx.wait_for(|requested| *requested).await.is_err() {
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(shutdown_timeout).await;
    };

    tokio::select! {
        result = server => result.map_err(|e| ServiceError::ServerFailed {
            message: e.to_string(),
        })?,
        _ = drain_deadline => {
            warn!(
                timeout_seconds = shutdown_timeout.as_secs(),
                "Graceful shutdown timed out; abandoning in-flight requests"
            );
        }
    }

    info!("HTTP server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT (Ctrl+C)"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Basic health check endpoint
async fn handle_health_check() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// Landing page for GitHub's post-installation redirect
///
/// The installation ID is displayed as given; nothing checks that it
/// belongs to the visitor.
#[instrument(skip(params))]
async fn handle_install_callback(Query(params): Query<CallbackParams>) -> Html<String> {
    match params.setup_action.as_deref() {
        Some("install") => {
            let installation_id = params.installation_id.unwrap_or_default();
            info!(installation_id = %installation_id, "New installation");
            Html(responses::installed_page(&installation_id))
        }
        other => {
            info!(setup_action = ?other, "Installation not completed");
            Html(responses::cancelled_page().to_string())
        }
    }
}

/// Handle GitHub webhook deliveries
#[instrument(skip(state, headers, body), fields(delivery_id, event_type))]
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ApiHandlerError> {
    let header_map: HashMap<String, String> = headers
        .iter()
        .map(|(k, v)| {
            (
                k.as_str().to_lowercase(),
                v.to_str().unwrap_or("").to_string(),
            )
        })
        .collect();

    let event = state.webhook_verifier.verify(&header_map, &body)?;

    let span = tracing::Span::current();
    span.record("delivery_id", event.delivery_id.as_str());
    span.record("event_type", event.event_type.as_str());

    if event.is_installation_lifecycle() {
        info!(
            action = ?event.action,
            installation_id = ?event.installation_id,
            "Installation {}",
            event.action.as_deref().unwrap_or_default()
        );
    } else {
        debug!(
            action = ?event.action,
            repository = ?event.repository,
            "Webhook accepted"
        );
    }

    Ok(Json(WebhookResponse {
        status: "ok".to_string(),
        delivery_id: event.delivery_id,
        event: event.event_type,
    }))
}

/// Relay an issue from Hud to GitHub
///
/// The bearer token is checked before the body is looked at, so a caller
/// without credentials never reaches the relay.
#[instrument(skip(state, headers, body))]
pub async fn handle_create_issue(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CreateIssueResponse>, ApiHandlerError> {
    let authorization = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    state.authenticator.authenticate(authorization)?;

    let payload: CreateIssuePayload = parse_json(&body)?;
    let issue = state.relay.relay(payload).await?;

    Ok(Json(CreateIssueResponse {
        success: true,
        issue,
    }))
}

/// Register or replace a customer's installation
#[instrument(skip(state, body))]
async fn handle_register_customer(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<RegisterCustomerResponse>, ApiHandlerError> {
    let payload: RegisterCustomerPayload = parse_json(&body)?;
    let registration = payload.validate()?;

    let record = state
        .registry
        .register(
            registration.customer_id,
            registration.installation_id,
            registration.repos,
        )
        .await?;

    let customers = state.registry.count().await?;
    info!(
        customer_id = %record.customer_id,
        installation_id = %record.installation_id,
        customers,
        "Customer registered"
    );

    Ok(Json(RegisterCustomerResponse {
        success: true,
        customer_id: record.customer_id,
    }))
}

/// Look up a customer's installation
#[instrument(skip(state))]
async fn handle_get_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> Result<Json<CustomerRecord>, ApiHandlerError> {
    let customer_id = CustomerId::new(customer_id)?;
    let record = state.registry.lookup(&customer_id).await?;
    Ok(Json(record))
}

fn parse_json<T>(body: &[u8]) -> Result<T, ApiHandlerError>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_slice(body).map_err(|e| ApiHandlerError::MalformedBody {
        message: e.to_string(),
    })
}

// ============================================================================
// Middleware
// ============================================================================

/// Correlation ID assigned to a request, available as a request extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationId(pub String);

/// Request logging middleware
///
/// - Logs request start and completion with structured fields
/// - Propagates the correlation ID, or generates one, into the response
#[instrument(skip(request, next), fields(
    method = %request.method(),
    uri = %request.uri(),
    correlation_id
))]
async fn request_logging_middleware(
    mut request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let correlation_id = request
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    tracing::Span::current().record("correlation_id", correlation_id.as_str());
    request
        .extensions_mut()
        .insert(CorrelationId(correlation_id.clone()));

    info!(
        correlation_id = %correlation_id,
        method = %method,
        uri = %uri,
        "Request started"
    );

    let mut response = next.run(request).await;
    let duration = start.elapsed();

    if let Ok(header_value) = correlation_id.parse() {
        response
            .headers_mut()
            .insert(CORRELATION_ID_HEADER, header_value);
    }

    let status = response.status();

    if status.is_server_error() {
        error!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed with server error"
        );
    } else if status.is_client_error() {
        warn!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed with client error"
        );
    } else {
        info!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed successfully"
        );
    }

    response
}

/// Turn a handler panic into a 500 response.
fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    error!(panic = %message, "Handler panicked");

    errors::error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error occurred. Please try again later.".to_string(),
        None,
    )
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
