//! # Hud Bridge Service
//!
//! Binary entry point for the Hud bridge HTTP service.
//!
//! This executable:
//! - Loads configuration from `.env`, files and environment
//! - Initializes logging
//! - Builds the GitHub App credentials, issue relay and registry
//! - Starts the HTTP server from hud-bridge-api

use hud_bridge_api::{
    config::LoggingConfig, start_server, AppState, GitHubBackend, ServiceConfig, ServiceError,
};
use hud_bridge_core::InMemoryInstallationRegistry;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is normal outside development
    let dotenv = dotenvy::dotenv();

    // -------------------------------------------------------------------------
    // Load configuration
    //
    // Sources (later override earlier):
    //  1. /etc/hud-bridge/service.yaml
    //  2. ./config/service.yaml
    //  3. the file named by HUD_CONFIG_FILE
    //  4. HUD__SECTION__KEY variables
    //  5. GITHUB_APP_ID, GITHUB_PRIVATE_KEY_PATH, GITHUB_PRIVATE_KEY,
    //     GITHUB_WEBHOOK_SECRET, API_SECRET, PORT, GITHUB_API_URL
    // -------------------------------------------------------------------------
    let service_config = match ServiceConfig::load() {
        Ok(config) => config,
        Err(e) => {
            init_logging(&LoggingConfig::default());
            error!(error = %e, "Failed to load configuration; aborting");
            std::process::exit(3);
        }
    };

    init_logging(&service_config.logging);
    info!("Starting Hud bridge service");
    if let Ok(path) = dotenv {
        info!(path = %path.display(), "Loaded environment from .env file");
    }

    if let Err(e) = service_config.validate() {
        error!(error = %e, "Service configuration is invalid; aborting");
        std::process::exit(3);
    }

    let backend = match GitHubBackend::from_config(&service_config) {
        Ok(backend) => backend,
        Err(e) => {
            error!(error = %e, "Failed to set up GitHub App credentials");
            std::process::exit(exit_code(&e));
        }
    };

    let install_url = match backend.client.get_app().await {
        Ok(app) => {
            info!(app = %app.name, slug = %app.slug, "Authenticated as GitHub App");
            Some(app.install_url())
        }
        Err(e) => {
            warn!(error = %e, "Could not fetch app metadata; install URL unknown");
            None
        }
    };

    for line in startup_banner(&service_config, install_url.as_deref()) {
        info!("{}", line);
    }

    let state = match AppState::from_config(
        service_config,
        backend.credentials.clone(),
        backend.client.clone(),
        Arc::new(InMemoryInstallationRegistry::new()),
    ) {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "Service configuration is incomplete; aborting");
            std::process::exit(3);
        }
    };

    if let Err(e) = start_server(state).await {
        error!("Failed to start server: {}", e);
        std::process::exit(exit_code(&e));
    }

    Ok(())
}

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=debug", logging.level)));

    let json = logging.json_format;
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();
}

fn startup_banner(config: &ServiceConfig, install_url: Option<&str>) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Hud GitHub bridge listening on {}:{}",
            config.server.host, config.server.port
        ),
        format!(
            "Webhook URL: http://{}:{}/webhook",
            config.server.host, config.server.port
        ),
    ];

    if let Some(url) = install_url {
        lines.push(format!("Install URL: {}", url));
    }

    lines
}

fn exit_code(error: &ServiceError) -> i32 {
    match error {
        ServiceError::BindFailed { .. } => 1,
        ServiceError::ServerFailed { .. } => 2,
        ServiceError::Configuration(_) => 3,
        ServiceError::GitHubSetup { .. } => 4,
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
