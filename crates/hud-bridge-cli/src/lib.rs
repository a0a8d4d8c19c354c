//! # Hud Bridge CLI
//!
//! Operator tooling for the Hud bridge:
//! - `check-app`: verify the GitHub App credentials and list installations
//! - `create-issue`: send a test issue through a running bridge
//! - `sign-payload`: sign a webhook body for manual `/webhook` calls
//! - `completions`: shell completions

use chrono::Utc;
use clap::{Args, CommandFactory, Parser, Subcommand};
use hud_bridge_github::{
    webhook::compute_signature, App, AuthConfig, ClientConfig, CredentialProvider, GitHubAppAuth,
    GitHubAppId, GitHubClient, Installation, InstallationId, PrivateKey, RS256JwtGenerator,
};
use serde::Deserialize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

// ============================================================================
// CLI Structure
// ============================================================================

/// Hud bridge CLI - operator tools for the Hud GitHub App
#[derive(Parser)]
#[command(name = "hud-bridge-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Operator tools for the Hud GitHub App bridge")]
pub struct Cli {
    /// Logging level
    #[arg(short, long, default_value = "warn", global = true)]
    pub log_level: String,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Authenticate as the GitHub App and list its installations
    CheckApp(CheckAppArgs),

    /// Create a test issue through a running bridge
    CreateIssue(CreateIssueArgs),

    /// Compute the X-Hub-Signature-256 value for a payload file
    SignPayload(SignPayloadArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Args, Debug)]
pub struct CheckAppArgs {
    /// GitHub App ID
    #[arg(long, env = "GITHUB_APP_ID")]
    pub app_id: GitHubAppId,

    /// Path to the app's PEM private key
    #[arg(long, env = "GITHUB_PRIVATE_KEY_PATH")]
    pub private_key_path: PathBuf,

    /// GitHub REST API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = hud_bridge_github::DEFAULT_GITHUB_API_URL)]
    pub api_url: String,

    /// Account login whose installation ID to highlight
    #[arg(long)]
    pub account: Option<String>,
}

#[derive(Args, Debug)]
pub struct CreateIssueArgs {
    /// Base URL of the running bridge
    #[arg(long, env = "HUD_BRIDGE_URL", default_value = "http://localhost:3000")]
    pub base_url: String,

    /// Bearer secret configured on the bridge
    #[arg(long, env = "API_SECRET", hide_env_values = true)]
    pub api_secret: String,

    /// Installation to create the issue as
    #[arg(long, env = "INSTALLATION_ID")]
    pub installation_id: InstallationId,

    /// Repository owner
    #[arg(long)]
    pub owner: String,

    /// Repository name
    #[arg(long)]
    pub repo: String,

    /// Issue title
    #[arg(long, default_value = "Test Bug Report from Hud")]
    pub title: String,

    /// Issue body (defaults to a bug report template)
    #[arg(long, conflicts_with = "body_file")]
    pub body: Option<String>,

    /// Read the issue body from a file
    #[arg(long)]
    pub body_file: Option<PathBuf>,

    /// Label to apply; repeat for several. The bridge's defaults apply when omitted.
    #[arg(long = "label")]
    pub labels: Vec<String>,
}

#[derive(Args, Debug)]
pub struct SignPayloadArgs {
    /// Webhook secret
    #[arg(long, env = "GITHUB_WEBHOOK_SECRET", hide_env_values = true)]
    pub secret: String,

    /// File holding the exact payload bytes
    pub file: PathBuf,
}

// ============================================================================
// Error Types
// ============================================================================

/// CLI error types
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Invalid argument: {arg} - {message}")]
    InvalidArgument { arg: String, message: String },

    #[error("GitHub error: {0}")]
    GitHub(#[from] hud_bridge_github::ApiError),

    #[error("Bridge rejected the request ({status}): {error}")]
    Relay {
        status: u16,
        error: String,
        details: Option<String>,
    },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration { .. } => 1,
            Self::InvalidArgument { .. } => 2,
            Self::GitHub(_) => 3,
            Self::Relay { .. } => 4,
            Self::Request(_) => 5,
            Self::Io(_) => 6,
        }
    }
}

// ============================================================================
// Entry Point
// ============================================================================

/// Parse arguments and run the selected command.
pub async fn run_cli() -> Result<(), CliError> {
    // Values such as API_SECRET may come from a local .env file
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    initialize_logging(&cli.log_level);

    let mut stdout = std::io::stdout();
    match cli.command {
        Commands::CheckApp(args) => execute_check_app(args, &mut stdout).await,
        Commands::CreateIssue(args) => execute_create_issue(args, &mut stdout).await,
        Commands::SignPayload(args) => execute_sign_payload(args, &mut stdout),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "hud-bridge-cli", &mut stdout);
            Ok(())
        }
    }
}

fn initialize_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

// ============================================================================
// check-app
// ============================================================================

/// Authenticate as the app, then print its metadata and installations.
pub async fn execute_check_app(args: CheckAppArgs, out: &mut impl Write) -> Result<(), CliError> {
    writeln!(out, "Checking GitHub App configuration...")?;
    writeln!(out, "App ID: {}", args.app_id)?;
    writeln!(out, "Private key path: {}", args.private_key_path.display())?;

    let pem = std::fs::read_to_string(&args.private_key_path)
        .map(Zeroizing::new)
        .map_err(|e| CliError::Configuration {
            message: format!(
                "Private key file {} could not be read: {}",
                args.private_key_path.display(),
                e
            ),
        })?;
    writeln!(out, "Private key loaded ({} characters)", pem.chars().count())?;

    let private_key = PrivateKey::from_pem(&pem).map_err(|e| CliError::Configuration {
        message: e.to_string(),
    })?;

    let auth = GitHubAppAuth::new(
        args.app_id,
        Arc::new(RS256JwtGenerator::new(private_key)),
        AuthConfig::default().with_github_api_url(&args.api_url),
    )
    .map_err(|e| CliError::Configuration {
        message: e.to_string(),
    })?;
    let credentials: Arc<dyn CredentialProvider> = Arc::new(auth);

    let client = GitHubClient::builder(credentials)
        .config(ClientConfig::default().with_github_api_url(&args.api_url))
        .build()?;

    let app = client.get_app().await?;
    writeln!(out, "App authentication successful")?;
    let installations = client.list_installations().await?;
    debug!(count = installations.len(), "Fetched installations");

    write_app_report(out, &app, &installations, args.account.as_deref())?;
    Ok(())
}

/// Print app metadata and installations, highlighting `account`'s installation.
pub fn write_app_report(
    out: &mut impl Write,
    app: &App,
    installations: &[Installation],
    account: Option<&str>,
) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(out, "App Info:")?;
    writeln!(out, "   Name: {}", app.name)?;
    writeln!(
        out,
        "   Owner: {}",
        app.owner.as_ref().map(|o| o.login.as_str()).unwrap_or("unknown")
    )?;
    writeln!(out, "   ID: {}", app.id)?;

    writeln!(out)?;
    writeln!(out, "Installations: {}", installations.len())?;

    if installations.is_empty() {
        writeln!(out)?;
        writeln!(out, "No installations found.")?;
        writeln!(out, "Install your app at: {}", app.install_url())?;
        return Ok(());
    }

    for installation in installations {
        let login = installation.account_login().unwrap_or("unknown");
        writeln!(out)?;
        writeln!(out, "Installation ID: {}", installation.id)?;
        writeln!(out, "   Account: {}", login)?;
        if installation.is_suspended() {
            writeln!(out, "   Suspended")?;
        }
        if account.is_some_and(|wanted| wanted.eq_ignore_ascii_case(login)) {
            writeln!(out)?;
            writeln!(out, "Use this for testing: INSTALLATION_ID={}", installation.id)?;
        }
    }

    Ok(())
}

// ============================================================================
// create-issue
// ============================================================================

#[derive(Debug, Deserialize)]
struct RelayIssue {
    number: u64,
    url: String,
    title: String,
}

#[derive(Debug, Deserialize)]
struct RelayReply {
    #[serde(default)]
    issue: Option<RelayIssue>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

/// Post a test issue to a running bridge and print the outcome.
pub async fn execute_create_issue(
    args: CreateIssueArgs,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let payload = build_issue_payload(&args)?;
    let url = format!("{}/api/create-issue", args.base_url.trim_end_matches('/'));
    info!(url = %url, owner = %args.owner, repo = %args.repo, "Sending test issue");

    let response = reqwest::Client::new()
        .post(&url)
        .bearer_auth(&args.api_secret)
        .json(&payload)
        .send()
        .await?;
    let status = response.status();
    let reply: RelayReply = response.json().await?;

    match reply.issue {
        Some(issue) if status.is_success() => {
            writeln!(out, "Issue created successfully!")?;
            writeln!(out, "Issue #{}: {}", issue.number, issue.title)?;
            writeln!(out, "URL: {}", issue.url)?;
            Ok(())
        }
        _ => Err(CliError::Relay {
            status: status.as_u16(),
            error: reply.error.unwrap_or_else(|| "unknown error".to_string()),
            details: reply.details,
        }),
    }
}

/// Request body for `/api/create-issue`.
pub fn build_issue_payload(args: &CreateIssueArgs) -> Result<serde_json::Value, CliError> {
    let body = match (&args.body, &args.body_file) {
        (Some(body), _) => body.clone(),
        (None, Some(path)) => std::fs::read_to_string(path).map_err(|e| CliError::InvalidArgument {
            arg: "--body-file".to_string(),
            message: format!("{}: {}", path.display(), e),
        })?,
        (None, None) => default_issue_body(&Utc::now().to_rfc3339()),
    };

    let mut payload = serde_json::json!({
        "installation_id": args.installation_id.as_u64(),
        "owner": args.owner,
        "repo": args.repo,
        "title": args.title,
        "body": body,
    });

    if !args.labels.is_empty() {
        payload["labels"] = serde_json::json!(args.labels);
    }

    Ok(payload)
}

/// Bug report template used when no body is given.
pub fn default_issue_body(timestamp: &str) -> String {
    format!(
        "# Bug Report\n\
         \n\
         **Detected by**: Hud Monitoring System\n\
         **Timestamp**: {}\n\
         **Severity**: High\n\
         \n\
         ## Description\n\
         Test issue sent with hud-bridge-cli to verify the GitHub App installation.\n\
         \n\
         ---\n\
         *This issue was automatically created by [Hud](https://hud.io)*\n",
        timestamp
    )
}

// ============================================================================
// sign-payload
// ============================================================================

/// Print the `sha256=` signature of a payload file.
pub fn execute_sign_payload(args: SignPayloadArgs, out: &mut impl Write) -> Result<(), CliError> {
    if args.secret.is_empty() {
        return Err(CliError::InvalidArgument {
            arg: "--secret".to_string(),
            message: "webhook secret must not be empty".to_string(),
        });
    }

    let payload = std::fs::read(&args.file)?;
    let signature =
        compute_signature(args.secret.as_bytes(), &payload).map_err(|e| CliError::InvalidArgument {
            arg: "--secret".to_string(),
            message: e.to_string(),
        })?;

    writeln!(out, "{}", signature)?;
    Ok(())
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
