//! Response types, query parameters, and supporting types for the API.

use chrono::{DateTime, Utc};
use hud_bridge_core::{CustomerId, IssueResult};
use serde::{Deserialize, Serialize};

// ============================================================================
// Response Types
// ============================================================================

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Accepted webhook delivery
#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub status: String,
    pub delivery_id: String,
    pub event: String,
}

/// Successful issue relay
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateIssueResponse {
    pub success: bool,
    pub issue: IssueResult,
}

/// Successful customer registration
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterCustomerResponse {
    pub success: bool,
    pub customer_id: CustomerId,
}

// ============================================================================
// Query Parameter Types
// ============================================================================

/// Parameters GitHub appends to the post-installation redirect
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub installation_id: Option<String>,
    pub setup_action: Option<String>,
}

// ============================================================================
// HTML Pages
// ============================================================================

/// Page shown after a completed installation.
pub fn installed_page(installation_id: &str) -> String {
    format!(
        "<h1>Hud Bug Reporter Installed!</h1>\n\
         <p>Installation ID: {}</p>\n\
         <p>You can now close this window.</p>\n\
         <p>Provide this Installation ID to your Hud administrator.</p>\n",
        escape_html(installation_id)
    )
}

/// Page shown when setup did not finish with an install.
pub fn cancelled_page() -> &'static str {
    "<h1>Installation cancelled</h1>"
}

/// Escape text for inclusion in HTML element content.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
