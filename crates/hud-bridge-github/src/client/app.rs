//! GitHub App metadata types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::InstallationId;

/// GitHub App as returned by `GET /app`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct App {
    pub id: u64,

    pub slug: String,

    pub name: String,

    pub owner: Option<Account>,

    pub description: Option<String>,

    #[serde(default)]
    pub external_url: Option<String>,

    pub html_url: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl App {
    /// URL a customer visits to install the app on their account.
    pub fn install_url(&self) -> String {
        format!("https://github.com/apps/{}/installations/new", self.slug)
    }
}

/// User or organization account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub id: u64,

    pub login: String,

    #[serde(rename = "type")]
    pub account_type: String,

    #[serde(default)]
    pub html_url: Option<String>,
}

/// Installation of the app on one account (`GET /app/installations`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Installation {
    pub id: InstallationId,

    pub account: Option<Account>,

    #[serde(default)]
    pub repository_selection: Option<String>,

    #[serde(default)]
    pub html_url: Option<String>,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub suspended_at: Option<DateTime<Utc>>,
}

impl Installation {
    /// Login of the account the app is installed on, if GitHub reported it.
    pub fn account_login(&self) -> Option<&str> {
        self.account.as_ref().map(|a| a.login.as_str())
    }

    /// Whether the installation is currently suspended.
    pub fn is_suspended(&self) -> bool {
        self.suspended_at.is_some()
    }
}
