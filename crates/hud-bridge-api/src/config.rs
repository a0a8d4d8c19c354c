//! Configuration types for the HTTP service

use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use zeroize::Zeroizing;

use hud_bridge_github::PrivateKey;

use crate::errors::ConfigError;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_FILE_ENV: &str = "HUD_CONFIG_FILE";

/// Prefix for structured environment overrides, e.g. `HUD__SERVER__PORT`.
pub const ENV_PREFIX: &str = "HUD";

/// Service configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ServiceConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// GitHub App identity and API settings
    #[serde(default)]
    pub github: GitHubConfig,

    /// Caller authentication
    #[serde(default)]
    pub security: SecurityConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Issue defaults
    #[serde(default)]
    pub issues: IssueConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,

    /// Maximum request size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            shutdown_timeout_seconds: 30,
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

/// GitHub App configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// Numeric GitHub App ID
    pub app_id: Option<u64>,

    /// Path to the app's PEM private key
    pub private_key_path: Option<String>,

    /// Inline PEM private key, used when no path is configured
    pub private_key: Option<Secret>,

    /// Shared secret for webhook signatures
    pub webhook_secret: Option<Secret>,

    /// REST API base URL
    pub api_url: String,

    /// User-Agent sent to GitHub
    pub user_agent: String,

    /// Outbound request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            app_id: None,
            private_key_path: None,
            private_key: None,
            webhook_secret: None,
            api_url: hud_bridge_github::DEFAULT_GITHUB_API_URL.to_string(),
            user_agent: format!("hud-bridge/{}", env!("CARGO_PKG_VERSION")),
            timeout_seconds: 30,
        }
    }
}

/// Security configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SecurityConfig {
    /// Bearer secret Hud presents on `/api/create-issue`
    pub api_secret: Option<Secret>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Logging level
    pub level: String,

    /// Enable JSON structured logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Issue defaults
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IssueConfig {
    /// Labels applied when a request carries none
    pub default_labels: Vec<String>,
}

impl Default for IssueConfig {
    fn default() -> Self {
        Self {
            default_labels: hud_bridge_core::relay::DEFAULT_LABELS
                .iter()
                .map(|l| l.to_string())
                .collect(),
        }
    }
}

/// Secret configuration value, wiped on drop and redacted in `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Zeroizing<String>);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<REDACTED>")
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Secret::new)
    }
}

impl ServiceConfig {
    /// Load configuration from files and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect();
        Self::load_from_env(env)
    }

    /// Load configuration from files and the given environment.
    ///
    /// Sources, later ones overriding earlier ones:
    ///
    /// 1. `/etc/hud-bridge/service.yaml` (optional)
    /// 2. `config/service.yaml` (optional)
    /// 3. the file named by `HUD_CONFIG_FILE` (required when set)
    /// 4. `HUD__SECTION__KEY` variables
    /// 5. the flat deployment variables: `GITHUB_APP_ID`,
    ///    `GITHUB_PRIVATE_KEY_PATH`, `GITHUB_PRIVATE_KEY`,
    ///    `GITHUB_WEBHOOK_SECRET`, `API_SECRET`, `PORT`, `GITHUB_API_URL`
    ///
    /// The result is not validated; call [`ServiceConfig::validate`].
    pub fn load_from_env(env: HashMap<String, String>) -> Result<Self, ConfigError> {
        let var = |key: &str| env.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        let mut builder = config::Config::builder()
            .add_source(
                config::File::with_name("/etc/hud-bridge/service")
                    .required(false)
                    .format(config::FileFormat::Yaml),
            )
            .add_source(
                config::File::with_name("config/service")
                    .required(false)
                    .format(config::FileFormat::Yaml),
            );

        if let Some(explicit_path) = var(CONFIG_FILE_ENV) {
            builder = builder.add_source(
                config::File::with_name(explicit_path)
                    .required(true)
                    .format(config::FileFormat::Yaml),
            );
        }

        builder = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .source(Some(env.clone().into_iter().collect())),
            )
            .set_override_option("github.app_id", parse_integer(var("GITHUB_APP_ID"), "GITHUB_APP_ID")?)?
            .set_override_option("server.port", parse_integer(var("PORT"), "PORT")?)?
            .set_override_option("github.private_key_path", var("GITHUB_PRIVATE_KEY_PATH"))?
            .set_override_option("github.private_key", var("GITHUB_PRIVATE_KEY"))?
            .set_override_option("github.webhook_secret", var("GITHUB_WEBHOOK_SECRET"))?
            .set_override_option("security.api_secret", var("API_SECRET"))?
            .set_override_option("github.api_url", var("GITHUB_API_URL"))?;

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Check that everything the service needs is present and sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.github.app_id {
            None => return Err(missing("github.app_id (GITHUB_APP_ID)")),
            Some(0) => {
                return Err(ConfigError::Invalid {
                    message: "github.app_id must be a positive integer".to_string(),
                })
            }
            Some(_) => {}
        }

        let has_key_path = self
            .github
            .private_key_path
            .as_deref()
            .is_some_and(|p| !p.trim().is_empty());
        let has_inline_key = matches!(&self.github.private_key, Some(key) if !key.is_blank());
        if !has_key_path && !has_inline_key {
            return Err(missing(
                "github.private_key_path (GITHUB_PRIVATE_KEY_PATH) or github.private_key (GITHUB_PRIVATE_KEY)",
            ));
        }

        if !matches!(&self.github.webhook_secret, Some(s) if !s.is_blank()) {
            return Err(missing("github.webhook_secret (GITHUB_WEBHOOK_SECRET)"));
        }

        if !matches!(&self.security.api_secret, Some(s) if !s.is_blank()) {
            return Err(missing("security.api_secret (API_SECRET)"));
        }

        if self.server.max_body_size == 0 {
            return Err(ConfigError::Invalid {
                message: "server.max_body_size must be greater than zero".to_string(),
            });
        }

        if self.github.timeout_seconds == 0 {
            return Err(ConfigError::Invalid {
                message: "github.timeout_seconds must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    /// Read and parse the configured private key.
    ///
    /// A key file wins over an inline key when both are configured.
    pub fn load_private_key(&self) -> Result<PrivateKey, ConfigError> {
        let pem = match self.github.private_key_path.as_deref().map(str::trim) {
            Some(path) if !path.is_empty() => read_key_file(Path::new(path))?,
            _ => match &self.github.private_key {
                Some(key) if !key.is_blank() => Zeroizing::new(key.expose().to_string()),
                _ => return Err(missing("github.private_key_path or github.private_key")),
            },
        };

        PrivateKey::from_pem(&pem).map_err(|e| ConfigError::Invalid {
            message: e.to_string(),
        })
    }

    /// `GitHubAppId` after validation.
    pub fn app_id(&self) -> Result<hud_bridge_github::GitHubAppId, ConfigError> {
        match self.github.app_id {
            Some(id) if id > 0 => Ok(hud_bridge_github::GitHubAppId::new(id)),
            _ => Err(missing("github.app_id")),
        }
    }
}

fn read_key_file(path: &Path) -> Result<Zeroizing<String>, ConfigError> {
    std::fs::read_to_string(path)
        .map(Zeroizing::new)
        .map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })
}

fn parse_integer(value: Option<&str>, name: &str) -> Result<Option<i64>, ConfigError> {
    value
        .map(|v| {
            v.parse::<i64>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ConfigError::Invalid {
                    message: format!("{} must be a positive integer, got '{}'", name, v),
                })
        })
        .transpose()
}

fn missing(key: &str) -> ConfigError {
    ConfigError::Missing {
        key: key.to_string(),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
