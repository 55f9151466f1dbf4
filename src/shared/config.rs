//! Application configuration. OAuth client credentials per provider, HTTP settings.

use crate::domain::{Credentials, Provider};
use serde::Deserialize;
use std::time::Duration;

/// Default timeout applied to every outbound provider request.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Per-request timeout in seconds. Read from TASK_BRIDGE_HTTP_TIMEOUT_SECS.
    #[serde(default)]
    pub http_timeout_secs: Option<u64>,

    // ─────────────────────────────────────────────────────────────────────────
    // Linear
    // ─────────────────────────────────────────────────────────────────────────
    /// Read from TASK_BRIDGE_LINEAR_CLIENT_ID or LINEAR_CLIENT_ID.
    #[serde(default)]
    pub linear_client_id: Option<String>,

    /// Read from TASK_BRIDGE_LINEAR_CLIENT_SECRET or LINEAR_CLIENT_SECRET.
    #[serde(default)]
    pub linear_client_secret: Option<String>,

    /// Read from TASK_BRIDGE_LINEAR_REDIRECT_URL or LINEAR_REDIRECT_URL.
    #[serde(default)]
    pub linear_redirect_url: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // ClickUp
    // ─────────────────────────────────────────────────────────────────────────
    #[serde(default)]
    pub clickup_client_id: Option<String>,

    #[serde(default)]
    pub clickup_client_secret: Option<String>,

    #[serde(default)]
    pub clickup_redirect_url: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // Jira (Atlassian OAuth 2.0 3LO app)
    // ─────────────────────────────────────────────────────────────────────────
    #[serde(default)]
    pub jira_client_id: Option<String>,

    #[serde(default)]
    pub jira_client_secret: Option<String>,

    #[serde(default)]
    pub jira_redirect_url: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("TASK_BRIDGE"));
        if let Ok(path) = std::env::var("TASK_BRIDGE_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c.build()?.try_deserialize()
    }

    /// Returns the request timeout. Defaults to 30 seconds.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(
            self.http_timeout_secs
                .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
        )
    }

    /// Credentials for `provider`, or `None` unless id, secret and redirect URL are all set.
    ///
    /// Each value falls back to the unprefixed env var (e.g. `JIRA_CLIENT_SECRET`).
    pub fn credentials(&self, provider: Provider) -> Option<Credentials> {
        let (id, secret, redirect, prefix) = match provider {
            Provider::Linear => (
                &self.linear_client_id,
                &self.linear_client_secret,
                &self.linear_redirect_url,
                "LINEAR",
            ),
            Provider::ClickUp => (
                &self.clickup_client_id,
                &self.clickup_client_secret,
                &self.clickup_redirect_url,
                "CLICKUP",
            ),
            Provider::Jira => (
                &self.jira_client_id,
                &self.jira_client_secret,
                &self.jira_redirect_url,
                "JIRA",
            ),
        };
        Some(Credentials::new(
            value_or_env(id, &format!("{}_CLIENT_ID", prefix))?,
            value_or_env(secret, &format!("{}_CLIENT_SECRET", prefix))?,
            value_or_env(redirect, &format!("{}_REDIRECT_URL", prefix))?,
        ))
    }

    /// Returns true if the provider has complete credentials.
    pub fn is_configured(&self, provider: Provider) -> bool {
        self.credentials(provider).is_some()
    }
}

fn value_or_env(value: &Option<String>, env_key: &str) -> Option<String> {
    value
        .clone()
        .or_else(|| std::env::var(env_key).ok())
        .filter(|v| !v.trim().is_empty())
}
