//! Domain entities. Pure data structures shared by every provider.
//!
//! No HTTP types here; adapters translate these into provider payloads.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A supported task-tracking platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Linear,
    ClickUp,
    Jira,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Linear, Provider::ClickUp, Provider::Jira];

    /// Text returned in place of a URL or error when the provider was never registered.
    pub fn not_added_message(self) -> String {
        format!("{} Integration not added", self)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Provider::Linear => "Linear",
            Provider::ClickUp => "ClickUp",
            Provider::Jira => "Jira",
        };
        f.write_str(name)
    }
}

/// OAuth client credentials. Set once when an adapter is built.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

impl Credentials {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_url: redirect_url.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_url", &self.redirect_url)
            .finish()
    }
}

/// Authorization-code grant input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenExchange {
    pub code: String,
    /// Overrides the adapter's configured redirect URL when set.
    pub redirect_url: Option<String>,
}

impl TokenExchange {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            redirect_url: None,
        }
    }

    pub fn with_redirect_url(mut self, redirect_url: impl Into<String>) -> Self {
        self.redirect_url = Some(redirect_url.into());
        self
    }
}

/// Token response from a provider's token endpoint.
///
/// Fields a provider sends beyond the common OAuth set are kept in `extra`,
/// so serializing the bundle reproduces the provider body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenBundle {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// Kept as the provider sent it (integer or float seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<serde_json::Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<TokenScope>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TokenBundle {
    /// Absolute expiry, given the moment the bundle was issued.
    /// `None` when the provider did not send `expires_in`.
    pub fn expires_at(&self, issued_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let expires_in = self.expires_in.as_ref()?;
        let secs = match expires_in.as_i64() {
            Some(secs) => secs,
            None => expires_in.as_f64()? as i64,
        };
        issued_at.checked_add_signed(Duration::try_seconds(secs)?)
    }

    /// Tokens without an expiry never count as expired.
    pub fn is_expired_at(&self, issued_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.expires_at(issued_at).is_some_and(|at| now >= at)
    }
}

/// Granted scopes. Linear sends a list, the others a space-separated string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenScope {
    Text(String),
    List(Vec<String>),
}

impl TokenScope {
    pub fn scopes(&self) -> Vec<&str> {
        match self {
            TokenScope::Text(text) => text.split_whitespace().collect(),
            TokenScope::List(list) => list.iter().map(String::as_str).collect(),
        }
    }
}

/// Where a new task should land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Let the adapter pick the first team / list / project visible to the token.
    FirstAvailable,
    LinearTeam(String),
    ClickUpList(String),
    JiraProject {
        cloud_id: Option<String>,
        project_key: Option<String>,
    },
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::FirstAvailable => f.write_str("first available container"),
            Destination::LinearTeam(id) => write!(f, "Linear team {}", id),
            Destination::ClickUpList(id) => write!(f, "ClickUp list {}", id),
            Destination::JiraProject {
                cloud_id,
                project_key,
            } => write!(
                f,
                "Jira project {} on site {}",
                project_key.as_deref().unwrap_or("(first)"),
                cloud_id.as_deref().unwrap_or("(first)")
            ),
        }
    }
}

/// Input for creating a task. `title` is sent as Jira's `summary`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRequest {
    pub access_token: String,
    pub title: String,
    pub description: String,
    pub destination: Destination,
}

impl TaskRequest {
    pub fn new(
        access_token: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            title: title.into(),
            description: description.into(),
            destination: Destination::FirstAvailable,
        }
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }
}
