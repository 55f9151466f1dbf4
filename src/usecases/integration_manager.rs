//! Integration manager. One facade over every configured task platform.
//!
//! Holds zero or more adapters keyed by provider and forwards each call to the
//! matching one. Shared operations go through `IntegrationPort`; refresh,
//! revoke and the team/list/project lookups reach the concrete adapter.

use crate::adapters::integrations::{
    ClickUpIntegration, ClickUpList, ClickUpTeam, JiraIntegration, JiraProject, JiraResource,
    LinearIntegration, LinearTeam,
};
use crate::domain::{
    Destination, DomainError, Envelope, Provider, TaskRequest, TokenBundle, TokenExchange,
};
use crate::ports::IntegrationPort;
use crate::shared::config::AppConfig;
use std::collections::HashMap;
use tracing::{info, warn};

/// A registered adapter.
pub enum Integration {
    Linear(LinearIntegration),
    ClickUp(ClickUpIntegration),
    Jira(JiraIntegration),
}

impl Integration {
    pub fn provider(&self) -> Provider {
        self.as_port().provider()
    }

    /// The adapter as the shared capability interface.
    pub fn as_port(&self) -> &dyn IntegrationPort {
        match self {
            Integration::Linear(linear) => linear,
            Integration::ClickUp(clickup) => clickup,
            Integration::Jira(jira) => jira,
        }
    }
}

impl From<LinearIntegration> for Integration {
    fn from(adapter: LinearIntegration) -> Self {
        Integration::Linear(adapter)
    }
}

impl From<ClickUpIntegration> for Integration {
    fn from(adapter: ClickUpIntegration) -> Self {
        Integration::ClickUp(adapter)
    }
}

impl From<JiraIntegration> for Integration {
    fn from(adapter: JiraIntegration) -> Self {
        Integration::Jira(adapter)
    }
}

fn not_configured<T>(provider: Provider) -> Envelope<T> {
    warn!(%provider, "integration not configured");
    Envelope::failure(DomainError::NotConfigured(provider))
}

/// Facade over the configured task platforms.
///
/// Authorization-URL methods return `"<Provider> Integration not added"` when
/// the provider is missing; async operations return a `not_configured`
/// failure envelope carrying the same text.
#[derive(Default)]
pub struct IntegrationManager {
    integrations: HashMap<Provider, Integration>,
}

impl IntegrationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every adapter whose credentials are fully configured.
    /// Adapters share one HTTP client with the configured timeout.
    pub fn from_config(cfg: &AppConfig) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(cfg.http_timeout())
            .build()
            .map_err(|e| DomainError::Config(format!("HTTP client: {}", e)))?;

        let mut manager = Self::new();
        for provider in Provider::ALL {
            let Some(credentials) = cfg.credentials(provider) else {
                continue;
            };
            info!(%provider, client_id = %credentials.client_id, "integration enabled");
            let integration: Integration = match provider {
                Provider::Linear => LinearIntegration::new(credentials)
                    .with_client(client.clone())
                    .into(),
                Provider::ClickUp => ClickUpIntegration::new(credentials)
                    .with_client(client.clone())
                    .into(),
                Provider::Jira => JiraIntegration::new(credentials)
                    .with_client(client.clone())
                    .into(),
            };
            manager = manager.register(integration);
        }
        Ok(manager)
    }

    /// Add or replace the adapter for its provider.
    pub fn register(mut self, integration: impl Into<Integration>) -> Self {
        let integration = integration.into();
        self.integrations.insert(integration.provider(), integration);
        self
    }

    pub fn with_linear(self, linear: LinearIntegration) -> Self {
        self.register(linear)
    }

    pub fn with_clickup(self, clickup: ClickUpIntegration) -> Self {
        self.register(clickup)
    }

    pub fn with_jira(self, jira: JiraIntegration) -> Self {
        self.register(jira)
    }

    pub fn is_configured(&self, provider: Provider) -> bool {
        self.integrations.contains_key(&provider)
    }

    /// Configured providers in a stable order.
    pub fn configured_providers(&self) -> Vec<Provider> {
        Provider::ALL
            .into_iter()
            .filter(|p| self.is_configured(*p))
            .collect()
    }

    pub fn port(&self, provider: Provider) -> Option<&dyn IntegrationPort> {
        self.integrations.get(&provider).map(Integration::as_port)
    }

    fn linear(&self) -> Option<&LinearIntegration> {
        match self.integrations.get(&Provider::Linear) {
            Some(Integration::Linear(linear)) => Some(linear),
            _ => None,
        }
    }

    fn clickup(&self) -> Option<&ClickUpIntegration> {
        match self.integrations.get(&Provider::ClickUp) {
            Some(Integration::ClickUp(clickup)) => Some(clickup),
            _ => None,
        }
    }

    fn jira(&self) -> Option<&JiraIntegration> {
        match self.integrations.get(&Provider::Jira) {
            Some(Integration::Jira(jira)) => Some(jira),
            _ => None,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Provider-generic dispatch
    // ─────────────────────────────────────────────────────────────────────────

    pub fn authorization_url(&self, provider: Provider, scopes: Option<&str>) -> String {
        match self.port(provider) {
            Some(port) => port.authorize(scopes),
            None => provider.not_added_message(),
        }
    }

    pub async fn access_token(
        &self,
        provider: Provider,
        exchange: &TokenExchange,
    ) -> Envelope<TokenBundle> {
        match self.port(provider) {
            Some(port) => port.get_tokens(exchange).await,
            None => not_configured(provider),
        }
    }

    pub async fn user(&self, provider: Provider, access_token: &str) -> Envelope<serde_json::Value> {
        match self.port(provider) {
            Some(port) => port.fetch_user_info(access_token).await,
            None => not_configured(provider),
        }
    }

    pub async fn create_task(
        &self,
        provider: Provider,
        request: &TaskRequest,
    ) -> Envelope<serde_json::Value> {
        match self.port(provider) {
            Some(port) => port.create_task(request).await,
            None => not_configured(provider),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Authorization links
    // ─────────────────────────────────────────────────────────────────────────

    /// `scopes`: comma separated, no spaces (e.g. `read,write`).
    pub fn linear_authorization_url(&self, scopes: &str) -> String {
        self.authorization_url(Provider::Linear, Some(scopes))
    }

    pub fn clickup_authorization_url(&self) -> String {
        self.authorization_url(Provider::ClickUp, None)
    }

    /// `scopes`: space separated Jira scopes.
    pub fn jira_authorization_url(&self, scopes: &str) -> String {
        self.authorization_url(Provider::Jira, Some(scopes))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Token exchange, refresh, revoke
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn linear_access_token(
        &self,
        code: &str,
        redirect_url: Option<&str>,
    ) -> Envelope<TokenBundle> {
        let mut exchange = TokenExchange::new(code);
        exchange.redirect_url = redirect_url.map(str::to_string);
        self.access_token(Provider::Linear, &exchange).await
    }

    pub async fn clickup_access_token(&self, code: &str) -> Envelope<TokenBundle> {
        self.access_token(Provider::ClickUp, &TokenExchange::new(code))
            .await
    }

    pub async fn jira_access_token(&self, code: &str) -> Envelope<TokenBundle> {
        self.access_token(Provider::Jira, &TokenExchange::new(code))
            .await
    }

    pub async fn refresh_jira_token(&self, refresh_token: &str) -> Envelope<TokenBundle> {
        match self.jira() {
            Some(jira) => jira.refresh_token(refresh_token).await,
            None => not_configured(Provider::Jira),
        }
    }

    pub async fn revoke_linear_token(&self, access_token: &str) -> Envelope<serde_json::Value> {
        match self.linear() {
            Some(linear) => linear.revoke_auth_token(access_token).await,
            None => not_configured(Provider::Linear),
        }
    }

    pub async fn revoke_jira_token(&self, access_token: &str) -> Envelope<serde_json::Value> {
        match self.jira() {
            Some(jira) => jira.revoke_auth_token(access_token).await,
            None => not_configured(Provider::Jira),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Users
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn linear_user(&self, access_token: &str) -> Envelope<serde_json::Value> {
        self.user(Provider::Linear, access_token).await
    }

    pub async fn clickup_user(&self, access_token: &str) -> Envelope<serde_json::Value> {
        self.user(Provider::ClickUp, access_token).await
    }

    pub async fn jira_user(&self, access_token: &str) -> Envelope<serde_json::Value> {
        self.user(Provider::Jira, access_token).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Tasks
    // ─────────────────────────────────────────────────────────────────────────

    /// Without `team_id` the viewer's first team is used.
    pub async fn create_task_on_linear(
        &self,
        access_token: &str,
        title: &str,
        description: &str,
        team_id: Option<&str>,
    ) -> Envelope<serde_json::Value> {
        let destination = match team_id {
            Some(id) => Destination::LinearTeam(id.to_string()),
            None => Destination::FirstAvailable,
        };
        let request = TaskRequest::new(access_token, title, description).with_destination(destination);
        self.create_task(Provider::Linear, &request).await
    }

    /// Without `list_id` the first list of the first team is used.
    pub async fn create_task_on_clickup(
        &self,
        access_token: &str,
        title: &str,
        description: &str,
        list_id: Option<&str>,
    ) -> Envelope<serde_json::Value> {
        let destination = match list_id {
            Some(id) => Destination::ClickUpList(id.to_string()),
            None => Destination::FirstAvailable,
        };
        let request = TaskRequest::new(access_token, title, description).with_destination(destination);
        self.create_task(Provider::ClickUp, &request).await
    }

    /// Missing `cloud_id` / `project_key` are resolved to the first site / project.
    pub async fn create_task_on_jira(
        &self,
        access_token: &str,
        summary: &str,
        description: &str,
        cloud_id: Option<&str>,
        project_key: Option<&str>,
    ) -> Envelope<serde_json::Value> {
        let request = TaskRequest::new(access_token, summary, description).with_destination(
            Destination::JiraProject {
                cloud_id: cloud_id.map(str::to_string),
                project_key: project_key.map(str::to_string),
            },
        );
        self.create_task(Provider::Jira, &request).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lookups
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn linear_teams(&self, access_token: &str) -> Envelope<Vec<LinearTeam>> {
        match self.linear() {
            Some(linear) => linear.fetch_all_teams(access_token).await,
            None => not_configured(Provider::Linear),
        }
    }

    pub async fn clickup_teams(&self, access_token: &str) -> Envelope<Vec<ClickUpTeam>> {
        match self.clickup() {
            Some(clickup) => clickup.fetch_all_teams(access_token).await,
            None => not_configured(Provider::ClickUp),
        }
    }

    pub async fn clickup_lists(
        &self,
        access_token: &str,
        team_id: &str,
    ) -> Envelope<Vec<ClickUpList>> {
        match self.clickup() {
            Some(clickup) => clickup.fetch_all_lists(access_token, team_id).await,
            None => not_configured(Provider::ClickUp),
        }
    }

    pub async fn jira_cloud_ids(&self, access_token: &str) -> Envelope<Vec<JiraResource>> {
        match self.jira() {
            Some(jira) => jira.fetch_cloud_id(access_token).await,
            None => not_configured(Provider::Jira),
        }
    }

    pub async fn jira_projects(
        &self,
        access_token: &str,
        cloud_id: &str,
    ) -> Envelope<Vec<JiraProject>> {
        match self.jira() {
            Some(jira) => jira.fetch_all_projects(access_token, cloud_id).await,
            None => not_configured(Provider::Jira),
        }
    }
}
