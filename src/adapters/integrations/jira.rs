//! Jira adapter. Implements IntegrationPort over Atlassian OAuth 2.0 (3LO) and
//! the Jira Cloud REST API v3.
//!
//! Jira Cloud is addressed through `api.atlassian.com/ex/jira/{cloud_id}`, so
//! creating an issue may first resolve the cloud id and a project key.

use super::http::{bearer, read_json, read_value, with_query};
use crate::domain::{
    Credentials, Destination, DomainError, Envelope, Provider, TaskRequest, TokenBundle,
    TokenExchange,
};
use crate::ports::IntegrationPort;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

const PROVIDER: Provider = Provider::Jira;

const AUDIENCE: &str = "api.atlassian.com";

/// Issue type used for created issues.
const ISSUE_TYPE: &str = "Task";

/// Atlassian endpoint set. `Default` points at production.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JiraEndpoints {
    pub authorize: String,
    pub token: String,
    /// Gateway root, e.g. `https://api.atlassian.com`.
    pub api: String,
}

impl Default for JiraEndpoints {
    fn default() -> Self {
        Self {
            authorize: "https://auth.atlassian.com/authorize".to_string(),
            token: "https://auth.atlassian.com/oauth/token".to_string(),
            api: "https://api.atlassian.com".to_string(),
        }
    }
}

impl JiraEndpoints {
    pub fn rooted_at(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            authorize: format!("{}/authorize", base),
            token: format!("{}/oauth/token", base),
            api: base.to_string(),
        }
    }

    fn revoke(&self) -> String {
        format!("{}/revoke", self.token)
    }

    fn me(&self) -> String {
        format!("{}/me", self.api)
    }

    fn accessible_resources(&self) -> String {
        format!("{}/oauth/token/accessible-resources", self.api)
    }

    fn jira(&self, cloud_id: &str, resource: &str) -> String {
        format!("{}/ex/jira/{}/rest/api/3/{}", self.api, cloud_id, resource)
    }
}

/// A Jira site the token has access to. `id` is the cloud id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraResource {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub scopes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JiraProject {
    #[serde(default)]
    pub id: String,
    pub key: String,
    #[serde(default)]
    pub name: String,
}

/// Jira (Atlassian Cloud) API adapter.
pub struct JiraIntegration {
    client: Client,
    credentials: Credentials,
    endpoints: JiraEndpoints,
}

/// Normalize comma- or space-separated scopes into Atlassian's space-separated form.
fn normalize_scopes(scopes: &str) -> String {
    scopes
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Wrap plain text in a single-paragraph Atlassian Document Format document.
pub fn adf_paragraph(text: &str) -> serde_json::Value {
    // Jira rejects empty text nodes.
    let content = if text.is_empty() {
        json!([])
    } else {
        json!([{ "type": "text", "text": text }])
    };
    json!({
        "type": "doc",
        "version": 1,
        "content": [
            { "type": "paragraph", "content": content }
        ]
    })
}

impl JiraIntegration {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            client: Client::new(),
            credentials,
            endpoints: JiraEndpoints::default(),
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_endpoints(mut self, endpoints: JiraEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Trade a refresh token for a new token bundle (rotating refresh tokens).
    pub async fn refresh_token(&self, refresh_token: &str) -> Envelope<TokenBundle> {
        self.token_grant(json!({
            "grant_type": "refresh_token",
            "client_id": self.credentials.client_id,
            "client_secret": self.credentials.client_secret,
            "refresh_token": refresh_token,
        }))
        .await
        .into()
    }

    /// Revoke an access or refresh token.
    pub async fn revoke_auth_token(&self, token: &str) -> Envelope<serde_json::Value> {
        self.try_revoke(token).await.into()
    }

    /// Sites (cloud ids) the token can reach.
    pub async fn fetch_cloud_id(&self, access_token: &str) -> Envelope<Vec<JiraResource>> {
        self.try_fetch_resources(access_token).await.into()
    }

    /// Projects of one Jira site.
    pub async fn fetch_all_projects(
        &self,
        access_token: &str,
        cloud_id: &str,
    ) -> Envelope<Vec<JiraProject>> {
        self.try_fetch_projects(access_token, cloud_id).await.into()
    }

    async fn token_grant(&self, body: serde_json::Value) -> Result<TokenBundle, DomainError> {
        let res = self
            .client
            .post(&self.endpoints.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::transport(PROVIDER, e))?;
        let bundle: TokenBundle = read_json(PROVIDER, res).await?;
        info!(
            provider = %PROVIDER,
            grant_type = %body["grant_type"],
            expires_in = ?bundle.expires_in,
            "token grant completed"
        );
        Ok(bundle)
    }

    async fn try_revoke(&self, token: &str) -> Result<serde_json::Value, DomainError> {
        let res = self
            .client
            .post(self.endpoints.revoke())
            .json(&json!({
                "token": token,
                "client_id": self.credentials.client_id,
            }))
            .send()
            .await
            .map_err(|e| DomainError::transport(PROVIDER, e))?;
        let body = read_value(PROVIDER, res).await?;
        info!(provider = %PROVIDER, "token revoked");
        Ok(body)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        access_token: &str,
        url: &str,
    ) -> Result<T, DomainError> {
        let res = self
            .client
            .get(url)
            .header("Authorization", bearer(access_token))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| DomainError::transport(PROVIDER, e))?;
        read_json(PROVIDER, res).await
    }

    async fn try_fetch_resources(
        &self,
        access_token: &str,
    ) -> Result<Vec<JiraResource>, DomainError> {
        self.get_json(access_token, &self.endpoints.accessible_resources())
            .await
    }

    async fn try_fetch_projects(
        &self,
        access_token: &str,
        cloud_id: &str,
    ) -> Result<Vec<JiraProject>, DomainError> {
        self.get_json(access_token, &self.endpoints.jira(cloud_id, "project"))
            .await
    }

    async fn first_cloud_id(&self, access_token: &str) -> Result<String, DomainError> {
        let resource = self
            .try_fetch_resources(access_token)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                DomainError::NotFound("No accessible Jira sites found for this access token".into())
            })?;
        debug!(cloud_id = %resource.id, site = %resource.name, "using first Jira site");
        Ok(resource.id)
    }

    async fn first_project_key(
        &self,
        access_token: &str,
        cloud_id: &str,
    ) -> Result<String, DomainError> {
        let project = self
            .try_fetch_projects(access_token, cloud_id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::NotFound("No projects found for this Jira site".into()))?;
        debug!(project_key = %project.key, "using first Jira project");
        Ok(project.key)
    }

    async fn try_create_task(
        &self,
        request: &TaskRequest,
    ) -> Result<serde_json::Value, DomainError> {
        let (cloud_id, project_key) = match &request.destination {
            Destination::JiraProject {
                cloud_id,
                project_key,
            } => (cloud_id.clone(), project_key.clone()),
            Destination::FirstAvailable => (None, None),
            other => {
                return Err(DomainError::InvalidRequest(format!(
                    "{} is not a Jira destination",
                    other
                )));
            }
        };

        let token = request.access_token.as_str();
        let cloud_id = match cloud_id {
            Some(id) => id,
            None => self.first_cloud_id(token).await?,
        };
        let project_key = match project_key {
            Some(key) => key,
            None => self.first_project_key(token, &cloud_id).await?,
        };

        let payload = json!({
            "fields": {
                "project": { "key": project_key },
                "summary": request.title,
                "description": adf_paragraph(&request.description),
                "issuetype": { "name": ISSUE_TYPE }
            }
        });

        let res = self
            .client
            .post(self.endpoints.jira(&cloud_id, "issue"))
            .header("Authorization", bearer(token))
            .header("Accept", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| DomainError::transport(PROVIDER, e))?;
        let issue: serde_json::Value = read_json(PROVIDER, res).await?;
        info!(
            provider = %PROVIDER,
            cloud_id = %cloud_id,
            project_key = %project_key,
            issue_key = %issue["key"],
            "issue created"
        );
        Ok(issue)
    }

    async fn try_fetch_user(&self, access_token: &str) -> Result<serde_json::Value, DomainError> {
        self.get_json(access_token, &self.endpoints.me()).await
    }
}

#[async_trait::async_trait]
impl IntegrationPort for JiraIntegration {
    fn provider(&self) -> Provider {
        PROVIDER
    }

    fn authorize(&self, scopes: Option<&str>) -> String {
        let scope = normalize_scopes(scopes.unwrap_or_default());
        with_query(
            &self.endpoints.authorize,
            &[
                ("audience", AUDIENCE),
                ("client_id", self.credentials.client_id.as_str()),
                ("redirect_uri", self.credentials.redirect_url.as_str()),
                ("scope", scope.as_str()),
                ("response_type", "code"),
                ("prompt", "consent"),
            ],
        )
    }

    async fn get_tokens(&self, exchange: &TokenExchange) -> Envelope<TokenBundle> {
        let redirect_uri = exchange
            .redirect_url
            .as_deref()
            .unwrap_or(&self.credentials.redirect_url);
        self.token_grant(json!({
            "grant_type": "authorization_code",
            "client_id": self.credentials.client_id,
            "client_secret": self.credentials.client_secret,
            "code": exchange.code,
            "redirect_uri": redirect_uri,
        }))
        .await
        .into()
    }

    async fn fetch_user_info(&self, access_token: &str) -> Envelope<serde_json::Value> {
        self.try_fetch_user(access_token).await.into()
    }

    async fn create_task(&self, request: &TaskRequest) -> Envelope<serde_json::Value> {
        self.try_create_task(request).await.into()
    }
}
