//! ClickUp adapter. Implements IntegrationPort via the ClickUp v2 REST API.

use super::http::{bearer, read_json, with_query};
use crate::domain::{
    Credentials, Destination, DomainError, Envelope, Provider, TaskRequest, TokenBundle,
    TokenExchange,
};
use crate::ports::IntegrationPort;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const PROVIDER: Provider = Provider::ClickUp;

/// ClickUp endpoint set. `Default` points at production.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickUpEndpoints {
    pub authorize: String,
    /// REST root, e.g. `https://api.clickup.com/api/v2`.
    pub api: String,
}

impl Default for ClickUpEndpoints {
    fn default() -> Self {
        Self {
            authorize: "https://app.clickup.com/api".to_string(),
            api: "https://api.clickup.com/api/v2".to_string(),
        }
    }
}

impl ClickUpEndpoints {
    pub fn rooted_at(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            authorize: format!("{}/api", base),
            api: base.to_string(),
        }
    }
}

/// A ClickUp team (workspace).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickUpTeam {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// A ClickUp list, the container tasks are created in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickUpList {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Deserialize)]
struct TeamsResponse {
    #[serde(default)]
    teams: Vec<ClickUpTeam>,
}

#[derive(Deserialize)]
struct ListsResponse {
    #[serde(default)]
    lists: Vec<ClickUpList>,
}

#[derive(Serialize)]
struct TaskPayload<'a> {
    name: &'a str,
    description: &'a str,
}

/// ClickUp API adapter.
///
/// Tasks go into the list given by the request destination; without one the
/// first list of the first team visible to the token is used.
pub struct ClickUpIntegration {
    client: Client,
    credentials: Credentials,
    endpoints: ClickUpEndpoints,
}

impl ClickUpIntegration {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            client: Client::new(),
            credentials,
            endpoints: ClickUpEndpoints::default(),
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_endpoints(mut self, endpoints: ClickUpEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Fetch all teams (workspaces) the token can see.
    pub async fn fetch_all_teams(&self, access_token: &str) -> Envelope<Vec<ClickUpTeam>> {
        self.try_fetch_teams(access_token).await.into()
    }

    /// Fetch all lists of a team.
    pub async fn fetch_all_lists(
        &self,
        access_token: &str,
        team_id: &str,
    ) -> Envelope<Vec<ClickUpList>> {
        self.try_fetch_lists(access_token, team_id).await.into()
    }

    async fn get(&self, access_token: &str, url: &str) -> Result<reqwest::Response, DomainError> {
        self.client
            .get(url)
            .header("Authorization", bearer(access_token))
            .send()
            .await
            .map_err(|e| DomainError::transport(PROVIDER, e))
    }

    async fn try_fetch_teams(&self, access_token: &str) -> Result<Vec<ClickUpTeam>, DomainError> {
        let url = format!("{}/team", self.endpoints.api);
        let res = self.get(access_token, &url).await?;
        let body: TeamsResponse = read_json(PROVIDER, res).await?;
        Ok(body.teams)
    }

    async fn try_fetch_lists(
        &self,
        access_token: &str,
        team_id: &str,
    ) -> Result<Vec<ClickUpList>, DomainError> {
        let url = format!("{}/team/{}/list", self.endpoints.api, team_id);
        let res = self.get(access_token, &url).await?;
        let body: ListsResponse = read_json(PROVIDER, res).await?;
        Ok(body.lists)
    }

    /// First team, then its first list.
    async fn first_list_id(&self, access_token: &str) -> Result<String, DomainError> {
        let team = self
            .try_fetch_teams(access_token)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::NotFound("No teams found for this access token".into()))?;
        debug!(team_id = %team.id, "using first ClickUp team");

        let list = self
            .try_fetch_lists(access_token, &team.id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::NotFound("No lists found for this team".into()))?;
        debug!(list_id = %list.id, "using first ClickUp list");
        Ok(list.id)
    }

    async fn try_get_tokens(&self, exchange: &TokenExchange) -> Result<TokenBundle, DomainError> {
        let url = format!("{}/oauth/token", self.endpoints.api);
        let res = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "client_id": self.credentials.client_id,
                "client_secret": self.credentials.client_secret,
                "code": exchange.code,
            }))
            .send()
            .await
            .map_err(|e| DomainError::transport(PROVIDER, e))?;
        let bundle = read_json(PROVIDER, res).await?;
        info!(provider = %PROVIDER, "authorization code exchanged");
        Ok(bundle)
    }

    async fn try_fetch_user(&self, access_token: &str) -> Result<serde_json::Value, DomainError> {
        let url = format!("{}/user", self.endpoints.api);
        let res = self.get(access_token, &url).await?;
        read_json(PROVIDER, res).await
    }

    async fn try_create_task(
        &self,
        request: &TaskRequest,
    ) -> Result<serde_json::Value, DomainError> {
        let list_id = match &request.destination {
            Destination::ClickUpList(list_id) => list_id.clone(),
            Destination::FirstAvailable => self.first_list_id(&request.access_token).await?,
            other => {
                return Err(DomainError::InvalidRequest(format!(
                    "{} is not a ClickUp destination",
                    other
                )));
            }
        };

        let url = format!("{}/list/{}/task", self.endpoints.api, list_id);
        let res = self
            .client
            .post(&url)
            .header("Authorization", bearer(&request.access_token))
            .json(&TaskPayload {
                name: &request.title,
                description: &request.description,
            })
            .send()
            .await
            .map_err(|e| DomainError::transport(PROVIDER, e))?;
        let task = read_json(PROVIDER, res).await?;
        info!(provider = %PROVIDER, list_id = %list_id, "task created");
        Ok(task)
    }
}

#[async_trait::async_trait]
impl IntegrationPort for ClickUpIntegration {
    fn provider(&self) -> Provider {
        PROVIDER
    }

    fn authorize(&self, _scopes: Option<&str>) -> String {
        with_query(
            &self.endpoints.authorize,
            &[
                ("client_id", self.credentials.client_id.as_str()),
                ("redirect_uri", self.credentials.redirect_url.as_str()),
            ],
        )
    }

    async fn get_tokens(&self, exchange: &TokenExchange) -> Envelope<TokenBundle> {
        self.try_get_tokens(exchange).await.into()
    }

    async fn fetch_user_info(&self, access_token: &str) -> Envelope<serde_json::Value> {
        self.try_fetch_user(access_token).await.into()
    }

    async fn create_task(&self, request: &TaskRequest) -> Envelope<serde_json::Value> {
        self.try_create_task(request).await.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorKind;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn adapter(server: &MockServer) -> ClickUpIntegration {
        ClickUpIntegration::new(Credentials::new(
            "cu-client",
            "cu-secret",
            "https://app.test/clickup/callback",
        ))
        .with_endpoints(ClickUpEndpoints::rooted_at(&server.uri()))
    }

    #[test]
    fn test_authorize_ignores_scopes() {
        let clickup = ClickUpIntegration::new(Credentials::new("cu", "s", "https://app.test/cb"));
        let url = clickup.authorize(None);
        assert_eq!(
            url,
            "https://app.clickup.com/api?client_id=cu&redirect_uri=https%3A%2F%2Fapp.test%2Fcb"
        );
        assert_eq!(url, clickup.authorize(Some("anything")));
    }

    #[tokio::test]
    async fn test_get_tokens_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(body_json(json!({
                "client_id": "cu-client",
                "client_secret": "cu-secret",
                "code": "code-1"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "cu_tok"})))
            .expect(1)
            .mount(&server)
            .await;

        let result = adapter(&server).get_tokens(&TokenExchange::new("code-1")).await;

        assert_eq!(result.data().unwrap().access_token, "cu_tok");
    }

    #[tokio::test]
    async fn test_create_task_resolves_first_team_and_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/team"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "teams": [{"id": "T1", "name": "Acme"}, {"id": "T2", "name": "Other"}]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/team/T1/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "lists": [{"id": "L1", "name": "Inbox"}]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/list/L1/task"))
            .and(body_json(json!({"name": "Call vendor", "description": "About invoice"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "task-1", "name": "Call vendor"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = adapter(&server)
            .create_task(&TaskRequest::new("tok", "Call vendor", "About invoice"))
            .await;

        assert_eq!(result.data().unwrap()["id"], "task-1");
    }

    #[tokio::test]
    async fn test_create_task_no_teams_skips_list_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/team"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"teams": []})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/team/.+/list$"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let result = adapter(&server)
            .create_task(&TaskRequest::new("tok", "t", "d"))
            .await;

        let failure = result.failure_ref().unwrap();
        assert_eq!(failure.kind, ErrorKind::NotFound);
        assert_eq!(failure.error, "No teams found for this access token");
    }

    #[tokio::test]
    async fn test_create_task_no_lists() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/team"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"teams": [{"id": "T1"}]})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/team/T1/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"lists": []})))
            .mount(&server)
            .await;

        let result = adapter(&server)
            .create_task(&TaskRequest::new("tok", "t", "d"))
            .await;

        assert_eq!(
            result.failure_ref().unwrap().error,
            "No lists found for this team"
        );
    }

    #[tokio::test]
    async fn test_create_task_explicit_list() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/list/L9/task"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "task-9"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let request = TaskRequest::new("tok", "t", "d")
            .with_destination(Destination::ClickUpList("L9".into()));
        let result = adapter(&server).create_task(&request).await;

        assert!(result.is_success());
    }

    #[tokio::test]
    async fn test_fetch_user_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"err": "Token invalid"})))
            .mount(&server)
            .await;

        let result = adapter(&server).fetch_user_info("expired").await;

        let failure = result.failure_ref().unwrap();
        assert_eq!(failure.kind, ErrorKind::Unauthorized);
        assert_eq!(failure.message, "Unauthorized");
    }

    #[tokio::test]
    async fn test_long_error_body_is_truncated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/team"))
            .respond_with(ResponseTemplate::new(500).set_body_string("x".repeat(5_000)))
            .mount(&server)
            .await;

        let result = adapter(&server).fetch_all_teams("tok").await;

        let failure = result.failure_ref().unwrap();
        assert_eq!(failure.kind, ErrorKind::Server);
        assert_eq!(failure.error, format!("ClickUp API error 500: {}", "x".repeat(200)));
    }

    #[tokio::test]
    async fn test_non_json_token_body_is_decode_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let result = adapter(&server).get_tokens(&TokenExchange::new("c")).await;

        assert_eq!(result.failure_ref().unwrap().kind, ErrorKind::Decode);
    }

    #[tokio::test]
    async fn test_fetch_all_lists() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/team/T1/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "lists": [{"id": "L1", "name": "Inbox"}, {"id": "L2", "name": "Backlog"}]
            })))
            .mount(&server)
            .await;

        let lists = adapter(&server)
            .fetch_all_lists("tok", "T1")
            .await
            .into_result()
            .unwrap();

        assert_eq!(lists.len(), 2);
        assert_eq!(lists[1].name, "Backlog");
    }
}
