//! Linear adapter. Implements IntegrationPort over Linear's OAuth and GraphQL APIs.

use super::http::{bearer, read_json, read_value, with_query};
use crate::domain::{
    Credentials, Destination, DomainError, Envelope, Provider, TaskRequest, TokenBundle,
    TokenExchange,
};
use crate::ports::IntegrationPort;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const PROVIDER: Provider = Provider::Linear;

/// Scope requested when the caller passes none.
const DEFAULT_SCOPE: &str = "read";

/// Linear endpoint set. `Default` points at production.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearEndpoints {
    pub authorize: String,
    pub token: String,
    pub revoke: String,
    pub graphql: String,
}

impl Default for LinearEndpoints {
    fn default() -> Self {
        Self {
            authorize: "https://linear.app/oauth/authorize".to_string(),
            token: "https://api.linear.app/oauth/token".to_string(),
            revoke: "https://api.linear.app/oauth/revoke".to_string(),
            graphql: "https://api.linear.app/graphql".to_string(),
        }
    }
}

impl LinearEndpoints {
    /// Every endpoint under one base URL (e.g. a local stub server).
    pub fn rooted_at(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            authorize: format!("{}/oauth/authorize", base),
            token: format!("{}/oauth/token", base),
            revoke: format!("{}/oauth/revoke", base),
            graphql: format!("{}/graphql", base),
        }
    }
}

/// A Linear team visible to the viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearTeam {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub key: Option<String>,
}

/// Linear API adapter.
///
/// Token exchange is form-encoded; everything else goes through the GraphQL
/// endpoint with a bearer token.
pub struct LinearIntegration {
    client: Client,
    credentials: Credentials,
    endpoints: LinearEndpoints,
}

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    errors: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct ViewerData {
    viewer: serde_json::Value,
}

#[derive(Deserialize)]
struct ViewerTeamsData {
    viewer: ViewerTeams,
}

#[derive(Deserialize)]
struct ViewerTeams {
    teams: TeamConnection,
}

#[derive(Deserialize)]
struct TeamConnection {
    nodes: Vec<LinearTeam>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueCreateData {
    issue_create: serde_json::Value,
}

impl LinearIntegration {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            client: Client::new(),
            credentials,
            endpoints: LinearEndpoints::default(),
        }
    }

    /// Share an existing HTTP client (connection pool, timeouts).
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_endpoints(mut self, endpoints: LinearEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Revoke an access token.
    pub async fn revoke_auth_token(&self, access_token: &str) -> Envelope<serde_json::Value> {
        self.try_revoke(access_token).await.into()
    }

    /// Fetch every team the viewer belongs to.
    pub async fn fetch_all_teams(&self, access_token: &str) -> Envelope<Vec<LinearTeam>> {
        self.try_fetch_teams(access_token).await.into()
    }

    async fn try_revoke(&self, access_token: &str) -> Result<serde_json::Value, DomainError> {
        let res = self
            .client
            .post(&self.endpoints.revoke)
            .header("Authorization", bearer(access_token))
            .send()
            .await
            .map_err(|e| DomainError::transport(PROVIDER, e))?;
        let body = read_value(PROVIDER, res).await?;
        info!(provider = %PROVIDER, "access token revoked");
        Ok(body)
    }

    async fn try_get_tokens(&self, exchange: &TokenExchange) -> Result<TokenBundle, DomainError> {
        let redirect_uri = exchange
            .redirect_url
            .as_deref()
            .unwrap_or(&self.credentials.redirect_url);
        let res = self
            .client
            .post(&self.endpoints.token)
            .form(&[
                ("code", exchange.code.as_str()),
                ("redirect_uri", redirect_uri),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| DomainError::transport(PROVIDER, e))?;
        let bundle: TokenBundle = read_json(PROVIDER, res).await?;
        info!(provider = %PROVIDER, scope = ?bundle.scope, "authorization code exchanged");
        Ok(bundle)
    }

    /// Run a GraphQL document and return its `data`.
    async fn graphql<T: serde::de::DeserializeOwned>(
        &self,
        access_token: &str,
        query: &str,
    ) -> Result<T, DomainError> {
        let res = self
            .client
            .post(&self.endpoints.graphql)
            .header("Authorization", bearer(access_token))
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await
            .map_err(|e| DomainError::transport(PROVIDER, e))?;

        let body: GraphQlResponse<T> = read_json(PROVIDER, res).await?;
        if let Some(errors) = body.errors {
            return Err(DomainError::GraphQl {
                provider: PROVIDER,
                errors: errors.to_string(),
            });
        }
        body.data
            .ok_or_else(|| DomainError::decode(PROVIDER, "missing 'data' in GraphQL response"))
    }

    async fn try_fetch_teams(&self, access_token: &str) -> Result<Vec<LinearTeam>, DomainError> {
        let data: ViewerTeamsData = self
            .graphql(access_token, "{ viewer { teams { nodes { id name key } } } }")
            .await?;
        Ok(data.viewer.teams.nodes)
    }

    async fn resolve_team(
        &self,
        access_token: &str,
        destination: &Destination,
    ) -> Result<String, DomainError> {
        match destination {
            Destination::LinearTeam(team_id) => Ok(team_id.clone()),
            Destination::FirstAvailable => {
                let team = self
                    .try_fetch_teams(access_token)
                    .await?
                    .into_iter()
                    .next()
                    .ok_or_else(|| {
                        DomainError::NotFound("No teams found for this Linear user".to_string())
                    })?;
                debug!(team_id = %team.id, "using first Linear team");
                Ok(team.id)
            }
            other => Err(DomainError::InvalidRequest(format!(
                "{} is not a Linear destination",
                other
            ))),
        }
    }

    async fn try_create_task(
        &self,
        request: &TaskRequest,
    ) -> Result<serde_json::Value, DomainError> {
        let team_id = self
            .resolve_team(&request.access_token, &request.destination)
            .await?;
        let mutation = issue_create_mutation(&request.title, &request.description, &team_id);
        let data: IssueCreateData = self.graphql(&request.access_token, &mutation).await?;
        info!(provider = %PROVIDER, team_id = %team_id, "issue created");
        Ok(data.issue_create)
    }
}

/// GraphQL string literal. JSON string escaping is valid GraphQL escaping.
fn graphql_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

fn issue_create_mutation(title: &str, description: &str, team_id: &str) -> String {
    format!(
        r#"mutation {{
  issueCreate(input: {{
    title: {},
    description: {},
    teamId: {}
  }}) {{
    success
    issue {{
      id
      identifier
      title
      description
      url
    }}
  }}
}}"#,
        graphql_string(title),
        graphql_string(description),
        graphql_string(team_id)
    )
}

#[async_trait::async_trait]
impl IntegrationPort for LinearIntegration {
    fn provider(&self) -> Provider {
        PROVIDER
    }

    fn authorize(&self, scopes: Option<&str>) -> String {
        with_query(
            &self.endpoints.authorize,
            &[
                ("client_id", self.credentials.client_id.as_str()),
                ("redirect_uri", self.credentials.redirect_url.as_str()),
                ("response_type", "code"),
                ("scope", scopes.unwrap_or(DEFAULT_SCOPE)),
            ],
        )
    }

    async fn get_tokens(&self, exchange: &TokenExchange) -> Envelope<TokenBundle> {
        self.try_get_tokens(exchange).await.into()
    }

    async fn fetch_user_info(&self, access_token: &str) -> Envelope<serde_json::Value> {
        let query = "{ viewer { id name displayName email active admin } }";
        self.graphql::<ViewerData>(access_token, query)
            .await
            .map(|data| data.viewer)
            .into()
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
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn adapter(server: &MockServer) -> LinearIntegration {
        LinearIntegration::new(Credentials::new(
            "lin-client",
            "lin-secret",
            "https://app.test/linear/callback",
        ))
        .with_endpoints(LinearEndpoints::rooted_at(&server.uri()))
    }

    #[test]
    fn test_authorize_is_deterministic() {
        let linear = LinearIntegration::new(Credentials::new(
            "lin-client",
            "secret",
            "https://app.test/cb",
        ));
        let first = linear.authorize(Some("read,write"));
        assert_eq!(first, linear.authorize(Some("read,write")));
        assert!(first.starts_with("https://linear.app/oauth/authorize?"));
        assert!(first.contains("client_id=lin-client"));
        assert!(first.contains("redirect_uri=https%3A%2F%2Fapp.test%2Fcb"));
        assert!(first.contains("response_type=code"));
        assert!(first.contains("scope=read%2Cwrite"));
    }

    #[test]
    fn test_mutation_escapes_quotes() {
        let mutation = issue_create_mutation(r#"Fix "login""#, "line1\nline2", "T1");
        assert!(mutation.contains(r#"title: "Fix \"login\"""#));
        assert!(mutation.contains(r#"description: "line1\nline2""#));
        assert!(mutation.contains(r#"teamId: "T1""#));
    }

    #[tokio::test]
    async fn test_get_tokens_form_encoded() {
        let server = MockServer::start().await;
        let body = json!({
            "access_token": "lin_tok",
            "token_type": "Bearer",
            "expires_in": 315705599,
            "scope": "read write"
        });
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=abc123"))
            .and(body_string_contains("redirect_uri=https%3A%2F%2Fother.test%2Fcb"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .expect(1)
            .mount(&server)
            .await;

        let exchange = TokenExchange::new("abc123").with_redirect_url("https://other.test/cb");
        let result = adapter(&server).get_tokens(&exchange).await;

        let bundle = result.data().expect("token exchange should succeed");
        assert_eq!(serde_json::to_value(bundle).unwrap(), body);
    }

    #[tokio::test]
    async fn test_get_tokens_failure_is_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
            .mount(&server)
            .await;

        let result = adapter(&server).get_tokens(&TokenExchange::new("bad")).await;

        let failure = result.failure_ref().unwrap();
        assert_eq!(failure.kind, ErrorKind::Server);
        assert!(failure.error.contains("invalid_grant"));
    }

    #[tokio::test]
    async fn test_create_task_with_team_makes_one_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(header("authorization", "Bearer tok"))
            .and(body_string_contains("issueCreate"))
            .and(body_string_contains("Ship it"))
            .and(body_string_contains("Before friday"))
            .and(body_string_contains("TEAM-9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "issueCreate": {
                        "success": true,
                        "issue": {"id": "i1", "title": "Ship it"}
                    }
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = TaskRequest::new("tok", "Ship it", "Before friday")
            .with_destination(Destination::LinearTeam("TEAM-9".into()));
        let result = adapter(&server).create_task(&request).await;

        let data = result.data().unwrap();
        assert_eq!(data["success"], true);
        assert_eq!(data["issue"]["id"], "i1");
    }

    #[tokio::test]
    async fn test_create_task_resolves_first_team() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(body_string_contains("teams"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"viewer": {"teams": {"nodes": [
                    {"id": "first", "name": "Core", "key": "COR"},
                    {"id": "second", "name": "Ops", "key": "OPS"}
                ]}}}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(body_string_contains("issueCreate"))
            .and(body_string_contains(r#"teamId: \"first\""#))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"issueCreate": {"success": true, "issue": {"id": "i2"}}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = TaskRequest::new("tok", "Title", "Body");
        let result = adapter(&server).create_task(&request).await;

        assert!(result.is_success());
    }

    #[tokio::test]
    async fn test_create_task_no_teams() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"viewer": {"teams": {"nodes": []}}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = adapter(&server)
            .create_task(&TaskRequest::new("tok", "Title", "Body"))
            .await;

        assert_eq!(result.failure_ref().unwrap().kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_graphql_errors_are_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errors": [{"message": "Authentication required"}]
            })))
            .mount(&server)
            .await;

        let result = adapter(&server).fetch_user_info("tok").await;

        let failure = result.failure_ref().unwrap();
        assert_eq!(failure.kind, ErrorKind::Server);
        assert!(failure.error.contains("Authentication required"));
    }

    #[tokio::test]
    async fn test_fetch_user_info_returns_viewer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(body_string_contains("viewer"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"viewer": {"id": "u1", "name": "Ada", "email": "ada@example.com"}}
            })))
            .mount(&server)
            .await;

        let result = adapter(&server).fetch_user_info("tok").await;

        assert_eq!(result.data().unwrap()["email"], "ada@example.com");
    }

    #[tokio::test]
    async fn test_wrong_destination_rejected_without_calls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let request = TaskRequest::new("tok", "t", "d")
            .with_destination(Destination::ClickUpList("L1".into()));
        let result = adapter(&server).create_task(&request).await;

        let failure = result.failure_ref().unwrap();
        assert_eq!(failure.kind, ErrorKind::InvalidRequest);
        assert_eq!(
            failure.error,
            "Invalid request: ClickUp list L1 is not a Linear destination"
        );
    }

    #[tokio::test]
    async fn test_get_tokens_keeps_list_scope() {
        let server = MockServer::start().await;
        let body = json!({
            "access_token": "t",
            "token_type": "Bearer",
            "expires_in": 315705599,
            "scope": ["read", "write"]
        });
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let result = adapter(&server).get_tokens(&TokenExchange::new("abc")).await;

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"success": true, "data": body})
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_failure() {
        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let linear = LinearIntegration::new(Credentials::new("c", "s", "https://app.test/cb"))
            .with_endpoints(LinearEndpoints::rooted_at(&format!("http://{}", addr)));

        let result = linear.fetch_all_teams("tok").await;

        let failure = result.failure_ref().unwrap();
        assert_eq!(failure.kind, ErrorKind::Transport);
        assert_eq!(failure.message, "Internal Server Error");
    }

    #[tokio::test]
    async fn test_revoke_accepts_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/revoke"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let result = adapter(&server).revoke_auth_token("tok").await;

        assert_eq!(result.data(), Some(&serde_json::Value::Null));
    }
}
