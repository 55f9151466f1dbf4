//! Integration outbound port. The capability set every task platform offers.

use crate::domain::{Envelope, Provider, TaskRequest, TokenBundle, TokenExchange};

/// Port for one task-tracking platform (Linear, ClickUp, Jira).
///
/// Implemented by adapters. Operations never fail past this boundary: every
/// transport or provider error comes back as `Envelope::Failure`.
/// Provider-specific extras (refresh, revoke, team/list/project lookups) live
/// on the adapters themselves.
#[async_trait::async_trait]
pub trait IntegrationPort: Send + Sync {
    /// Platform this adapter talks to.
    fn provider(&self) -> Provider;

    /// Build the OAuth consent URL the user should be redirected to.
    ///
    /// Pure and deterministic. `scopes` format is adapter-specific
    /// (comma separated for Linear, space or comma separated for Jira,
    /// ignored by ClickUp).
    fn authorize(&self, scopes: Option<&str>) -> String;

    /// Exchange an authorization code for tokens.
    async fn get_tokens(&self, exchange: &TokenExchange) -> Envelope<TokenBundle>;

    /// Fetch the user the access token belongs to.
    async fn fetch_user_info(&self, access_token: &str) -> Envelope<serde_json::Value>;

    /// Create a task / issue.
    ///
    /// # Arguments
    /// * `request` - Title, description, token and destination. A
    ///   destination belonging to another platform is rejected.
    async fn create_task(&self, request: &TaskRequest) -> Envelope<serde_json::Value>;
}
