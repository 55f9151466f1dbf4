//! Shared response handling for provider adapters.
//!
//! Classifies status codes into `DomainError` and decodes bodies.

use crate::domain::{DomainError, Provider};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::warn;

/// Longest provider error body kept in error messages.
const MAX_ERROR_BODY: usize = 200;

/// Return the body text of a successful response.
///
/// 401 maps to `Unauthorized`; any other non-2xx maps to `Api` with the status
/// and a truncated body.
pub(crate) async fn success_body(provider: Provider, res: Response) -> Result<String, DomainError> {
    let status = res.status();
    if status == StatusCode::UNAUTHORIZED {
        warn!(%provider, "access token rejected (401)");
        return Err(DomainError::Unauthorized(provider));
    }
    if !status.is_success() {
        let text = res.text().await.unwrap_or_default();
        let body: String = text.chars().take(MAX_ERROR_BODY).collect();
        warn!(%provider, status = %status, body = %body, "provider API returned error");
        return Err(DomainError::Api {
            provider,
            status: status.as_u16(),
            body,
        });
    }
    res.text()
        .await
        .map_err(|e| DomainError::transport(provider, e))
}

/// Decode a successful JSON response.
pub(crate) async fn read_json<T: DeserializeOwned>(
    provider: Provider,
    res: Response,
) -> Result<T, DomainError> {
    let body = success_body(provider, res).await?;
    serde_json::from_str(&body).map_err(|e| DomainError::decode(provider, e))
}

/// Like [`read_json`], but an empty body (revoke endpoints) becomes `null`.
pub(crate) async fn read_value(
    provider: Provider,
    res: Response,
) -> Result<serde_json::Value, DomainError> {
    let body = success_body(provider, res).await?;
    if body.trim().is_empty() {
        return Ok(serde_json::Value::Null);
    }
    serde_json::from_str(&body).map_err(|e| DomainError::decode(provider, e))
}

/// `Bearer <token>` header value.
pub(crate) fn bearer(access_token: &str) -> String {
    format!("Bearer {}", access_token)
}

/// Append percent-encoded query parameters to a base URL.
///
/// Spaces are written as `%20`; a literal `+` is already escaped as `%2B`.
pub(crate) fn with_query(base: &str, params: &[(&str, &str)]) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish()
        .replace('+', "%20");
    format!("{}?{}", base, query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_query_encodes_values() {
        let url = with_query(
            "https://example.com/auth",
            &[("client_id", "abc"), ("redirect_uri", "https://app.test/cb?x=1")],
        );
        assert_eq!(
            url,
            "https://example.com/auth?client_id=abc&redirect_uri=https%3A%2F%2Fapp.test%2Fcb%3Fx%3D1"
        );
    }

    #[test]
    fn test_with_query_space_and_colon() {
        let url = with_query("https://x.test", &[("scope", "read:jira-work offline_access")]);
        assert_eq!(url, "https://x.test?scope=read%3Ajira-work%20offline_access");
    }

    #[test]
    fn test_with_query_literal_plus_stays_escaped() {
        let url = with_query("https://x.test", &[("redirect_uri", "https://app.test/a+b c")]);
        assert_eq!(
            url,
            "https://x.test?redirect_uri=https%3A%2F%2Fapp.test%2Fa%2Bb%20c"
        );
    }
}
