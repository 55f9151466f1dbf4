//! Domain errors. Used by ports, adapters and the manager.
//!
//! Adapters map transport and provider errors into these; the port boundary
//! turns them into failure envelopes.

use super::entities::Provider;
use super::envelope::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("{provider} request failed: {reason}")]
    Transport { provider: Provider, reason: String },

    #[error("{0} rejected the access token (401 Unauthorized)")]
    Unauthorized(Provider),

    #[error("{provider} API error {status}: {body}")]
    Api {
        provider: Provider,
        status: u16,
        body: String,
    },

    #[error("{provider} GraphQL errors: {errors}")]
    GraphQl { provider: Provider, errors: String },

    #[error("Failed to parse {provider} response: {reason}")]
    Decode { provider: Provider, reason: String },

    /// A first-wins lookup came back empty (no teams, lists, projects...).
    #[error("{0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("{0} Integration not added")]
    NotConfigured(Provider),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DomainError {
    pub fn transport(provider: Provider, err: reqwest::Error) -> Self {
        DomainError::Transport {
            provider,
            reason: err.to_string(),
        }
    }

    pub fn decode(provider: Provider, err: impl std::fmt::Display) -> Self {
        DomainError::Decode {
            provider,
            reason: err.to_string(),
        }
    }

    /// Coarse classification carried by failure envelopes.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Transport { .. } => ErrorKind::Transport,
            DomainError::Unauthorized(_) => ErrorKind::Unauthorized,
            DomainError::Api { .. } | DomainError::GraphQl { .. } => ErrorKind::Server,
            DomainError::Decode { .. } => ErrorKind::Decode,
            DomainError::NotFound(_) => ErrorKind::NotFound,
            DomainError::InvalidRequest(_) | DomainError::Config(_) => ErrorKind::InvalidRequest,
            DomainError::NotConfigured(_) => ErrorKind::NotConfigured,
        }
    }
}
