//! Result envelope returned by every adapter operation.
//!
//! Serializes as `{"success": true, "data": ...}` or
//! `{"success": false, "kind": ..., "error": ..., "message": ...}`.

use super::errors::DomainError;
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Transport,
    Unauthorized,
    NotFound,
    Server,
    Decode,
    InvalidRequest,
    NotConfigured,
}

impl ErrorKind {
    /// Short human-readable label, the `message` field of a failure envelope.
    pub fn message(self) -> &'static str {
        match self {
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::NotFound => "Not Found",
            ErrorKind::InvalidRequest => "Bad Request",
            ErrorKind::NotConfigured => "Not Configured",
            ErrorKind::Transport | ErrorKind::Server | ErrorKind::Decode => {
                "Internal Server Error"
            }
        }
    }
}

/// Failure half of an [`Envelope`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: ErrorKind,
    pub error: String,
    pub message: String,
}

impl From<DomainError> for Failure {
    fn from(err: DomainError) -> Self {
        let kind = err.kind();
        Self {
            kind,
            error: err.to_string(),
            message: kind.message().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Envelope<T> {
    Success(T),
    Failure(Failure),
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Envelope::Success(data)
    }

    pub fn failure(err: DomainError) -> Self {
        Envelope::Failure(err.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Envelope::Success(data) => Some(data),
            Envelope::Failure(_) => None,
        }
    }

    pub fn failure_ref(&self) -> Option<&Failure> {
        match self {
            Envelope::Success(_) => None,
            Envelope::Failure(failure) => Some(failure),
        }
    }

    pub fn into_result(self) -> Result<T, Failure> {
        match self {
            Envelope::Success(data) => Ok(data),
            Envelope::Failure(failure) => Err(failure),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        match self {
            Envelope::Success(data) => Envelope::Success(f(data)),
            Envelope::Failure(failure) => Envelope::Failure(failure),
        }
    }
}

impl<T> From<Result<T, DomainError>> for Envelope<T> {
    fn from(result: Result<T, DomainError>) -> Self {
        match result {
            Ok(data) => Envelope::Success(data),
            Err(err) => Envelope::failure(err),
        }
    }
}

impl<T: Serialize> Serialize for Envelope<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Envelope::Success(data) => {
                let mut state = serializer.serialize_struct("Envelope", 2)?;
                state.serialize_field("success", &true)?;
                state.serialize_field("data", data)?;
                state.end()
            }
            Envelope::Failure(failure) => {
                let mut state = serializer.serialize_struct("Envelope", 4)?;
                state.serialize_field("success", &false)?;
                state.serialize_field("kind", &failure.kind)?;
                state.serialize_field("error", &failure.error)?;
                state.serialize_field("message", &failure.message)?;
                state.end()
            }
        }
    }
}
