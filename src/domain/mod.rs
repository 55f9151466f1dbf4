//! Core domain layer. No network I/O.
//!
//! Entities, the result envelope and errors live here. Dependencies flow inward.

pub mod entities;
pub mod envelope;
pub mod errors;

pub use entities::{
    Credentials, Destination, Provider, TaskRequest, TokenBundle, TokenExchange,
    TokenScope,
};
pub use envelope::{Envelope, ErrorKind, Failure};
pub use errors::DomainError;
