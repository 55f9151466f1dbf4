//! Infrastructure adapters. Implement outbound ports.
//!
//! One HTTP adapter per task platform. Map errors to DomainError.

pub mod integrations;
