//! task-bridge: one facade over the Linear, ClickUp and Jira OAuth and task APIs.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;

pub use domain::{DomainError, Envelope, Provider};
pub use usecases::IntegrationManager;
