//! Application use cases. Orchestrate the provider adapters via ports.

pub mod integration_manager;

pub use integration_manager::{Integration, IntegrationManager};
