//! Port traits. API boundaries for the hexagon.
//!
//! - Outbound: Called by the manager into provider adapters

pub mod integration;

pub use integration::IntegrationPort;
