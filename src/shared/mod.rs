//! Cross-cutting concerns: configuration and tracing setup.

pub mod config;
pub mod telemetry;

pub use config::AppConfig;
pub use telemetry::init_tracing;
