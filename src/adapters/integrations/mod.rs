//! Task platform adapters. Each implements IntegrationPort for one provider.

pub(crate) mod http;

pub mod clickup;
pub mod jira;
pub mod linear;

pub use clickup::{ClickUpEndpoints, ClickUpIntegration, ClickUpList, ClickUpTeam};
pub use jira::{JiraEndpoints, JiraIntegration, JiraProject, JiraResource};
pub use linear::{LinearEndpoints, LinearIntegration, LinearTeam};
