//! Another agent exposed as a tool.

use crate::api::types::{ConnectedAgentDetails, ToolDefinition};
use crate::config::ConnectedAgentConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectedAgentTool {
    details: ConnectedAgentDetails,
}

impl ConnectedAgentTool {
    pub fn new(
        agent_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            details: ConnectedAgentDetails {
                id: agent_id.into(),
                name: name.into(),
                description: description.into(),
            },
        }
    }

    pub fn from_config(config: &ConnectedAgentConfig) -> Self {
        Self::new(
            config.agent_id.clone(),
            config.name.clone(),
            config.description.clone(),
        )
    }

    pub fn name(&self) -> &str {
        &self.details.name
    }

    pub fn description(&self) -> &str {
        &self.details.description
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition::ConnectedAgent {
            connected_agent: self.details.clone(),
        }
    }
}
