//! Tool definitions attached to the agent.
//!
//! The tool set is built once from configuration and passed by reference to
//! the resolver (definitions), the driver (run resources) and the approval
//! handler (MCP headers).

mod connected;
mod file_search;
mod mcp;

use std::collections::{BTreeMap, BTreeSet};

pub use connected::ConnectedAgentTool;
pub use file_search::FileSearchTool;
pub use mcp::McpTool;

use crate::api::types::{ToolDefinition, ToolResources};
use crate::config::Config;

/// The tools a newly created agent receives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolSet {
    pub mcp: Option<McpTool>,
    pub file_search: Option<FileSearchTool>,
    pub connected_agent: Option<ConnectedAgentTool>,
}

impl ToolSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            mcp: config.mcp.as_ref().map(McpTool::from_config),
            file_search: FileSearchTool::new(config.vector_store_ids.clone()),
            connected_agent: config
                .connected_agent
                .as_ref()
                .map(ConnectedAgentTool::from_config),
        }
    }

    pub fn with_mcp(mut self, tool: McpTool) -> Self {
        self.mcp = Some(tool);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.mcp.is_none() && self.file_search.is_none() && self.connected_agent.is_none()
    }

    /// Tool definitions in a stable order: MCP, file search, connected agent.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs = Vec::new();
        if let Some(mcp) = &self.mcp {
            defs.push(mcp.definition());
        }
        if let Some(fs) = &self.file_search {
            defs.push(fs.definition());
        }
        if let Some(connected) = &self.connected_agent {
            defs.push(connected.definition());
        }
        defs
    }

    /// Type tags of the tools in this set.
    pub fn kinds(&self) -> BTreeSet<&'static str> {
        self.definitions().iter().map(ToolDefinition::kind).collect()
    }

    /// Resources stored on the agent at creation time.
    pub fn agent_resources(&self) -> Option<ToolResources> {
        self.file_search.as_ref().map(|fs| ToolResources {
            file_search: Some(fs.resource()),
            mcp: Vec::new(),
        })
    }

    /// Resources supplied with each run.
    pub fn run_resources(&self) -> Option<ToolResources> {
        self.mcp.as_ref().map(|mcp| ToolResources {
            file_search: None,
            mcp: vec![mcp.resource()],
        })
    }

    /// Headers attached to every tool approval.
    pub fn approval_headers(&self) -> BTreeMap<String, String> {
        self.mcp
            .as_ref()
            .map(|mcp| mcp.headers().clone())
            .unwrap_or_default()
    }
}
