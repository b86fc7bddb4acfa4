//! Remote MCP server tool.

use std::collections::BTreeMap;

use crate::api::types::{ApprovalMode, McpToolResource, ToolDefinition};
use crate::config::McpServerConfig;

/// An MCP server exposed to the agent, restricted to an allow-list of
/// operations.
#[derive(Debug, Clone, PartialEq)]
pub struct McpTool {
    server_label: String,
    server_url: String,
    allowed_tools: Vec<String>,
    headers: BTreeMap<String, String>,
    require_approval: ApprovalMode,
}

impl McpTool {
    pub fn new(server_label: impl Into<String>, server_url: impl Into<String>) -> Self {
        Self {
            server_label: server_label.into(),
            server_url: server_url.into(),
            allowed_tools: Vec::new(),
            headers: BTreeMap::new(),
            require_approval: ApprovalMode::Always,
        }
    }

    pub fn from_config(config: &McpServerConfig) -> Self {
        Self {
            server_label: config.server_label.clone(),
            server_url: config.server_url.clone(),
            allowed_tools: config.allowed_tools.clone(),
            headers: config.headers.clone(),
            require_approval: config.require_approval,
        }
    }

    pub fn with_allowed_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn server_label(&self) -> &str {
        &self.server_label
    }

    /// Headers forwarded to the MCP server with each approved call.
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition::Mcp {
            server_label: self.server_label.clone(),
            server_url: self.server_url.clone(),
            allowed_tools: self.allowed_tools.clone(),
        }
    }

    /// Run-time resource carrying the approval mode and headers.
    pub fn resource(&self) -> McpToolResource {
        McpToolResource {
            server_label: self.server_label.clone(),
            headers: self.headers.clone(),
            require_approval: self.require_approval,
        }
    }
}
