//! Default agent instructions and user prompt.

use crate::tools::ToolSet;

/// Name given to a newly created agent.
pub const DEFAULT_AGENT_NAME: &str = "Weather-agent";

/// Instructions for a newly created agent.
pub const DEFAULT_INSTRUCTIONS: &str = "You are a weather assistant that helps users find weather updates and warnings for a given US state and City";

/// The single user message posted to the thread.
pub const DEFAULT_USER_PROMPT: &str = "I live in Seward, Alaska and wondering what kind of clothing and accessory I should wear today when I go out?";

/// Build the instructions for a new agent: the base text followed by one
/// line per attached tool, so the model knows what it may call.
pub fn build_instructions(base: &str, tools: &ToolSet) -> String {
    let mut lines = Vec::new();
    if let Some(mcp) = &tools.mcp {
        lines.push(format!(
            "- **{}**: live weather alerts and forecasts",
            mcp.server_label()
        ));
    }
    if tools.file_search.is_some() {
        lines.push("- **file_search**: reference documents uploaded for this agent".to_string());
    }
    if let Some(connected) = &tools.connected_agent {
        lines.push(format!(
            "- **{}**: {}",
            connected.name(),
            connected.description()
        ));
    }

    if lines.is_empty() {
        return base.to_string();
    }

    format!(
        "{base}\n\n## Available Tools\n{tools}",
        base = base.trim_end(),
        tools = lines.join("\n")
    )
}
