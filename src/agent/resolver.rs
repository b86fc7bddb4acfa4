//! Resolve the agent to run: reuse one by id or create a new one.

use std::collections::BTreeSet;
use std::io::Write;

use crate::api::types::{Agent, CreateAgentRequest, ToolDefinition};
use crate::api::AgentsApi;
use crate::config::Config;
use crate::telemetry::traced_call;
use crate::tools::ToolSet;

use super::prompt::build_instructions;
use super::AgentError;

/// What the resolver needs to find or create an agent.
#[derive(Debug, Clone)]
pub struct AgentTemplate<'a> {
    pub agent_id: Option<&'a str>,
    pub model: &'a str,
    pub name: &'a str,
    pub instructions: &'a str,
    pub tools: &'a ToolSet,
}

impl<'a> AgentTemplate<'a> {
    pub fn from_config(config: &'a Config, tools: &'a ToolSet) -> Self {
        Self {
            agent_id: config.agent_id.as_deref(),
            model: &config.model,
            name: &config.agent_name,
            instructions: &config.instructions,
            tools,
        }
    }
}

/// The agent a run will use.
#[derive(Debug, Clone)]
pub struct ResolvedAgent {
    pub agent: Agent,

    /// Whether the agent was created by this call
    pub created: bool,

    /// Reused agent whose tool types differ from the configured tool set.
    /// Never reconciled; only reported.
    pub stale_tools: bool,
}

impl ResolvedAgent {
    pub fn id(&self) -> &str {
        &self.agent.id
    }
}

/// Reuse the agent named by `template.agent_id`, or create one when no id is
/// configured.
///
/// Lookup and creation failures are returned as-is. An unknown id is an
/// error, never a reason to create a replacement agent.
pub async fn resolve_agent<A, W>(
    api: &A,
    template: &AgentTemplate<'_>,
    out: &mut W,
) -> Result<ResolvedAgent, AgentError>
where
    A: AgentsApi + ?Sized,
    W: Write,
{
    if let Some(agent_id) = template.agent_id {
        let agent = traced_call("agents.get", api.get_agent(agent_id)).await?;
        writeln!(out, "Using existing agent, ID: {}", agent.id)?;

        let stale_tools = tools_differ(&agent.tools, template.tools);
        if stale_tools {
            tracing::warn!(
                agent_id = %agent.id,
                existing = ?tool_kinds(&agent.tools),
                configured = ?template.tools.kinds(),
                "Existing agent's tools differ from the configured tool set; \
                 they are not updated"
            );
        }
        return Ok(ResolvedAgent {
            agent,
            created: false,
            stale_tools,
        });
    }

    let request = CreateAgentRequest {
        model: template.model.to_string(),
        name: template.name.to_string(),
        instructions: build_instructions(template.instructions, template.tools),
        tools: template.tools.definitions(),
        tool_resources: template.tools.agent_resources(),
    };
    let agent = traced_call("agents.create", api.create_agent(&request)).await?;
    writeln!(out, "Created agent, ID: {}", agent.id)?;
    tracing::info!(agent_id = %agent.id, model = %agent.model, "Agent created");

    Ok(ResolvedAgent {
        agent,
        created: true,
        stale_tools: false,
    })
}

fn tool_kinds(tools: &[ToolDefinition]) -> BTreeSet<&'static str> {
    tools.iter().map(ToolDefinition::kind).collect()
}

fn tools_differ(existing: &[ToolDefinition], configured: &ToolSet) -> bool {
    tool_kinds(existing) != configured.kinds()
}
