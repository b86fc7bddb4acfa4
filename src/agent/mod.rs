//! Agent module - one conversation with a weather agent.
//!
//! A session runs in four stages:
//! 1. Resolve the agent (reuse by id, otherwise create it with the tool set)
//! 2. Post the user prompt to a new thread and start a run
//! 3. Poll the run, approving MCP tool calls when it pauses for them
//! 4. Print the run steps and the conversation

mod approval;
mod driver;
pub mod prompt;
mod report;
mod resolver;

use std::io::Write;

use thiserror::Error;
use tracing::{field, Instrument};

use crate::api::{AgentsApi, ApiError};
use crate::config::Config;
use crate::tools::ToolSet;

pub use approval::{
    approve_tool_call, build_batch, submit_approvals, ApprovalBatch, ApprovalError,
};
pub use driver::{ConversationDriver, RunOutcome};
pub use prompt::build_instructions;
pub use report::{report_run, ReportSummary};
pub use resolver::{resolve_agent, AgentTemplate, ResolvedAgent};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// Everything one session produced.
#[derive(Debug, Clone)]
pub struct Session {
    pub agent: ResolvedAgent,
    pub outcome: RunOutcome,
    pub report: ReportSummary,
}

/// Run the configured prompt against the configured agent and report the result.
///
/// Returns `Ok` for every run that reached a terminal state, including
/// failed ones; only service and output errors are `Err`.
pub async fn run_weather_agent<A, W>(
    api: &A,
    config: &Config,
    tools: &ToolSet,
    out: &mut W,
) -> Result<Session, AgentError>
where
    A: AgentsApi + ?Sized,
    W: Write,
{
    let agent = resolve_agent(api, &AgentTemplate::from_config(config, tools), out).await?;

    let span = tracing::info_span!(
        "weather_agent.run",
        weather.agent_id = %agent.id(),
        weather.model_deployment = %config.model,
        weather.user_prompt = field::Empty,
        weather.run.status = field::Empty,
    );
    let driver = ConversationDriver::new(api, tools, config.poll_interval)
        .with_step_tracing(config.trace_run_steps);
    let outcome = driver
        .run(agent.id(), &config.user_prompt, out)
        .instrument(span)
        .await?;

    let report = report_run(api, &outcome.thread_id, &outcome.run.id, out).await?;

    Ok(Session {
        agent,
        outcome,
        report,
    })
}
