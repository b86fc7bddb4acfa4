//! Conversation driver: thread, message, run, and the polling loop.
//!
//! ```text
//! queued -> in_progress -> requires_action <-> in_progress -> completed | failed | cancelled | ...
//! ```
//!
//! The loop sleeps a fixed interval before each poll. There is no deadline:
//! a run the service never finishes keeps the loop alive.

use std::io::Write;
use std::time::Duration;

use tracing::Span;

use crate::api::types::{
    CreateMessageRequest, CreateRunRequest, MessageRole, RequiredAction, RunStatus, ThreadRun,
};
use crate::api::AgentsApi;
use crate::telemetry::{preview, traced_call};
use crate::tools::ToolSet;

use super::approval::submit_approvals;
use super::AgentError;

const PROMPT_PREVIEW_CHARS: usize = 500;

/// How a run ended.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub thread_id: String,

    /// The last run state observed
    pub run: ThreadRun,

    /// Number of `get_run` calls made
    pub polls: usize,

    /// Number of approval batches submitted
    pub approval_rounds: usize,

    /// The driver cancelled the run itself
    pub cancelled: bool,
}

impl RunOutcome {
    pub fn status(&self) -> RunStatus {
        self.run.status
    }
}

/// Drives one run of an agent against a fresh thread.
pub struct ConversationDriver<'a, A: AgentsApi + ?Sized> {
    api: &'a A,
    tools: &'a ToolSet,
    poll_interval: Duration,
    trace_run_steps: bool,
}

impl<'a, A: AgentsApi + ?Sized> ConversationDriver<'a, A> {
    pub fn new(api: &'a A, tools: &'a ToolSet, poll_interval: Duration) -> Self {
        Self {
            api,
            tools,
            poll_interval,
            trace_run_steps: false,
        }
    }

    /// Log the run's steps after every poll.
    pub fn with_step_tracing(mut self, enabled: bool) -> Self {
        self.trace_run_steps = enabled;
        self
    }

    /// Post `prompt` to a new thread, run `agent_id` on it and poll until the
    /// run reaches a terminal state.
    ///
    /// A `failed` run is a normal outcome, not an error.
    pub async fn run<W: Write>(
        &self,
        agent_id: &str,
        prompt: &str,
        out: &mut W,
    ) -> Result<RunOutcome, AgentError> {
        let api = self.api;

        let thread = traced_call("threads.create", api.create_thread()).await?;
        writeln!(out, "Created thread, ID: {}", thread.id)?;
        tracing::info!(thread_id = %thread.id, "Thread created");

        let message = traced_call(
            "messages.create",
            api.create_message(
                &thread.id,
                &CreateMessageRequest {
                    role: MessageRole::User,
                    content: prompt.to_string(),
                },
            ),
        )
        .await?;
        writeln!(out, "Created message, ID: {}", message.id)?;
        Span::current().record("weather.user_prompt", preview(prompt, PROMPT_PREVIEW_CHARS));
        tracing::info!(
            thread.id = %thread.id,
            message.id = %message.id,
            prompt.length = prompt.chars().count(),
            "user_prompt"
        );

        let request = CreateRunRequest {
            assistant_id: agent_id.to_string(),
            tool_resources: self.tools.run_resources(),
        };
        let mut run = traced_call("runs.create", api.create_run(&thread.id, &request)).await?;
        writeln!(out, "Created run, ID: {}", run.id)?;
        tracing::info!(run_id = %run.id, thread_id = %thread.id, "Run created");

        let approval_headers = self.tools.approval_headers();
        let mut polls = 0;
        let mut approval_rounds = 0;
        let mut cancelled = false;

        while !run.status.is_terminal() {
            tokio::time::sleep(self.poll_interval).await;
            run = traced_call("runs.get", api.get_run(&thread.id, &run.id)).await?;
            polls += 1;

            if run.status == RunStatus::RequiresAction {
                match &run.required_action {
                    Some(RequiredAction::SubmitToolApproval {
                        submit_tool_approval,
                    }) => {
                        let tool_calls = &submit_tool_approval.tool_calls;
                        if tool_calls.is_empty() {
                            writeln!(out, "No tool calls provided - cancelling run")?;
                            tracing::warn!(
                                run_id = %run.id,
                                "Run cancelled due to missing tool calls"
                            );
                            run = traced_call("runs.cancel", api.cancel_run(&thread.id, &run.id))
                                .await?;
                            cancelled = true;
                            break;
                        }

                        let batch = submit_approvals(
                            api,
                            &thread.id,
                            &run.id,
                            tool_calls,
                            &approval_headers,
                            out,
                        )
                        .await?;
                        writeln!(out, "tool_approvals: {}", batch.approvals.len())?;
                        if !batch.is_empty() {
                            approval_rounds += 1;
                        }
                    }
                    Some(other) => {
                        tracing::warn!(
                            run_id = %run.id,
                            action = ?other,
                            "Run requires an action this client does not handle"
                        );
                    }
                    None => {
                        tracing::warn!(
                            run_id = %run.id,
                            "Run requires action but carries no payload"
                        );
                    }
                }
            }

            writeln!(out, "Current run status: {}", run.status)?;
            tracing::info!(run_id = %run.id, status = %run.status, "Run status");

            if self.trace_run_steps {
                self.trace_steps(&thread.id, &run.id).await;
            }
        }

        writeln!(out, "Run completed with status: {}", run.status)?;
        let span = Span::current();
        span.record("weather.run.status", run.status.as_str());
        tracing::info!(
            run.id = %run.id,
            thread.id = %thread.id,
            status = %run.status,
            failed = run.status == RunStatus::Failed,
            "run_completion"
        );

        if run.status == RunStatus::Failed {
            let error = run
                .last_error
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "unknown error".to_string());
            writeln!(out, "Run failed: {}", error)?;
            tracing::error!(run.id = %run.id, thread.id = %thread.id, error = %error, "run_error");
        }

        Ok(RunOutcome {
            thread_id: thread.id,
            run,
            polls,
            approval_rounds,
            cancelled,
        })
    }

    /// Log the run's steps. Failures are logged and never end the run.
    async fn trace_steps(&self, thread_id: &str, run_id: &str) {
        let steps =
            match traced_call("run_steps.list", self.api.list_run_steps(thread_id, run_id)).await {
                Ok(steps) => steps,
                Err(e) => {
                    tracing::warn!(run_id, error = %e, "Failed to list run steps for tracing");
                    return;
                }
            };
        for step in &steps {
            tracing::debug!(
                run_id,
                step_id = %step.id,
                step_type = %step.kind,
                status = %step.status,
                tool_calls = step.tool_calls().len(),
                "Run step"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{approval_run, failed_run, mcp_call, run, FakeAgentsApi};
    use crate::api::types::{RequiredAction, SubmitToolOutputsDetails};
    use crate::tools::McpTool;

    fn weather_tools() -> ToolSet {
        ToolSet::new().with_mcp(
            McpTool::new("weather", "https://mcp.example/sse").with_header("x-api-key", "secret"),
        )
    }

    async fn drive(api: &FakeAgentsApi, tools: &ToolSet) -> (RunOutcome, String) {
        let driver = ConversationDriver::new(api, tools, Duration::ZERO);
        let mut out = Vec::new();
        let outcome = driver.run("asst_1", "What should I wear?", &mut out).await.unwrap();
        (outcome, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn non_terminal_statuses_are_polled_until_completion() {
        let api = FakeAgentsApi::new().with_run_script([
            run(RunStatus::Queued),
            run(RunStatus::InProgress),
            run(RunStatus::InProgress),
            run(RunStatus::Completed),
        ]);
        let tools = ToolSet::new();

        let (outcome, output) = drive(&api, &tools).await;

        assert_eq!(outcome.status(), RunStatus::Completed);
        assert_eq!(outcome.polls, 4);
        assert_eq!(api.count("runs.get"), 4);
        assert!(!outcome.cancelled);
        assert!(output.contains("Run completed with status: completed"));
    }

    #[tokio::test]
    async fn each_terminal_status_ends_the_loop_after_one_poll() {
        for terminal in [
            RunStatus::Completed,
            RunStatus::Failed,
            RunStatus::Cancelled,
            RunStatus::Expired,
            RunStatus::Incomplete,
        ] {
            // A second scripted run would be returned if the loop kept going.
            let api = FakeAgentsApi::new()
                .with_run_script([run(terminal), run(RunStatus::InProgress)]);
            let tools = ToolSet::new();

            let (outcome, _) = drive(&api, &tools).await;

            assert_eq!(outcome.status(), terminal);
            assert_eq!(api.count("runs.get"), 1, "{terminal} polled more than once");
        }
    }

    #[tokio::test]
    async fn empty_approval_request_cancels_once_and_exits() {
        let api = FakeAgentsApi::new().with_run_script([
            run(RunStatus::InProgress),
            approval_run(Vec::new()),
            run(RunStatus::InProgress),
        ]);
        let tools = weather_tools();

        let (outcome, output) = drive(&api, &tools).await;

        assert!(outcome.cancelled);
        assert_eq!(api.count("runs.cancel"), 1);
        assert_eq!(api.count("runs.submit_tool_outputs"), 0);
        assert_eq!(api.count("runs.get"), 2);
        assert_eq!(outcome.status(), RunStatus::Cancelling);
        assert!(output.contains("No tool calls provided - cancelling run"));
    }

    #[tokio::test]
    async fn approvals_submitted_once_per_round_with_headers() {
        let api = FakeAgentsApi::new().with_run_script([
            approval_run(vec![
                mcp_call("call_1", "get_alerts"),
                mcp_call("call_2", "get_forecast"),
            ]),
            run(RunStatus::InProgress),
            approval_run(vec![mcp_call("call_3", "get_forecast")]),
            run(RunStatus::Completed),
        ]);
        let tools = weather_tools();

        let (outcome, _) = drive(&api, &tools).await;

        assert_eq!(outcome.status(), RunStatus::Completed);
        assert_eq!(outcome.approval_rounds, 2);
        let batches = api.approval_batches();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].len(), 2);
        assert_eq!(batches[1].len(), 1);
        for approval in batches.iter().flatten() {
            assert!(approval.approve);
            assert_eq!(
                approval.headers.get("x-api-key").map(String::as_str),
                Some("secret")
            );
        }
    }

    #[tokio::test]
    async fn run_is_created_with_mcp_resources() {
        let api = FakeAgentsApi::new().with_run_script([run(RunStatus::Completed)]);
        let tools = weather_tools();

        drive(&api, &tools).await;

        let runs = api.created_runs();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].assistant_id, "asst_1");
        assert_eq!(runs[0].tool_resources, tools.run_resources());
        assert_eq!(
            &api.calls()[..3],
            &["threads.create", "messages.create", "runs.create"]
        );
    }

    #[tokio::test]
    async fn failed_run_is_an_outcome_not_an_error() {
        let api = FakeAgentsApi::new().with_run_script([
            run(RunStatus::InProgress),
            failed_run("server_error", "MCP server unreachable"),
        ]);
        let tools = ToolSet::new();

        let (outcome, output) = drive(&api, &tools).await;

        assert_eq!(outcome.status(), RunStatus::Failed);
        assert!(output.contains("Run failed: server_error: MCP server unreachable"));
    }

    #[tokio::test]
    async fn unhandled_action_is_polled_again() {
        let outputs_run = ThreadRun {
            required_action: Some(RequiredAction::SubmitToolOutputs {
                submit_tool_outputs: SubmitToolOutputsDetails::default(),
            }),
            ..run(RunStatus::RequiresAction)
        };
        let api = FakeAgentsApi::new().with_run_script([outputs_run, run(RunStatus::Completed)]);
        let tools = ToolSet::new();

        let (outcome, _) = drive(&api, &tools).await;

        assert_eq!(outcome.status(), RunStatus::Completed);
        assert_eq!(api.count("runs.cancel"), 0);
        assert_eq!(api.count("runs.submit_tool_outputs"), 0);
    }

    #[tokio::test]
    async fn step_tracing_lists_steps_after_every_poll() {
        let api = FakeAgentsApi::new()
            .with_run_script([run(RunStatus::InProgress), run(RunStatus::Completed)]);
        let tools = ToolSet::new();
        let driver = ConversationDriver::new(&api, &tools, Duration::ZERO).with_step_tracing(true);
        let mut out = Vec::new();

        driver.run("asst_1", "hi", &mut out).await.unwrap();

        assert_eq!(api.count("run_steps.list"), 2);
    }

    #[tokio::test]
    async fn step_tracing_failure_is_logged_and_polling_continues() {
        let api = FakeAgentsApi::new()
            .with_run_script([run(RunStatus::InProgress), run(RunStatus::Completed)])
            .with_failing_step_lists(503, 2);
        let tools = ToolSet::new();
        let driver = ConversationDriver::new(&api, &tools, Duration::ZERO).with_step_tracing(true);
        let mut out = Vec::new();

        let outcome = driver.run("asst_1", "hi", &mut out).await.unwrap();

        assert_eq!(outcome.status(), RunStatus::Completed);
        assert_eq!(outcome.polls, 2);
        assert_eq!(api.count("run_steps.list"), 2);
    }
}
