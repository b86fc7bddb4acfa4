//! In-memory [`AgentsApi`] for tests.
//!
//! `get_run` replays a scripted sequence of runs; every call is recorded so
//! tests can assert on exactly which operations were issued.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use super::types::{
    Agent, AgentThread, CreateAgentRequest, CreateMessageRequest, CreateRunRequest, ListOrder,
    MessageContent, MessageRole, MessageText, RequiredAction, RequiredToolCall, RunError,
    RunStatus, RunStep, SubmitToolApprovalDetails, ThreadMessage, ThreadRun, ToolApproval,
    ToolCallType,
};
use super::{AgentsApi, ApiError};

pub(crate) const THREAD_ID: &str = "thread_1";
pub(crate) const RUN_ID: &str = "run_1";

#[derive(Default)]
struct FakeState {
    agents: HashMap<String, Agent>,
    run_script: VecDeque<ThreadRun>,
    steps: Vec<RunStep>,
    messages: Vec<ThreadMessage>,
    calls: Vec<&'static str>,
    created_agents: Vec<CreateAgentRequest>,
    created_runs: Vec<CreateRunRequest>,
    approval_batches: Vec<Vec<ToolApproval>>,
    get_agent_status: Option<u16>,
    /// (status, remaining) for failing `list_run_steps` calls
    list_steps_failures: Option<(u16, usize)>,
    next_id: usize,
}

#[derive(Default)]
pub(crate) struct FakeAgentsApi {
    state: Mutex<FakeState>,
}

impl FakeAgentsApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_agent(self, agent: Agent) -> Self {
        self.lock().agents.insert(agent.id.clone(), agent);
        self
    }

    /// Make every `get_agent` call fail with `status`.
    pub(crate) fn with_get_agent_status(self, status: u16) -> Self {
        self.lock().get_agent_status = Some(status);
        self
    }

    /// Make the next `times` calls to `list_run_steps` fail with `status`.
    pub(crate) fn with_failing_step_lists(self, status: u16, times: usize) -> Self {
        self.lock().list_steps_failures = Some((status, times));
        self
    }

    /// Runs returned by successive `get_run` calls.
    pub(crate) fn with_run_script(self, runs: impl IntoIterator<Item = ThreadRun>) -> Self {
        self.lock().run_script.extend(runs);
        self
    }

    pub(crate) fn with_steps(self, steps: Vec<RunStep>) -> Self {
        self.lock().steps = steps;
        self
    }

    /// Messages already on the thread, after the user message.
    pub(crate) fn with_reply(self, text: &str) -> Self {
        {
            let mut state = self.lock();
            let created_at = 100 + state.messages.len() as i64;
            let reply = text_message("msg_reply", MessageRole::Assistant, text, created_at);
            state.messages.push(reply);
        }
        self
    }

    pub(crate) fn with_message(self, message: ThreadMessage) -> Self {
        self.lock().messages.push(message);
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.lock().calls.clone()
    }

    pub(crate) fn count(&self, operation: &str) -> usize {
        self.lock().calls.iter().filter(|c| **c == operation).count()
    }

    pub(crate) fn approval_batches(&self) -> Vec<Vec<ToolApproval>> {
        self.lock().approval_batches.clone()
    }

    pub(crate) fn created_agents(&self) -> Vec<CreateAgentRequest> {
        self.lock().created_agents.clone()
    }

    pub(crate) fn created_runs(&self) -> Vec<CreateRunRequest> {
        self.lock().created_runs.clone()
    }
}

pub(crate) fn run(status: RunStatus) -> ThreadRun {
    ThreadRun {
        id: RUN_ID.to_string(),
        thread_id: THREAD_ID.to_string(),
        assistant_id: None,
        status,
        required_action: None,
        last_error: None,
    }
}

pub(crate) fn failed_run(code: &str, message: &str) -> ThreadRun {
    ThreadRun {
        last_error: Some(RunError {
            code: code.to_string(),
            message: message.to_string(),
        }),
        ..run(RunStatus::Failed)
    }
}

pub(crate) fn approval_run(tool_calls: Vec<RequiredToolCall>) -> ThreadRun {
    ThreadRun {
        required_action: Some(RequiredAction::SubmitToolApproval {
            submit_tool_approval: SubmitToolApprovalDetails { tool_calls },
        }),
        ..run(RunStatus::RequiresAction)
    }
}

pub(crate) fn mcp_call(id: &str, name: &str) -> RequiredToolCall {
    RequiredToolCall {
        id: id.to_string(),
        kind: ToolCallType::Mcp,
        name: Some(name.to_string()),
        arguments: Some("{}".to_string()),
        server_label: Some("weather".to_string()),
    }
}

pub(crate) fn agent(id: &str) -> Agent {
    Agent {
        id: id.to_string(),
        name: Some("Weather-agent".to_string()),
        model: "gpt-4o".to_string(),
        instructions: None,
        tools: Vec::new(),
        created_at: None,
    }
}

pub(crate) fn text_message(
    id: &str,
    role: MessageRole,
    text: &str,
    created_at: i64,
) -> ThreadMessage {
    ThreadMessage {
        id: id.to_string(),
        thread_id: Some(THREAD_ID.to_string()),
        role,
        content: vec![MessageContent::Text {
            text: MessageText {
                value: text.to_string(),
            },
        }],
        created_at: Some(created_at),
    }
}

#[async_trait]
impl AgentsApi for FakeAgentsApi {
    async fn get_agent(&self, agent_id: &str) -> Result<Agent, ApiError> {
        let mut state = self.lock();
        state.calls.push("agents.get");
        if let Some(status) = state.get_agent_status {
            return Err(ApiError::Status {
                status,
                body: "scripted failure".to_string(),
            });
        }
        state.agents.get(agent_id).cloned().ok_or(ApiError::Status {
            status: 404,
            body: format!("agent {} not found", agent_id),
        })
    }

    async fn create_agent(&self, request: &CreateAgentRequest) -> Result<Agent, ApiError> {
        let mut state = self.lock();
        state.calls.push("agents.create");
        state.next_id += 1;
        let created = Agent {
            id: format!("asst_new_{}", state.next_id),
            name: Some(request.name.clone()),
            model: request.model.clone(),
            instructions: Some(request.instructions.clone()),
            tools: request.tools.clone(),
            created_at: None,
        };
        state.agents.insert(created.id.clone(), created.clone());
        state.created_agents.push(request.clone());
        Ok(created)
    }

    async fn create_thread(&self) -> Result<AgentThread, ApiError> {
        self.lock().calls.push("threads.create");
        Ok(AgentThread {
            id: THREAD_ID.to_string(),
            created_at: None,
        })
    }

    async fn create_message(
        &self,
        thread_id: &str,
        request: &CreateMessageRequest,
    ) -> Result<ThreadMessage, ApiError> {
        let mut state = self.lock();
        state.calls.push("messages.create");
        let message = text_message("msg_user", request.role, &request.content, 1);
        let message = ThreadMessage {
            thread_id: Some(thread_id.to_string()),
            ..message
        };
        // The user message precedes any scripted reply.
        state.messages.insert(0, message.clone());
        Ok(message)
    }

    async fn create_run(
        &self,
        _thread_id: &str,
        request: &CreateRunRequest,
    ) -> Result<ThreadRun, ApiError> {
        let mut state = self.lock();
        state.calls.push("runs.create");
        state.created_runs.push(request.clone());
        Ok(ThreadRun {
            assistant_id: Some(request.assistant_id.clone()),
            ..run(RunStatus::Queued)
        })
    }

    async fn get_run(&self, _thread_id: &str, _run_id: &str) -> Result<ThreadRun, ApiError> {
        let mut state = self.lock();
        state.calls.push("runs.get");
        state.run_script.pop_front().ok_or(ApiError::Status {
            status: 500,
            body: "run script exhausted".to_string(),
        })
    }

    async fn list_run_steps(
        &self,
        _thread_id: &str,
        _run_id: &str,
    ) -> Result<Vec<RunStep>, ApiError> {
        let mut state = self.lock();
        state.calls.push("run_steps.list");
        if let Some((status, remaining)) = state.list_steps_failures.as_mut() {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(ApiError::Status {
                    status: *status,
                    body: "scripted failure".to_string(),
                });
            }
        }
        Ok(state.steps.clone())
    }

    async fn submit_tool_approvals(
        &self,
        _thread_id: &str,
        _run_id: &str,
        approvals: &[ToolApproval],
    ) -> Result<ThreadRun, ApiError> {
        let mut state = self.lock();
        state.calls.push("runs.submit_tool_outputs");
        state.approval_batches.push(approvals.to_vec());
        Ok(run(RunStatus::InProgress))
    }

    async fn cancel_run(&self, _thread_id: &str, _run_id: &str) -> Result<ThreadRun, ApiError> {
        self.lock().calls.push("runs.cancel");
        Ok(run(RunStatus::Cancelling))
    }

    async fn list_messages(
        &self,
        _thread_id: &str,
        order: ListOrder,
    ) -> Result<Vec<ThreadMessage>, ApiError> {
        let mut state = self.lock();
        state.calls.push("messages.list");
        let mut messages = state.messages.clone();
        messages.sort_by_key(|m| m.created_at);
        if order == ListOrder::Descending {
            messages.reverse();
        }
        Ok(messages)
    }
}
