//! Wire types for the hosted agents REST API.
//!
//! Only the fields this client reads or writes are modelled. Unknown fields
//! are ignored and unknown enum values land in a catch-all variant so a newer
//! service version never breaks deserialization.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Agents and tools
// ─────────────────────────────────────────────────────────────────────────────

/// A remotely hosted, configured assistant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Agent {
    /// Stable service-assigned identifier
    pub id: String,

    /// Display name
    #[serde(default)]
    pub name: Option<String>,

    /// Model deployment the agent is bound to
    #[serde(default)]
    pub model: String,

    /// System instructions
    #[serde(default)]
    pub instructions: Option<String>,

    /// Tools attached at creation time
    #[serde(default)]
    pub tools: Vec<ToolDefinition>,

    /// Creation time (unix seconds)
    #[serde(default)]
    pub created_at: Option<i64>,
}

/// A tool attached to an agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolDefinition {
    /// Remote MCP server exposing callable operations.
    Mcp {
        server_label: String,
        server_url: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        allowed_tools: Vec<String>,
    },
    /// Retrieval over the vector stores named in the agent's tool resources.
    FileSearch,
    /// Another agent invoked as a tool.
    ConnectedAgent { connected_agent: ConnectedAgentDetails },
    /// Any tool type this client does not model.
    #[serde(other)]
    Other,
}

impl ToolDefinition {
    /// Short type tag, used when comparing tool sets.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Mcp { .. } => "mcp",
            Self::FileSearch => "file_search",
            Self::ConnectedAgent { .. } => "connected_agent",
            Self::Other => "other",
        }
    }
}

/// Target of a connected-agent tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectedAgentDetails {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// Per-tool resources sent alongside tool definitions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ToolResources {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_search: Option<FileSearchResources>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mcp: Vec<McpToolResource>,
}

impl ToolResources {
    pub fn is_empty(&self) -> bool {
        self.file_search.is_none() && self.mcp.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileSearchResources {
    pub vector_store_ids: Vec<String>,
}

/// Run-time settings for one MCP server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct McpToolResource {
    pub server_label: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    pub require_approval: ApprovalMode,
}

/// Whether the service pauses the run for approval before calling an MCP tool.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalMode {
    Always,
    Never,
}

/// Request body for `POST /assistants`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateAgentRequest {
    pub model: String,
    pub name: String,
    pub instructions: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_resources: Option<ToolResources>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Threads and messages
// ─────────────────────────────────────────────────────────────────────────────

/// Conversation container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentThread {
    pub id: String,

    #[serde(default)]
    pub created_at: Option<i64>,
}

/// Author of a message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    #[serde(other)]
    Unknown,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request body for `POST /threads/{thread_id}/messages`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateMessageRequest {
    pub role: MessageRole,
    pub content: String,
}

/// One conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThreadMessage {
    pub id: String,

    #[serde(default)]
    pub thread_id: Option<String>,

    pub role: MessageRole,

    #[serde(default)]
    pub content: Vec<MessageContent>,

    #[serde(default)]
    pub created_at: Option<i64>,
}

impl ThreadMessage {
    /// Text values of all text parts, in order.
    pub fn text_parts(&self) -> impl Iterator<Item = &str> {
        self.content.iter().filter_map(|part| match part {
            MessageContent::Text { text } => Some(text.value.as_str()),
            MessageContent::Other => None,
        })
    }

    /// The last text part, if the message has any.
    pub fn last_text(&self) -> Option<&str> {
        self.text_parts().last()
    }
}

/// A content part of a message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: MessageText },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageText {
    pub value: String,
}

/// Sort order for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOrder {
    Ascending,
    Descending,
}

impl ListOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

/// Envelope returned by every list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,

    #[serde(default)]
    pub has_more: bool,

    #[serde(default)]
    pub last_id: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Runs
// ─────────────────────────────────────────────────────────────────────────────

/// Run status as reported by the service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Run is queued, waiting to start
    Queued,
    /// Run is executing
    InProgress,
    /// Run is paused until the client answers `required_action`
    RequiresAction,
    /// Cancel was requested and is being processed
    Cancelling,
    /// Run finished successfully
    Completed,
    /// Run failed; see `last_error`
    Failed,
    /// Run was cancelled
    Cancelled,
    /// Run timed out on the service side
    Expired,
    /// Run ended early (e.g. token limit)
    Incomplete,
    /// A status this client does not know
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Whether polling should stop.
    ///
    /// Unknown statuses count as terminal so an unexpected value ends the
    /// loop instead of polling forever.
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            Self::Queued | Self::InProgress | Self::RequiresAction | Self::Cancelling
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::RequiresAction => "requires_action",
            Self::Cancelling => "cancelling",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
            Self::Incomplete => "incomplete",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error object attached to a failed run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunError {
    #[serde(default)]
    pub code: String,

    #[serde(default)]
    pub message: String,
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Request body for `POST /threads/{thread_id}/runs`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateRunRequest {
    pub assistant_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_resources: Option<ToolResources>,
}

/// One execution of an agent against a thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThreadRun {
    pub id: String,

    #[serde(default)]
    pub thread_id: String,

    #[serde(default)]
    pub assistant_id: Option<String>,

    pub status: RunStatus,

    #[serde(default)]
    pub required_action: Option<RequiredAction>,

    #[serde(default)]
    pub last_error: Option<RunError>,
}

/// What the service needs from the client before the run can continue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequiredAction {
    /// Approve or deny pending MCP tool calls.
    SubmitToolApproval {
        submit_tool_approval: SubmitToolApprovalDetails,
    },
    /// Supply outputs for client-side function tools.
    SubmitToolOutputs {
        submit_tool_outputs: SubmitToolOutputsDetails,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SubmitToolApprovalDetails {
    #[serde(default)]
    pub tool_calls: Vec<RequiredToolCall>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SubmitToolOutputsDetails {
    #[serde(default)]
    pub tool_calls: Vec<serde_json::Value>,
}

/// Kind of a pending tool call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallType {
    Mcp,
    Function,
    #[serde(other)]
    Other,
}

impl fmt::Display for ToolCallType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mcp => f.write_str("mcp"),
            Self::Function => f.write_str("function"),
            Self::Other => f.write_str("other"),
        }
    }
}

/// A tool invocation the agent wants the service to make.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequiredToolCall {
    #[serde(default)]
    pub id: String,

    #[serde(rename = "type")]
    pub kind: ToolCallType,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub arguments: Option<String>,

    #[serde(default)]
    pub server_label: Option<String>,
}

/// Local decision to allow (or deny) one tool call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolApproval {
    pub tool_call_id: String,
    pub approve: bool,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

/// Request body for `POST .../submit_tool_outputs` in approval form.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitToolApprovalsRequest {
    pub tool_approvals: Vec<ToolApproval>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Run steps
// ─────────────────────────────────────────────────────────────────────────────

/// One step the service took while executing a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunStep {
    pub id: String,

    #[serde(default)]
    pub status: String,

    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default)]
    pub step_details: Option<RunStepDetails>,
}

impl RunStep {
    pub fn tool_calls(&self) -> &[RunStepToolCall] {
        self.step_details
            .as_ref()
            .map(|d| d.tool_calls.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RunStepDetails {
    #[serde(default)]
    pub tool_calls: Vec<RunStepToolCall>,
}

/// A tool call recorded in a run step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunStepToolCall {
    #[serde(default)]
    pub id: String,

    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default)]
    pub name: Option<String>,
}
