//! Client side of the hosted agents service.
//!
//! `AgentsApi` is the seam between the orchestration logic and the remote
//! service. `AgentsClient` implements it over HTTP; tests substitute an
//! in-memory fake.

pub mod client;
pub mod types;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use thiserror::Error;

pub use client::AgentsClient;

use types::{
    Agent, AgentThread, CreateAgentRequest, CreateMessageRequest, CreateRunRequest, ListOrder,
    RunStep, ThreadMessage, ThreadRun, ToolApproval,
};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode response from {operation}: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Operations consumed from the remote agents service.
#[async_trait]
pub trait AgentsApi: Send + Sync {
    async fn get_agent(&self, agent_id: &str) -> Result<Agent, ApiError>;

    async fn create_agent(&self, request: &CreateAgentRequest) -> Result<Agent, ApiError>;

    async fn create_thread(&self) -> Result<AgentThread, ApiError>;

    async fn create_message(
        &self,
        thread_id: &str,
        request: &CreateMessageRequest,
    ) -> Result<ThreadMessage, ApiError>;

    async fn create_run(
        &self,
        thread_id: &str,
        request: &CreateRunRequest,
    ) -> Result<ThreadRun, ApiError>;

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<ThreadRun, ApiError>;

    /// All steps of a run, oldest first.
    async fn list_run_steps(&self, thread_id: &str, run_id: &str)
        -> Result<Vec<RunStep>, ApiError>;

    async fn submit_tool_approvals(
        &self,
        thread_id: &str,
        run_id: &str,
        approvals: &[ToolApproval],
    ) -> Result<ThreadRun, ApiError>;

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<ThreadRun, ApiError>;

    /// All messages of a thread in the requested order.
    async fn list_messages(
        &self,
        thread_id: &str,
        order: ListOrder,
    ) -> Result<Vec<ThreadMessage>, ApiError>;
}
