//! Tool-approval handling for runs paused on `submit_tool_approval`.
//!
//! Every MCP call is approved unconditionally; the allow-list configured on
//! the agent is the only policy. Building an approval can still fail for a
//! single call (no id, or a header the HTTP layer would reject), in which
//! case that call is skipped and the rest of the batch goes through.

use std::collections::BTreeMap;
use std::io::Write;

use reqwest::header::{HeaderName, HeaderValue};
use thiserror::Error;

use crate::api::types::{RequiredToolCall, ToolApproval, ToolCallType};
use crate::api::AgentsApi;
use crate::telemetry::traced_call;

use super::AgentError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApprovalError {
    #[error("tool call has no id")]
    MissingCallId,

    #[error("invalid approval header {name}")]
    InvalidHeader { name: String },
}

/// Result of one approval round.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApprovalBatch {
    pub approvals: Vec<ToolApproval>,

    /// (tool call id, reason) for every call that could not be approved
    pub failures: Vec<(String, ApprovalError)>,

    /// Calls that are not MCP calls and were left alone
    pub skipped: usize,
}

impl ApprovalBatch {
    pub fn is_empty(&self) -> bool {
        self.approvals.is_empty()
    }
}

/// Build the approval for a single MCP call.
pub fn approve_tool_call(
    call: &RequiredToolCall,
    headers: &BTreeMap<String, String>,
) -> Result<ToolApproval, ApprovalError> {
    if call.id.trim().is_empty() {
        return Err(ApprovalError::MissingCallId);
    }

    for (name, value) in headers {
        let invalid = || ApprovalError::InvalidHeader { name: name.clone() };
        HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
        HeaderValue::from_str(value).map_err(|_| invalid())?;
    }

    Ok(ToolApproval {
        tool_call_id: call.id.clone(),
        approve: true,
        headers: headers.clone(),
    })
}

/// Build approvals for every MCP call, collecting per-call failures.
pub fn build_batch(
    tool_calls: &[RequiredToolCall],
    headers: &BTreeMap<String, String>,
) -> ApprovalBatch {
    let mut batch = ApprovalBatch::default();
    for call in tool_calls {
        if call.kind != ToolCallType::Mcp {
            batch.skipped += 1;
            continue;
        }
        match approve_tool_call(call, headers) {
            Ok(approval) => batch.approvals.push(approval),
            Err(e) => batch.failures.push((call.id.clone(), e)),
        }
    }
    batch
}

/// Approve the pending calls of one run and submit them in a single request.
///
/// Nothing is submitted when no approval could be built.
pub async fn submit_approvals<A, W>(
    api: &A,
    thread_id: &str,
    run_id: &str,
    tool_calls: &[RequiredToolCall],
    headers: &BTreeMap<String, String>,
    out: &mut W,
) -> Result<ApprovalBatch, AgentError>
where
    A: AgentsApi + ?Sized,
    W: Write,
{
    let batch = build_batch(tool_calls, headers);

    for approval in &batch.approvals {
        let call = tool_calls
            .iter()
            .find(|c| c.id == approval.tool_call_id);
        let tool_type = call.map(|c| c.kind.to_string()).unwrap_or_else(|| "unknown".to_string());
        let tool_name = call
            .and_then(|c| c.name.as_deref())
            .unwrap_or("unknown");

        writeln!(out, "Approving tool call: {} ({})", approval.tool_call_id, tool_name)?;
        tracing::info!(
            run.id = %run_id,
            thread.id = %thread_id,
            tool.call.id = %approval.tool_call_id,
            tool.kind = %tool_type,
            tool.name = %tool_name,
            approved = true,
            "tool_selection"
        );
    }

    for (call_id, error) in &batch.failures {
        writeln!(out, "Error approving tool_call {}: {}", call_id, error)?;
        tracing::warn!(
            run.id = %run_id,
            thread.id = %thread_id,
            tool.call.id = %call_id,
            error = %error,
            "tool_selection_error"
        );
    }

    if batch.skipped > 0 {
        tracing::debug!(run_id, skipped = batch.skipped, "Ignoring non-MCP tool calls");
    }

    if batch.is_empty() {
        tracing::warn!(run_id, "No tool approvals could be built; nothing submitted this round");
        return Ok(batch);
    }

    traced_call(
        "runs.submit_tool_outputs",
        api.submit_tool_approvals(thread_id, run_id, &batch.approvals),
    )
    .await?;
    tracing::info!(run_id, approvals = batch.approvals.len(), "Submitted tool approvals");

    Ok(batch)
}
