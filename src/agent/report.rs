//! Print the run steps and the conversation once a run has ended.

use std::io::Write;

use chrono::{DateTime, Utc};

use crate::api::types::ListOrder;
use crate::api::AgentsApi;
use crate::telemetry::{preview, traced_call};

use super::AgentError;

const MESSAGE_PREVIEW_CHARS: usize = 300;
const SEPARATOR_WIDTH: usize = 50;

/// Counts of what was reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSummary {
    pub steps: usize,
    pub tool_calls: usize,

    /// Messages with at least one text part
    pub messages_printed: usize,
}

/// Write every step of the run and every text message of the thread, oldest first.
pub async fn report_run<A, W>(
    api: &A,
    thread_id: &str,
    run_id: &str,
    out: &mut W,
) -> Result<ReportSummary, AgentError>
where
    A: AgentsApi + ?Sized,
    W: Write,
{
    let mut summary = ReportSummary::default();

    let steps = traced_call("run_steps.list", api.list_run_steps(thread_id, run_id)).await?;
    summary.steps = steps.len();

    for step in &steps {
        writeln!(out, "Step {} status: {}", step.id, step.status)?;

        let tool_calls = step.tool_calls();
        if !tool_calls.is_empty() {
            writeln!(out, "  Tool calls:")?;
            for call in tool_calls {
                writeln!(out, "    Tool Call ID: {}", call.id)?;
                writeln!(out, "    Type: {}", call.kind)?;
                if let Some(name) = &call.name {
                    writeln!(out, "    Name: {}", name)?;
                }
                tracing::info!(
                    run_id,
                    step_id = %step.id,
                    tool_call_id = %call.id,
                    tool_type = %call.kind,
                    "Tool call recorded"
                );
            }
            summary.tool_calls += tool_calls.len();
        }

        writeln!(out)?;
    }

    let messages = traced_call(
        "messages.list",
        api.list_messages(thread_id, ListOrder::Ascending),
    )
    .await?;

    writeln!(out, "\nConversation:")?;
    writeln!(out, "{}", "-".repeat(SEPARATOR_WIDTH))?;
    for message in &messages {
        let Some(text) = message.last_text() else {
            continue;
        };
        writeln!(out, "{}: {}", message.role.as_str().to_uppercase(), text)?;
        writeln!(out, "{}", "-".repeat(SEPARATOR_WIDTH))?;
        summary.messages_printed += 1;

        let created = message
            .created_at
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .map(|t| t.to_rfc3339())
            .unwrap_or_default();
        tracing::info!(
            role = %message.role,
            message_id = %message.id,
            created = %created,
            content_preview = %preview(text, MESSAGE_PREVIEW_CHARS),
            "Conversation message"
        );
    }

    Ok(summary)
}
