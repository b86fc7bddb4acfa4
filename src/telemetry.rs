//! Logging and trace export.
//!
//! Log records go to stderr through a `fmt` layer filtered by `RUST_LOG` or
//! `LOG_LEVEL`. When an OTLP endpoint is configured, spans from this crate
//! are also exported through OpenTelemetry. Export setup failures only
//! disable the exporter; they never stop the run.

use std::future::Future;

use opentelemetry_otlp::WithExportConfig;
use thiserror::Error;
use tracing::field;
use tracing::{Instrument, Level};
use tracing_subscriber::filter::Targets;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::api::types::{Agent, AgentThread, RunStep, ThreadMessage, ThreadRun};
use crate::api::ApiError;
use crate::config::TelemetryConfig;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("OpenTelemetry setup failed: {0}")]
    OpenTelemetry(String),

    #[error("Failed to install tracing subscriber: {0}")]
    Subscriber(String),
}

/// Flushes exported spans when dropped.
#[derive(Debug)]
pub struct TelemetryGuard {
    export_enabled: bool,
}

impl TelemetryGuard {
    pub fn export_enabled(&self) -> bool {
        self.export_enabled
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if self.export_enabled {
            opentelemetry::global::shutdown_tracer_provider();
        }
    }
}

fn log_filter(config: &TelemetryConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("error"))
}

fn build_tracer(
    endpoint: &str,
    service_name: &str,
) -> Result<opentelemetry_sdk::trace::Tracer, TelemetryError> {
    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint),
        )
        .with_trace_config(opentelemetry_sdk::trace::config().with_resource(
            opentelemetry_sdk::Resource::new(vec![opentelemetry::KeyValue::new(
                "service.name",
                service_name.to_string(),
            )]),
        ))
        .install_batch(opentelemetry_sdk::runtime::Tokio)
        .map_err(|e| TelemetryError::OpenTelemetry(e.to_string()))
}

/// Span export setup. Never fails: a setup error leaves export disabled and
/// is kept so it can be logged once a subscriber exists.
pub struct SpanExport {
    tracer: Option<opentelemetry_sdk::trace::Tracer>,
    setup_error: Option<TelemetryError>,
}

impl SpanExport {
    pub fn from_config(config: &TelemetryConfig) -> Self {
        match config.otlp_endpoint.as_deref() {
            Some(endpoint) => match build_tracer(endpoint, &config.service_name) {
                Ok(tracer) => Self {
                    tracer: Some(tracer),
                    setup_error: None,
                },
                Err(e) => Self {
                    tracer: None,
                    setup_error: Some(e),
                },
            },
            None => Self {
                tracer: None,
                setup_error: None,
            },
        }
    }

    pub fn enabled(&self) -> bool {
        self.tracer.is_some()
    }

    pub fn setup_error(&self) -> Option<&TelemetryError> {
        self.setup_error.as_ref()
    }
}

/// Install the global subscriber.
///
/// Must be called from inside a tokio runtime when span export is enabled.
/// Only a failure to install the subscriber itself is an error.
pub fn init(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let SpanExport {
        tracer,
        setup_error,
    } = SpanExport::from_config(config);
    let export_enabled = tracer.is_some();

    // Spans are exported regardless of the log level.
    let otel_layer = tracer.map(|tracer| {
        tracing_opentelemetry::layer()
            .with_tracer(tracer)
            .with_filter(Targets::new().with_target("weather_agent", Level::INFO))
    });

    let text_layer = (!config.json_logs).then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(log_filter(config))
    });
    let json_layer = config.json_logs.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(log_filter(config))
    });

    tracing_subscriber::registry()
        .with(otel_layer)
        .with(text_layer)
        .with(json_layer)
        .try_init()
        .map_err(|e| TelemetryError::Subscriber(e.to_string()))?;

    match (&config.otlp_endpoint, setup_error) {
        (_, Some(e)) => {
            tracing::error!(error = %e, "Failed to configure span export, continuing without it")
        }
        (Some(endpoint), None) => tracing::info!(endpoint = %endpoint, "Span export configured"),
        (None, None) => {
            tracing::warn!("OTEL_EXPORTER_OTLP_ENDPOINT not set. Span export disabled.")
        }
    }

    Ok(TelemetryGuard { export_enabled })
}

// ─────────────────────────────────────────────────────────────────────────────
// Traced remote calls
// ─────────────────────────────────────────────────────────────────────────────

/// Accessor from a result type to a string span value.
pub type FieldAccessor<T> = fn(&T) -> String;

/// Span fields recorded from a successful remote call.
///
/// Each entry names one of the fields declared on the `agents_call` span
/// (`result.id`, `result.status`, `result.role`, `result.count`).
pub trait TracedResult: Sized + 'static {
    const FIELDS: &'static [(&'static str, FieldAccessor<Self>)];
}

impl TracedResult for Agent {
    const FIELDS: &'static [(&'static str, FieldAccessor<Self>)] =
        &[("result.id", |a: &Agent| a.id.clone())];
}

impl TracedResult for AgentThread {
    const FIELDS: &'static [(&'static str, FieldAccessor<Self>)] =
        &[("result.id", |t: &AgentThread| t.id.clone())];
}

impl TracedResult for ThreadMessage {
    const FIELDS: &'static [(&'static str, FieldAccessor<Self>)] = &[
        ("result.id", |m: &ThreadMessage| m.id.clone()),
        ("result.role", |m: &ThreadMessage| m.role.to_string()),
    ];
}

impl TracedResult for ThreadRun {
    const FIELDS: &'static [(&'static str, FieldAccessor<Self>)] = &[
        ("result.id", |r: &ThreadRun| r.id.clone()),
        ("result.status", |r: &ThreadRun| r.status.to_string()),
    ];
}

impl TracedResult for Vec<RunStep> {
    const FIELDS: &'static [(&'static str, FieldAccessor<Self>)] =
        &[("result.count", |v: &Vec<RunStep>| v.len().to_string())];
}

impl TracedResult for Vec<ThreadMessage> {
    const FIELDS: &'static [(&'static str, FieldAccessor<Self>)] =
        &[("result.count", |v: &Vec<ThreadMessage>| v.len().to_string())];
}

/// Run a remote call inside its own span and record identifying result fields.
pub async fn traced_call<T, F>(operation: &'static str, call: F) -> Result<T, ApiError>
where
    T: TracedResult,
    F: Future<Output = Result<T, ApiError>>,
{
    let span = tracing::info_span!(
        "agents_call",
        otel.name = operation,
        agents.operation = operation,
        result.id = field::Empty,
        result.status = field::Empty,
        result.role = field::Empty,
        result.count = field::Empty,
        error = field::Empty,
    );

    let result = call.instrument(span.clone()).await;
    match &result {
        Ok(value) => {
            for (name, accessor) in T::FIELDS {
                span.record(*name, accessor(value).as_str());
            }
        }
        Err(e) => {
            span.record("error", e.to_string().as_str());
            tracing::debug!(parent: &span, operation, error = %e, "Agents call failed");
        }
    }
    result
}

/// Truncate `s` to at most `max_chars` characters, on a char boundary.
pub fn preview(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{MessageRole, RunStatus};

    #[test]
    fn preview_respects_char_boundaries() {
        assert_eq!(preview("hello", 10), "hello");
        assert_eq!(preview("hello", 3), "hel");
        assert_eq!(preview("❄️snow", 1), "❄");
        assert_eq!(preview("", 5), "");
    }

    #[test]
    fn run_fields_record_id_and_status() {
        let run = ThreadRun {
            id: "run_1".to_string(),
            thread_id: "thread_1".to_string(),
            assistant_id: None,
            status: RunStatus::RequiresAction,
            required_action: None,
            last_error: None,
        };
        let recorded: Vec<_> = ThreadRun::FIELDS
            .iter()
            .map(|(name, accessor)| (*name, accessor(&run)))
            .collect();
        assert_eq!(
            recorded,
            vec![
                ("result.id", "run_1".to_string()),
                ("result.status", "requires_action".to_string())
            ]
        );
    }

    #[test]
    fn message_fields_include_role() {
        let message = ThreadMessage {
            id: "msg_1".to_string(),
            thread_id: None,
            role: MessageRole::Assistant,
            content: Vec::new(),
            created_at: None,
        };
        let role = ThreadMessage::FIELDS
            .iter()
            .find(|(name, _)| *name == "result.role")
            .map(|(_, accessor)| accessor(&message));
        assert_eq!(role.as_deref(), Some("assistant"));
    }

    #[tokio::test]
    async fn traced_call_passes_errors_through() {
        let result: Result<Vec<ThreadMessage>, ApiError> = traced_call("messages.list", async {
            Err(ApiError::Status {
                status: 500,
                body: "boom".to_string(),
            })
        })
        .await;
        assert!(matches!(result, Err(ApiError::Status { status: 500, .. })));
    }

    #[tokio::test]
    async fn unusable_otlp_endpoint_disables_export_without_failing() {
        let config = TelemetryConfig {
            otlp_endpoint: Some("not a valid endpoint".to_string()),
            ..TelemetryConfig::default()
        };

        let export = SpanExport::from_config(&config);

        assert!(!export.enabled());
        assert!(matches!(
            export.setup_error(),
            Some(TelemetryError::OpenTelemetry(_))
        ));
    }

    #[test]
    fn export_is_off_without_an_endpoint() {
        let export = SpanExport::from_config(&TelemetryConfig::default());

        assert!(!export.enabled());
        assert!(export.setup_error().is_none());
    }
}
