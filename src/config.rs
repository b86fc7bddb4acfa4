//! Configuration management for the weather agent runner.
//!
//! Configuration is read from environment variables, after loading a `.env`
//! file from the working directory when one exists:
//! - `PROJECT_ENDPOINT` - Required. Base URL of the agents project.
//! - `PROJECT_API_KEY` - Required. Bearer token for the agents service.
//! - `PROJECT_API_VERSION` - Optional. `api-version` query value. Defaults to `v1`.
//! - `MODEL_DEPLOYMENT_NAME` - Required. Model used when an agent is created.
//! - `AGENT_ID` - Optional. Reuse an existing agent instead of creating one.
//! - `AGENT_NAME` - Optional. Name of a created agent. Defaults to `Weather-agent`.
//! - `AGENT_INSTRUCTIONS` - Optional. Instructions of a created agent.
//! - `USER_PROMPT` - Optional. The user message sent to the agent.
//! - `MCP_SERVER_URL` / `MCP_SERVER_LABEL` - Optional, set together. Remote MCP server.
//! - `MCP_ALLOWED_TOOLS` - Optional. Comma-separated. Defaults to `get_alerts,get_forecast`.
//! - `MCP_HEADERS` - Optional. Comma-separated `Name:Value` pairs sent with approvals.
//! - `MCP_REQUIRE_APPROVAL` - Optional. `always` or `never`. Defaults to `always`.
//! - `VECTOR_STORE_IDS` - Optional. Comma-separated; attaches a file-search tool.
//! - `CONNECTED_AGENT_ID` - Optional. Attaches a connected sub-agent tool.
//! - `CONNECTED_AGENT_NAME` / `CONNECTED_AGENT_DESCRIPTION` - Optional metadata for it.
//! - `POLL_INTERVAL_SECS` - Optional. Fixed delay between run polls, at least 1. Defaults to `5`.
//! - `HTTP_TIMEOUT_SECS` - Optional. Per-request timeout, at least 1. Defaults to `60`.
//! - `TRACE_RUN_STEPS` - Optional. Log run steps after every poll. Defaults to `false`.
//! - `LOG_LEVEL` - Optional. Log filter when `RUST_LOG` is unset. Defaults to `error`.
//! - `LOG_FORMAT` - Optional. `text` or `json`. Defaults to `text`.
//! - `OTEL_EXPORTER_OTLP_ENDPOINT` - Optional. Enables span export.
//! - `OTEL_SERVICE_NAME` - Optional. Defaults to `weather-agent`.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::{HeaderName, HeaderValue};
use thiserror::Error;

use crate::agent::prompt::{DEFAULT_AGENT_NAME, DEFAULT_INSTRUCTIONS, DEFAULT_USER_PROMPT};
use crate::api::types::ApprovalMode;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Remote MCP server attached to the agent.
#[derive(Debug, Clone, PartialEq)]
pub struct McpServerConfig {
    pub server_label: String,
    pub server_url: String,
    pub allowed_tools: Vec<String>,

    /// Headers forwarded with every approval
    pub headers: BTreeMap<String, String>,

    pub require_approval: ApprovalMode,
}

/// Connected sub-agent exposed as a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectedAgentConfig {
    pub agent_id: String,
    pub name: String,
    pub description: String,
}

/// Log output configuration.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub log_level: String,

    /// Emit JSON log records instead of text
    pub json_logs: bool,

    /// OTLP collector endpoint; `None` disables span export
    pub otlp_endpoint: Option<String>,

    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "error".to_string(),
            json_logs: false,
            otlp_endpoint: None,
            service_name: "weather-agent".to_string(),
        }
    }
}

/// Runner configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Agents project endpoint
    pub project_endpoint: String,

    /// Bearer token for the agents service
    pub api_key: String,

    /// `api-version` query value
    pub api_version: String,

    /// Model deployment used for newly created agents
    pub model: String,

    /// Existing agent to reuse
    pub agent_id: Option<String>,

    pub agent_name: String,

    pub instructions: String,

    /// The single user message
    pub user_prompt: String,

    pub mcp: Option<McpServerConfig>,

    /// Vector stores for the file-search tool (empty = no file search)
    pub vector_store_ids: Vec<String>,

    pub connected_agent: Option<ConnectedAgentConfig>,

    /// Fixed delay between run polls
    pub poll_interval: Duration,

    /// Per-request HTTP timeout
    pub http_timeout: Duration,

    /// Log run steps after every poll
    pub trace_run_steps: bool,

    pub telemetry: TelemetryConfig,
}

impl Config {
    /// Load `.env` (if present) and then read configuration from the environment.
    ///
    /// A missing `.env` is fine; a malformed one is a configuration error.
    pub fn load() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => {}
            Err(e) if e.not_found() => {}
            Err(e) => return Err(ConfigError::InvalidValue(".env".to_string(), e.to_string())),
        }
        Self::from_env()
    }

    /// Read configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if a required variable is not set
    /// and `ConfigError::InvalidValue` if a value cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values count as unset, matching how `.env` templates leave blanks.
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require =
            |key: &str| get(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()));

        let project_endpoint = require("PROJECT_ENDPOINT")?;
        let api_key = require("PROJECT_API_KEY")?;
        let model = require("MODEL_DEPLOYMENT_NAME")?;

        let api_version = get("PROJECT_API_VERSION").unwrap_or_else(|| "v1".to_string());

        let mcp = match (get("MCP_SERVER_URL"), get("MCP_SERVER_LABEL")) {
            (Some(server_url), Some(server_label)) => Some(McpServerConfig {
                server_label,
                server_url,
                allowed_tools: get("MCP_ALLOWED_TOOLS")
                    .map(|v| parse_list(&v))
                    .unwrap_or_else(|| vec!["get_alerts".to_string(), "get_forecast".to_string()]),
                headers: get("MCP_HEADERS")
                    .map(|v| parse_headers(&v))
                    .transpose()
                    .map_err(|e| ConfigError::InvalidValue("MCP_HEADERS".to_string(), e))?
                    .unwrap_or_default(),
                require_approval: get("MCP_REQUIRE_APPROVAL")
                    .map(|v| parse_approval_mode(&v))
                    .transpose()
                    .map_err(|e| ConfigError::InvalidValue("MCP_REQUIRE_APPROVAL".to_string(), e))?
                    .unwrap_or(ApprovalMode::Always),
            }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(ConfigError::MissingEnvVar("MCP_SERVER_LABEL".to_string()))
            }
            (None, Some(_)) => {
                return Err(ConfigError::MissingEnvVar("MCP_SERVER_URL".to_string()))
            }
        };

        let connected_agent = get("CONNECTED_AGENT_ID").map(|agent_id| ConnectedAgentConfig {
            agent_id,
            name: get("CONNECTED_AGENT_NAME").unwrap_or_else(|| "connected_agent".to_string()),
            description: get("CONNECTED_AGENT_DESCRIPTION").unwrap_or_else(|| {
                "Delegate questions this agent cannot answer on its own".to_string()
            }),
        });

        let poll_interval = parse_secs(get("POLL_INTERVAL_SECS"), "POLL_INTERVAL_SECS", 5)?;
        let http_timeout = parse_secs(get("HTTP_TIMEOUT_SECS"), "HTTP_TIMEOUT_SECS", 60)?;

        let trace_run_steps = get("TRACE_RUN_STEPS")
            .map(|v| {
                parse_bool(&v)
                    .map_err(|e| ConfigError::InvalidValue("TRACE_RUN_STEPS".to_string(), e))
            })
            .transpose()?
            .unwrap_or(false);

        let json_logs = match get("LOG_FORMAT").map(|v| v.trim().to_lowercase()) {
            None => false,
            Some(v) if v == "text" => false,
            Some(v) if v == "json" => true,
            Some(other) => {
                return Err(ConfigError::InvalidValue(
                    "LOG_FORMAT".to_string(),
                    format!("expected text or json, got: {}", other),
                ))
            }
        };

        let telemetry = TelemetryConfig {
            log_level: get("LOG_LEVEL")
                .map(|v| v.to_lowercase())
                .unwrap_or_else(|| "error".to_string()),
            json_logs,
            otlp_endpoint: get("OTEL_EXPORTER_OTLP_ENDPOINT"),
            service_name: get("OTEL_SERVICE_NAME").unwrap_or_else(|| "weather-agent".to_string()),
        };

        Ok(Self {
            project_endpoint,
            api_key,
            api_version,
            model,
            agent_id: get("AGENT_ID"),
            agent_name: get("AGENT_NAME").unwrap_or_else(|| DEFAULT_AGENT_NAME.to_string()),
            instructions: get("AGENT_INSTRUCTIONS")
                .unwrap_or_else(|| DEFAULT_INSTRUCTIONS.to_string()),
            user_prompt: get("USER_PROMPT").unwrap_or_else(|| DEFAULT_USER_PROMPT.to_string()),
            mcp,
            vector_store_ids: get("VECTOR_STORE_IDS")
                .map(|v| parse_list(&v))
                .unwrap_or_default(),
            connected_agent,
            poll_interval,
            http_timeout,
            trace_run_steps,
            telemetry,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(project_endpoint: String, api_key: String, model: String) -> Self {
        Self {
            project_endpoint,
            api_key,
            api_version: "v1".to_string(),
            model,
            agent_id: None,
            agent_name: DEFAULT_AGENT_NAME.to_string(),
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            user_prompt: DEFAULT_USER_PROMPT.to_string(),
            mcp: None,
            vector_store_ids: Vec::new(),
            connected_agent: None,
            poll_interval: Duration::from_secs(5),
            http_timeout: Duration::from_secs(60),
            trace_run_steps: false,
            telemetry: TelemetryConfig::default(),
        }
    }
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
        other => Err(format!("expected boolean-like value, got: {}", other)),
    }
}

/// Whole seconds, at least one.
fn parse_secs(value: Option<String>, key: &str, default: u64) -> Result<Duration, ConfigError> {
    let Some(value) = value else {
        return Ok(Duration::from_secs(default));
    };
    let secs = value
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidValue(key.to_string(), format!("{}", e)))?;
    if secs == 0 {
        return Err(ConfigError::InvalidValue(
            key.to_string(),
            "must be at least 1 second".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

/// Split a comma-separated list, trimming items and dropping empty ones.
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `Name:Value,Name2:Value2`. Values may contain further colons.
///
/// Every name and value must be a valid HTTP header, since the same headers
/// go out with every approval of the run.
fn parse_headers(value: &str) -> Result<BTreeMap<String, String>, String> {
    let mut headers = BTreeMap::new();
    for item in parse_list(value) {
        let (name, val) = item
            .split_once(':')
            .ok_or_else(|| format!("expected Name:Value, got: {}", item))?;
        let (name, val) = (name.trim(), val.trim());
        if name.is_empty() {
            return Err(format!("empty header name in: {}", item));
        }
        HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| format!("invalid header name: {}", name))?;
        HeaderValue::from_str(val).map_err(|_| format!("invalid value for header {}", name))?;
        headers.insert(name.to_string(), val.to_string());
    }
    Ok(headers)
}

fn parse_approval_mode(value: &str) -> Result<ApprovalMode, String> {
    match value.trim().to_lowercase().as_str() {
        "always" => Ok(ApprovalMode::Always),
        "never" => Ok(ApprovalMode::Never),
        other => Err(format!("expected always or never, got: {}", other)),
    }
}
