//! # Weather Agent
//!
//! Runs one conversation with a hosted weather agent and prints the result.
//!
//! This library provides:
//! - A typed client for the agents REST service (agents, threads, messages, runs)
//! - Tool configuration: a remote MCP server, file search and a connected sub-agent
//! - A polling driver that approves MCP tool calls while the run is paused
//! - Tracing setup with optional OTLP span export
//!
//! ## Example
//!
//! ```rust,ignore
//! use weather_agent::{agent, api::AgentsClient, tools::ToolSet, Config};
//!
//! let config = Config::from_env()?;
//! let client = AgentsClient::from_config(&config)?;
//! let tools = ToolSet::from_config(&config);
//! let session = agent::run_weather_agent(&client, &config, &tools, &mut std::io::stdout()).await?;
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod telemetry;
pub mod tools;

pub use config::Config;
