//! Weather Agent - command line entry point
//!
//! Resolves the agent, runs the configured prompt once and prints the
//! conversation to stdout. A failed run still exits successfully.

use tracing::info;
use weather_agent::{agent, api::AgentsClient, config::Config, telemetry, tools::ToolSet};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging; the guard flushes exported spans on exit
    let _telemetry = telemetry::init(&config.telemetry)?;
    info!(
        endpoint = %config.project_endpoint,
        model = %config.model,
        "Loaded configuration"
    );

    let tools = ToolSet::from_config(&config);
    let client = AgentsClient::from_config(&config)?;

    let mut stdout = std::io::stdout().lock();
    let session = agent::run_weather_agent(&client, &config, &tools, &mut stdout).await?;
    info!(
        agent_id = %session.agent.id(),
        status = %session.outcome.status(),
        messages = session.report.messages_printed,
        "Session finished"
    );

    Ok(())
}
