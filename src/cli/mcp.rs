//! MCP server launcher
//!
//! Starts the MCP server over stdio.

use anyhow::{Context, Result};
use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};

use crate::config::load_config;
use crate::mcp::MakeServer;

/// Run the MCP server over stdio.
///
/// Builds the executor from configuration, runs the help target once to
/// compose the server description, then serves until the client disconnects.
/// In-flight make processes are killed on the way out.
///
/// # Arguments
/// * `config_path` - Optional path to a config file override
pub async fn run_mcp_server(config_path: Option<&str>) -> Result<()> {
    let config = load_config(config_path).context("Failed to load configuration")?;

    let server = MakeServer::new(&config)
        .context("Failed to configure make executor")?
        .with_help()
        .await;

    tracing::info!(
        make = %server.executor().config().make_path.display(),
        work_dir = %server.executor().config().default_work_dir.display(),
        max_concurrency = server.executor().config().max_concurrency,
        "starting MCP server on stdio"
    );

    let transport = (stdin(), stdout());
    let service = server.clone().serve(transport).await?;
    let outcome = service.waiting().await;

    server.shutdown();
    outcome?;

    Ok(())
}
