//! # Stagetrack MCP Server
//!
//! Entry point for the MCP (Model Context Protocol) bridge to the
//! Stagetrack engine.
//!
//! Reads configuration from the environment (and `stagetrack.toml`):
//! - `STAGETRACK_ATS_API_KEY` — ATS API key (required)
//! - `STAGETRACK_ATS_BASE_URL` — ATS API base URL (optional)
//!
//! Communicates with AI clients (Claude, GPT) via MCP over stdio, and
//! queries the remote ATS API directly.

mod server;

use rmcp::{ServiceExt, transport::stdio};
use server::StagetrackMcp;
use stagetrack_core::{AtsClient, ClientConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logging to stderr only — stdout is reserved for MCP stdio transport.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = ClientConfig::from_env().inspect_err(|e| {
        tracing::error!("Configuration error: {e}");
    })?;

    tracing::info!("Stagetrack MCP server starting, target: {}", config.base_url);

    let client = AtsClient::new(&config)?;
    let mcp = StagetrackMcp::new(client);

    let service = mcp.serve(stdio()).await.inspect_err(|e| {
        tracing::error!("MCP serve error: {:?}", e);
    })?;

    service.waiting().await?;
    Ok(())
}
