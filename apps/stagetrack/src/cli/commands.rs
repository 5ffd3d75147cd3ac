//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//! Every command builds its own client from the environment; nothing is
//! shared between invocations.

use crate::api::{self, AppState};
use crate::tools;
use stagetrack_core::{AtsClient, ClientConfig, StagetrackError};

/// Build the shared application state from environment configuration.
fn build_state() -> Result<AppState, StagetrackError> {
    let config = ClientConfig::from_env()?;
    let client = AtsClient::new(&config)?;
    Ok(AppState::new(client))
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP tool server.
pub async fn cmd_server(host: &str, port: u16) -> Result<(), StagetrackError> {
    let state = build_state()?;

    println!("Stagetrack Tool Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host: {}", host);
    println!("  Port: {}", port);
    println!();
    println!("Endpoints:");
    println!("  GET  /health     - Health check");
    println!("  GET  /tools      - List available tools");
    println!("  POST /tools/call - Execute a tool call");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, state).await
}

// =============================================================================
// TRANSITIONS COMMANDS
// =============================================================================

/// List candidatures that transitioned into a stage during a month.
pub async fn cmd_transitions(
    stage: &str,
    year: i32,
    month: u32,
    json_mode: bool,
) -> Result<(), StagetrackError> {
    let state = build_state()?;
    let matches = state.tracker.transitions_in_window(stage, year, month).await?;

    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&matches).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Transitions into '{}' during {:04}-{:02}", stage, year, month);
    println!("=================================================");
    if matches.is_empty() {
        println!("(none)");
        return Ok(());
    }
    for m in &matches {
        println!(
            "{}  candidate={}  job={}  at={}",
            m.candidature_id,
            m.candidate_id.as_deref().unwrap_or("-"),
            m.job_id.as_deref().unwrap_or("-"),
            m.transitioned_at.to_rfc3339()
        );
    }
    println!();
    println!("Total: {}", matches.len());
    Ok(())
}

/// Count candidatures that transitioned into a stage during a month.
pub async fn cmd_count_transitions(
    stage: &str,
    year: i32,
    month: u32,
    json_mode: bool,
) -> Result<(), StagetrackError> {
    let state = build_state()?;
    let count = state
        .tracker
        .count_transitions_in_window(stage, year, month)
        .await?;

    if json_mode {
        let output = serde_json::json!({
            "stage_name": stage,
            "year": year,
            "month": month,
            "count": count,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!(
        "Candidatures that entered '{}' in {:04}-{:02}: {}",
        stage, year, month, count
    );
    Ok(())
}

// =============================================================================
// CURRENT-STAGE COMMANDS
// =============================================================================

/// List candidatures currently in a stage.
pub async fn cmd_in_stage(
    stage: &str,
    page: u32,
    page_size: u32,
    json_mode: bool,
) -> Result<(), StagetrackError> {
    let state = build_state()?;
    let result = state.tracker.currently_in_stage(stage, page, page_size).await?;

    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).unwrap_or_default()
        );
        return Ok(());
    }

    println!(
        "Candidatures currently in '{}' (page {}/{})",
        stage,
        result.meta.page,
        result.meta.total_pages.max(1)
    );
    println!("=================================================");
    for c in &result.data {
        println!(
            "{}  status={}",
            c.id,
            c.status
                .as_ref()
                .map(|s| format!("{:?}", s))
                .unwrap_or_else(|| "-".to_string())
        );
    }
    println!();
    println!("Total in stage: {}", result.meta.total);
    Ok(())
}

/// Count candidatures currently in a stage.
pub async fn cmd_count_in_stage(stage: &str, json_mode: bool) -> Result<(), StagetrackError> {
    let state = build_state()?;
    let count = state.tracker.count_currently_in_stage(stage).await?;

    if json_mode {
        let output = serde_json::json!({ "stage_name": stage, "count": count });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Candidatures currently in '{}': {}", stage, count);
    Ok(())
}

// =============================================================================
// TOOLS COMMAND
// =============================================================================

/// List the available tools. Works without ATS configuration.
pub fn cmd_tools(json_mode: bool) {
    let specs = tools::tool_specs();

    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&specs).unwrap_or_default()
        );
        return;
    }

    println!("Available tools ({}):", specs.len());
    println!("=================================================");
    for spec in &specs {
        println!("{}", spec.name);
        println!("    {}", spec.description);
    }
}
