//! # Stagetrack CLI Module
//!
//! This module implements the CLI interface for Stagetrack.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP tool server
//! - `transitions` - List candidatures that entered a stage in a month
//! - `count-transitions` - Count candidatures that entered a stage in a month
//! - `in-stage` - List candidatures currently in a stage
//! - `count-in-stage` - Count candidatures currently in a stage
//! - `tools` - List the available tools

mod commands;

use clap::{Parser, Subcommand};
use stagetrack_core::StagetrackError;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Stagetrack - Recruitment Pipeline Tracker
///
/// Correlates stage transitions out of a remote ATS that only offers
/// current-state search and per-candidature history fetches.
#[derive(Parser, Debug)]
#[command(name = "stagetrack")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP tool server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// List candidatures that transitioned into a stage during a month
    Transitions {
        /// Stage name (case-sensitive, e.g. "Match")
        stage: String,

        /// Year (e.g. 2025)
        year: i32,

        /// Month (1-12)
        month: u32,
    },

    /// Count candidatures that transitioned into a stage during a month
    CountTransitions {
        /// Stage name (case-sensitive, e.g. "Match")
        stage: String,

        /// Year (e.g. 2025)
        year: i32,

        /// Month (1-12)
        month: u32,
    },

    /// List candidatures currently in a stage
    InStage {
        /// Stage name (case-sensitive)
        stage: String,

        /// Page number
        #[arg(short, long, default_value = "1")]
        page: u32,

        /// Results per page (max 100)
        #[arg(short = 's', long, default_value = "50")]
        page_size: u32,
    },

    /// Count candidatures currently in a stage
    CountInStage {
        /// Stage name (case-sensitive)
        stage: String,
    },

    /// List the available tools
    Tools,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the parsed CLI command.
pub async fn execute(cli: Cli) -> Result<(), StagetrackError> {
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => cmd_server(&host, port).await,
        Some(Commands::Transitions { stage, year, month }) => {
            cmd_transitions(&stage, year, month, json_mode).await
        }
        Some(Commands::CountTransitions { stage, year, month }) => {
            cmd_count_transitions(&stage, year, month, json_mode).await
        }
        Some(Commands::InStage {
            stage,
            page,
            page_size,
        }) => cmd_in_stage(&stage, page, page_size, json_mode).await,
        Some(Commands::CountInStage { stage }) => cmd_count_in_stage(&stage, json_mode).await,
        Some(Commands::Tools) => {
            cmd_tools(json_mode);
            Ok(())
        }
        None => {
            println!("No command specified. Run with --help for usage.");
            Ok(())
        }
    }
}
