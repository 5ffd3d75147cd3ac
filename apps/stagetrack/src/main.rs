//! # Stagetrack - Recruitment Pipeline Tracker
//!
//! The main binary for the Stagetrack stage-transition engine.
//!
//! This application provides:
//! - HTTP tool server (axum-based)
//! - CLI interface for pipeline queries
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                   apps/stagetrack (THE BINARY)                 │
//! │                                                                │
//! │   ┌─────────────┐    ┌──────────────┐    ┌────────────────┐   │
//! │   │   CLI       │    │  HTTP Tools  │    │ Tool Dispatch  │   │
//! │   │  (clap)     │    │   (axum)     │    │  (name+args)   │   │
//! │   └──────┬──────┘    └──────┬───────┘    └───────┬────────┘   │
//! │          │                  │                    │            │
//! │          └──────────────────┼────────────────────┘            │
//! │                             ▼                                 │
//! │                   ┌──────────────────┐                        │
//! │                   │ stagetrack-core  │                        │
//! │                   │   (THE LOGIC)    │                        │
//! │                   └────────┬─────────┘                        │
//! │                            ▼                                  │
//! │                       remote ATS API                          │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP tool server
//! stagetrack server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! stagetrack transitions Match 2025 9
//! stagetrack count-in-stage Contratado
//! ```

use clap::Parser;
use stagetrack::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // Initialize tracing — STAGETRACK_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("STAGETRACK_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "stagetrack=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Display startup banner
    if !cli.quiet {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Stagetrack startup banner.
fn print_banner() {
    println!(
        r#"
  ███████╗████████╗ █████╗  ██████╗ ███████╗
  ██╔════╝╚══██╔══╝██╔══██╗██╔════╝ ██╔════╝
  ███████╗   ██║   ███████║██║  ███╗█████╗
  ╚════██║   ██║   ██╔══██║██║   ██║██╔══╝
  ███████║   ██║   ██║  ██║╚██████╔╝███████╗
  ╚══════╝   ╚═╝   ╚═╝  ╚═╝ ╚═════╝ ╚══════╝

  Stagetrack v{}

  Pipeline transitions, correlated from the source of truth
"#,
        env!("CARGO_PKG_VERSION")
    );
}
