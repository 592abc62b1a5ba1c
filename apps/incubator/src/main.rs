//! # Incubator - Assessment Workflow Server
//!
//! The main binary for the incubator portal's assessment workflow.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for assessment operations
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   apps/incubator (THE BINARY)                   │
//! │                                                                 │
//! │  ┌─────────────┐    ┌─────────────┐    ┌──────────────────┐    │
//! │  │   CLI       │    │   HTTP API  │    │ Tracing Notifier │    │
//! │  │  (clap)     │    │   (axum)    │    │  (audit events)  │    │
//! │  └──────┬──────┘    └──────┬──────┘    └────────┬─────────┘    │
//! │         │                  │                    │               │
//! │         └──────────────────┼────────────────────┘               │
//! │                            ▼                                    │
//! │                   ┌────────────────┐                            │
//! │                   │ incubator-core │                            │
//! │                   │  (THE LOGIC)   │                            │
//! │                   └────────────────┘                            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! incubator server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! incubator open acme "Acme Robotics"
//! incubator advance acme --notes "Eligible" --actor-id u-1 --role editor
//! incubator show acme
//! ```

use clap::Parser;
use incubator::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // INCUBATOR_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("INCUBATOR_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "incubator=info,tower_http=debug".into());

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

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
  ██╗███╗   ██╗ ██████╗██╗   ██╗██████╗  █████╗ ████████╗ ██████╗ ██████╗
  ██║████╗  ██║██╔════╝██║   ██║██╔══██╗██╔══██╗╚══██╔══╝██╔═══██╗██╔══██╗
  ██║██╔██╗ ██║██║     ██║   ██║██████╔╝███████║   ██║   ██║   ██║██████╔╝
  ██║██║╚██╗██║██║     ██║   ██║██╔══██╗██╔══██║   ██║   ██║   ██║██╔══██╗
  ██║██║ ╚████║╚██████╗╚██████╔╝██████╔╝██║  ██║   ██║   ╚██████╔╝██║  ██║
  ╚═╝╚═╝  ╚═══╝ ╚═════╝ ╚═════╝ ╚═════╝ ╚═╝  ╚═╝   ╚═╝    ╚═════╝ ╚═╝  ╚═╝

  Assessment Workflow Server v{}

  Screening • Review • Diligence • Approval
"#,
        env!("CARGO_PKG_VERSION")
    );
}
