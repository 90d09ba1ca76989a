//! # Phasegraph
//!
//! The scenario runner for the phasegraph-core scheduling kernel.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │          apps/phasegraph (THE BINARY)         │
//! │                                               │
//! │   ┌─────────────┐        ┌────────────────┐   │
//! │   │    CLI      │───────▶│   Scenario     │   │
//! │   │   (clap)    │        │   (toml)       │   │
//! │   └─────────────┘        └───────┬────────┘   │
//! │                                  ▼            │
//! │                        ┌──────────────────┐   │
//! │                        │ phasegraph-core  │   │
//! │                        │  (THE KERNEL)    │   │
//! │                        └──────────────────┘   │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! phasegraph run -s scenario.toml
//! phasegraph run -s scenario.toml --until linking --json
//! phasegraph check -s scenario.toml
//! phasegraph phases
//! ```

use clap::Parser;
use phasegraph::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    // PHASEGRAPH_LOG_FORMAT=json enables machine-parseable logs. Logs go to
    // stderr so `--json` output on stdout stays clean.
    let log_format = std::env::var("PHASEGRAPH_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "phasegraph=debug,phasegraph_core=debug"
    } else {
        "phasegraph=info,phasegraph_core=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if !cli.quiet && !cli.json {
        print_banner();
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        "Phasegraph v{} - phase-ordered graph propagation\n",
        env!("CARGO_PKG_VERSION")
    );
}
