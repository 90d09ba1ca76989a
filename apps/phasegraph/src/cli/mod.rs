//! # Phasegraph CLI Module
//!
//! This module implements the CLI interface for Phasegraph.
//!
//! ## Available Commands
//!
//! - `run` - Load a scenario, drain its context and print metrics
//! - `check` - Validate a scenario without running it
//! - `phases` - List the phases in scheduling order

mod commands;

use crate::error::AppError;
use clap::{Parser, Subcommand};
use phasegraph_core::Phase;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Phasegraph - phase-ordered graph propagation runner
///
/// Drives a scheduling context over a scenario file and reports what the
/// kernel did.
#[derive(Parser, Debug)]
#[command(name = "phasegraph")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging (unless RUST_LOG is set)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a scenario
    Run {
        /// Path to the scenario file (TOML)
        #[arg(short, long)]
        scenario: PathBuf,

        /// Last phase to process (counting, inference, linking, instantiation, anneal, close)
        #[arg(short, long)]
        until: Option<Phase>,

        /// Close the context after draining and drain the close steps
        #[arg(short, long)]
        close: bool,
    },

    /// Validate a scenario file
    Check {
        /// Path to the scenario file (TOML)
        #[arg(short, long)]
        scenario: PathBuf,
    },

    /// List phases in scheduling order
    Phases,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), AppError> {
    let json_mode = cli.json;

    match cli.command {
        Commands::Run {
            scenario,
            until,
            close,
        } => cmd_run(&scenario, json_mode, until, close),
        Commands::Check { scenario } => cmd_check(&scenario, json_mode),
        Commands::Phases => cmd_phases(json_mode),
    }
}

// =============================================================================
// TESTS
// =============================================================================
