//! # phasegraph
//!
//! Library side of the Phasegraph binary: scenario loading, the run driver
//! and the CLI definitions. The binary only installs logging and dispatches.

pub mod cli;
pub mod error;
pub mod scenario;

pub use error::AppError;
pub use scenario::{RunOptions, RunOutcome, Scenario, run};
