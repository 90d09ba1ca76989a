//! # Application Errors
//!
//! Everything the binary can fail with. Kernel errors pass through unchanged.

use phasegraph_core::KernelError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// The kernel rejected an operation.
    #[error(transparent)]
    Kernel(#[from] KernelError),

    /// A file could not be read.
    #[error("Cannot read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A scenario file is not valid TOML for the scenario schema.
    #[error("Scenario parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A report could not be rendered as JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A scenario parsed but is inconsistent.
    #[error("Invalid scenario: {0}")]
    Scenario(String),
}
