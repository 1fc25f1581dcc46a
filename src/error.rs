//! Error types for analysis passes.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that end an analysis call.
///
/// Malformed log lines and dangling event references are not errors: they
/// are reported through [`Diagnostics`](crate::Diagnostics) and skipped.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The event log could not be opened.
    #[error("Event log unavailable: {path}: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading failed part-way through a pass.
    #[error("Failed to read event log: {0}")]
    Io(#[from] io::Error),

    /// Settings could not be loaded.
    #[error("Invalid configuration: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T, E = AnalysisError> = std::result::Result<T, E>;
