//! CLI error types
//!
//! Transfer failures carry their own actionable messages; this layer only
//! adds the faults that belong to the terminal: bad usage, and the non-zero
//! exit when some units aborted after their errors were already printed.

use esferry_common::TransferError;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors surfaced to the terminal
#[derive(Error, Debug)]
pub enum CliError {
    /// A transfer operation failed
    #[error(transparent)]
    Transfer(#[from] TransferError),

    /// Flag combination or value clap cannot catch on its own
    #[error("{0}")]
    Usage(String),

    /// Units aborted; their errors were reported per unit already
    #[error("{failed} of {total} unit(s) failed; rerun to retry them")]
    UnitsFailed { failed: usize, total: usize },
}

impl CliError {
    /// Create a usage error
    pub fn usage(msg: impl Into<String>) -> Self {
        Self::Usage(msg.into())
    }
}
