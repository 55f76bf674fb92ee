//! Error types for esferry
//!
//! This module provides the error taxonomy for transfer operations with clear,
//! actionable messages. Every variant that aborts a unit of work leaves the
//! checkpoint log untouched, so the unit is retried by a later run.

use thiserror::Error;

/// Result type alias for transfer operations
pub type Result<T> = std::result::Result<T, TransferError>;

/// Comprehensive error type for transfer operations
///
/// Variants are scoped to one unit of work unless noted otherwise. A unit
/// that fails with any of these is never marked done.
#[derive(Error, Debug)]
pub enum TransferError {
    /// Elasticsearch or broker transport failed mid-flight
    #[error("Transport error: {0}. The current unit was not committed; rerun to retry it.")]
    Transport(#[from] reqwest::Error),

    /// Elasticsearch answered, but one or more shards did not participate
    #[error("Partial shard failure: {successful}/{total} shards responded. Results would be incomplete; rerun once the cluster is healthy.")]
    PartialShardFailure { successful: u64, total: u64 },

    /// Accounting failed at the end of a unit of work
    #[error("Count mismatch: expected {expected} documents, received {received}, published {published}. The unit was not committed; rerun to retry it.")]
    CountMismatch {
        expected: u64,
        received: u64,
        published: u64,
    },

    /// A document is missing a required field or has the wrong shape
    #[error("Malformed document: {0}. Transfers fail loud rather than publish bad records.")]
    MalformedDocument(String),

    /// The checkpoint log lists the same unit key twice
    #[error("Duplicate checkpoint entry: '{0}'. The checkpoint file is corrupt; inspect it before rerunning.")]
    DuplicateCheckpointEntry(String),

    /// The relay queue protocol was violated
    #[error("Relay protocol error: {0}")]
    RelayProtocol(String),

    /// Broker connect, publish, or confirm failed
    #[error("Broker error: {0}. Check the AMQP endpoint and credentials.")]
    Broker(String),

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}. Check your environment variables or command-line flags.")]
    Config(String),

    /// File system operation failed
    #[error("File operation failed: {0}. Check file permissions and disk space.")]
    Io(#[from] std::io::Error),

    /// JSON parsing failed
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic anyhow error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TransferError {
    /// Create a malformed document error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedDocument(msg.into())
    }

    /// Create a relay protocol error
    pub fn relay_protocol(msg: impl Into<String>) -> Self {
        Self::RelayProtocol(msg.into())
    }

    /// Create a broker error
    pub fn broker(msg: impl Into<String>) -> Self {
        Self::Broker(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a count mismatch error
    pub fn count_mismatch(expected: u64, received: u64, published: u64) -> Self {
        Self::CountMismatch {
            expected,
            received,
            published,
        }
    }

    /// Whether this error aborts the whole run even with --continue-on-error
    ///
    /// Checkpoint corruption is never something to keep running past.
    pub fn is_run_fatal(&self) -> bool {
        matches!(self, Self::DuplicateCheckpointEntry(_))
    }
}
