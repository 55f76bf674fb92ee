//! esferry CLI Library
//!
//! Command-line interface for moving job-monitoring records out of
//! Elasticsearch into a message broker.
//!
//! # Overview
//!
//! - **Day Transfers**: stream whole UTC days into the broker (`esferry transfer`)
//! - **Index Campaigns**: stage and replay whole indices (`esferry transfer-index`)
//! - **Staging**: dump units to local NDJSON files (`esferry dump`)
//! - **Planning**: snapshot the matching indices into a catalog (`esferry indices`)
//!
//! Every transfer is checkpointed per unit of work; rerunning a command picks
//! up exactly where the last run stopped.

pub mod commands;
pub mod error;

// Re-export commonly used types
pub use error::{CliError, Result};

use clap::{Args, Parser, Subcommand};
use esferry_transfer::checkpoint::DEFAULT_CHECKPOINT_FILE;
use esferry_transfer::es::client::DEFAULT_ES_URL;
use esferry_transfer::indices::DEFAULT_CATALOG_FILE;
use esferry_transfer::options::{
    DEFAULT_BATCH_SIZE, DEFAULT_INDEX_PATTERN, DEFAULT_PAGE_SIZE, DEFAULT_QUEUE_CAPACITY,
    DEFAULT_REPORT_EVERY, DEFAULT_SLICES, DEFAULT_TIME_FIELD,
};
use esferry_transfer::publish::{DEFAULT_AMQP_TARGET, DEFAULT_AMQP_URL};
use std::path::PathBuf;

/// esferry - Elasticsearch to message broker ferry
#[derive(Parser, Debug)]
#[command(name = "esferry")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Elasticsearch URL
    #[arg(long, env = "ESFERRY_ES_URL", default_value = DEFAULT_ES_URL, global = true)]
    pub es_url: String,

    /// AMQP broker URL
    #[arg(long, env = "ESFERRY_AMQP_URL", default_value = DEFAULT_AMQP_URL, global = true)]
    pub amqp_url: String,

    /// Queue the records are published to
    #[arg(long, env = "ESFERRY_AMQP_TARGET", default_value = DEFAULT_AMQP_TARGET, global = true)]
    pub amqp_target: String,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Transfer whole days of records from the cluster to the broker
    Transfer(TransferArgs),

    /// Stage whole indices to disk and replay them into the broker
    TransferIndex(TransferIndexArgs),

    /// Stage units of work to local NDJSON dump files
    Dump(DumpArgs),

    /// Snapshot the matching indices into a catalog file
    Indices(IndicesArgs),
}

/// Arguments for `esferry transfer`
#[derive(Args, Debug)]
pub struct TransferArgs {
    /// Days to transfer, as YYYY-MM-DD. Invalid dates are skipped with a
    /// warning.
    #[arg(required = true)]
    pub dates: Vec<String>,

    /// Checkpoint log recording finished units
    #[arg(long, default_value = DEFAULT_CHECKPOINT_FILE)]
    pub checkpoint_file: PathBuf,

    /// Documents per scroll page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,

    /// Documents per broker publish
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Parallel scan slices per day
    #[arg(long, default_value_t = DEFAULT_SLICES)]
    pub slices: u64,

    /// Relay queue capacity in messages
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// Log a progress line every this many documents
    #[arg(long, default_value_t = DEFAULT_REPORT_EVERY)]
    pub report_every: u64,

    /// Index pattern searched for each day
    #[arg(long, default_value = DEFAULT_INDEX_PATTERN)]
    pub index_pattern: String,

    /// Document field holding the record timestamp, in epoch seconds
    #[arg(long, default_value = DEFAULT_TIME_FIELD)]
    pub time_field: String,

    /// Verify counts without publishing or checkpointing
    #[arg(long)]
    pub dry_run: bool,

    /// Keep going with the next day after one aborts
    #[arg(long)]
    pub continue_on_error: bool,
}

/// Arguments for `esferry transfer-index`
#[derive(Args, Debug)]
pub struct TransferIndexArgs {
    /// Index catalog written by `esferry indices`
    #[arg(long, default_value = DEFAULT_CATALOG_FILE)]
    pub catalog: PathBuf,

    /// Transfer only these catalog indices
    #[arg(long, value_delimiter = ',', conflicts_with = "until")]
    pub select: Vec<String>,

    /// Transfer every catalog index up to and including this one
    #[arg(long)]
    pub until: Option<String>,

    /// Directory holding the staged dumps
    #[arg(long, default_value = "stage")]
    pub stage_dir: PathBuf,

    /// Delete each staged dump after its unit commits
    #[arg(long)]
    pub clean_after_upload: bool,

    /// Checkpoint log recording finished units
    #[arg(long, default_value = DEFAULT_CHECKPOINT_FILE)]
    pub checkpoint_file: PathBuf,

    /// Documents per scroll page while staging, and per replay page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,

    /// Documents per broker publish
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Relay queue capacity in messages
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// Log a progress line every this many documents
    #[arg(long, default_value_t = DEFAULT_REPORT_EVERY)]
    pub report_every: u64,

    /// Verify counts without publishing or checkpointing
    #[arg(long)]
    pub dry_run: bool,

    /// Keep going with the next index after one aborts
    #[arg(long)]
    pub continue_on_error: bool,
}

/// Arguments for `esferry dump`
#[derive(Args, Debug)]
pub struct DumpArgs {
    /// Days to stage, as YYYY-MM-DD. Invalid dates are skipped with a
    /// warning.
    #[arg(required = true)]
    pub dates: Vec<String>,

    /// Directory the dumps are written to
    #[arg(long, default_value = "stage")]
    pub target: PathBuf,

    /// Documents per scroll page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,

    /// Index pattern searched for each day
    #[arg(long, default_value = DEFAULT_INDEX_PATTERN)]
    pub index_pattern: String,

    /// Document field holding the record timestamp, in epoch seconds
    #[arg(long, default_value = DEFAULT_TIME_FIELD)]
    pub time_field: String,
}

/// Arguments for `esferry indices`
#[derive(Args, Debug)]
pub struct IndicesArgs {
    /// Index pattern to list
    #[arg(long, default_value = DEFAULT_INDEX_PATTERN)]
    pub pattern: String,

    /// Catalog file to write
    #[arg(long, default_value = DEFAULT_CATALOG_FILE)]
    pub output: PathBuf,
}
