//! Elasticsearch client module
//!
//! HTTP client for the cluster holding the job-monitoring records: count,
//! scrolled scans (optionally sliced), and index listings.

pub mod client;
pub mod endpoints;
pub mod types;

pub use client::EsClient;
pub use types::*;
