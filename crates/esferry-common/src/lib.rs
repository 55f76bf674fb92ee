//! esferry Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the esferry workspace.
//!
//! # Overview
//!
//! This crate provides common functionality used by both the transfer library
//! and the CLI:
//!
//! - **Error Handling**: The transfer error taxonomy and result type
//! - **Logging**: Tracing-based logging configuration and initialization
//! - **Records**: Document helpers (date-field conversion, job identifiers)
//!
//! # Example
//!
//! ```no_run
//! use esferry_common::{Result, TransferError};
//! use esferry_common::records::global_job_id;
//!
//! fn job_id_of(doc: &esferry_common::records::Document) -> Result<String> {
//!     let id = global_job_id(doc)?;
//!     Ok(id.to_string())
//! }
//! ```

pub mod error;
pub mod logging;
pub mod records;

// Re-export commonly used types
pub use error::{Result, TransferError};
