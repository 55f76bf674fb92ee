//! Record Transfer Engine
//!
//! Moves job-monitoring records out of an Elasticsearch cluster into a
//! message broker, one checkpointed unit of work at a time.
//!
//! # Overview
//!
//! - **Units of Work**: a day of records or a whole index (`unit`)
//! - **Scanning**: sliced scroll reads with shard-failure checks (`es`, `source`)
//! - **Relay**: bounded queue between scan and upload workers (`relay`)
//! - **Publishing**: confirm-mode AMQP, or a dry run (`publish`)
//! - **Verification**: counts reconciled before a unit commits (`upload`)
//! - **Checkpointing**: append-only log of finished units (`checkpoint`)
//! - **Staging**: dump an index to disk, replay it later (`dump`)
//! - **Planning**: index catalog for long campaigns (`indices`)
//!
//! A unit either lands completely, is verified, and is checkpointed, or it
//! fails and the next run redoes it from scratch. Nothing in between.

pub mod checkpoint;
pub mod dump;
pub mod es;
pub mod indices;
pub mod options;
pub mod pipeline;
pub mod progress;
pub mod publish;
pub mod relay;
pub mod scan;
pub mod source;
pub mod unit;
pub mod upload;

#[cfg(test)]
pub mod testing;

// Re-export commonly used types
pub use checkpoint::CheckpointLog;
pub use es::EsClient;
pub use options::TransferOptions;
pub use pipeline::{RunSummary, TransferPipeline, UnitReport};
pub use publish::{AmqpPublisher, DryRunPublisher, Publisher};
pub use source::{DocumentScan, DocumentSource, EsDocumentSource};
pub use unit::WorkUnit;
