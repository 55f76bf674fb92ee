//! Upload worker
//!
//! The single consumer of the relay queue. Assembles documents into batches,
//! applies the date-field conversion at flush time, publishes through the
//! injected publisher, and keeps the books: documents received off the queue
//! and documents acknowledged by the broker, checked against the announced
//! total once the stream completes.

use crate::progress::TransferProgress;
use crate::publish::Publisher;
use crate::relay::{RelayMessage, RelayReceiver};
use esferry_common::records::{convert_dates_to_millis, global_job_id, Document};
use esferry_common::{Result, TransferError};
use std::sync::Arc;
use tracing::debug;

/// Accounting for one completed unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadStats {
    /// Total announced at the start of the unit
    pub expected: u64,
    /// Documents taken off the relay queue
    pub received: u64,
    /// Documents acknowledged by the publisher
    pub published: u64,
    /// Batches flushed
    pub batches: u64,
}

/// Drain the relay queue for one unit of work.
///
/// The first message must announce the expected total. After that, documents
/// are batched and flushed at `batch_size`; whatever remains is flushed when
/// all `producers` end-of-stream markers have arrived. Returns an error if
/// the final accounting does not reconcile, and the unit is then never
/// checkpointed.
pub async fn run_upload(
    mut rx: RelayReceiver,
    publisher: Arc<dyn Publisher>,
    batch_size: usize,
    producers: usize,
    mut progress: TransferProgress,
) -> Result<UploadStats> {
    let expected = match rx.recv().await {
        Some(RelayMessage::ExpectedTotal(n)) => n,
        Some(_) => {
            return Err(TransferError::relay_protocol(
                "first relay message must announce the expected total",
            ))
        },
        None => {
            return Err(TransferError::relay_protocol(
                "relay queue closed before the expected total arrived",
            ))
        },
    };
    debug!(expected, producers, "upload worker started");

    let mut stats = UploadStats {
        expected,
        received: 0,
        published: 0,
        batches: 0,
    };
    let mut buffer: Vec<Document> = Vec::with_capacity(batch_size);
    let mut streams_done = 0usize;

    while streams_done < producers {
        match rx.recv().await {
            Some(RelayMessage::Document(doc)) => {
                stats.received += 1;
                buffer.push(doc);
                if buffer.len() >= batch_size {
                    flush(&mut buffer, publisher.as_ref(), &mut stats, &mut progress).await?;
                }
            },
            Some(RelayMessage::EndOfStream) => {
                streams_done += 1;
            },
            Some(RelayMessage::ExpectedTotal(_)) => {
                return Err(TransferError::relay_protocol(
                    "expected total announced more than once",
                ))
            },
            None => {
                return Err(TransferError::relay_protocol(format!(
                    "relay queue closed with {} of {} scans unfinished",
                    producers - streams_done,
                    producers
                )))
            },
        }
    }

    if !buffer.is_empty() {
        flush(&mut buffer, publisher.as_ref(), &mut stats, &mut progress).await?;
    }
    progress.finish();

    if stats.received != expected || stats.published != expected {
        return Err(TransferError::count_mismatch(
            expected,
            stats.received,
            stats.published,
        ));
    }

    Ok(stats)
}

/// Publish the buffered documents as one batch.
///
/// This is the one place the date-field conversion runs, so every document
/// is converted exactly once, on its way out.
async fn flush(
    buffer: &mut Vec<Document>,
    publisher: &dyn Publisher,
    stats: &mut UploadStats,
    progress: &mut TransferProgress,
) -> Result<()> {
    let mut batch = Vec::with_capacity(buffer.len());
    for mut doc in buffer.drain(..) {
        convert_dates_to_millis(&mut doc);
        let job_id = global_job_id(&doc)?.to_string();
        batch.push((job_id, doc));
    }

    let acked = publisher.publish(&batch).await?;
    stats.published += acked;
    stats.batches += 1;
    progress.record(acked);

    debug!(batch = batch.len(), acked, "batch flushed");
    Ok(())
}
