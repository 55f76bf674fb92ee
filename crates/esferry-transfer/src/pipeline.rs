//! Transfer orchestrator
//!
//! Runs units of work one at a time: resolve the expected total, stream
//! documents from scan workers through the relay queue into the upload
//! worker, verify the accounting, and only then checkpoint the unit. A unit
//! that fails anywhere leaves the checkpoint log untouched and is picked up
//! again by the next run.

use crate::checkpoint::CheckpointLog;
use crate::options::TransferOptions;
use crate::progress::TransferProgress;
use crate::publish::Publisher;
use crate::relay::{relay_channel, RelayMessage};
use crate::scan;
use crate::source::DocumentSource;
use crate::unit::WorkUnit;
use crate::upload::{self, UploadStats};
use esferry_common::{Result, TransferError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Outcome of one committed unit
#[derive(Debug)]
pub struct UnitReport {
    pub key: String,
    pub documents: u64,
    pub batches: u64,
    pub elapsed: Duration,
}

/// Outcome of a whole run
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Units transferred and checkpointed this run (or verified, in dry run)
    pub committed: Vec<UnitReport>,
    /// Units already checkpointed before this run
    pub skipped: Vec<String>,
    /// Units that aborted, with the error that stopped them
    pub failed: Vec<(String, TransferError)>,
    pub elapsed: Duration,
}

impl RunSummary {
    /// No unit aborted
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Documents published across all committed units
    pub fn documents(&self) -> u64 {
        self.committed.iter().map(|report| report.documents).sum()
    }

    /// Fold another summary into this one
    pub fn merge(&mut self, other: RunSummary) {
        self.committed.extend(other.committed);
        self.skipped.extend(other.skipped);
        self.failed.extend(other.failed);
        self.elapsed += other.elapsed;
    }
}

/// The producer/consumer transfer pipeline for a set of units
pub struct TransferPipeline {
    source: Arc<dyn DocumentSource>,
    publisher: Arc<dyn Publisher>,
    checkpoint: CheckpointLog,
    options: TransferOptions,
}

impl TransferPipeline {
    /// Build a pipeline from injected collaborators
    pub fn new(
        source: Arc<dyn DocumentSource>,
        publisher: Arc<dyn Publisher>,
        checkpoint: CheckpointLog,
        options: TransferOptions,
    ) -> Self {
        Self {
            source,
            publisher,
            checkpoint,
            options,
        }
    }

    pub fn checkpoint(&self) -> &CheckpointLog {
        &self.checkpoint
    }

    /// Transfer each unit in order, checkpointing as units complete.
    ///
    /// Returns Err only for faults that make continuing pointless (a corrupt
    /// checkpoint log); per-unit failures are reported in the summary, and
    /// halt the run unless `continue_on_error` is set.
    pub async fn run(&mut self, units: &[WorkUnit]) -> Result<RunSummary> {
        let run_started = Instant::now();
        let mut summary = RunSummary::default();

        for unit in units {
            let key = unit.key().to_string();

            if self.checkpoint.contains(&key) {
                info!(unit = %key, "already transferred, skipping");
                summary.skipped.push(key);
                continue;
            }

            // The log may have grown since it was loaded; trust disk over
            // memory before starting work.
            self.checkpoint.refresh()?;
            if self.checkpoint.contains(&key) {
                info!(unit = %key, "already transferred, skipping");
                summary.skipped.push(key);
                continue;
            }

            let started = Instant::now();
            match self.transfer_unit(unit).await {
                Ok(stats) => {
                    if self.options.dry_run {
                        info!(
                            unit = %key,
                            documents = stats.published,
                            "dry run verified, checkpoint left untouched"
                        );
                    } else {
                        self.checkpoint.mark_done(&key)?;
                    }

                    let elapsed = started.elapsed();
                    info!(
                        unit = %key,
                        documents = stats.published,
                        batches = stats.batches,
                        elapsed_secs = elapsed.as_secs(),
                        "unit complete"
                    );
                    summary.committed.push(UnitReport {
                        key,
                        documents: stats.published,
                        batches: stats.batches,
                        elapsed,
                    });
                },
                Err(e) if e.is_run_fatal() => return Err(e),
                Err(e) => {
                    error!(unit = %key, error = %e, "unit aborted");
                    summary.failed.push((key, e));
                    if !self.options.continue_on_error {
                        break;
                    }
                },
            }
        }

        summary.elapsed = run_started.elapsed();
        Ok(summary)
    }

    /// Move one unit of work: count, stream, verify
    async fn transfer_unit(&self, unit: &WorkUnit) -> Result<UploadStats> {
        let expected = self.source.count(unit).await?;
        info!(unit = %unit, expected, "expected total resolved");

        let slices = if self.source.sliceable() {
            self.options.slices.max(1)
        } else {
            1
        };

        let (tx, rx) = relay_channel(self.options.queue_capacity);

        // The total goes first, from here, so the upload worker knows it
        // before any scan gets a chance to enqueue documents.
        tx.send(RelayMessage::ExpectedTotal(expected))
            .await
            .map_err(|_| TransferError::relay_protocol("relay queue closed at startup"))?;

        let mut producers = Vec::with_capacity(slices as usize);
        for slice_id in 0..slices {
            let source = Arc::clone(&self.source);
            let unit = unit.clone();
            let tx = tx.clone();
            producers.push(tokio::spawn(async move {
                let scan = source.open_scan(&unit, slice_id, slices).await?;
                scan::run_scan(scan, tx, slice_id).await
            }));
        }
        drop(tx);

        let progress = if self.options.show_progress {
            TransferProgress::with_bar(expected, unit.key(), self.options.report_every)
        } else {
            TransferProgress::quiet(unit.key(), self.options.report_every)
        };
        let consumer = tokio::spawn(upload::run_upload(
            rx,
            Arc::clone(&self.publisher),
            self.options.batch_size,
            slices as usize,
            progress,
        ));

        let mut errors: Vec<TransferError> = Vec::new();
        let mut forwarded = 0u64;
        for handle in producers {
            match handle.await {
                Ok(Ok(n)) => forwarded += n,
                Ok(Err(e)) => errors.push(e),
                Err(e) => errors.push(TransferError::Other(e.into())),
            }
        }

        let stats = match consumer.await {
            Ok(Ok(stats)) => Some(stats),
            Ok(Err(e)) => {
                errors.push(e);
                None
            },
            Err(e) => {
                errors.push(TransferError::Other(e.into()));
                None
            },
        };

        if let Some(err) = pick_primary_error(errors) {
            return Err(err);
        }

        let stats = stats
            .ok_or_else(|| TransferError::relay_protocol("upload worker finished without stats"))?;
        if forwarded != stats.received {
            return Err(TransferError::relay_protocol(format!(
                "scans forwarded {} documents but {} arrived",
                forwarded, stats.received
            )));
        }

        Ok(stats)
    }
}

/// Prefer the root cause over secondary fallout: when a scan dies, the
/// upload worker also reports a closed queue, but the scan's error is the
/// one worth reading.
fn pick_primary_error(errors: Vec<TransferError>) -> Option<TransferError> {
    let mut primary: Option<TransferError> = None;
    let mut fallback: Option<TransferError> = None;

    for err in errors {
        match err {
            TransferError::RelayProtocol(_) => {
                if fallback.is_none() {
                    fallback = Some(err);
                }
            },
            _ => {
                if primary.is_none() {
                    primary = Some(err);
                }
            },
        }
    }

    primary.or(fallback)
}
