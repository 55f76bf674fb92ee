//! Shared test doubles for the pipeline
//!
//! Fixture sources and publishers that run the real workers without a
//! cluster or a broker.

use crate::publish::Publisher;
use crate::source::{DocumentScan, DocumentSource};
use crate::unit::WorkUnit;
use async_trait::async_trait;
use esferry_common::records::Document;
use esferry_common::{Result, TransferError};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// A minimal record with the given job id
pub fn doc(id: &str) -> Document {
    match json!({ "GlobalJobId": id, "QDate": 1000 }) {
        serde_json::Value::Object(map) => map,
        _ => unreachable!(),
    }
}

/// `n` records with sequential job ids
pub fn docs(n: usize) -> Vec<Document> {
    (0..n).map(|i| doc(&format!("sched#{}#1", i))).collect()
}

/// Scan serving pre-built pages in order
pub struct PagedScan {
    pages: VecDeque<Vec<Document>>,
}

impl PagedScan {
    pub fn new(pages: Vec<Vec<Document>>) -> Self {
        Self {
            pages: pages.into(),
        }
    }

    /// Pages with the given document counts, ids unique across pages
    pub fn from_counts(counts: &[usize]) -> Self {
        let pages = counts
            .iter()
            .enumerate()
            .map(|(page, &count)| {
                (0..count)
                    .map(|i| doc(&format!("sched#p{}d{}#1", page, i)))
                    .collect()
            })
            .collect();
        Self::new(pages)
    }
}

#[async_trait]
impl DocumentScan for PagedScan {
    async fn next_page(&mut self) -> Result<Vec<Document>> {
        Ok(self.pages.pop_front().unwrap_or_default())
    }
}

/// Scan yielding one page, then a shard failure
pub struct FailingScan {
    page: Option<Vec<Document>>,
}

impl FailingScan {
    pub fn after_docs(n: usize) -> Self {
        Self {
            page: Some(docs(n)),
        }
    }
}

#[async_trait]
impl DocumentScan for FailingScan {
    async fn next_page(&mut self) -> Result<Vec<Document>> {
        match self.page.take() {
            Some(page) => Ok(page),
            None => Err(TransferError::PartialShardFailure {
                successful: 4,
                total: 5,
            }),
        }
    }
}

/// In-memory source partitioning a fixed document set across slices
pub struct FixtureSource {
    docs: Vec<Document>,
    page_size: usize,
    count_override: Option<u64>,
}

impl FixtureSource {
    pub fn new(docs: Vec<Document>) -> Self {
        Self {
            docs,
            page_size: 100,
            count_override: None,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Report a count different from what the scans deliver
    pub fn with_count(mut self, count: u64) -> Self {
        self.count_override = Some(count);
        self
    }
}

#[async_trait]
impl DocumentSource for FixtureSource {
    async fn count(&self, _unit: &WorkUnit) -> Result<u64> {
        Ok(self.count_override.unwrap_or(self.docs.len() as u64))
    }

    async fn open_scan(
        &self,
        _unit: &WorkUnit,
        slice_id: u64,
        total_slices: u64,
    ) -> Result<Box<dyn DocumentScan>> {
        let mine: Vec<Document> = self
            .docs
            .iter()
            .enumerate()
            .filter(|(i, _)| (*i as u64) % total_slices == slice_id)
            .map(|(_, d)| d.clone())
            .collect();

        let pages = mine
            .chunks(self.page_size)
            .map(|chunk| chunk.to_vec())
            .collect();
        Ok(Box::new(PagedScan::new(pages)))
    }

    fn sliceable(&self) -> bool {
        true
    }
}

/// Publisher remembering every batch it acknowledged
#[derive(Default)]
pub struct RecordingPublisher {
    pub batches: Mutex<Vec<Vec<(String, Document)>>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .map(|b| b.len())
            .collect()
    }

    pub fn published_ids(&self) -> Vec<String> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .flatten()
            .map(|(id, _)| id.clone())
            .collect()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, batch: &[(String, Document)]) -> Result<u64> {
        self.batches.lock().unwrap().push(batch.to_vec());
        Ok(batch.len() as u64)
    }
}

/// Publisher that under-acknowledges its first batch by a fixed amount
pub struct ShortAckPublisher {
    shortfall: AtomicU64,
}

impl ShortAckPublisher {
    pub fn dropping(shortfall: u64) -> Self {
        Self {
            shortfall: AtomicU64::new(shortfall),
        }
    }
}

#[async_trait]
impl Publisher for ShortAckPublisher {
    async fn publish(&self, batch: &[(String, Document)]) -> Result<u64> {
        let drop = self.shortfall.swap(0, Ordering::SeqCst);
        Ok((batch.len() as u64).saturating_sub(drop))
    }
}

/// Publisher whose broker is down
pub struct FailingPublisher;

#[async_trait]
impl Publisher for FailingPublisher {
    async fn publish(&self, _batch: &[(String, Document)]) -> Result<u64> {
        Err(TransferError::broker("connection reset by broker"))
    }
}
