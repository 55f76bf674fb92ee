//! Test helpers for transfer integration tests
//!
//! This module provides:
//! - Elasticsearch-shaped JSON fixtures for wiremock
//! - A publisher that records every batch it is handed

// Each integration test binary uses its own subset of these helpers.
#![allow(dead_code)]

use async_trait::async_trait;
use esferry_common::records::Document;
use esferry_common::Result;
use esferry_transfer::publish::Publisher;
use serde_json::{json, Value};
use std::sync::Mutex;

/// Healthy shard stats
pub fn shards_ok() -> Value {
    json!({ "total": 5, "successful": 5, "skipped": 0, "failed": 0 })
}

/// Shard stats with failures
pub fn shards_failed(successful: u64, total: u64) -> Value {
    json!({
        "total": total,
        "successful": successful,
        "skipped": 0,
        "failed": total - successful
    })
}

/// A `_count` response
pub fn count_response(count: u64) -> Value {
    json!({ "count": count, "_shards": shards_ok() })
}

/// One page of a scroll response
pub fn scroll_page(scroll_id: &str, docs: &[Value]) -> Value {
    let hits: Vec<Value> = docs.iter().map(|doc| json!({ "_source": doc })).collect();
    json!({
        "_scroll_id": scroll_id,
        "_shards": shards_ok(),
        "hits": { "hits": hits }
    })
}

/// A job-monitoring record like the cluster stores them
pub fn job_doc(i: u64) -> Value {
    json!({
        "GlobalJobId": format!("crab3@vocms05#{i}#1"),
        "QDate": 1_614_556_800u64 + i,
        "Site": "T2_CH_CERN"
    })
}

/// Publisher double that records every batch and acknowledges everything
#[derive(Default)]
pub struct RecordingPublisher {
    batches: Mutex<Vec<Vec<(String, Document)>>>,
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
            .map(|batch| batch.len())
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

    pub fn published_docs(&self) -> Vec<Document> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .flatten()
            .map(|(_, doc)| doc.clone())
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
