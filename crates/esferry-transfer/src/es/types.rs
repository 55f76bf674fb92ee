//! Elasticsearch wire types
//!
//! Matches the response shapes of the cluster APIs the pipeline calls.
//! Documents stay untyped; only the envelopes are modeled.

use esferry_common::records::Document;
use esferry_common::{Result, TransferError};
use serde::{Deserialize, Serialize};

/// Scan partition assigned to one worker.
///
/// The cluster rejects a slice with `max == 1`, so a single-worker scan must
/// not send one; [`Slice::for_worker`] encodes that rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Slice {
    pub id: u64,
    pub max: u64,
}

impl Slice {
    /// The slice body for worker `id` out of `total`, or None when the scan
    /// is not partitioned at all
    pub fn for_worker(id: u64, total: u64) -> Option<Self> {
        if total > 1 {
            Some(Self { id, max: total })
        } else {
            None
        }
    }
}

/// Shard participation stats attached to every search and count response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ShardStats {
    pub total: u64,
    pub successful: u64,
    #[serde(default)]
    pub skipped: u64,
    pub failed: u64,
}

impl ShardStats {
    /// Fail the unit when any shard did not participate: a partial answer
    /// would silently drop that shard's documents.
    pub fn ensure_complete(&self) -> Result<()> {
        if self.failed > 0 {
            return Err(TransferError::PartialShardFailure {
                successful: self.successful,
                total: self.total,
            });
        }
        Ok(())
    }
}

/// Response of the count endpoint
#[derive(Debug, Deserialize)]
pub struct CountResponse {
    pub count: u64,
    #[serde(rename = "_shards")]
    pub shards: ShardStats,
}

/// Response of a scroll open or continuation request
#[derive(Debug, Deserialize)]
pub struct ScrollResponse {
    #[serde(rename = "_scroll_id")]
    pub scroll_id: Option<String>,
    #[serde(rename = "_shards")]
    pub shards: ShardStats,
    pub hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
pub struct HitsEnvelope {
    pub hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
pub struct Hit {
    #[serde(rename = "_source")]
    pub source: Document,
}

/// One page of a scan: the documents plus the id to continue with
#[derive(Debug)]
pub struct ScrollPage {
    pub scroll_id: Option<String>,
    pub docs: Vec<Document>,
}

/// One row of the index listing.
///
/// Counts and sizes come back as strings, and are null for closed indices.
#[derive(Debug, Clone, Deserialize)]
pub struct CatIndexRow {
    pub index: String,
    #[serde(rename = "docs.count")]
    pub docs_count: Option<String>,
    #[serde(rename = "store.size")]
    pub store_size: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_slice_for_worker() {
        assert_eq!(Slice::for_worker(0, 1), None);
        assert_eq!(Slice::for_worker(0, 3), Some(Slice { id: 0, max: 3 }));
        assert_eq!(Slice::for_worker(2, 3), Some(Slice { id: 2, max: 3 }));
    }

    #[test]
    fn test_shard_stats_complete() {
        let stats = ShardStats {
            total: 5,
            successful: 5,
            skipped: 0,
            failed: 0,
        };
        assert!(stats.ensure_complete().is_ok());
    }

    #[test]
    fn test_shard_stats_partial_failure() {
        let stats = ShardStats {
            total: 5,
            successful: 4,
            skipped: 0,
            failed: 1,
        };
        let err = stats.ensure_complete().unwrap_err();
        assert!(matches!(
            err,
            TransferError::PartialShardFailure {
                successful: 4,
                total: 5
            }
        ));
    }

    #[test]
    fn test_count_response_deserializes() {
        let response: CountResponse = serde_json::from_value(json!({
            "count": 120000,
            "_shards": { "total": 5, "successful": 5, "skipped": 0, "failed": 0 }
        }))
        .unwrap();

        assert_eq!(response.count, 120000);
        assert_eq!(response.shards.failed, 0);
    }

    #[test]
    fn test_scroll_response_deserializes() {
        let response: ScrollResponse = serde_json::from_value(json!({
            "_scroll_id": "c2Nhbjsx",
            "took": 12,
            "timed_out": false,
            "_shards": { "total": 5, "successful": 5, "failed": 0 },
            "hits": {
                "total": { "value": 2, "relation": "eq" },
                "hits": [
                    { "_index": "jobs-2021-03", "_id": "1", "_source": { "GlobalJobId": "a#1#1" } },
                    { "_index": "jobs-2021-03", "_id": "2", "_source": { "GlobalJobId": "a#2#1" } }
                ]
            }
        }))
        .unwrap();

        assert_eq!(response.scroll_id.as_deref(), Some("c2Nhbjsx"));
        assert_eq!(response.hits.hits.len(), 2);
        assert_eq!(
            response.hits.hits[0].source["GlobalJobId"],
            json!("a#1#1")
        );
    }

    #[test]
    fn test_cat_index_row_with_nulls() {
        let row: CatIndexRow = serde_json::from_value(json!({
            "health": "yellow",
            "status": "close",
            "index": "jobs-2020-01",
            "docs.count": null,
            "store.size": null
        }))
        .unwrap();

        assert_eq!(row.index, "jobs-2020-01");
        assert!(row.docs_count.is_none());
    }
}
