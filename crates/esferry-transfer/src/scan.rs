//! Scan worker
//!
//! One producer task per scan slice: drain the scan page by page, forward
//! every document onto the relay queue, then send a single end-of-stream
//! marker. A failed scan returns without the marker, which the consumer side
//! surfaces as an incomplete stream.

use crate::relay::{RelayMessage, RelaySender};
use crate::source::DocumentScan;
use esferry_common::{Result, TransferError};
use tracing::debug;

/// Drive one scan to completion, forwarding documents to the relay queue.
///
/// Returns the number of documents forwarded. Sends block when the queue is
/// full; that backpressure is what keeps a fast cluster from ballooning
/// memory ahead of a slow broker.
pub async fn run_scan(
    mut scan: Box<dyn DocumentScan>,
    tx: RelaySender,
    slice_id: u64,
) -> Result<u64> {
    let mut forwarded = 0u64;

    loop {
        let page = scan.next_page().await?;
        if page.is_empty() {
            break;
        }

        for doc in page {
            tx.send(RelayMessage::Document(doc)).await.map_err(|_| {
                TransferError::relay_protocol("relay queue closed while documents remained")
            })?;
            forwarded += 1;
        }
    }

    tx.send(RelayMessage::EndOfStream).await.map_err(|_| {
        TransferError::relay_protocol("relay queue closed before end of stream")
    })?;

    debug!(slice = slice_id, docs = forwarded, "scan slice complete");
    Ok(forwarded)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::relay::relay_channel;
    use crate::testing::{FailingScan, PagedScan};
    use serde_json::json;

    #[tokio::test]
    async fn test_forwards_all_pages_then_one_marker() {
        let scan = PagedScan::from_counts(&[3, 2]);
        let (tx, mut rx) = relay_channel(16);

        let forwarded = run_scan(Box::new(scan), tx, 0).await.unwrap();
        assert_eq!(forwarded, 5);

        let mut docs = 0;
        let mut markers = 0;
        while let Some(message) = rx.recv().await {
            match message {
                RelayMessage::Document(_) => docs += 1,
                RelayMessage::EndOfStream => markers += 1,
                RelayMessage::ExpectedTotal(_) => panic!("scan workers never announce totals"),
            }
        }
        assert_eq!(docs, 5);
        assert_eq!(markers, 1);
    }

    #[tokio::test]
    async fn test_empty_scan_sends_only_the_marker() {
        let scan = PagedScan::from_counts(&[]);
        let (tx, mut rx) = relay_channel(4);

        let forwarded = run_scan(Box::new(scan), tx, 0).await.unwrap();
        assert_eq!(forwarded, 0);

        assert!(matches!(rx.recv().await, Some(RelayMessage::EndOfStream)));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_scan_error_propagates_without_marker() {
        let scan = FailingScan::after_docs(2);
        let (tx, mut rx) = relay_channel(16);

        let err = run_scan(Box::new(scan), tx, 0).await.unwrap_err();
        assert!(matches!(err, TransferError::PartialShardFailure { .. }));

        let mut markers = 0;
        while let Some(message) = rx.recv().await {
            if matches!(message, RelayMessage::EndOfStream) {
                markers += 1;
            }
        }
        assert_eq!(markers, 0, "a failed scan must not signal completion");
    }

    #[tokio::test]
    async fn test_closed_queue_is_a_protocol_error() {
        let scan = PagedScan::new(vec![vec![
            match json!({ "GlobalJobId": "a#1#1" }) {
                serde_json::Value::Object(map) => map,
                _ => unreachable!(),
            },
        ]]);
        let (tx, rx) = relay_channel(4);
        drop(rx);

        let err = run_scan(Box::new(scan), tx, 0).await.unwrap_err();
        assert!(matches!(err, TransferError::RelayProtocol(_)));
    }
}
