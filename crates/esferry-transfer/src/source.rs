//! Document sources
//!
//! The orchestrator reads documents through these seams rather than from a
//! concrete client, so the live cluster and staged dump files are
//! interchangeable, and tests can feed fixtures through the same pipeline.

use crate::es::{EsClient, ScrollPage, Slice};
use crate::options::TransferOptions;
use crate::unit::WorkUnit;
use async_trait::async_trait;
use esferry_common::records::Document;
use esferry_common::Result;

/// One open scan over a unit's documents
#[async_trait]
pub trait DocumentScan: Send {
    /// Fetch the next page. An empty page means the scan is complete; the
    /// caller must not call again after that.
    async fn next_page(&mut self) -> Result<Vec<Document>>;
}

/// Where a unit's documents come from
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Resolve the total number of documents the unit is expected to deliver
    async fn count(&self, unit: &WorkUnit) -> Result<u64>;

    /// Open scan `slice_id` of `total_slices` over the unit's documents
    async fn open_scan(
        &self,
        unit: &WorkUnit,
        slice_id: u64,
        total_slices: u64,
    ) -> Result<Box<dyn DocumentScan>>;

    /// Whether this source can partition a unit across parallel scans
    fn sliceable(&self) -> bool {
        false
    }
}

/// Live source scanning the Elasticsearch cluster
pub struct EsDocumentSource {
    client: EsClient,
    index_pattern: String,
    time_field: String,
    page_size: usize,
}

impl EsDocumentSource {
    pub fn new(client: EsClient, options: &TransferOptions) -> Self {
        Self {
            client,
            index_pattern: options.index_pattern.clone(),
            time_field: options.time_field.clone(),
            page_size: options.page_size,
        }
    }
}

#[async_trait]
impl DocumentSource for EsDocumentSource {
    async fn count(&self, unit: &WorkUnit) -> Result<u64> {
        let index = unit.index_for(&self.index_pattern);
        self.client.count(index, &unit.query(&self.time_field)).await
    }

    async fn open_scan(
        &self,
        unit: &WorkUnit,
        slice_id: u64,
        total_slices: u64,
    ) -> Result<Box<dyn DocumentScan>> {
        let index = unit.index_for(&self.index_pattern);
        let first = self
            .client
            .open_scroll(
                index,
                &unit.query(&self.time_field),
                self.page_size,
                Slice::for_worker(slice_id, total_slices),
            )
            .await?;

        Ok(Box::new(EsScan::new(self.client.clone(), first)))
    }

    fn sliceable(&self) -> bool {
        true
    }
}

/// A scroll in progress. The page fetched when the scroll was opened is
/// buffered and handed out on the first `next_page` call.
struct EsScan {
    client: EsClient,
    scroll_id: Option<String>,
    first_page: Option<Vec<Document>>,
    done: bool,
}

impl EsScan {
    fn new(client: EsClient, first: ScrollPage) -> Self {
        Self {
            client,
            scroll_id: first.scroll_id,
            first_page: Some(first.docs),
            done: false,
        }
    }

    async fn finish(&mut self) {
        self.done = true;
        if let Some(id) = self.scroll_id.take() {
            self.client.clear_scroll(&id).await;
        }
    }
}

#[async_trait]
impl DocumentScan for EsScan {
    async fn next_page(&mut self) -> Result<Vec<Document>> {
        if self.done {
            return Ok(Vec::new());
        }

        if let Some(page) = self.first_page.take() {
            if page.is_empty() {
                self.finish().await;
            }
            return Ok(page);
        }

        let Some(scroll_id) = self.scroll_id.clone() else {
            self.done = true;
            return Ok(Vec::new());
        };

        let page = self.client.continue_scroll(&scroll_id).await?;
        if let Some(next_id) = page.scroll_id {
            self.scroll_id = Some(next_id);
        }
        if page.docs.is_empty() {
            self.finish().await;
        }

        Ok(page.docs)
    }
}
