//! HTTP client for the Elasticsearch cluster
//!
//! Thin reqwest wrapper around the three cluster APIs the pipeline uses:
//! count, scroll, and the index listing. Every search-shaped response has its
//! shard stats checked before documents are handed out.

use crate::es::{endpoints, types::*};
use esferry_common::{Result, TransferError};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

// ============================================================================
// Elasticsearch Client Constants
// ============================================================================

/// Default timeout for cluster requests in seconds.
/// Can be overridden via ESFERRY_ES_TIMEOUT_SECS environment variable.
/// Generous because scroll pages over a loaded cluster are slow.
pub const DEFAULT_ES_TIMEOUT_SECS: u64 = 300;

/// Default cluster URL when not specified via environment variable.
pub const DEFAULT_ES_URL: &str = "http://localhost:9200";

/// How long the cluster keeps a scroll context alive between pages.
pub const SCROLL_KEEPALIVE: &str = "5m";

/// Client for the cluster holding the job-monitoring records
#[derive(Debug, Clone)]
pub struct EsClient {
    client: Client,
    base_url: String,
    auth: Option<(String, String)>,
}

impl EsClient {
    /// Create a new client without authentication
    pub fn new(base_url: String) -> Result<Self> {
        let timeout_secs = std::env::var("ESFERRY_ES_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_ES_TIMEOUT_SECS);

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url,
            auth: None,
        })
    }

    /// Create for a known URL, picking up credentials from the environment
    ///
    /// `ESFERRY_ES_USERNAME` / `ESFERRY_ES_PASSWORD` enable basic auth; they
    /// must be set together. Credentials are taken from the environment only,
    /// never from flags.
    pub fn with_env_auth(base_url: String) -> Result<Self> {
        let mut client = Self::new(base_url)?;

        let username = std::env::var("ESFERRY_ES_USERNAME").ok();
        let password = std::env::var("ESFERRY_ES_PASSWORD").ok();
        client.auth = match (username, password) {
            (Some(user), Some(pass)) => Some((user, pass)),
            (None, None) => None,
            _ => {
                return Err(TransferError::config(
                    "ESFERRY_ES_USERNAME and ESFERRY_ES_PASSWORD must be set together",
                ))
            },
        };

        Ok(client)
    }

    /// Set basic auth credentials
    pub fn with_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some((username.into(), password.into()));
        self
    }

    /// Count the documents an index (or pattern) holds for a query
    pub async fn count(&self, index: &str, query: &Value) -> Result<u64> {
        let url = endpoints::count_url(&self.base_url, index);
        let body = json!({ "query": query });

        let response = self
            .request(self.client.post(&url).json(&body))
            .send()
            .await?
            .error_for_status()?;

        let count: CountResponse = response.json().await?;
        count.shards.ensure_complete()?;

        Ok(count.count)
    }

    /// Open a scroll over an index (or pattern) and fetch the first page
    pub async fn open_scroll(
        &self,
        index: &str,
        query: &Value,
        page_size: usize,
        slice: Option<Slice>,
    ) -> Result<ScrollPage> {
        let url = endpoints::open_scroll_url(&self.base_url, index, SCROLL_KEEPALIVE);
        let mut body = json!({ "size": page_size, "query": query });
        if let Some(slice) = slice {
            body["slice"] = json!({ "id": slice.id, "max": slice.max });
        }

        let response = self
            .request(self.client.post(&url).json(&body))
            .send()
            .await?
            .error_for_status()?;

        self.into_page(response).await
    }

    /// Fetch the next page of an open scroll
    pub async fn continue_scroll(&self, scroll_id: &str) -> Result<ScrollPage> {
        let url = endpoints::continue_scroll_url(&self.base_url);
        let body = json!({ "scroll": SCROLL_KEEPALIVE, "scroll_id": scroll_id });

        let response = self
            .request(self.client.post(&url).json(&body))
            .send()
            .await?
            .error_for_status()?;

        self.into_page(response).await
    }

    /// Release a scroll context early. Best effort: the context expires on
    /// its own after the keepalive anyway.
    pub async fn clear_scroll(&self, scroll_id: &str) {
        let url = endpoints::clear_scroll_url(&self.base_url);
        let body = json!({ "scroll_id": [scroll_id] });

        let result = self
            .request(self.client.delete(&url).json(&body))
            .send()
            .await;
        if let Err(e) = result {
            debug!(error = %e, "failed to clear scroll context");
        }
    }

    /// List indices matching a pattern, with document counts and sizes
    pub async fn cat_indices(&self, pattern: &str) -> Result<Vec<CatIndexRow>> {
        let url = endpoints::cat_indices_url(&self.base_url, pattern);

        let response = self
            .request(self.client.get(&url))
            .send()
            .await?
            .error_for_status()?;

        let rows: Vec<CatIndexRow> = response.json().await?;
        Ok(rows)
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            Some((user, pass)) => builder.basic_auth(user, Some(pass)),
            None => builder,
        }
    }

    async fn into_page(&self, response: reqwest::Response) -> Result<ScrollPage> {
        let parsed: ScrollResponse = response.json().await?;
        parsed.shards.ensure_complete()?;

        let docs = parsed.hits.hits.into_iter().map(|hit| hit.source).collect();
        Ok(ScrollPage {
            scroll_id: parsed.scroll_id,
            docs,
        })
    }
}
