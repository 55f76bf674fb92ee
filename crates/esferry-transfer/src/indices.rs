//! Index catalog
//!
//! Long index-by-index campaigns start from a catalog: a snapshot of the
//! matching indices with their document counts and store sizes, saved to a
//! JSON file. Operators inspect the catalog, then transfer a selection of it
//! or everything up to a cutoff index. Keeping the catalog on disk makes the
//! campaign plan reviewable and stable across runs even while the cluster
//! keeps creating new indices.

use crate::es::{CatIndexRow, EsClient};
use crate::unit::WorkUnit;
use esferry_common::{Result, TransferError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// Default catalog file name in the working directory.
pub const DEFAULT_CATALOG_FILE: &str = "indices.json";

/// Size and document count of one index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub docs_count: u64,
    pub store_bytes: u64,
}

/// Snapshot of the indices matching a pattern, sorted by name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexCatalog {
    indices: BTreeMap<String, IndexStats>,
}

impl IndexCatalog {
    /// Snapshot the cluster's view of the matching indices
    pub async fn fetch(client: &EsClient, pattern: &str) -> Result<Self> {
        let rows = client.cat_indices(pattern).await?;
        let catalog = Self::from_rows(rows);
        info!(pattern, indices = catalog.len(), "index catalog fetched");

        Ok(catalog)
    }

    fn from_rows(rows: Vec<CatIndexRow>) -> Self {
        let mut indices = BTreeMap::new();

        for row in rows {
            // A recovering or closed index reports null stats; it cannot be
            // planned, so it is left out rather than guessed at.
            let parsed = row
                .docs_count
                .as_deref()
                .and_then(|v| v.parse::<u64>().ok())
                .zip(row.store_size.as_deref().and_then(|v| v.parse::<u64>().ok()));

            match parsed {
                Some((docs_count, store_bytes)) => {
                    indices.insert(
                        row.index,
                        IndexStats {
                            docs_count,
                            store_bytes,
                        },
                    );
                },
                None => {
                    warn!(index = %row.index, "index has no usable stats, leaving it out");
                },
            }
        }

        Self { indices }
    }

    /// Load a previously saved catalog
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => TransferError::config(format!(
                "no index catalog at {}; run the indices command first",
                path.display()
            )),
            _ => TransferError::Io(e),
        })?;

        Ok(serde_json::from_str(&raw)?)
    }

    /// Save the catalog as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut raw = serde_json::to_string_pretty(self)?;
        raw.push('\n');
        std::fs::write(path, raw)?;
        info!(path = %path.display(), indices = self.len(), "index catalog saved");

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &IndexStats)> {
        self.indices.iter()
    }

    pub fn total_documents(&self) -> u64 {
        self.indices.values().map(|stats| stats.docs_count).sum()
    }

    pub fn total_bytes(&self) -> u64 {
        self.indices.values().map(|stats| stats.store_bytes).sum()
    }

    /// All indices as units of work, in name order
    pub fn units(&self) -> Vec<WorkUnit> {
        self.indices.keys().map(WorkUnit::index).collect()
    }

    /// The named indices as units of work, in catalog order.
    ///
    /// Every requested name must be in the catalog; a typo fails the whole
    /// selection rather than silently transferring less than asked.
    pub fn select(&self, names: &[String]) -> Result<Vec<WorkUnit>> {
        for name in names {
            if !self.indices.contains_key(name) {
                return Err(TransferError::config(format!(
                    "index {name} is not in the catalog; refresh it with the indices command"
                )));
            }
        }

        Ok(self
            .indices
            .keys()
            .filter(|name| names.contains(*name))
            .map(WorkUnit::index)
            .collect())
    }

    /// Every index up to and including the named one, in catalog order
    pub fn until(&self, last: &str) -> Result<Vec<WorkUnit>> {
        if !self.indices.contains_key(last) {
            return Err(TransferError::config(format!(
                "index {last} is not in the catalog; refresh it with the indices command"
            )));
        }

        Ok(self
            .indices
            .keys()
            .take_while(|name| name.as_str() <= last)
            .map(WorkUnit::index)
            .collect())
    }
}
