//! Transfer configuration
//!
//! Tuning knobs for the scan/publish pipeline. Every field has a default
//! that matches how production transfers run; the CLI overrides them from
//! flags.

use serde::{Deserialize, Serialize};

// ============================================================================
// Transfer Defaults
// ============================================================================

/// Documents fetched per scroll page from Elasticsearch.
pub const DEFAULT_PAGE_SIZE: usize = 5000;

/// Documents accumulated before a publish to the broker.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Parallel scan slices per unit of work. One slice means a plain scroll.
pub const DEFAULT_SLICES: u64 = 1;

/// Bounded relay queue capacity, in messages.
pub const DEFAULT_QUEUE_CAPACITY: usize = 2048;

/// Progress is reported every this many published documents.
pub const DEFAULT_REPORT_EVERY: u64 = 500;

/// Index pattern holding the job-monitoring records.
pub const DEFAULT_INDEX_PATTERN: &str = "jobs-*";

/// Document field carrying the record timestamp, in epoch seconds.
pub const DEFAULT_TIME_FIELD: &str = "RecordTime";

/// Transfer pipeline options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferOptions {
    /// Scroll page size per Elasticsearch request
    pub page_size: usize,

    /// Documents per broker publish
    pub batch_size: usize,

    /// Parallel scan slices per unit of work
    pub slices: u64,

    /// Relay queue capacity in messages
    pub queue_capacity: usize,

    /// Progress report interval in documents
    pub report_every: u64,

    /// Index pattern searched for date units
    pub index_pattern: String,

    /// Time-range field for date units
    pub time_field: String,

    /// Publish nothing; verify counts against a synthetic acknowledger
    pub dry_run: bool,

    /// Keep going with the next unit after one aborts
    pub continue_on_error: bool,

    /// Draw progress bars on the console
    #[serde(default)]
    pub show_progress: bool,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            slices: DEFAULT_SLICES,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            report_every: DEFAULT_REPORT_EVERY,
            index_pattern: DEFAULT_INDEX_PATTERN.to_string(),
            time_field: DEFAULT_TIME_FIELD.to_string(),
            dry_run: false,
            continue_on_error: false,
            show_progress: false,
        }
    }
}

impl TransferOptions {
    /// Create options with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_slices(mut self, slices: u64) -> Self {
        self.slices = slices.max(1);
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    pub fn with_report_every(mut self, report_every: u64) -> Self {
        self.report_every = report_every.max(1);
        self
    }

    pub fn with_index_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.index_pattern = pattern.into();
        self
    }

    pub fn with_time_field(mut self, field: impl Into<String>) -> Self {
        self.time_field = field.into();
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    pub fn with_show_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = TransferOptions::default();
        assert_eq!(options.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(options.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(options.slices, 1);
        assert_eq!(options.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert_eq!(options.index_pattern, "jobs-*");
        assert_eq!(options.time_field, "RecordTime");
        assert!(!options.dry_run);
        assert!(!options.continue_on_error);
    }

    #[test]
    fn test_builder_setters() {
        let options = TransferOptions::new()
            .with_page_size(100)
            .with_batch_size(10)
            .with_slices(3)
            .with_queue_capacity(16)
            .with_index_pattern("jobs-2021-*")
            .with_time_field("DataCollectionDate")
            .with_dry_run(true)
            .with_continue_on_error(true);

        assert_eq!(options.page_size, 100);
        assert_eq!(options.batch_size, 10);
        assert_eq!(options.slices, 3);
        assert_eq!(options.queue_capacity, 16);
        assert_eq!(options.index_pattern, "jobs-2021-*");
        assert_eq!(options.time_field, "DataCollectionDate");
        assert!(options.dry_run);
        assert!(options.continue_on_error);
    }

    #[test]
    fn test_zero_values_are_clamped() {
        let options = TransferOptions::new()
            .with_page_size(0)
            .with_batch_size(0)
            .with_slices(0)
            .with_queue_capacity(0);

        assert_eq!(options.page_size, 1);
        assert_eq!(options.batch_size, 1);
        assert_eq!(options.slices, 1);
        assert_eq!(options.queue_capacity, 1);
    }
}
