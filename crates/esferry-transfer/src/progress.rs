//! Progress reporting for transfers
//!
//! Observational only: nothing here feeds back into the pipeline's
//! accounting. Bars draw on the console when enabled; throttled tracing
//! events cover unattended runs where no terminal is watching.

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

/// Create a progress bar for one unit of work
pub fn create_transfer_bar(total: u64, unit_key: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} docs ({eta})")
            .expect("Invalid progress bar template")
            .progress_chars("#>-"),
    );
    pb.set_message(unit_key.to_string());
    pb
}

/// Format bytes into human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", size as u64, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

/// Published-document tally for one unit, reported every N documents
pub struct TransferProgress {
    unit_key: String,
    bar: Option<ProgressBar>,
    report_every: u64,
    published: u64,
    last_reported: u64,
}

impl TransferProgress {
    /// Progress with a console bar sized to the expected total
    pub fn with_bar(expected: u64, unit_key: &str, report_every: u64) -> Self {
        Self {
            unit_key: unit_key.to_string(),
            bar: Some(create_transfer_bar(expected, unit_key)),
            report_every: report_every.max(1),
            published: 0,
            last_reported: 0,
        }
    }

    /// Progress without console drawing; tracing events only
    pub fn quiet(unit_key: &str, report_every: u64) -> Self {
        Self {
            unit_key: unit_key.to_string(),
            bar: None,
            report_every: report_every.max(1),
            published: 0,
            last_reported: 0,
        }
    }

    /// Record `n` newly published documents
    pub fn record(&mut self, n: u64) {
        self.published += n;
        if let Some(ref bar) = self.bar {
            bar.inc(n);
        }
        if self.published - self.last_reported >= self.report_every {
            self.last_reported = self.published;
            info!(unit = %self.unit_key, published = self.published, "transfer progress");
        }
    }

    /// Total recorded so far
    pub fn published(&self) -> u64 {
        self.published
    }

    /// Close out the bar, leaving the final count on screen
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish();
        }
    }
}
