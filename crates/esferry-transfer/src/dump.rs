//! Staged dumps
//!
//! Large index transfers run in two steps: stage the index to a local
//! newline-delimited JSON file, then replay that file into the broker. The
//! staged file is the authority for the replay: its line count is the
//! expected total, and documents are stored raw, with the date conversion
//! still applied at publish time.
//!
//! A dump in progress is written under a `.part` suffix and renamed into
//! place only after every document landed, so a crash mid-stage never leaves
//! a file that looks complete.

use crate::progress::create_transfer_bar;
use crate::source::{DocumentScan, DocumentSource};
use crate::unit::WorkUnit;
use async_trait::async_trait;
use esferry_common::records::Document;
use esferry_common::{Result, TransferError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter, Lines};
use tracing::{debug, info, warn};

/// One line of a staged dump
#[derive(Debug, Serialize, Deserialize)]
struct DumpLine {
    #[serde(rename = "_source")]
    source: Document,
}

/// Where a unit's staged dump lives
pub fn dump_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{key}.json"))
}

fn part_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{key}.json.part"))
}

/// A completed (or reused) stage
#[derive(Debug)]
pub struct StagedDump {
    pub path: PathBuf,
    pub documents: u64,
    pub reused: bool,
}

/// Stage one unit to disk, reusing an existing complete dump.
///
/// The written total is verified against the source count before the file is
/// renamed into place; an undercount keeps the `.part` file for inspection
/// and fails the stage.
pub async fn stage_unit(
    source: &dyn DocumentSource,
    unit: &WorkUnit,
    dir: &Path,
    show_progress: bool,
) -> Result<StagedDump> {
    let path = dump_path(dir, unit.key());
    if fs::try_exists(&path).await? {
        let documents = count_staged(&path).await?;
        info!(
            unit = %unit,
            path = %path.display(),
            documents,
            "staged dump already present, reusing"
        );
        return Ok(StagedDump {
            path,
            documents,
            reused: true,
        });
    }

    fs::create_dir_all(dir).await?;
    let expected = source.count(unit).await?;
    let mut scan = source.open_scan(unit, 0, 1).await?;

    let part = part_path(dir, unit.key());
    let file = File::create(&part).await?;
    let mut writer = BufWriter::new(file);
    let bar = show_progress.then(|| create_transfer_bar(expected, unit.key()));

    let mut written = 0u64;
    loop {
        let page = scan.next_page().await?;
        if page.is_empty() {
            break;
        }
        for doc in page {
            let line = serde_json::to_vec(&DumpLine { source: doc })?;
            writer.write_all(&line).await?;
            writer.write_all(b"\n").await?;
            written += 1;
            if let Some(bar) = &bar {
                bar.inc(1);
            }
        }
    }

    writer.flush().await?;
    writer.get_ref().sync_all().await?;
    if let Some(bar) = &bar {
        bar.finish();
    }

    if written != expected {
        warn!(
            unit = %unit,
            expected,
            written,
            "stage incomplete, keeping the partial file for inspection"
        );
        return Err(TransferError::count_mismatch(expected, written, written));
    }

    fs::rename(&part, &path).await?;
    info!(
        unit = %unit,
        path = %path.display(),
        documents = written,
        "unit staged"
    );

    Ok(StagedDump {
        path,
        documents: written,
        reused: false,
    })
}

/// Count the documents in a staged dump
pub async fn count_staged(path: &Path) -> Result<u64> {
    let file = open_staged(path).await?;
    let mut lines = BufReader::new(file).lines();

    let mut count = 0u64;
    while let Some(line) = lines.next_line().await? {
        if !line.trim().is_empty() {
            count += 1;
        }
    }

    Ok(count)
}

/// Remove a unit's staged dump, tolerating one that is already gone
pub async fn clean_unit(dir: &Path, key: &str) -> Result<()> {
    let path = dump_path(dir, key);
    match fs::remove_file(&path).await {
        Ok(()) => info!(path = %path.display(), "staged dump removed"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no staged dump to remove");
        },
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

async fn open_staged(path: &Path) -> Result<File> {
    File::open(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => TransferError::config(format!(
            "no staged dump at {}; run the dump step first",
            path.display()
        )),
        _ => TransferError::Io(e),
    })
}

/// Replays staged dumps as a document source.
///
/// The line count of the staged file is the expected total, so a replay
/// verifies against what was actually staged rather than against a live
/// index that may have grown since. Dumps are replayed single-threaded; the
/// file is the bottleneck, not the scan.
pub struct DumpSource {
    dir: PathBuf,
    page_size: usize,
}

impl DumpSource {
    pub fn new(dir: impl Into<PathBuf>, page_size: usize) -> Self {
        Self {
            dir: dir.into(),
            page_size: page_size.max(1),
        }
    }
}

#[async_trait]
impl DocumentSource for DumpSource {
    async fn count(&self, unit: &WorkUnit) -> Result<u64> {
        count_staged(&dump_path(&self.dir, unit.key())).await
    }

    async fn open_scan(
        &self,
        unit: &WorkUnit,
        _slice_id: u64,
        _total_slices: u64,
    ) -> Result<Box<dyn DocumentScan>> {
        let path = dump_path(&self.dir, unit.key());
        let file = open_staged(&path).await?;
        debug!(path = %path.display(), "replaying staged dump");

        Ok(Box::new(DumpScan {
            lines: BufReader::new(file).lines(),
            page_size: self.page_size,
            line_no: 0,
        }))
    }
}

struct DumpScan {
    lines: Lines<BufReader<File>>,
    page_size: usize,
    line_no: u64,
}

#[async_trait]
impl DocumentScan for DumpScan {
    async fn next_page(&mut self) -> Result<Vec<Document>> {
        let mut docs = Vec::with_capacity(self.page_size);

        while docs.len() < self.page_size {
            match self.lines.next_line().await? {
                Some(line) => {
                    self.line_no += 1;
                    if line.trim().is_empty() {
                        continue;
                    }
                    let envelope: DumpLine = serde_json::from_str(&line).map_err(|e| {
                        TransferError::malformed(format!(
                            "staged dump line {} is not a document envelope: {e}",
                            self.line_no
                        ))
                    })?;
                    docs.push(envelope.source);
                },
                None => break,
            }
        }

        Ok(docs)
    }
}
