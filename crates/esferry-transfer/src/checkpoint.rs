//! Checkpoint log handling
//!
//! The checkpoint log is the durability record of the pipeline: an
//! append-only text file with one unit key per line. A key is appended only
//! after its unit has been fully published and verified, so every key in the
//! file stands for a completed unit. Everything not in the file is fair game
//! for a rerun; that is the whole crash-recovery story.
//!
//! The file may be shared across sequential runs on the same host, so the
//! in-memory view is re-read from disk immediately before a unit starts and
//! again before every append.

use esferry_common::{Result, TransferError};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default checkpoint file name, in the working directory
pub const DEFAULT_CHECKPOINT_FILE: &str = "checkpoint.dat";

/// Append-only log of completed unit keys
#[derive(Debug)]
pub struct CheckpointLog {
    path: PathBuf,
    done: HashSet<String>,
}

impl CheckpointLog {
    /// Load the checkpoint log from disk.
    ///
    /// A missing file is an empty log (first run). A key listed twice means
    /// the file was corrupted or hand-edited, and nothing should run until a
    /// human has looked at it.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let done = read_keys(&path)?;
        debug!(path = %path.display(), entries = done.len(), "checkpoint log loaded");

        Ok(Self { path, done })
    }

    /// Whether a unit key is already marked done
    pub fn contains(&self, key: &str) -> bool {
        self.done.contains(key)
    }

    /// Re-read the log from disk, replacing the in-memory view
    pub fn refresh(&mut self) -> Result<()> {
        self.done = read_keys(&self.path)?;
        Ok(())
    }

    /// Mark a unit done: re-read the log, then append the key if absent.
    ///
    /// The write is flushed and synced before returning; once this returns
    /// Ok the unit survives a crash.
    pub fn mark_done(&mut self, key: &str) -> Result<()> {
        self.refresh()?;
        if self.done.contains(key) {
            debug!(key, "unit already checkpointed, not appending");
            return Ok(());
        }

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", key)?;
        file.flush()?;
        file.sync_all()?;

        self.done.insert(key.to_string());
        info!(key, path = %self.path.display(), "unit checkpointed");
        Ok(())
    }

    /// Number of completed units on record
    pub fn len(&self) -> usize {
        self.done.len()
    }

    pub fn is_empty(&self) -> bool {
        self.done.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Read and validate all keys from a checkpoint file
fn read_keys(path: &Path) -> Result<HashSet<String>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashSet::new()),
        Err(e) => return Err(e.into()),
    };

    let mut keys = HashSet::new();
    for line in content.lines() {
        let key = line.trim();
        if key.is_empty() {
            continue;
        }
        if !keys.insert(key.to_string()) {
            return Err(TransferError::DuplicateCheckpointEntry(key.to_string()));
        }
    }

    Ok(keys)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::TempDir;

    fn checkpoint_path(dir: &TempDir) -> PathBuf {
        dir.path().join("checkpoint.dat")
    }

    #[test]
    fn test_missing_file_is_empty_log() {
        let dir = TempDir::new().unwrap();
        let log = CheckpointLog::load(checkpoint_path(&dir)).unwrap();

        assert!(log.is_empty());
        assert!(!log.contains("2021-03-01"));
    }

    #[test]
    fn test_load_existing_entries() {
        let dir = TempDir::new().unwrap();
        let path = checkpoint_path(&dir);
        std::fs::write(&path, "2021-03-01\n2021-03-02\n").unwrap();

        let log = CheckpointLog::load(&path).unwrap();

        assert_eq!(log.len(), 2);
        assert!(log.contains("2021-03-01"));
        assert!(log.contains("2021-03-02"));
        assert!(!log.contains("2021-03-03"));
    }

    #[test]
    fn test_duplicate_entry_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = checkpoint_path(&dir);
        std::fs::write(&path, "2021-03-01\n2021-03-02\n2021-03-01\n").unwrap();

        let err = CheckpointLog::load(&path).unwrap_err();

        assert!(matches!(
            err,
            TransferError::DuplicateCheckpointEntry(key) if key == "2021-03-01"
        ));
    }

    #[test]
    fn test_blank_lines_are_ignored() {
        let dir = TempDir::new().unwrap();
        let path = checkpoint_path(&dir);
        std::fs::write(&path, "2021-03-01\n\n  \n2021-03-02\n").unwrap();

        let log = CheckpointLog::load(&path).unwrap();

        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_mark_done_appends_one_line() {
        let dir = TempDir::new().unwrap();
        let path = checkpoint_path(&dir);

        let mut log = CheckpointLog::load(&path).unwrap();
        log.mark_done("2021-03-01").unwrap();
        log.mark_done("2021-03-02").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "2021-03-01\n2021-03-02\n");
    }

    #[test]
    fn test_mark_done_twice_appends_once() {
        let dir = TempDir::new().unwrap();
        let path = checkpoint_path(&dir);

        let mut log = CheckpointLog::load(&path).unwrap();
        log.mark_done("2021-03-01").unwrap();
        log.mark_done("2021-03-01").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "2021-03-01\n");
    }

    #[test]
    fn test_mark_done_sees_entries_appended_by_others() {
        let dir = TempDir::new().unwrap();
        let path = checkpoint_path(&dir);

        let mut log = CheckpointLog::load(&path).unwrap();

        // Another run appends behind our back.
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .unwrap();
        writeln!(file, "2021-03-01").unwrap();
        drop(file);

        log.mark_done("2021-03-01").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "2021-03-01\n");
        assert!(log.contains("2021-03-01"));
    }

    #[test]
    fn test_refresh_picks_up_new_entries() {
        let dir = TempDir::new().unwrap();
        let path = checkpoint_path(&dir);

        let mut log = CheckpointLog::load(&path).unwrap();
        assert!(!log.contains("2021-03-01"));

        std::fs::write(&path, "2021-03-01\n").unwrap();
        log.refresh().unwrap();

        assert!(log.contains("2021-03-01"));
    }
}
