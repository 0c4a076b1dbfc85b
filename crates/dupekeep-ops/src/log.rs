//! Incremental JSON-lines action log.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::action::ActionLogEntry;
use crate::OpsError;

/// Appends one JSON line per action, flushing after every entry.
///
/// The flush-per-entry discipline is the point: if the process dies
/// mid-run, the log on disk is a complete, parseable prefix of the run.
pub struct ActionLogWriter {
    file: File,
    path: PathBuf,
    entries_written: u64,
}

impl ActionLogWriter {
    /// Open (or create) the log file for appending.
    ///
    /// Failure here is a setup error: surfaced before any action runs.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, OpsError> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| OpsError::LogOpen {
                path: path.clone(),
                source,
            })?;
        Ok(Self {
            file,
            path,
            entries_written: 0,
        })
    }

    /// Append one entry and flush it to disk before returning.
    pub fn append(&mut self, entry: &ActionLogEntry) -> Result<(), OpsError> {
        let line = serde_json::to_string(entry).map_err(|e| OpsError::LogWrite(e.into()))?;
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        self.file.flush()?;
        self.entries_written += 1;
        Ok(())
    }

    /// Number of entries appended through this writer.
    pub fn entries_written(&self) -> u64 {
        self.entries_written
    }

    /// Path of the underlying log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Read an action log back, one entry per line.
///
/// Tolerates a trailing blank line but not malformed entries.
pub fn read_action_log(path: &Path) -> Result<Vec<ActionLogEntry>, OpsError> {
    let file = File::open(path).map_err(|source| OpsError::LogOpen {
        path: path.to_path_buf(),
        source,
    })?;
    let mut entries = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let entry = serde_json::from_str(&line).map_err(|e| OpsError::InvalidReport {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        entries.push(entry);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionStatus;
    use tempfile::TempDir;

    #[test]
    fn test_every_append_is_readable_immediately() {
        let temp = TempDir::new().unwrap();
        let log_path = temp.path().join("actions.jsonl");

        let mut writer = ActionLogWriter::create(&log_path).unwrap();
        for i in 0..3 {
            let entry = ActionLogEntry::new(
                format!("/data/file{i}.txt").into(),
                None,
                "duplicate of /data/keep.txt",
                ActionStatus::Success,
            );
            writer.append(&entry).unwrap();

            // Without dropping the writer, the log already holds i+1 lines.
            let on_disk = read_action_log(&log_path).unwrap();
            assert_eq!(on_disk.len(), i + 1);
        }
        assert_eq!(writer.entries_written(), 3);
    }

    #[test]
    fn test_partial_log_is_usable_after_abandoned_writer() {
        let temp = TempDir::new().unwrap();
        let log_path = temp.path().join("actions.jsonl");

        let mut writer = ActionLogWriter::create(&log_path).unwrap();
        writer
            .append(&ActionLogEntry::new(
                "/a".into(),
                None,
                "duplicate of /k",
                ActionStatus::Success,
            ))
            .unwrap();
        writer
            .append(&ActionLogEntry::new(
                "/b".into(),
                None,
                "duplicate of /k",
                ActionStatus::Error("gone".into()),
            ))
            .unwrap();
        // Simulate a crash: the writer is dropped without any finalizer.
        drop(writer);

        let entries = read_action_log(&log_path).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].status.is_success());
        assert!(!entries[1].status.is_success());
    }
}
