//! The apply executor.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::action::{ActionLogEntry, ActionStatus, ApplyMode, Removal};
use crate::log::ActionLogWriter;
use crate::OpsError;

/// Totals for a completed (or interrupted-and-resumed) apply run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplySummary {
    /// Files removed (deleted, trashed, or archived).
    pub removed: u64,
    /// Per-file failures, logged and skipped.
    pub errors: u64,
    /// Bytes reclaimed by successful removals.
    pub bytes_reclaimed: u64,
}

/// Execute the removals, logging each action as it completes.
///
/// Failures on individual files are caught, logged with error status,
/// and never abort the batch. The only errors returned from this
/// function are setup failures (archive directory creation) and the
/// inability to write the log itself, which would silently break the
/// audit trail if ignored.
pub fn apply(
    removals: &[Removal],
    mode: &ApplyMode,
    log: &mut ActionLogWriter,
) -> Result<ApplySummary, OpsError> {
    if let ApplyMode::Archive { dir } = mode {
        fs::create_dir_all(dir).map_err(|source| OpsError::ArchiveDir {
            path: dir.clone(),
            source,
        })?;
    }

    let mut summary = ApplySummary::default();

    for removal in removals {
        let outcome = perform(&removal.path, mode);

        let (destination, status) = match outcome {
            Ok(destination) => {
                summary.removed += 1;
                summary.bytes_reclaimed += removal.size;
                debug!(path = %removal.path.display(), "removed");
                (destination, ActionStatus::Success)
            }
            Err(message) => {
                summary.errors += 1;
                warn!(path = %removal.path.display(), %message, "removal failed");
                (None, ActionStatus::Error(message))
            }
        };

        // One log line per action, flushed before moving on.
        log.append(&ActionLogEntry::new(
            removal.path.clone(),
            destination,
            removal.reason.clone(),
            status,
        ))?;
    }

    Ok(summary)
}

/// Perform one removal. Returns the destination for moves.
fn perform(path: &Path, mode: &ApplyMode) -> Result<Option<PathBuf>, String> {
    match mode {
        ApplyMode::Delete => {
            fs::remove_file(path).map_err(|e| e.to_string())?;
            Ok(None)
        }
        ApplyMode::Trash => {
            trash::delete(path).map_err(|e| e.to_string())?;
            Ok(None)
        }
        ApplyMode::Archive { dir } => {
            if !path.exists() {
                return Err(format!("No such file: {}", path.display()));
            }
            let name = path
                .file_name()
                .ok_or_else(|| format!("Path has no file name: {}", path.display()))?;
            let mut dest = dir.join(name);
            if dest.exists() {
                dest = auto_rename_path(&dest);
            }
            // rename fails across filesystems; fall back to copy+delete.
            if fs::rename(path, &dest).is_err() {
                let options = fs_extra::file::CopyOptions::new();
                fs_extra::file::move_file(path, &dest, &options).map_err(|e| e.to_string())?;
            }
            Ok(Some(dest))
        }
    }
}

/// Generate an auto-renamed path to avoid collisions in the archive.
///
/// For "file.txt", tries "file (1).txt", "file (2).txt", etc.
fn auto_rename_path(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new(""));
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
    let extension = path.extension().and_then(|e| e.to_str());

    for i in 1..1000 {
        let new_name = if let Some(ext) = extension {
            format!("{stem} ({i}).{ext}")
        } else {
            format!("{stem} ({i})")
        };
        let candidate = parent.join(new_name);
        if !candidate.exists() {
            return candidate;
        }
    }

    // Practically unreachable; keep the original and let the move fail.
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_auto_rename_path() {
        let temp = TempDir::new().unwrap();
        let original = temp.path().join("file.txt");
        std::fs::write(&original, "x").unwrap();

        let renamed = auto_rename_path(&original);
        assert_eq!(renamed.file_name().unwrap(), "file (1).txt");

        std::fs::write(&renamed, "y").unwrap();
        let renamed2 = auto_rename_path(&original);
        assert_eq!(renamed2.file_name().unwrap(), "file (2).txt");
    }

    #[test]
    fn test_auto_rename_without_extension() {
        let temp = TempDir::new().unwrap();
        let original = temp.path().join("README");
        std::fs::write(&original, "x").unwrap();

        let renamed = auto_rename_path(&original);
        assert_eq!(renamed.file_name().unwrap(), "README (1)");
    }
}
