//! JWalk-based parallel directory walker.

use std::path::PathBuf;
use std::time::Instant;

use jwalk::{Parallelism, WalkDir};
use serde::{Deserialize, Serialize};
use tracing::debug;

use dupekeep_core::{FileRecord, ScanConfig, ScanError, ScanWarning, WarningKind};

/// Summary statistics for a scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanStats {
    /// Files that matched the filters and were kept.
    pub files_kept: u64,
    /// Files seen but skipped (filters, size bounds, symlinks, empty).
    pub files_skipped: u64,
    /// Directories traversed.
    pub dirs_seen: u64,
    /// Total bytes across kept files.
    pub total_bytes: u64,
}

/// Outcome of a scan: the records to analyze plus everything that went
/// wrong along the way.
#[derive(Debug)]
pub struct ScanResult {
    /// One record per kept file, unfingerprinted.
    pub records: Vec<FileRecord>,
    /// Scan statistics.
    pub stats: ScanStats,
    /// Non-fatal warnings (unreadable entries, metadata failures).
    pub warnings: Vec<ScanWarning>,
    /// Wall-clock duration of the walk.
    pub duration: std::time::Duration,
}

/// Parallel scanner producing flat file records.
pub struct Scanner;

impl Scanner {
    /// Create a new scanner.
    pub fn new() -> Self {
        Self
    }

    /// Walk the configured root and collect file records.
    ///
    /// Setup failures (missing root, root not a directory, bad filters)
    /// are errors; anything that goes wrong on an individual entry is
    /// recorded as a warning and the walk continues.
    pub fn scan(&self, config: &ScanConfig) -> Result<ScanResult, ScanError> {
        let start = Instant::now();
        let root = config
            .root
            .canonicalize()
            .map_err(|e| ScanError::io(&config.root, e))?;

        if !root.is_dir() {
            return Err(ScanError::NotADirectory { path: root });
        }

        let matcher = config.filter_matcher()?;

        let parallelism = match config.threads {
            0 => Parallelism::RayonDefaultPool {
                busy_timeout: std::time::Duration::from_millis(100),
            },
            n => Parallelism::RayonNewPool(n),
        };

        let walker = WalkDir::new(&root)
            .parallelism(parallelism)
            .skip_hidden(!config.include_hidden)
            .follow_links(config.follow_symlinks)
            .max_depth(config.max_depth.map(|d| d as usize).unwrap_or(usize::MAX));

        let mut records = Vec::new();
        let mut stats = ScanStats::default();
        let mut warnings = Vec::new();

        for entry_result in walker {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(PathBuf::from).unwrap_or_default();
                    warnings.push(ScanWarning::new(path, err.to_string(), WarningKind::ReadError));
                    continue;
                }
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                stats.dirs_seen += 1;
                continue;
            }
            // Symlinks are identity-ambiguous; dedup only regular files.
            if file_type.is_symlink() {
                stats.files_skipped += 1;
                continue;
            }
            if !file_type.is_file() {
                stats.files_skipped += 1;
                continue;
            }

            let path = entry.path();
            let name = entry.file_name().to_string_lossy();

            if let Some(ref matcher) = matcher {
                if !matcher.is_match(name.as_ref()) {
                    stats.files_skipped += 1;
                    continue;
                }
            }

            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(err) => {
                    let io_err = err
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("metadata unavailable"));
                    warnings.push(ScanWarning::metadata_error(&path, &io_err));
                    continue;
                }
            };

            let size = metadata.len();
            if !config.size_in_bounds(size) {
                stats.files_skipped += 1;
                continue;
            }

            let modified = metadata.modified().unwrap_or(std::time::UNIX_EPOCH);

            stats.files_kept += 1;
            stats.total_bytes += size;
            records.push(FileRecord::new(path, size, modified));
        }

        let duration = start.elapsed();
        debug!(
            kept = stats.files_kept,
            skipped = stats.files_skipped,
            warnings = warnings.len(),
            "scan complete in {:.2}s",
            duration.as_secs_f64()
        );

        Ok(ScanResult {
            records,
            stats,
            warnings,
            duration,
        })
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir(root.join("dir1")).unwrap();
        fs::create_dir(root.join("dir1/subdir")).unwrap();

        fs::write(root.join("file1.txt"), "hello").unwrap();
        fs::write(root.join("dir1/file2.txt"), "world world world").unwrap();
        fs::write(root.join("dir1/subdir/file3.py"), "print('hi')").unwrap();
        fs::write(root.join("empty.txt"), "").unwrap();

        temp
    }

    #[test]
    fn test_basic_scan() {
        let temp = create_test_tree();
        let config = ScanConfig::new(temp.path());

        let result = Scanner::new().scan(&config).unwrap();

        // empty.txt is skipped (zero length)
        assert_eq!(result.stats.files_kept, 3);
        assert_eq!(result.records.len(), 3);
        assert!(result.stats.total_bytes > 0);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let config = ScanConfig::new("/definitely/not/a/real/path");
        let err = Scanner::new().scan(&config).unwrap_err();
        assert!(matches!(err, ScanError::NotFound { .. }));
    }

    #[test]
    fn test_root_must_be_directory() {
        let temp = create_test_tree();
        let config = ScanConfig::new(temp.path().join("file1.txt"));
        let err = Scanner::new().scan(&config).unwrap_err();
        assert!(matches!(err, ScanError::NotADirectory { .. }));
    }

    #[test]
    fn test_filters_restrict_extension() {
        let temp = create_test_tree();
        let config = ScanConfig::builder()
            .root(temp.path())
            .filters(vec!["*.py".to_string()])
            .build()
            .unwrap();

        let result = Scanner::new().scan(&config).unwrap();
        assert_eq!(result.records.len(), 1);
        assert!(result.records[0].path.ends_with("file3.py"));
    }

    #[test]
    fn test_size_bounds_skip_files() {
        let temp = create_test_tree();
        let config = ScanConfig::builder()
            .root(temp.path())
            .min_size(10u64)
            .build()
            .unwrap();

        let result = Scanner::new().scan(&config).unwrap();
        // "hello" (5 bytes) is out of bounds
        assert!(result.records.iter().all(|r| r.size >= 10));
    }

    #[test]
    fn test_records_are_unfingerprinted() {
        let temp = create_test_tree();
        let config = ScanConfig::new(temp.path());
        let result = Scanner::new().scan(&config).unwrap();
        assert!(result.records.iter().all(|r| r.fingerprint.is_none()));
    }
}
