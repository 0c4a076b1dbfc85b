//! Scan configuration.

use std::path::PathBuf;

use derive_builder::Builder;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// Configuration for a duplicate scan.
///
/// All knobs are explicit; nothing is read from the environment. Build via
/// [`ScanConfig::builder`] or [`ScanConfig::new`] for the defaults.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Root path to scan.
    pub root: PathBuf,

    /// Glob patterns restricting which file names are considered
    /// (e.g. `*.py`). Empty means every file.
    #[builder(default)]
    #[serde(default)]
    pub filters: Vec<String>,

    /// Minimum file size to consider. Zero-length files are always skipped.
    #[builder(default = "1")]
    #[serde(default = "default_min_size")]
    pub min_size: u64,

    /// Maximum file size to consider.
    #[builder(default = "u64::MAX")]
    #[serde(default = "default_max_size")]
    pub max_size: u64,

    /// Follow symbolic links.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Include hidden files (starting with `.`).
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub include_hidden: bool,

    /// Maximum depth to traverse (None = unlimited).
    #[builder(default)]
    #[serde(default)]
    pub max_depth: Option<u32>,

    /// Number of threads for scanning and hashing (0 = auto-detect).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,
}

fn default_true() -> bool {
    true
}

fn default_min_size() -> u64 {
    1
}

fn default_max_size() -> u64 {
    u64::MAX
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref root) = self.root {
            if root.as_os_str().is_empty() {
                return Err("Root path cannot be empty".to_string());
            }
        } else {
            return Err("Root path is required".to_string());
        }
        if let Some(ref filters) = self.filters {
            for pattern in filters {
                Glob::new(pattern).map_err(|e| format!("Invalid filter '{pattern}': {e}"))?;
            }
        }
        if let (Some(min), Some(max)) = (self.min_size, self.max_size) {
            if min > max {
                return Err(format!("min_size ({min}) exceeds max_size ({max})"));
            }
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a simple config for scanning a path with the defaults.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            filters: Vec::new(),
            min_size: 1,
            max_size: u64::MAX,
            follow_symlinks: false,
            include_hidden: true,
            max_depth: None,
            threads: 0,
        }
    }

    /// Compile the filter patterns into a matcher.
    ///
    /// Returns `None` when no filters are configured (match everything).
    pub fn filter_matcher(&self) -> Result<Option<GlobSet>, ScanError> {
        if self.filters.is_empty() {
            return Ok(None);
        }
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.filters {
            let glob = Glob::new(pattern).map_err(|e| ScanError::InvalidConfig {
                message: format!("Invalid filter '{pattern}': {e}"),
            })?;
            builder.add(glob);
        }
        let set = builder.build().map_err(|e| ScanError::InvalidConfig {
            message: e.to_string(),
        })?;
        Ok(Some(set))
    }

    /// Check whether a file size falls inside the configured bounds.
    pub fn size_in_bounds(&self, size: u64) -> bool {
        size >= self.min_size.max(1) && size <= self.max_size
    }
}
