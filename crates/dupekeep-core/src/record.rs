//! File records and content fingerprints.

use std::path::PathBuf;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// BLAKE3 content fingerprint used as a content-equality proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub [u8; 32]);

impl Fingerprint {
    /// Create a new Fingerprint from raw digest bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the fingerprint as a fixed-length hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// One file on disk as observed at scan time.
///
/// Created during the directory walk, fingerprinted by the analysis
/// pipeline, and immutable afterwards. Records are not persisted as
/// entities; their fields are serialized into report rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Absolute path to the file.
    pub path: PathBuf,

    /// Size in bytes.
    pub size: u64,

    /// Last-modified timestamp.
    pub modified: SystemTime,

    /// Content fingerprint, if one has been computed.
    pub fingerprint: Option<Fingerprint>,
}

impl FileRecord {
    /// Create a new record without a fingerprint.
    pub fn new(path: impl Into<PathBuf>, size: u64, modified: SystemTime) -> Self {
        Self {
            path: path.into(),
            size,
            modified,
            fingerprint: None,
        }
    }

    /// Return a copy of this record carrying the given fingerprint.
    pub fn with_fingerprint(mut self, fingerprint: Fingerprint) -> Self {
        self.fingerprint = Some(fingerprint);
        self
    }

    /// The path rendered for reports and logs.
    pub fn display_path(&self) -> String {
        self.path.display().to_string()
    }
}
