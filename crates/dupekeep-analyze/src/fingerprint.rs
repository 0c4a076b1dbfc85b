//! Content fingerprinting.
//!
//! Two modes, per the safety rule that matters here: the partial hash
//! (file size + first 8 KiB) is only ever a candidate filter. Two files
//! that agree on it may still differ later in the file, so every record
//! that ends up in a duplicate group carries a full-content hash.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use blake3::Hasher;

use dupekeep_core::{Fingerprint, ScanError};

/// Bytes sampled from the head of the file for the partial hash.
pub const PARTIAL_HASH_LEN: usize = 8192;

/// Chunk size for full-content hashing.
const READ_BUF_LEN: usize = 64 * 1024;

/// Computes content fingerprints for files.
///
/// Read failures surface as [`ScanError`]s; callers record them as scan
/// warnings and exclude the file from grouping.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fingerprinter;

impl Fingerprinter {
    /// Create a new fingerprinter.
    pub fn new() -> Self {
        Self
    }

    /// Full-content BLAKE3 fingerprint, read in fixed-size chunks.
    pub fn full(&self, path: &Path) -> Result<Fingerprint, ScanError> {
        let mut file = File::open(path).map_err(|e| ScanError::io(path, e))?;
        let mut hasher = Hasher::new();
        let mut buffer = vec![0u8; READ_BUF_LEN];

        loop {
            let n = file.read(&mut buffer).map_err(|e| ScanError::io(path, e))?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }

        Ok(Fingerprint::new(*hasher.finalize().as_bytes()))
    }

    /// Partial fingerprint: size + first 8 KiB.
    ///
    /// Candidate filter only. Never use this to decide a removal.
    pub fn partial(&self, path: &Path, size: u64) -> Result<Fingerprint, ScanError> {
        let mut file = File::open(path).map_err(|e| ScanError::io(path, e))?;
        let mut hasher = Hasher::new();
        hasher.update(&size.to_le_bytes());

        let mut buffer = vec![0u8; PARTIAL_HASH_LEN];
        let mut filled = 0;
        // read() may return short counts; loop until the sample is full or EOF.
        while filled < buffer.len() {
            let n = file
                .read(&mut buffer[filled..])
                .map_err(|e| ScanError::io(path, e))?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        hasher.update(&buffer[..filled]);

        Ok(Fingerprint::new(*hasher.finalize().as_bytes()))
    }
}
