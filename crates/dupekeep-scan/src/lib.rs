//! File system scanning for dupekeep.
//!
//! Walks a directory tree in parallel and produces a flat list of
//! [`FileRecord`](dupekeep_core::FileRecord)s for the analysis pipeline,
//! together with non-fatal warnings for anything that could not be read.

mod walker;

pub use walker::{ScanResult, ScanStats, Scanner};

// Re-export core types callers always need alongside the scanner.
pub use dupekeep_core::{ScanConfig, ScanError, ScanWarning};
