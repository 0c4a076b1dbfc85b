//! Core types for dupekeep.
//!
//! This crate provides the fundamental data structures shared by the
//! dupekeep ecosystem: file records, content fingerprints, scan
//! configuration, and the error/warning taxonomy.

mod config;
mod error;
mod record;

pub use config::{ScanConfig, ScanConfigBuilder};
pub use error::{ScanError, ScanWarning, WarningKind};
pub use record::{FileRecord, Fingerprint};
