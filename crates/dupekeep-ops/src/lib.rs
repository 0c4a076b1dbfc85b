//! Effectful half of dupekeep: applying a plan and recording every action.
//!
//! Planning is pure and lives in `dupekeep-analyze`; this crate owns the
//! mutations. The one discipline that matters here: the action log is
//! appended and flushed after **each** individual action, so a run killed
//! partway through leaves a complete record of everything done so far.
//! Per-file failures are logged and never abort the batch.

mod action;
mod apply;
mod log;
mod report;

pub use action::{ActionLogEntry, ActionStatus, ApplyMode, Removal};
pub use apply::{apply, ApplySummary};
pub use log::{read_action_log, ActionLogWriter};
pub use report::{read_report_csv, removals_from_rows, write_plan_csv, ReportRow};

use thiserror::Error;

/// Setup-stage failures: things that abort before or instead of a run.
///
/// Per-file delete/move failures are never an `OpsError`; they become
/// error-status entries in the action log.
#[derive(Debug, Error)]
pub enum OpsError {
    /// Could not create or open the action log file.
    #[error("Cannot open action log {path}: {source}")]
    LogOpen {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not write or flush an action log entry.
    #[error("Failed writing action log: {0}")]
    LogWrite(#[from] std::io::Error),

    /// Could not create the archive directory.
    #[error("Cannot create archive directory {path}: {source}")]
    ArchiveDir {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A report file could not be parsed.
    #[error("Invalid report {path}: {message}")]
    InvalidReport {
        path: std::path::PathBuf,
        message: String,
    },
}
