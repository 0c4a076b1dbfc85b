//! Dry-run report files.
//!
//! The CSV layout is stable across runs so reports can be diffed, and a
//! saved report can be read back and fed to the executor as a resumable
//! instruction set.

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use dupekeep_analyze::DedupePlan;

use crate::action::Removal;
use crate::OpsError;

/// One row of the dry-run report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    /// File slated for removal.
    pub original_path: String,
    /// Planned action ("remove" in dry-run reports; archives record the
    /// destination once applied).
    pub new_path_or_action: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Why, e.g. `duplicate of /path/kept.txt`.
    pub reason: String,
    /// Row status; always "planned" when written by the planner.
    pub status: String,
}

/// Write a plan as a CSV report: one row per planned removal.
pub fn write_plan_csv<W: Write>(plan: &DedupePlan, out: W) -> Result<(), OpsError> {
    let mut writer = csv::Writer::from_writer(out);
    for (remove, keep) in plan.removals() {
        writer
            .serialize(ReportRow {
                original_path: remove.display_path(),
                new_path_or_action: "remove".to_string(),
                size_bytes: remove.size,
                reason: format!("duplicate of {}", keep.display_path()),
                status: "planned".to_string(),
            })
            .map_err(csv_io)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a previously written report back.
pub fn read_report_csv(path: &Path) -> Result<Vec<ReportRow>, OpsError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| OpsError::InvalidReport {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let mut rows = Vec::new();
    for result in reader.deserialize() {
        let row: ReportRow = result.map_err(|e| OpsError::InvalidReport {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        rows.push(row);
    }
    Ok(rows)
}

/// Convert report rows into executor work items.
pub fn removals_from_rows(rows: &[ReportRow]) -> Vec<Removal> {
    rows.iter()
        .map(|row| Removal {
            path: row.original_path.clone().into(),
            size: row.size_bytes,
            reason: row.reason.clone(),
        })
        .collect()
}

fn csv_io(err: csv::Error) -> OpsError {
    OpsError::LogWrite(std::io::Error::other(err))
}
