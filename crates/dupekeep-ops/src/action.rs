//! Action and log-entry types.

use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use dupekeep_analyze::DedupePlan;

/// What to do with each file slated for removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyMode {
    /// Delete permanently.
    Delete,
    /// Move to the system trash.
    Trash,
    /// Move into an archive directory, auto-renaming on collision.
    Archive { dir: PathBuf },
}

impl ApplyMode {
    /// Short label used in reports and log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Trash => "trash",
            Self::Archive { .. } => "archive",
        }
    }
}

/// One unit of work for the executor: a file to remove and why.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Removal {
    /// File to remove.
    pub path: PathBuf,
    /// Size in bytes, for the reclaimed-bytes tally.
    pub size: u64,
    /// Human-readable reason, e.g. `duplicate of /path/kept.txt`.
    pub reason: String,
}

impl Removal {
    /// Flatten a plan into executor work items.
    pub fn from_plan(plan: &DedupePlan) -> Vec<Self> {
        plan.removals()
            .map(|(remove, keep)| Self {
                path: remove.path.clone(),
                size: remove.size,
                reason: format!("duplicate of {}", keep.display_path()),
            })
            .collect()
    }
}

/// Outcome of one executed action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "message")]
pub enum ActionStatus {
    /// The action completed.
    Success,
    /// The action failed with this message; the batch continued.
    Error(String),
}

impl ActionStatus {
    /// True for successful actions.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// One record in the action log, written immediately after each action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLogEntry {
    /// The file the action was performed on.
    pub source: PathBuf,
    /// Where it went (archive/trash moves), or None for deletions.
    pub destination: Option<PathBuf>,
    /// Why it was removed.
    pub reason: String,
    /// Success or error-with-message.
    #[serde(flatten)]
    pub status: ActionStatus,
    /// RFC 3339 timestamp of the action.
    pub timestamp: String,
}

impl ActionLogEntry {
    /// Create an entry stamped with the current time.
    pub fn new(
        source: PathBuf,
        destination: Option<PathBuf>,
        reason: impl Into<String>,
        status: ActionStatus,
    ) -> Self {
        Self {
            source,
            destination,
            reason: reason.into(),
            status,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serialization_shape() {
        let entry = ActionLogEntry::new(
            PathBuf::from("/x/a.txt"),
            None,
            "duplicate of /x/b.txt",
            ActionStatus::Success,
        );
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"status\":\"success\""));

        let entry = ActionLogEntry::new(
            PathBuf::from("/x/a.txt"),
            None,
            "duplicate of /x/b.txt",
            ActionStatus::Error("permission denied".to_string()),
        );
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"status\":\"error\""));
        assert!(json.contains("permission denied"));

        let back: ActionLogEntry = serde_json::from_str(&json).unwrap();
        assert!(!back.status.is_success());
    }

    #[test]
    fn test_mode_labels() {
        assert_eq!(ApplyMode::Delete.label(), "delete");
        assert_eq!(ApplyMode::Trash.label(), "trash");
        assert_eq!(
            ApplyMode::Archive { dir: PathBuf::from("/tmp") }.label(),
            "archive"
        );
    }
}
