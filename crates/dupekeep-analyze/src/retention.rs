//! Retention policy: pick exactly one file to keep per duplicate group.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use dupekeep_core::FileRecord;

use crate::groups::DuplicateGroup;

/// The outcome of the retention policy for one duplicate group.
///
/// `keep` is always a member of the group it was chosen from and
/// `remove` is the rest of the group, in member order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionDecision {
    /// The single record to retain.
    pub keep: FileRecord,
    /// Everything else in the group.
    pub remove: Vec<FileRecord>,
}

/// Decide which member of a duplicate group to keep.
///
/// Pure function, no I/O. The ordering is total, so any permutation of
/// the same group yields the same decision:
///
/// 1. most recent modification time wins;
/// 2. tie → shortest path string (nested backup copies tend to have
///    longer paths than the canonical one);
/// 3. tie → lexicographically smallest path.
pub fn decide(group: &DuplicateGroup) -> RetentionDecision {
    debug_assert!(group.members.len() >= 2);

    let keep_idx = group
        .members
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| preference(a, b))
        .map(|(i, _)| i)
        .unwrap_or(0);

    let keep = group.members[keep_idx].clone();
    let remove = group
        .members
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != keep_idx)
        .map(|(_, r)| r.clone())
        .collect();

    RetentionDecision { keep, remove }
}

/// Total preference order: `Greater` means "prefer a over b".
fn preference(a: &FileRecord, b: &FileRecord) -> Ordering {
    let a_path = a.path.to_string_lossy();
    let b_path = b.path.to_string_lossy();

    a.modified
        .cmp(&b.modified)
        .then_with(|| b_path.len().cmp(&a_path.len()))
        .then_with(|| b_path.cmp(&a_path))
}
