//! Pure planning: turn duplicate groups into a removal plan.

use serde::{Deserialize, Serialize};

use dupekeep_core::FileRecord;

use crate::groups::DuplicateGroup;
use crate::retention;

/// One planned consolidation: keep one file, remove the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanEntry {
    /// The record retained.
    pub keep: FileRecord,
    /// Records slated for removal.
    pub remove: Vec<FileRecord>,
    /// Bytes reclaimed if every removal succeeds.
    pub bytes_reclaimable: u64,
}

/// A dry-run plan over a set of duplicate groups.
///
/// Building a plan never touches the filesystem; planning twice over an
/// untouched tree produces identical plans.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupePlan {
    /// One entry per duplicate group.
    pub entries: Vec<PlanEntry>,
    /// Sum of `bytes_reclaimable` over all entries.
    pub total_reclaimable: u64,
    /// Number of duplicate groups.
    pub group_count: usize,
    /// Number of files slated for removal.
    pub removal_count: usize,
}

impl DedupePlan {
    /// True when there is nothing to do.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over every planned removal with its keep counterpart.
    pub fn removals(&self) -> impl Iterator<Item = (&FileRecord, &FileRecord)> {
        self.entries
            .iter()
            .flat_map(|e| e.remove.iter().map(move |r| (r, &e.keep)))
    }
}

/// Build a plan from duplicate groups. Pure; always safe to call.
pub fn build_plan(groups: &[DuplicateGroup]) -> DedupePlan {
    let mut entries: Vec<PlanEntry> = groups
        .iter()
        .map(|group| {
            let decision = retention::decide(group);
            let bytes_reclaimable = group.size * decision.remove.len() as u64;
            PlanEntry {
                keep: decision.keep,
                remove: decision.remove,
                bytes_reclaimable,
            }
        })
        .collect();

    // Stable, input-order-independent presentation.
    entries.sort_by(|a, b| {
        b.bytes_reclaimable
            .cmp(&a.bytes_reclaimable)
            .then_with(|| a.keep.path.cmp(&b.keep.path))
    });

    let total_reclaimable = entries.iter().map(|e| e.bytes_reclaimable).sum();
    let removal_count = entries.iter().map(|e| e.remove.len()).sum();
    let group_count = entries.len();

    DedupePlan {
        entries,
        total_reclaimable,
        group_count,
        removal_count,
    }
}
