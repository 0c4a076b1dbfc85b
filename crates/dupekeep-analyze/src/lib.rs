//! Duplicate detection pipeline for dupekeep.
//!
//! The pipeline is a single linear pass:
//!
//! 1. **Fingerprint engine** — size grouping, optional partial-hash
//!    prefilter (first 8 KiB + size), full BLAKE3 hash. The partial hash
//!    is a candidate filter only; nothing enters a duplicate group without
//!    a full-content hash.
//! 2. **Group builder** — one map insertion per file, keyed by the full
//!    fingerprint. Unreadable files are excluded and reported, never
//!    grouped with each other.
//! 3. **Retention policy** — a pure total order picks exactly one `keep`
//!    per group (newest mtime, then shortest path, then lexicographic).
//! 4. **Planner** — a pure `build_plan` turns groups into removal entries
//!    with reclaimable-byte totals. No filesystem mutation anywhere in
//!    this crate beyond reads.
//!
//! ```rust,ignore
//! use dupekeep_analyze::{DedupeConfig, DedupeFinder, build_plan};
//! use dupekeep_scan::{ScanConfig, Scanner};
//!
//! let scan = Scanner::new().scan(&ScanConfig::new("/path")).unwrap();
//! let outcome = DedupeFinder::new().find(scan.records);
//! let plan = build_plan(&outcome.groups);
//! println!("{} bytes reclaimable", plan.total_reclaimable);
//! ```

mod fingerprint;
mod groups;
mod plan;
mod retention;

pub use fingerprint::{Fingerprinter, PARTIAL_HASH_LEN};
pub use groups::{
    build_groups, DedupeConfig, DedupeConfigBuilder, DedupeFinder, DedupeOutcome, DuplicateGroup,
};
pub use plan::{build_plan, DedupePlan, PlanEntry};
pub use retention::{decide, RetentionDecision};

// Re-export core types
pub use dupekeep_core::{FileRecord, Fingerprint, ScanWarning};
