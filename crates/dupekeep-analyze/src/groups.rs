//! Size grouping, hashing pipeline, and the group builder.

use dashmap::DashMap;
use derive_builder::Builder;
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use dupekeep_core::{FileRecord, Fingerprint, ScanError, ScanWarning, WarningKind};

use crate::fingerprint::Fingerprinter;

/// Configuration for duplicate detection.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
pub struct DedupeConfig {
    /// Prefilter size-matched files with a partial hash (size + first
    /// 8 KiB) before full hashing. Purely a throughput optimization;
    /// groups are always keyed on full-content hashes.
    #[builder(default = "true")]
    pub quick_compare: bool,
}

impl Default for DedupeConfig {
    fn default() -> Self {
        Self { quick_compare: true }
    }
}

impl DedupeConfig {
    /// Create a new config builder.
    pub fn builder() -> DedupeConfigBuilder {
        DedupeConfigBuilder::default()
    }
}

/// A group of two or more files sharing a full-content fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Full-content fingerprint shared by every member.
    pub fingerprint: Fingerprint,

    /// Size of each member in bytes.
    pub size: u64,

    /// Member records, sorted by path.
    pub members: Vec<FileRecord>,
}

impl DuplicateGroup {
    /// Number of files in this group.
    pub fn count(&self) -> usize {
        self.members.len()
    }

    /// Bytes reclaimable if all but one member is removed.
    pub fn wasted_bytes(&self) -> u64 {
        self.size * (self.members.len().saturating_sub(1)) as u64
    }
}

/// Results from a duplicate-detection run.
#[derive(Debug)]
pub struct DedupeOutcome {
    /// Duplicate groups, sorted by wasted bytes descending.
    pub groups: Vec<DuplicateGroup>,
    /// Files that could not be fingerprinted, excluded from grouping.
    pub warnings: Vec<ScanWarning>,
    /// Number of input records considered.
    pub files_analyzed: u64,
}

/// Build the fingerprint → members map in one streaming pass.
///
/// One insertion per record; insertion order is preserved. Records
/// without a fingerprint are skipped (unreadable files never group).
pub fn build_groups(
    records: impl IntoIterator<Item = FileRecord>,
) -> IndexMap<Fingerprint, Vec<FileRecord>> {
    let mut map: IndexMap<Fingerprint, Vec<FileRecord>> = IndexMap::new();
    for record in records {
        let Some(fingerprint) = record.fingerprint else {
            continue;
        };
        map.entry(fingerprint).or_default().push(record);
    }
    map
}

/// Duplicate file finder.
pub struct DedupeFinder {
    config: DedupeConfig,
    fingerprinter: Fingerprinter,
}

impl DedupeFinder {
    /// Create a finder with the default config.
    pub fn new() -> Self {
        Self::with_config(DedupeConfig::default())
    }

    /// Create a finder with a custom config.
    pub fn with_config(config: DedupeConfig) -> Self {
        Self {
            config,
            fingerprinter: Fingerprinter::new(),
        }
    }

    /// Find duplicate groups among the given records.
    ///
    /// Three phases: group by size, optionally prune with a partial hash,
    /// confirm with a full-content hash. Hashing is a pure map over files,
    /// so size classes run in parallel with no ordering requirements.
    pub fn find(&self, records: Vec<FileRecord>) -> DedupeOutcome {
        let files_analyzed = records.len() as u64;

        // Phase 1: size classes. Only classes with 2+ members can
        // contain duplicates.
        let by_size: DashMap<u64, Vec<FileRecord>> = DashMap::new();
        records
            .into_par_iter()
            .for_each(|record| by_size.entry(record.size).or_default().push(record));

        let candidates: Vec<Vec<FileRecord>> = by_size
            .into_iter()
            .filter(|(_, v)| v.len() > 1)
            .map(|(_, v)| v)
            .collect();

        debug!(size_classes = candidates.len(), "hashing candidate size classes");

        // Phases 2+3 per size class, in parallel.
        let results: Vec<(Vec<DuplicateGroup>, Vec<ScanWarning>)> = candidates
            .into_par_iter()
            .map(|class| self.resolve_size_class(class))
            .collect();

        let mut groups = Vec::new();
        let mut warnings = Vec::new();
        for (g, w) in results {
            groups.extend(g);
            warnings.extend(w);
        }

        // Deterministic output order regardless of thread scheduling.
        groups.sort_by(|a, b| {
            b.wasted_bytes()
                .cmp(&a.wasted_bytes())
                .then_with(|| a.fingerprint.to_hex().cmp(&b.fingerprint.to_hex()))
        });

        DedupeOutcome {
            groups,
            warnings,
            files_analyzed,
        }
    }

    /// Resolve one size class into confirmed duplicate groups.
    fn resolve_size_class(
        &self,
        records: Vec<FileRecord>,
    ) -> (Vec<DuplicateGroup>, Vec<ScanWarning>) {
        let mut warnings = Vec::new();

        // Optional partial-hash prefilter. Files that disagree on the
        // first 8 KiB cannot be duplicates and skip full hashing.
        let candidate_sets: Vec<Vec<FileRecord>> = if self.config.quick_compare {
            let mut by_partial: IndexMap<Fingerprint, Vec<FileRecord>> = IndexMap::new();
            for record in records {
                match self.fingerprinter.partial(&record.path, record.size) {
                    Ok(partial) => by_partial.entry(partial).or_default().push(record),
                    Err(err) => warnings.push(warning_for(&record, err)),
                }
            }
            by_partial.into_values().filter(|v| v.len() > 1).collect()
        } else {
            vec![records]
        };

        // Full-content confirmation. Nothing is grouped on a partial hash.
        let mut fingerprinted = Vec::new();
        for set in candidate_sets {
            let hashed: Vec<Result<FileRecord, ScanWarning>> = set
                .into_par_iter()
                .map(|record| match self.fingerprinter.full(&record.path) {
                    Ok(fp) => Ok(record.with_fingerprint(fp)),
                    Err(err) => Err(warning_for(&record, err)),
                })
                .collect();
            for item in hashed {
                match item {
                    Ok(record) => fingerprinted.push(record),
                    Err(warning) => warnings.push(warning),
                }
            }
        }

        let groups = build_groups(fingerprinted)
            .into_iter()
            .filter(|(_, members)| members.len() > 1)
            .map(|(fingerprint, mut members)| {
                // Hashing order depends on thread interleaving; sort so
                // member order (and everything downstream of it) is stable.
                members.sort_by(|a, b| a.path.cmp(&b.path));
                DuplicateGroup {
                    fingerprint,
                    size: members[0].size,
                    members,
                }
            })
            .collect();

        (groups, warnings)
    }
}

impl Default for DedupeFinder {
    fn default() -> Self {
        Self::new()
    }
}

fn warning_for(record: &FileRecord, err: ScanError) -> ScanWarning {
    let kind = match &err {
        ScanError::PermissionDenied { .. } => WarningKind::PermissionDenied,
        _ => WarningKind::ReadError,
    };
    ScanWarning::new(&record.path, err.to_string(), kind)
}
