use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use tempfile::TempDir;

use dupekeep_analyze::{build_plan, DedupeFinder, FileRecord};
use dupekeep_ops::{
    apply, read_action_log, read_report_csv, removals_from_rows, write_plan_csv, ActionLogWriter,
    ApplyMode, Removal,
};

fn records_in(root: &Path) -> Vec<FileRecord> {
    fs::read_dir(root)
        .unwrap()
        .filter_map(|e| {
            let entry = e.unwrap();
            let meta = entry.metadata().unwrap();
            if meta.is_file() && meta.len() > 0 {
                Some(FileRecord::new(
                    entry.path(),
                    meta.len(),
                    meta.modified().unwrap(),
                ))
            } else {
                None
            }
        })
        .collect()
}

fn make_duplicates(root: &Path, count: usize, content: &str) -> Vec<std::path::PathBuf> {
    let base = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
    (0..count)
        .map(|i| {
            let path = root.join(format!("copy{i}.txt"));
            fs::write(&path, content).unwrap();
            let f = fs::File::options().write(true).open(&path).unwrap();
            f.set_modified(base + Duration::from_secs(i as u64)).unwrap();
            path
        })
        .collect()
}

#[test]
fn test_apply_delete_removes_and_logs() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("tree");
    fs::create_dir(&root).unwrap();
    make_duplicates(&root, 3, "same content");

    let outcome = DedupeFinder::new().find(records_in(&root));
    let plan = build_plan(&outcome.groups);
    assert_eq!(plan.removal_count, 2);

    let log_path = temp.path().join("actions.jsonl");
    let mut log = ActionLogWriter::create(&log_path).unwrap();
    let removals = Removal::from_plan(&plan);
    let summary = apply(&removals, &ApplyMode::Delete, &mut log).unwrap();

    assert_eq!(summary.removed, 2);
    assert_eq!(summary.errors, 0);
    assert_eq!(summary.bytes_reclaimed, plan.total_reclaimable);

    // The keep survives; the removals are gone.
    assert!(plan.entries[0].keep.path.exists());
    for record in &plan.entries[0].remove {
        assert!(!record.path.exists());
    }

    let entries = read_action_log(&log_path).unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.status.is_success()));
    assert!(entries.iter().all(|e| e.destination.is_none()));
    assert!(entries.iter().all(|e| e.reason.starts_with("duplicate of ")));
}

#[test]
fn test_apply_is_idempotent_for_already_removed_files() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("tree");
    fs::create_dir(&root).unwrap();
    make_duplicates(&root, 3, "payload payload");

    let plan = build_plan(&DedupeFinder::new().find(records_in(&root)).groups);
    let removals = Removal::from_plan(&plan);

    // First pass removes one of the two planned files out-of-band.
    fs::remove_file(&removals[0].path).unwrap();

    let log_path = temp.path().join("actions.jsonl");
    let mut log = ActionLogWriter::create(&log_path).unwrap();
    let summary = apply(&removals, &ApplyMode::Delete, &mut log).unwrap();

    // The missing file is an error row; the rest completes.
    assert_eq!(summary.errors, 1);
    assert_eq!(summary.removed, removals.len() as u64 - 1);

    let entries = read_action_log(&log_path).unwrap();
    assert_eq!(entries.len(), removals.len());
    assert_eq!(entries.iter().filter(|e| !e.status.is_success()).count(), 1);
}

#[test]
fn test_interrupted_apply_leaves_complete_prefix() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("tree");
    fs::create_dir(&root).unwrap();
    make_duplicates(&root, 6, "zzzz");

    let plan = build_plan(&DedupeFinder::new().find(records_in(&root)).groups);
    let removals = Removal::from_plan(&plan);
    assert_eq!(removals.len(), 5);

    // Simulate a process killed after 2 of 5 removals: only the first
    // two work items ever reach the executor.
    let log_path = temp.path().join("actions.jsonl");
    let mut log = ActionLogWriter::create(&log_path).unwrap();
    apply(&removals[..2], &ApplyMode::Delete, &mut log).unwrap();
    drop(log);

    let entries = read_action_log(&log_path).unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.status.is_success()));

    // Re-planning against the mutated tree sees the two files as gone.
    let replan = build_plan(&DedupeFinder::new().find(records_in(&root)).groups);
    assert_eq!(replan.removal_count, 3);
}

#[test]
fn test_archive_mode_moves_and_auto_renames() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("tree");
    fs::create_dir(&root).unwrap();

    // Two duplicate pairs whose removal targets share a file name.
    fs::create_dir(root.join("x")).unwrap();
    fs::create_dir(root.join("y")).unwrap();
    fs::write(root.join("x/note.txt"), "alpha").unwrap();
    fs::write(root.join("keep_a.txt"), "alpha").unwrap();
    fs::write(root.join("y/note.txt"), "beta!").unwrap();
    fs::write(root.join("keep_b.txt"), "beta!").unwrap();

    let archive = temp.path().join("archive");
    let removals = vec![
        Removal {
            path: root.join("x/note.txt"),
            size: 5,
            reason: "duplicate of keep_a.txt".into(),
        },
        Removal {
            path: root.join("y/note.txt"),
            size: 5,
            reason: "duplicate of keep_b.txt".into(),
        },
    ];

    let log_path = temp.path().join("actions.jsonl");
    let mut log = ActionLogWriter::create(&log_path).unwrap();
    let summary = apply(
        &removals,
        &ApplyMode::Archive { dir: archive.clone() },
        &mut log,
    )
    .unwrap();

    assert_eq!(summary.removed, 2);
    assert!(archive.join("note.txt").exists());
    assert!(archive.join("note (1).txt").exists());

    let entries = read_action_log(&log_path).unwrap();
    assert!(entries.iter().all(|e| e.destination.is_some()));
}

#[test]
fn test_csv_report_is_byte_stable_across_passes() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("tree");
    fs::create_dir(&root).unwrap();
    // Enough duplicates that parallel hashing actually interleaves.
    make_duplicates(&root, 64, "many identical copies of this line");

    let mut outputs = std::collections::HashSet::new();
    for _ in 0..5 {
        let plan = build_plan(&DedupeFinder::new().find(records_in(&root)).groups);
        let mut buf = Vec::new();
        write_plan_csv(&plan, &mut buf).unwrap();
        outputs.insert(buf);
    }

    assert_eq!(outputs.len(), 1);
}

#[test]
fn test_report_feeds_apply() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("tree");
    fs::create_dir(&root).unwrap();
    make_duplicates(&root, 2, "report driven");

    let plan = build_plan(&DedupeFinder::new().find(records_in(&root)).groups);

    let report_path = temp.path().join("report.csv");
    let mut buf = Vec::new();
    write_plan_csv(&plan, &mut buf).unwrap();
    fs::write(&report_path, &buf).unwrap();

    // Apply from the saved report rather than the in-memory plan.
    let rows = read_report_csv(&report_path).unwrap();
    let removals = removals_from_rows(&rows);
    assert_eq!(removals.len(), 1);

    let mut log = ActionLogWriter::create(temp.path().join("actions.jsonl")).unwrap();
    let summary = apply(&removals, &ApplyMode::Delete, &mut log).unwrap();

    assert_eq!(summary.removed, 1);
    assert_eq!(summary.bytes_reclaimed, plan.total_reclaimable);
}
