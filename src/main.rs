//! dupekeep - content-addressed duplicate file finder.
//!
//! Usage:
//!   dk scan [PATH]           Scan summary (files, bytes, warnings)
//!   dk plan [PATH]           Dry-run duplicate report (always safe)
//!   dk apply [PATH] --live   Execute a plan (delete/trash/archive)
//!   dk --help                Show help

use std::io::Write;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{bail, Context, Result};
use tracing_subscriber::EnvFilter;

use dupekeep_analyze::{build_plan, DedupeConfig, DedupeFinder, DedupePlan};
use dupekeep_core::ScanWarning;
use dupekeep_ops::{
    apply, read_report_csv, removals_from_rows, write_plan_csv, ActionLogWriter, ApplyMode,
    Removal,
};
use dupekeep_scan::{ScanConfig, Scanner};

#[derive(Parser)]
#[command(
    name = "dupekeep",
    version,
    about = "Find duplicate files and consolidate them safely",
    long_about = "dupekeep fingerprints file content (BLAKE3), groups duplicates, and \
                  picks one file to keep per group.\n\n\
                  `plan` is a dry run and never mutates anything; `apply` only mutates \
                  with the explicit --live flag, and writes an incremental action log \
                  as it goes."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a tree and show what would be considered
    Scan {
        #[command(flatten)]
        scan: ScanArgs,
    },

    /// Compute duplicate groups and the removal plan (dry run)
    Plan {
        #[command(flatten)]
        scan: ScanArgs,

        /// Skip the partial-hash prefilter and full-hash every size match
        #[arg(long)]
        no_fast: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Execute a plan: delete, trash, or archive the removals
    Apply {
        #[command(flatten)]
        scan: ScanArgs,

        /// Actually mutate the filesystem (without this, apply is a dry run)
        #[arg(long)]
        live: bool,

        /// What to do with each removed file
        #[arg(long, default_value = "trash")]
        mode: ModeArg,

        /// Destination directory for --mode archive
        #[arg(long, required_if_eq("mode", "archive"))]
        archive_dir: Option<PathBuf>,

        /// Action log file (JSON lines, appended and flushed per action)
        #[arg(long, default_value = "dupekeep-actions.jsonl")]
        log: PathBuf,

        /// Apply a previously saved CSV report instead of re-planning
        #[arg(long)]
        from_report: Option<PathBuf>,

        /// Skip the partial-hash prefilter and full-hash every size match
        #[arg(long)]
        no_fast: bool,
    },
}

/// Scan options shared by every subcommand.
#[derive(Args)]
struct ScanArgs {
    /// Root directory to scan
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Restrict to file names matching a glob (repeatable, e.g. -F '*.py')
    #[arg(short = 'F', long = "filter")]
    filters: Vec<String>,

    /// Minimum file size to consider (e.g. "1KB", "1MB")
    #[arg(long, default_value = "1B")]
    min_size: String,

    /// Maximum file size to consider
    #[arg(long)]
    max_size: Option<String>,

    /// Maximum directory depth
    #[arg(long)]
    max_depth: Option<u32>,

    /// Skip hidden files and directories
    #[arg(long)]
    no_hidden: bool,

    /// Worker threads (0 = auto)
    #[arg(long, default_value = "0")]
    threads: usize,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum ModeArg {
    Delete,
    #[default]
    Trash,
    Archive,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Scan { scan } => run_scan(&scan),
        Command::Plan {
            scan,
            no_fast,
            format,
            output,
        } => run_plan(&scan, no_fast, format, output),
        Command::Apply {
            scan,
            live,
            mode,
            archive_dir,
            log,
            from_report,
            no_fast,
        } => run_apply(&scan, live, mode, archive_dir, log, from_report, no_fast),
    }
}

/// Build a scan config from CLI flags; bad flags are fatal setup errors.
fn scan_config(args: &ScanArgs) -> Result<ScanConfig> {
    let min_size = parse_size(&args.min_size)
        .with_context(|| format!("Invalid --min-size '{}'", args.min_size))?;
    let max_size = match &args.max_size {
        Some(s) => parse_size(s).with_context(|| format!("Invalid --max-size '{s}'"))?,
        None => u64::MAX,
    };

    let mut builder = ScanConfig::builder();
    builder
        .root(args.path.clone())
        .filters(args.filters.clone())
        .min_size(min_size.max(1))
        .max_size(max_size)
        .include_hidden(!args.no_hidden)
        .threads(args.threads);
    if let Some(depth) = args.max_depth {
        builder.max_depth(Some(depth));
    }
    builder.build().map_err(|e| color_eyre::eyre::eyre!("{e}"))
}

/// Scan and print a summary.
fn run_scan(args: &ScanArgs) -> Result<()> {
    let config = scan_config(args)?;
    eprintln!("Scanning {}...", args.path.display());

    let result = Scanner::new().scan(&config).wrap_err("Scan failed")?;

    println!();
    println!("{}", "─".repeat(60));
    println!(" {}", args.path.display());
    println!(
        " {} files considered, {} total",
        result.stats.files_kept,
        format_size(result.stats.total_bytes)
    );
    println!(
        " {} skipped, {} directories",
        result.stats.files_skipped, result.stats.dirs_seen
    );
    println!(" Scanned in {:.2}s", result.duration.as_secs_f64());
    println!("{}", "─".repeat(60));

    print_warnings(&result.warnings);
    Ok(())
}

/// Scan, find duplicates, and print or write the dry-run plan.
fn run_plan(
    args: &ScanArgs,
    no_fast: bool,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let (plan, warnings) = compute_plan(args, no_fast)?;
    let rendered = render_plan(&plan, format)?;

    match output {
        Some(path) => {
            std::fs::write(&path, rendered)
                .wrap_err_with(|| format!("Cannot write report to {}", path.display()))?;
            eprintln!("Report written to {}", path.display());
        }
        None => {
            print!("{rendered}");
            std::io::stdout().flush()?;
        }
    }

    print_warnings(&warnings);
    print_plan_summary(&plan, warnings.len());
    Ok(())
}

/// Execute (or dry-run) a plan.
fn run_apply(
    args: &ScanArgs,
    live: bool,
    mode: ModeArg,
    archive_dir: Option<PathBuf>,
    log: PathBuf,
    from_report: Option<PathBuf>,
    no_fast: bool,
) -> Result<()> {
    let mode = match mode {
        ModeArg::Delete => ApplyMode::Delete,
        ModeArg::Trash => ApplyMode::Trash,
        ModeArg::Archive => {
            let Some(dir) = archive_dir else {
                bail!("--mode archive requires --archive-dir");
            };
            ApplyMode::Archive { dir }
        }
    };

    let (removals, warning_count) = match from_report {
        Some(report_path) => {
            let rows = read_report_csv(&report_path)
                .wrap_err_with(|| format!("Cannot read report {}", report_path.display()))?;
            (removals_from_rows(&rows), 0)
        }
        None => {
            let (plan, warnings) = compute_plan(args, no_fast)?;
            if !live {
                print!("{}", render_plan_text(&plan));
                print_warnings(&warnings);
                print_plan_summary(&plan, warnings.len());
                println!();
                println!(
                    " Dry run: nothing was changed. Re-run with --live to {}.",
                    mode.label()
                );
                return Ok(());
            }
            (Removal::from_plan(&plan), warnings.len())
        }
    };

    if !live {
        // --from-report without --live: show what the report would do.
        for removal in &removals {
            println!(
                " {} {} ({})",
                mode.label(),
                removal.path.display(),
                removal.reason
            );
        }
        println!();
        println!(
            " Dry run: nothing was changed. Re-run with --live to {}.",
            mode.label()
        );
        return Ok(());
    }

    // Opening the log is a setup error, surfaced before anything runs.
    let mut log_writer = ActionLogWriter::create(&log)
        .wrap_err_with(|| format!("Cannot open action log {}", log.display()))?;

    let total_bytes: u64 = removals.iter().map(|r| r.size).sum();
    eprintln!(
        "Applying {} removals ({}) with mode '{}'...",
        removals.len(),
        format_size(total_bytes),
        mode.label()
    );

    let summary = apply(&removals, &mode, &mut log_writer)?;

    println!();
    println!("{}", "─".repeat(60));
    println!(" Removed:          {}", summary.removed);
    println!(" Reclaimed:        {}", format_size(summary.bytes_reclaimed));
    println!(" Per-file errors:  {}", summary.errors);
    if warning_count > 0 {
        println!(" Scan warnings:    {warning_count}");
    }
    println!(" Action log:       {}", log_writer.path().display());
    println!("{}", "─".repeat(60));

    // Per-file failures are logged, not fatal: exit 0 regardless.
    Ok(())
}

/// Scan and plan in one pass. Pure apart from reads.
fn compute_plan(args: &ScanArgs, no_fast: bool) -> Result<(DedupePlan, Vec<ScanWarning>)> {
    let config = scan_config(args)?;
    eprintln!("Scanning {}...", args.path.display());

    let scan = Scanner::new().scan(&config).wrap_err("Scan failed")?;
    let mut warnings = scan.warnings;

    eprintln!("Fingerprinting {} files...", scan.stats.files_kept);
    let dedupe_config = DedupeConfig::builder()
        .quick_compare(!no_fast)
        .build()
        .map_err(|e| color_eyre::eyre::eyre!("{e}"))?;
    let outcome = DedupeFinder::with_config(dedupe_config).find(scan.records);
    warnings.extend(outcome.warnings);

    Ok((build_plan(&outcome.groups), warnings))
}

/// Render a plan in the requested format.
///
/// The return value is the entire stdout payload of `dk plan`; summaries
/// and warnings go to stderr so `--format csv` output stays parseable
/// when redirected.
fn render_plan(plan: &DedupePlan, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => render_plan_text(plan),
        OutputFormat::Json => serde_json::to_string_pretty(plan)? + "\n",
        OutputFormat::Csv => {
            let mut buf = Vec::new();
            write_plan_csv(plan, &mut buf)?;
            String::from_utf8(buf)?
        }
    })
}

/// Render the plan the way the `plan` subcommand prints it.
fn render_plan_text(plan: &DedupePlan) -> String {
    let mut out = String::new();
    out.push_str(&format!("\n{}\n", "─".repeat(70)));
    out.push_str(" Duplicate Consolidation Plan\n");
    out.push_str(&format!("{}\n\n", "─".repeat(70)));

    if plan.is_empty() {
        out.push_str(" No duplicate files found.\n");
        return out;
    }

    for (i, entry) in plan.entries.iter().enumerate() {
        out.push_str(&format!(
            " Group {} ({} reclaimable)\n",
            i + 1,
            format_size(entry.bytes_reclaimable)
        ));
        out.push_str(&format!("   keep    {}\n", entry.keep.path.display()));
        for record in &entry.remove {
            out.push_str(&format!("   remove  {}\n", record.path.display()));
        }
        out.push('\n');
    }
    out
}

// Stderr, like the progress lines: stdout is reserved for the report
// itself so it can be redirected and fed back to `apply --from-report`.
fn print_plan_summary(plan: &DedupePlan, warning_count: usize) {
    eprintln!();
    eprintln!(
        " {} duplicate groups, {} files to remove, {} reclaimable",
        plan.group_count,
        plan.removal_count,
        format_size(plan.total_reclaimable)
    );
    if warning_count > 0 {
        eprintln!(" {warning_count} file(s) could not be read and were excluded");
    }
}

fn print_warnings(warnings: &[ScanWarning]) {
    for warning in warnings {
        eprintln!(" warning: {}", warning.message);
    }
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Parse a size string (e.g., "1KB", "10MB", "1GB").
fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim().to_uppercase();

    let (num, multiplier) = if s.ends_with("GB") || s.ends_with("G") {
        let num: f64 = s
            .trim_end_matches(|c: char| !c.is_ascii_digit() && c != '.')
            .parse()?;
        (num, 1024 * 1024 * 1024)
    } else if s.ends_with("MB") || s.ends_with("M") {
        let num: f64 = s
            .trim_end_matches(|c: char| !c.is_ascii_digit() && c != '.')
            .parse()?;
        (num, 1024 * 1024)
    } else if s.ends_with("KB") || s.ends_with("K") {
        let num: f64 = s
            .trim_end_matches(|c: char| !c.is_ascii_digit() && c != '.')
            .parse()?;
        (num, 1024)
    } else if s.ends_with('B') {
        let num: f64 = s
            .trim_end_matches(|c: char| !c.is_ascii_digit() && c != '.')
            .parse()?;
        (num, 1)
    } else {
        let num: f64 = s.parse()?;
        (num, 1)
    };

    Ok((num * multiplier as f64) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    use dupekeep_analyze::{DuplicateGroup, FileRecord, Fingerprint};
    use dupekeep_ops::{read_report_csv, removals_from_rows};

    fn sample_plan() -> DedupePlan {
        let base = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);
        let members = vec![
            FileRecord::new("/data/a.txt", 5, base).with_fingerprint(Fingerprint::new([1; 32])),
            FileRecord::new("/data/b.txt", 5, base + Duration::from_secs(60))
                .with_fingerprint(Fingerprint::new([1; 32])),
        ];
        build_plan(&[DuplicateGroup {
            fingerprint: Fingerprint::new([1; 32]),
            size: 5,
            members,
        }])
    }

    #[test]
    fn test_csv_rendering_feeds_back_into_apply() {
        // The entire stdout payload of `dk plan --format csv` must parse
        // as a report; summaries and warnings go to stderr.
        let rendered = render_plan(&sample_plan(), OutputFormat::Csv).unwrap();

        let temp = tempfile::TempDir::new().unwrap();
        let report = temp.path().join("report.csv");
        std::fs::write(&report, &rendered).unwrap();

        let rows = read_report_csv(&report).unwrap();
        let removals = removals_from_rows(&rows);
        assert_eq!(removals.len(), 1);
        assert_eq!(removals[0].path, PathBuf::from("/data/a.txt"));
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("1B").unwrap(), 1);
        assert_eq!(parse_size("1KB").unwrap(), 1024);
        assert_eq!(parse_size("2MB").unwrap(), 2 * 1024 * 1024);
        assert_eq!(parse_size("1.5K").unwrap(), 1536);
        assert_eq!(parse_size("512").unwrap(), 512);
        assert!(parse_size("nonsense").is_err());
    }
}
