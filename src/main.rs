//! stalefile - Find large, old files and move them out of the way.
//!
//! Usage:
//!   stalefile                      Scan the home directory, confirm, move to ~/trash
//!   stalefile --dir D --size 500   Scan D for files over 500 MB
//!   stalefile --dry-run            Report only, never move
//!   stalefile --help               Show help

use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local};
use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Context, Result, eyre};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;

use stalefile_core::Settings;
use stalefile_ops::{
    ConflictPolicy, CrossDevicePolicy, RelocateEvent, RelocateOptions, RelocationReport,
    Relocator, start_relocate,
};
use stalefile_scan::{FilterCriteria, MatchedFile, ScanConfig, ScanEngine, ScanObserver, ScanOutcome};

const DEFAULT_SIZE_MB: u64 = 100;
const DEFAULT_DAYS: f64 = 365.0;
const DEFAULT_EXCLUDE: [&str; 2] = [".docx", ".xlsx"];
const LOG_FILE_NAME: &str = "stalefile.log";

#[derive(Parser)]
#[command(
    name = "stalefile",
    version,
    about = "Find and remove large, old files",
    long_about = "stalefile scans a directory tree for files that are larger and older \
                  than the given limits, reports them, and after confirmation moves \
                  them into a trash directory."
)]
struct Cli {
    /// Directory to scan (defaults to the home directory)
    #[arg(long)]
    dir: Option<PathBuf>,

    /// File size limit in MB
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    size: Option<u64>,

    /// File age limit in days
    #[arg(long)]
    days: Option<f64>,

    /// File extensions to exclude (defaults to .docx .xlsx)
    #[arg(long, num_args = 0..)]
    exclude: Option<Vec<String>>,

    /// Directory to move files to (defaults to ~/trash)
    #[arg(long)]
    trash: Option<PathBuf>,

    /// Number of worker threads (0 = one per CPU)
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Settings file (TOML); flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Move without asking for confirmation
    #[arg(short, long)]
    yes: bool,

    /// Only report, never move anything
    #[arg(long)]
    dry_run: bool,

    /// Rename on name clashes in the trash instead of skipping the file
    #[arg(long)]
    auto_rename: bool,

    /// Fail cross-filesystem moves instead of copying then deleting
    #[arg(long)]
    no_copy_fallback: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Also log to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Everything needed for one run, after merging defaults, settings, and flags.
struct RunOptions {
    scan_config: ScanConfig,
    trash: PathBuf,
    relocate: RelocateOptions,
}

impl RunOptions {
    fn resolve(cli: &Cli, settings: Settings) -> Result<Self> {
        let home = dirs::home_dir();
        let dir = match cli.dir.clone().or(settings.dir) {
            Some(dir) => dir,
            None => home.clone().ok_or_else(|| eyre!("No home directory; pass --dir"))?,
        };
        let trash = match cli.trash.clone().or(settings.trash) {
            Some(trash) => trash,
            None => home
                .map(|h| h.join("trash"))
                .ok_or_else(|| eyre!("No home directory; pass --trash"))?,
        };

        let size_mb = cli.size.or(settings.size_mb).unwrap_or(DEFAULT_SIZE_MB);
        let days = cli.days.or(settings.days).unwrap_or(DEFAULT_DAYS);
        let exclude = cli
            .exclude
            .clone()
            .or(settings.exclude)
            .unwrap_or_else(|| DEFAULT_EXCLUDE.iter().map(|s| s.to_string()).collect());

        let criteria = FilterCriteria::builder()
            .size_limit_bytes(size_mb.saturating_mul(1024 * 1024))
            .age_limit_days(days)
            .excluded_extensions(exclude)
            .build()
            .context("Invalid filter")?;

        let scan_config = ScanConfig::builder()
            .root(dir)
            .criteria(criteria)
            .threads(cli.threads.or(settings.threads).unwrap_or(0))
            .skip_paths(vec![trash.clone()])
            .build()
            .context("Invalid scan configuration")?;

        let relocate = RelocateOptions {
            conflict: if cli.auto_rename {
                ConflictPolicy::AutoRename
            } else {
                ConflictPolicy::Fail
            },
            cross_device: if cli.no_copy_fallback {
                CrossDevicePolicy::Fail
            } else {
                CrossDevicePolicy::CopyThenDelete
            },
        };

        Ok(Self {
            scan_config,
            trash,
            relocate,
        })
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    scan: &'a ScanOutcome,
    relocation: Option<&'a RelocationReport>,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let settings = match &cli.config {
        Some(path) => Settings::load(path).context("Invalid settings file")?,
        None => Settings::default(),
    };
    let options = RunOptions::resolve(&cli, settings)?;

    init_logging(&options.trash, cli.verbose, !cli.dry_run)?;
    info!(
        dir = %options.scan_config.root.display(),
        size_limit = options.scan_config.criteria.size_limit_bytes,
        days_limit = options.scan_config.criteria.age_limit_days,
        excluded = ?options.scan_config.criteria.excluded_extensions,
        trash = %options.trash.display(),
        "initialized"
    );

    let mut outcome = run_scan(&options, cli.format).await?;
    outcome.match_set.sort_by_size_desc();

    if cli.format == OutputFormat::Text {
        print_scan_summary(&outcome);
    }

    let relocation = if cli.dry_run || outcome.match_set.is_empty() {
        None
    } else if cli.yes || confirm(&outcome, &options.trash)? {
        Some(run_relocate(&options, &outcome, cli.format).await)
    } else {
        eprintln!("Nothing moved.");
        None
    };

    match cli.format {
        OutputFormat::Text => {
            if let Some(report) = &relocation {
                print_relocation_summary(report);
            }
        }
        OutputFormat::Json => {
            let report = JsonReport {
                scan: &outcome,
                relocation: relocation.as_ref(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

/// Install the log sink: a file in the trash directory, plus stderr if verbose.
fn init_logging(trash: &Path, verbose: bool, to_file: bool) -> Result<()> {
    let file_layer = if to_file {
        std::fs::create_dir_all(trash)
            .with_context(|| format!("Cannot create {}", trash.display()))?;
        let log_path = trash.join(LOG_FILE_NAME);
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("Cannot open log file {}", log_path.display()))?;
        Some(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
    } else {
        None
    };

    let stderr_layer = verbose.then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(LevelFilter::INFO)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .context("Failed to initialize logging")?;
    Ok(())
}

/// Prints each match as soon as a worker finds it.
struct MatchPrinter;

impl ScanObserver for MatchPrinter {
    fn on_match(&self, matched: &MatchedFile) {
        let modified: DateTime<Local> = matched.modified.into();
        println!(
            "Old, large file: {} Size: {:.2} MB Modified: {}",
            matched.path().display(),
            matched.size_bytes as f64 / 1024.0 / 1024.0,
            modified.format("%Y-%m-%d")
        );
    }
}

/// Run the scan on a blocking thread while rendering progress.
async fn run_scan(options: &RunOptions, format: OutputFormat) -> Result<ScanOutcome> {
    let mut engine = ScanEngine::new();
    if format == OutputFormat::Text {
        engine = engine.with_observer(Arc::new(MatchPrinter));
    }

    let show_progress = std::io::stderr().is_terminal();
    let mut progress_rx = engine.subscribe();
    let progress_task = tokio::spawn(async move {
        loop {
            match progress_rx.recv().await {
                Ok(progress) => {
                    if show_progress {
                        eprint!(
                            "\rScanning files... {} evaluated, {} matched",
                            progress.entries_evaluated, progress.matches
                        );
                    }
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
        if show_progress {
            eprintln!();
        }
    });

    if format == OutputFormat::Text {
        eprintln!("Starting the file scanning process... This may take a while, please hang tight.");
    }

    let config = options.scan_config.clone();
    let outcome = tokio::task::spawn_blocking(move || engine.scan(&config))
        .await
        .context("Scan task failed")?
        .context("Scan failed")?;
    progress_task.await.context("Progress task failed")?;

    Ok(outcome)
}

/// Move the matches, cancelling between files on Ctrl-C.
async fn run_relocate(
    options: &RunOptions,
    outcome: &ScanOutcome,
    format: OutputFormat,
) -> RelocationReport {
    let relocator = Relocator::new(&options.trash).with_options(options.relocate);
    let cancel = CancellationToken::new();

    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let show_progress = format == OutputFormat::Text && std::io::stderr().is_terminal();
    let mut rx = start_relocate(relocator, outcome.match_set.clone(), cancel);

    let mut report = RelocationReport::new();
    while let Some(event) = rx.recv().await {
        match event {
            RelocateEvent::Progress(progress) => {
                if show_progress {
                    eprint!(
                        "\rMoving files: {}/{} ({:.0}%)",
                        progress.files_completed,
                        progress.files_total,
                        progress.percentage()
                    );
                }
            }
            RelocateEvent::Complete(complete) => report = complete,
        }
    }
    if show_progress {
        eprintln!();
    }

    report
}

/// Ask for explicit confirmation. Anything but "y"/"yes" declines.
fn confirm(outcome: &ScanOutcome, trash: &Path) -> Result<bool> {
    eprint!(
        "Move {} files ({:.2} GB) to {}? [y/N] ",
        outcome.stats.file_count,
        outcome.stats.total_gib(),
        trash.display()
    );
    std::io::stderr().flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn print_scan_summary(outcome: &ScanOutcome) {
    println!();
    println!("{}", "─".repeat(60));
    println!(
        " {} files matched out of {} evaluated",
        outcome.stats.file_count, outcome.summary.entries_evaluated
    );
    println!(
        " Total size to be moved to trash: {:.2} GB ({})",
        outcome.stats.total_gib(),
        format_size(outcome.stats.total_bytes)
    );
    println!(
        " Scanned in {:.2}s",
        outcome.summary.duration.as_secs_f64()
    );
    if !outcome.warnings.is_empty() {
        println!(" {} warning(s) during scan", outcome.warnings.len());
    }
    println!("{}", "─".repeat(60));
}

fn print_relocation_summary(report: &RelocationReport) {
    println!();
    println!(" {} ({})", report.summary(), format_size(report.bytes_moved));
    for failure in &report.errors {
        println!("   {failure}");
    }
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("stalefile").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let options = RunOptions::resolve(&cli(&["--dir", "/data", "--trash", "/t"]), Settings::default())
            .unwrap();

        let criteria = &options.scan_config.criteria;
        assert_eq!(criteria.size_limit_bytes, 100 * 1024 * 1024);
        assert_eq!(criteria.age_limit_days, 365.0);
        assert!(criteria.is_excluded(".docx"));
        assert_eq!(options.scan_config.skip_paths, vec![PathBuf::from("/t")]);
        assert_eq!(options.relocate.conflict, ConflictPolicy::Fail);
        assert_eq!(options.relocate.cross_device, CrossDevicePolicy::CopyThenDelete);
    }

    #[test]
    fn test_flags_override_settings() {
        let settings = Settings {
            size_mb: Some(5),
            days: Some(10.0),
            exclude: Some(vec![".iso".to_string()]),
            ..Default::default()
        };
        let options = RunOptions::resolve(
            &cli(&["--dir", "/data", "--trash", "/t", "--size", "7", "--auto-rename"]),
            settings,
        )
        .unwrap();

        let criteria = &options.scan_config.criteria;
        assert_eq!(criteria.size_limit_bytes, 7 * 1024 * 1024);
        assert_eq!(criteria.age_limit_days, 10.0);
        assert!(criteria.is_excluded(".iso"));
        assert!(!criteria.is_excluded(".docx"));
        assert_eq!(options.relocate.conflict, ConflictPolicy::AutoRename);
    }

    #[test]
    fn test_empty_exclude_list() {
        let options = RunOptions::resolve(
            &cli(&["--dir", "/data", "--trash", "/t", "--exclude"]),
            Settings::default(),
        )
        .unwrap();
        assert!(options.scan_config.criteria.excluded_extensions.is_empty());
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(Cli::try_parse_from(["stalefile", "--size", "0"]).is_err());

        let settings = Settings {
            size_mb: Some(0),
            ..Default::default()
        };
        let result = RunOptions::resolve(&cli(&["--dir", "/data", "--trash", "/t"]), settings);
        assert!(result.is_err());
    }

    #[test]
    fn test_negative_days_rejected() {
        let result = RunOptions::resolve(
            &cli(&["--dir", "/data", "--trash", "/t", "--days=-3"]),
            Settings::default(),
        );
        assert!(result.is_err());
    }
}
