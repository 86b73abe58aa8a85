//! Parallel scan-filter engine.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use rayon::ThreadPool;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use stalefile_core::{
    FileEntry, FilterCriteria, MatchSet, RunStats, ScanConfig, ScanError, ScanWarning,
};

use crate::collector::MatchCollector;
use crate::filter::evaluate;
use crate::progress::{ProgressCounters, ScanObserver, ScanProgress};
use crate::walker::Walker;

/// How many evaluations between progress broadcasts.
const PROGRESS_INTERVAL: u64 = 1000;

/// Counts describing a finished scan.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ScanSummary {
    /// Entries evaluated, including skipped ones.
    pub entries_evaluated: u64,
    /// Entries skipped because of an error.
    pub entries_skipped: u64,
    /// Wall time of the scan.
    pub duration: Duration,
}

/// Result of a complete scan.
#[derive(Debug, Clone, Serialize)]
pub struct ScanOutcome {
    /// Every file that matched.
    pub match_set: MatchSet,
    /// Aggregate over `match_set`.
    pub stats: RunStats,
    /// Evaluation counts and timing.
    pub summary: ScanSummary,
    /// Non-fatal problems, from the walk and from evaluation.
    pub warnings: Vec<ScanWarning>,
}

/// Evaluates walked entries on a worker pool and collects the matches.
pub struct ScanEngine {
    progress_tx: broadcast::Sender<ScanProgress>,
    observer: Option<Arc<dyn ScanObserver>>,
}

impl ScanEngine {
    /// Create a new engine.
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self {
            progress_tx,
            observer: None,
        }
    }

    /// Register callbacks for evaluated entries and matches.
    pub fn with_observer(mut self, observer: Arc<dyn ScanObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Subscribe to scan progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Walk `config.root` and evaluate every file.
    ///
    /// Fails only if the root cannot be walked; per-entry problems end up
    /// in [`ScanOutcome::warnings`].
    pub fn scan(&self, config: &ScanConfig) -> Result<ScanOutcome, ScanError> {
        config.criteria.validate()?;
        let mut walk = Walker::from_config(config).walk()?;
        let mut outcome = self.run(config, &mut walk)?;

        let mut warnings = walk.into_warnings();
        warnings.append(&mut outcome.warnings);
        outcome.warnings = warnings;
        Ok(outcome)
    }

    /// Evaluate entries supplied by the caller instead of walking.
    ///
    /// Each entry is evaluated once; callers are responsible for not
    /// passing the same path twice.
    pub fn scan_entries<I>(&self, config: &ScanConfig, entries: I) -> Result<ScanOutcome, ScanError>
    where
        I: IntoIterator<Item = FileEntry>,
    {
        config.criteria.validate()?;
        self.run(config, entries.into_iter())
    }

    fn run<I>(&self, config: &ScanConfig, entries: I) -> Result<ScanOutcome, ScanError>
    where
        I: Iterator<Item = FileEntry>,
    {
        let pool = build_pool(config.threads)?;
        let collector = MatchCollector::new();
        let counters = ProgressCounters::new();
        let criteria = &config.criteria;
        let now = config.reference_time;

        info!(
            root = %config.root.display(),
            threads = pool.current_num_threads(),
            size_limit = criteria.size_limit_bytes,
            age_limit_days = criteria.age_limit_days,
            excluded = ?criteria.excluded_extensions,
            "starting scan"
        );

        // The walk is driven from this thread; each entry becomes one task.
        // The scope returns only after every task has finished.
        pool.in_place_scope(|scope| {
            for entry in entries {
                let collector = &collector;
                let counters = &counters;
                scope.spawn(move |_| self.process(entry, criteria, now, collector, counters));
            }
        });

        let (match_set, warnings) = collector.finish();
        let stats = match_set.stats();
        let _ = self
            .progress_tx
            .send(counters.snapshot(stats, config.root.clone()));

        let summary = ScanSummary {
            entries_evaluated: counters.evaluated(),
            entries_skipped: counters.skipped(),
            duration: counters.elapsed(),
        };

        info!(
            evaluated = summary.entries_evaluated,
            skipped = summary.entries_skipped,
            matches = stats.file_count,
            bytes = stats.total_bytes,
            "scan complete"
        );

        Ok(ScanOutcome {
            match_set,
            stats,
            summary,
            warnings,
        })
    }

    /// Evaluate one entry and record the result. Runs on a worker.
    fn process(
        &self,
        entry: FileEntry,
        criteria: &FilterCriteria,
        now: SystemTime,
        collector: &MatchCollector,
        counters: &ProgressCounters,
    ) {
        match evaluate(&entry, criteria, now) {
            Ok(Some(matched)) => {
                info!(path = %matched.path().display(), size = matched.size_bytes, "added file to move");
                if let Some(observer) = &self.observer {
                    observer.on_match(&matched);
                }
                collector.push(matched);
            }
            Ok(None) => {}
            Err(err) => {
                warn!(path = %err.path().display(), error = %err, "skipping entry");
                counters.record_skipped();
                collector.warn(ScanWarning::from(&err));
            }
        }

        if let Some(observer) = &self.observer {
            observer.on_entry_evaluated(&entry);
        }

        let count = counters.record_evaluated();
        if count % PROGRESS_INTERVAL == 0 {
            let _ = self
                .progress_tx
                .send(counters.snapshot(collector.stats(), entry.path().to_path_buf()));
        }
    }
}

impl Default for ScanEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the worker pool. Zero threads means available parallelism.
fn build_pool(threads: usize) -> Result<ThreadPool, ScanError> {
    debug!(threads, "building worker pool");
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("stalefile-scan-{i}"))
        .build()
        .map_err(|e| ScanError::ThreadPool {
            message: e.to_string(),
        })
}
