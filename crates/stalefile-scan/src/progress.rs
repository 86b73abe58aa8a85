//! Scan progress reporting.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use stalefile_core::{FileEntry, MatchedFile, RunStats};

/// Progress information during a scan.
#[derive(Debug, Clone)]
pub struct ScanProgress {
    /// Entries whose evaluation finished.
    pub entries_evaluated: u64,
    /// Entries skipped because of an error.
    pub entries_skipped: u64,
    /// Matches found so far.
    pub matches: u64,
    /// Total size of the matches so far.
    pub bytes_matched: u64,
    /// Last path evaluated.
    pub current_path: PathBuf,
    /// Time elapsed since scan started.
    pub elapsed: Duration,
}

impl ScanProgress {
    /// Create initial progress state.
    pub fn new() -> Self {
        Self {
            entries_evaluated: 0,
            entries_skipped: 0,
            matches: 0,
            bytes_matched: 0,
            current_path: PathBuf::new(),
            elapsed: Duration::ZERO,
        }
    }

    /// Calculate evaluation rate in entries per second.
    pub fn entries_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.entries_evaluated as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Callbacks for presentation layers.
///
/// Observers are purely informational and cannot influence which files
/// match. Methods are called from worker threads.
pub trait ScanObserver: Send + Sync {
    /// Called once per evaluated entry, matched or not.
    fn on_entry_evaluated(&self, _entry: &FileEntry) {}

    /// Called once per match.
    fn on_match(&self, _matched: &MatchedFile) {}
}

/// Lock-free counters shared by workers.
#[derive(Debug)]
pub(crate) struct ProgressCounters {
    start: Instant,
    evaluated: AtomicU64,
    skipped: AtomicU64,
}

impl ProgressCounters {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            evaluated: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
        }
    }

    /// Record a finished evaluation, returning the new total.
    pub fn record_evaluated(&self) -> u64 {
        self.evaluated.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn evaluated(&self) -> u64 {
        self.evaluated.load(Ordering::Relaxed)
    }

    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn snapshot(&self, stats: RunStats, current_path: PathBuf) -> ScanProgress {
        ScanProgress {
            entries_evaluated: self.evaluated(),
            entries_skipped: self.skipped(),
            matches: stats.file_count,
            bytes_matched: stats.total_bytes,
            current_path,
            elapsed: self.elapsed(),
        }
    }
}
