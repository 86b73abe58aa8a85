//! Scan-and-filter engine for stalefile.
//!
//! This crate walks a directory tree and picks out the files that are
//! larger and older than the configured limits.
//!
//! # Overview
//!
//! - **Lazy traversal** via jwalk, never following symlinks
//! - **Parallel evaluation** on a dedicated rayon pool
//! - **Single collector** that owns all shared mutable state
//! - **Progress updates** via broadcast channels and [`ScanObserver`]
//!
//! # Example
//!
//! ```rust,no_run
//! use stalefile_scan::{FilterCriteria, ScanConfig, ScanEngine};
//!
//! let criteria = FilterCriteria::builder()
//!     .size_limit_bytes(100 * 1024 * 1024u64)
//!     .age_limit_days(365.0)
//!     .excluded_extensions([".docx", ".xlsx"])
//!     .build()
//!     .unwrap();
//! let config = ScanConfig::new("/path/to/scan", criteria);
//!
//! let outcome = ScanEngine::new().scan(&config).unwrap();
//! println!("{} files, {:.2} GB", outcome.stats.file_count, outcome.stats.total_gib());
//! ```
//!
//! # Progress Monitoring
//!
//! ```rust,no_run
//! use stalefile_scan::ScanEngine;
//!
//! let engine = ScanEngine::new();
//! let mut progress_rx = engine.subscribe();
//!
//! tokio::spawn(async move {
//!     while let Ok(progress) = progress_rx.recv().await {
//!         println!("Evaluated {} files", progress.entries_evaluated);
//!     }
//! });
//! ```

mod collector;
mod engine;
mod filter;
mod progress;
mod walker;

pub use engine::{ScanEngine, ScanOutcome, ScanSummary};
pub use filter::evaluate;
pub use progress::{ScanObserver, ScanProgress};
pub use walker::{Walk, Walker};

// Re-export core types for convenience
pub use stalefile_core::{
    EntryError, FileEntry, FilterCriteria, MatchSet, MatchedFile, RunStats, ScanConfig,
    ScanError, ScanWarning, WarningKind,
};
