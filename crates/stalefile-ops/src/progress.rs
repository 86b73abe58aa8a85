//! Progress and result types for relocation.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use stalefile_core::RelocateError;

/// Why a single relocation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    Conflict,
    PermissionDenied,
    CrossDevice,
    SourceVanished,
    Destination,
    Io,
}

impl From<&RelocateError> for FailureKind {
    fn from(err: &RelocateError) -> Self {
        match err {
            RelocateError::DestinationConflict { .. } => Self::Conflict,
            RelocateError::PermissionDenied { .. } => Self::PermissionDenied,
            RelocateError::CrossDevice { .. } => Self::CrossDevice,
            RelocateError::SourceVanished { .. } => Self::SourceVanished,
            RelocateError::Destination { .. } => Self::Destination,
            RelocateError::Io { .. } => Self::Io,
        }
    }
}

/// A file that could not be relocated. The file is still at `path`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelocationFailure {
    /// Source path of the file.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Failure classification.
    pub kind: FailureKind,
}

impl std::fmt::Display for RelocationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

/// Progress of an ongoing relocation.
#[derive(Debug, Clone)]
pub struct RelocateProgress {
    /// Files processed so far, successful or not.
    pub files_completed: usize,
    /// Total number of files to process.
    pub files_total: usize,
    /// Failures so far.
    pub failed: usize,
    /// Bytes moved so far.
    pub bytes_moved: u64,
    /// The file processed last.
    pub current_file: Option<PathBuf>,
}

impl RelocateProgress {
    /// Create progress for a batch of `files_total` files.
    pub fn new(files_total: usize) -> Self {
        Self {
            files_completed: 0,
            files_total,
            failed: 0,
            bytes_moved: 0,
            current_file: None,
        }
    }

    /// Get the progress as a percentage (0.0 to 100.0).
    pub fn percentage(&self) -> f64 {
        if self.files_total > 0 {
            (self.files_completed as f64 / self.files_total as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Outcome of a relocation batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelocationReport {
    /// Number of files moved.
    pub succeeded: usize,
    /// Number of files left in place because of an error.
    pub failed: usize,
    /// Total bytes moved, using sizes captured at match time.
    pub bytes_moved: u64,
    /// `(source, destination)` of every successful move.
    pub moved: Vec<(PathBuf, PathBuf)>,
    /// Every failure, in processing order.
    pub errors: Vec<RelocationFailure>,
    /// Whether the batch was cancelled before every file was processed.
    pub cancelled: bool,
}

impl RelocationReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful move.
    pub fn record_success(&mut self, source: PathBuf, destination: PathBuf, bytes: u64) {
        self.succeeded += 1;
        self.bytes_moved += bytes;
        self.moved.push((source, destination));
    }

    /// Record a failed move.
    pub fn record_failure(&mut self, source: PathBuf, error: &RelocateError) {
        self.failed += 1;
        self.errors.push(RelocationFailure {
            path: source,
            message: error.to_string(),
            kind: error.into(),
        });
    }

    /// Files processed, successful or not.
    pub fn processed(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Check if every file was moved.
    pub fn is_success(&self) -> bool {
        self.failed == 0 && !self.cancelled
    }

    /// Get a human-readable summary of the batch.
    pub fn summary(&self) -> String {
        let mut summary = if self.failed == 0 {
            format!("Moved {} files", self.succeeded)
        } else {
            format!("Moved {} files, {} failed", self.succeeded, self.failed)
        };
        if self.cancelled {
            summary.push_str(" (cancelled)");
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_summary() {
        let mut report = RelocationReport::new();
        report.record_success(PathBuf::from("/a"), PathBuf::from("/t/a"), 10);
        assert_eq!(report.summary(), "Moved 1 files");
        assert!(report.is_success());

        let err = RelocateError::SourceVanished {
            source_path: PathBuf::from("/b"),
        };
        report.record_failure(PathBuf::from("/b"), &err);
        assert_eq!(report.summary(), "Moved 1 files, 1 failed");
        assert_eq!(report.errors[0].kind, FailureKind::SourceVanished);
        assert_eq!(report.processed(), 2);
        assert!(!report.is_success());
    }

    #[test]
    fn test_percentage() {
        let mut progress = RelocateProgress::new(4);
        assert_eq!(progress.percentage(), 0.0);
        progress.files_completed = 1;
        assert_eq!(progress.percentage(), 25.0);
        assert_eq!(RelocateProgress::new(0).percentage(), 0.0);
    }
}
