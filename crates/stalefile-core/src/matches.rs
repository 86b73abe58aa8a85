//! Match set and run statistics.

use std::path::Path;
use std::time::SystemTime;

use serde::Serialize;

use crate::FileEntry;

/// A file that passed every filter predicate.
///
/// Size and modification time are captured at match time and never re-read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedFile {
    /// The matched entry.
    pub entry: FileEntry,
    /// Size in bytes when the file matched.
    pub size_bytes: u64,
    /// Modification time when the file matched.
    pub modified: SystemTime,
}

impl MatchedFile {
    /// Create a new match.
    pub fn new(entry: FileEntry, size_bytes: u64, modified: SystemTime) -> Self {
        Self {
            entry,
            size_bytes,
            modified,
        }
    }

    /// Path of the matched file.
    pub fn path(&self) -> &Path {
        self.entry.path()
    }
}

/// Aggregate over a match set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Sum of matched file sizes.
    pub total_bytes: u64,
    /// Number of matched files.
    pub file_count: u64,
}

impl RunStats {
    /// Total size in GiB, the unit reported to users.
    pub fn total_gib(&self) -> f64 {
        self.total_bytes as f64 / (1024.0 * 1024.0 * 1024.0)
    }
}

/// All matches of one run.
///
/// During a scan workers only reach it through the scanner's collector; it
/// is handed out once every worker has finished.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MatchSet {
    files: Vec<MatchedFile>,
    total_bytes: u64,
}

impl MatchSet {
    /// Create an empty match set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a match and account for its size.
    pub fn push(&mut self, matched: MatchedFile) {
        self.total_bytes += matched.size_bytes;
        self.files.push(matched);
    }

    /// Matched files in insertion order.
    pub fn files(&self) -> &[MatchedFile] {
        &self.files
    }

    /// Iterate over matched files.
    pub fn iter(&self) -> std::slice::Iter<'_, MatchedFile> {
        self.files.iter()
    }

    /// Number of matches.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether nothing matched.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Paths of the matched files.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(MatchedFile::path)
    }

    /// Whether a path is part of the set.
    pub fn contains(&self, path: &Path) -> bool {
        self.files.iter().any(|m| m.path() == path)
    }

    /// Aggregate statistics.
    pub fn stats(&self) -> RunStats {
        RunStats {
            total_bytes: self.total_bytes,
            file_count: self.files.len() as u64,
        }
    }

    /// Sort by size, largest first, for presentation.
    pub fn sort_by_size_desc(&mut self) {
        self.files
            .sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes).then_with(|| a.entry.cmp(&b.entry)));
    }
}

impl FromIterator<MatchedFile> for MatchSet {
    fn from_iter<T: IntoIterator<Item = MatchedFile>>(iter: T) -> Self {
        let mut set = Self::new();
        for matched in iter {
            set.push(matched);
        }
        set
    }
}

impl<'a> IntoIterator for &'a MatchSet {
    type Item = &'a MatchedFile;
    type IntoIter = std::slice::Iter<'a, MatchedFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}
