//! Lazily-queried file entries.

use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::EntryError;

/// A reference to a file discovered during a walk.
///
/// An entry is not a snapshot. Every metadata accessor goes back to the
/// filesystem, so an entry can stop being valid between discovery and use
/// (the file may have been deleted or moved by someone else).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileEntry {
    path: PathBuf,
}

impl FileEntry {
    /// Create an entry for a path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the entry.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final path component, if any.
    pub fn file_name(&self) -> Option<&std::ffi::OsStr> {
        self.path.file_name()
    }

    /// Extension including the leading dot (`".pdf"`), or an empty string.
    ///
    /// Dot-files such as `.bashrc` have no extension.
    pub fn extension(&self) -> String {
        match self.path.extension() {
            Some(ext) => format!(".{}", ext.to_string_lossy()),
            None => String::new(),
        }
    }

    /// Current size in bytes.
    pub fn size_bytes(&self) -> Result<u64, EntryError> {
        Ok(self.metadata()?.len())
    }

    /// Current last-modified time.
    pub fn modified_time(&self) -> Result<SystemTime, EntryError> {
        self.metadata()?
            .modified()
            .map_err(|e| EntryError::io(&self.path, e))
    }

    /// Query metadata without following a trailing symlink.
    pub fn metadata(&self) -> Result<Metadata, EntryError> {
        std::fs::symlink_metadata(&self.path).map_err(|e| EntryError::io(&self.path, e))
    }
}

impl From<PathBuf> for FileEntry {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

impl AsRef<Path> for FileEntry {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_has_leading_dot() {
        assert_eq!(FileEntry::new("/a/report.pdf").extension(), ".pdf");
        assert_eq!(FileEntry::new("/a/archive.tar.gz").extension(), ".gz");
    }

    #[test]
    fn test_extension_missing() {
        assert_eq!(FileEntry::new("/a/Makefile").extension(), "");
        assert_eq!(FileEntry::new("/a/.bashrc").extension(), "");
    }

    #[test]
    fn test_vanished_entry() {
        let temp = tempfile::TempDir::new().unwrap();
        let entry = FileEntry::new(temp.path().join("gone.bin"));

        assert!(matches!(entry.size_bytes(), Err(EntryError::Vanished { .. })));
        assert!(matches!(entry.modified_time(), Err(EntryError::Vanished { .. })));
    }

    #[test]
    fn test_accessors_requery() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("grow.txt");
        std::fs::write(&path, "abc").unwrap();

        let entry = FileEntry::new(&path);
        assert_eq!(entry.size_bytes().unwrap(), 3);

        std::fs::write(&path, "abcdef").unwrap();
        assert_eq!(entry.size_bytes().unwrap(), 6);
    }
}
