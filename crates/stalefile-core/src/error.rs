//! Error types for scanning and relocation.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal errors that abort a scan before it starts.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Root path does not exist.
    #[error("Root path not found: {path}")]
    RootNotFound { path: PathBuf },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// The worker pool could not be built.
    #[error("Failed to build worker pool: {message}")]
    ThreadPool { message: String },

    /// Generic I/O error while validating the root.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Map an I/O error on the root path.
    pub fn root(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::RootNotFound { path },
            _ => Self::Io { path, source },
        }
    }
}

/// Errors on a single entry during evaluation. Never fatal to the scan.
#[derive(Debug, Error)]
pub enum EntryError {
    /// The file disappeared between discovery and evaluation.
    #[error("File vanished: {path}")]
    Vanished { path: PathBuf },

    /// Metadata could not be read.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Any other I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EntryError {
    /// Create an entry error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::Vanished { path },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            _ => Self::Io { path, source },
        }
    }

    /// Path the error refers to.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Vanished { path } | Self::PermissionDenied { path } | Self::Io { path, .. } => {
                path
            }
        }
    }

    /// Warning kind to record for this error.
    pub fn warning_kind(&self) -> WarningKind {
        match self {
            Self::Vanished { .. } => WarningKind::Vanished,
            Self::PermissionDenied { .. } => WarningKind::PermissionDenied,
            Self::Io { .. } => WarningKind::MetadataError,
        }
    }
}

/// Per-file relocation failures. The source is always left in place.
#[derive(Debug, Error)]
pub enum RelocateError {
    /// A file with the same name already exists in the destination.
    #[error("Destination already exists: {destination}")]
    DestinationConflict { source_path: PathBuf, destination: PathBuf },

    /// The file could not be moved due to permissions.
    #[error("Permission denied moving {source_path}")]
    PermissionDenied { source_path: PathBuf },

    /// Rename across filesystems with the copy fallback disabled.
    #[error("Cannot move {source_path} across filesystems")]
    CrossDevice { source_path: PathBuf },

    /// The source disappeared before it could be moved.
    #[error("Source vanished: {source_path}")]
    SourceVanished { source_path: PathBuf },

    /// The destination directory could not be created.
    #[error("Destination directory unavailable: {destination}: {source}")]
    Destination {
        destination: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Any other I/O error.
    #[error("Failed to move {source_path}: {source}")]
    Io {
        source_path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RelocateError {
    /// Classify an I/O error raised while moving `source_path`.
    pub fn io(source_path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let source_path = source_path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::SourceVanished { source_path },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { source_path },
            std::io::ErrorKind::CrossesDevices => Self::CrossDevice { source_path },
            _ => Self::Io { source_path, source },
        }
    }
}

/// Errors loading a settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The file could not be read.
    #[error("Failed to read settings {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for the settings schema.
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Kind of scan warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// File disappeared before it was evaluated.
    Vanished,
    /// Permission was denied.
    PermissionDenied,
    /// Error reading a directory.
    ReadError,
    /// Error reading metadata.
    MetadataError,
}

/// Non-fatal warning encountered during scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a new scan warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

}

impl From<&EntryError> for ScanWarning {
    fn from(err: &EntryError) -> Self {
        Self::new(err.path(), err.to_string(), err.warning_kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_root_not_found() {
        let err = ScanError::root("/missing", Error::new(ErrorKind::NotFound, "gone"));
        assert!(matches!(err, ScanError::RootNotFound { .. }));
    }

    #[test]
    fn test_entry_error_kinds() {
        let err = EntryError::io("/a", Error::new(ErrorKind::NotFound, "gone"));
        assert_eq!(err.warning_kind(), WarningKind::Vanished);

        let err = EntryError::io("/a", Error::new(ErrorKind::PermissionDenied, "denied"));
        assert_eq!(err.warning_kind(), WarningKind::PermissionDenied);

        let err = EntryError::io("/a", Error::other("boom"));
        assert_eq!(err.warning_kind(), WarningKind::MetadataError);
    }

    #[test]
    fn test_relocate_error_kinds() {
        let err = RelocateError::io("/a", Error::new(ErrorKind::CrossesDevices, "exdev"));
        assert!(matches!(err, RelocateError::CrossDevice { .. }));

        let err = RelocateError::io("/a", Error::new(ErrorKind::PermissionDenied, "denied"));
        assert!(matches!(err, RelocateError::PermissionDenied { .. }));
    }

    #[test]
    fn test_warning_from_entry_error() {
        let err = EntryError::Vanished {
            path: PathBuf::from("/tmp/x"),
        };
        let warning = ScanWarning::from(&err);
        assert_eq!(warning.kind, WarningKind::Vanished);
        assert!(warning.message.contains("vanished"));
    }
}
