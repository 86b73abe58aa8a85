//! Lazy directory walk built on jwalk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use jwalk::{Parallelism, WalkDir};
use tracing::debug;

use stalefile_core::{FileEntry, ScanConfig, ScanError, ScanWarning, WarningKind};

/// Produces the regular files below a root directory.
///
/// Symbolic links are neither followed nor yielded. Each call to
/// [`Walker::walk`] starts a fresh traversal.
#[derive(Debug, Clone)]
pub struct Walker {
    root: PathBuf,
    skip_paths: Vec<PathBuf>,
    include_hidden: bool,
    max_depth: Option<usize>,
}

impl Walker {
    /// Create a walker rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            skip_paths: Vec::new(),
            include_hidden: true,
            max_depth: None,
        }
    }

    /// Create a walker from scan configuration.
    pub fn from_config(config: &ScanConfig) -> Self {
        Self {
            root: config.root.clone(),
            skip_paths: config.skip_paths.clone(),
            include_hidden: config.include_hidden,
            max_depth: config.max_depth,
        }
    }

    /// Never descend into `path`.
    pub fn skip_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.skip_paths.push(path.into());
        self
    }

    /// Include hidden files and directories.
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Limit traversal depth.
    pub fn max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    /// Root of the walk.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate the root and start walking.
    pub fn walk(&self) -> Result<Walk, ScanError> {
        let metadata = std::fs::metadata(&self.root).map_err(|e| ScanError::root(&self.root, e))?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory {
                path: self.root.clone(),
            });
        }
        let root = self
            .root
            .canonicalize()
            .map_err(|e| ScanError::root(&self.root, e))?;

        // Paths that do not exist cannot be in the tree.
        let skip: Arc<Vec<PathBuf>> = Arc::new(
            self.skip_paths
                .iter()
                .filter_map(|p| p.canonicalize().ok())
                .collect(),
        );

        let walker = WalkDir::new(&root)
            .parallelism(Parallelism::Serial)
            .skip_hidden(!self.include_hidden)
            .follow_links(false)
            .max_depth(self.max_depth.unwrap_or(usize::MAX))
            .process_read_dir(move |_depth, _path, _state, children| {
                if skip.is_empty() {
                    return;
                }
                children.retain(|child| match child {
                    Ok(entry) => {
                        let path = entry.path();
                        !skip.iter().any(|s| *s == path)
                    }
                    Err(_) => true,
                });
            });

        debug!(root = %root.display(), "starting walk");

        Ok(Walk {
            inner: walker.into_iter(),
            warnings: Vec::new(),
        })
    }
}

/// One-shot iterator over the files of a walk.
pub struct Walk {
    inner: <WalkDir as IntoIterator>::IntoIter,
    warnings: Vec<ScanWarning>,
}

impl Walk {
    /// Directories that could not be read so far.
    pub fn warnings(&self) -> &[ScanWarning] {
        &self.warnings
    }

    /// Consume the walk, returning its warnings.
    pub fn into_warnings(self) -> Vec<ScanWarning> {
        self.warnings
    }
}

impl Iterator for Walk {
    type Item = FileEntry;

    fn next(&mut self) -> Option<FileEntry> {
        loop {
            match self.inner.next()? {
                Ok(entry) => {
                    if entry.file_type().is_file() {
                        return Some(FileEntry::new(entry.path()));
                    }
                }
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    debug!(path = %path.display(), error = %err, "skipping unreadable directory");
                    let kind = match err.io_error().map(std::io::Error::kind) {
                        Some(std::io::ErrorKind::PermissionDenied) => WarningKind::PermissionDenied,
                        _ => WarningKind::ReadError,
                    };
                    self.warnings.push(ScanWarning::new(path, err.to_string(), kind));
                }
            }
        }
    }
}
