//! Name conflicts in the destination directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// What to do when the destination already holds a file with the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ConflictPolicy {
    /// Leave the source in place and count the move as failed.
    #[default]
    Fail,
    /// Move under a free name such as "file (1).txt".
    AutoRename,
}

/// Whether something already occupies `path` (dangling symlinks included).
pub(crate) fn is_occupied(path: &Path) -> bool {
    std::fs::symlink_metadata(path).is_ok()
}

/// Generate an auto-renamed path to avoid conflicts.
///
/// For "file.txt", tries "file (1).txt", "file (2).txt", etc.
pub fn auto_rename_path(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new(""));
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned());

    let candidate = |suffix: &str| match &extension {
        Some(ext) => parent.join(format!("{stem} {suffix}.{ext}")),
        None => parent.join(format!("{stem} {suffix}")),
    };

    for i in 1..1000 {
        let new_path = candidate(&format!("({i})"));
        if !is_occupied(&new_path) {
            return new_path;
        }
    }

    // Fallback: use timestamp
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    candidate(&format!("({timestamp})"))
}
