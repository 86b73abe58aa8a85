//! Bulk relocation of matched files into a holding directory.

use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use stalefile_core::{MatchSet, MatchedFile, RelocateError};

use crate::conflict::{auto_rename_path, is_occupied, ConflictPolicy};
use crate::progress::RelocationReport;

/// What to do when a rename crosses filesystem boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CrossDevicePolicy {
    /// Copy the file, then delete the source once the copy is durable.
    #[default]
    CopyThenDelete,
    /// Report the move as failed.
    Fail,
}

/// Options for relocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelocateOptions {
    /// How to handle name conflicts.
    pub conflict: ConflictPolicy,
    /// How to handle cross-device moves.
    pub cross_device: CrossDevicePolicy,
}

/// Moves matched files into a destination directory.
///
/// Every file is handled on its own: a failure is recorded and the batch
/// moves on. A failed move never removes the source.
#[derive(Debug, Clone)]
pub struct Relocator {
    destination: PathBuf,
    options: RelocateOptions,
}

impl Relocator {
    /// Create a relocator with default options.
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
            options: RelocateOptions::default(),
        }
    }

    /// Replace the options.
    pub fn with_options(mut self, options: RelocateOptions) -> Self {
        self.options = options;
        self
    }

    /// Destination directory.
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Create the destination directory if needed. Safe to call repeatedly.
    pub fn ensure_destination(&self) -> Result<(), RelocateError> {
        fs::create_dir_all(&self.destination).map_err(|source| RelocateError::Destination {
            destination: self.destination.clone(),
            source,
        })
    }

    /// Move every file of the set into the destination.
    pub fn relocate(&self, matches: &MatchSet) -> RelocationReport {
        let mut report = RelocationReport::new();

        if let Err(err) = self.ensure_destination() {
            error!(destination = %self.destination.display(), error = %err, "cannot create destination");
            for matched in matches {
                report.record_failure(matched.path().to_path_buf(), &err);
            }
            return report;
        }

        for matched in matches {
            self.relocate_into(matched, &mut report);
        }

        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            bytes = report.bytes_moved,
            "relocation complete"
        );
        report
    }

    /// Move one file and record the result.
    pub(crate) fn relocate_into(&self, matched: &MatchedFile, report: &mut RelocationReport) {
        let source = matched.path().to_path_buf();
        match self.relocate_one(matched) {
            Ok(target) => {
                info!(from = %source.display(), to = %target.display(), "moved file to trash");
                report.record_success(source, target, matched.size_bytes);
            }
            Err(err) => {
                error!(path = %source.display(), error = %err, "failed to move file");
                report.record_failure(source, &err);
            }
        }
    }

    /// Move one file, returning where it ended up.
    ///
    /// The destination directory must already exist.
    pub fn relocate_one(&self, matched: &MatchedFile) -> Result<PathBuf, RelocateError> {
        let source = matched.path();
        let name = source.file_name().ok_or_else(|| RelocateError::Io {
            source_path: source.to_path_buf(),
            source: io::Error::new(ErrorKind::InvalidInput, "path has no file name"),
        })?;
        let preferred = self.destination.join(name);

        loop {
            let target = if !is_occupied(&preferred) {
                preferred.clone()
            } else {
                match self.options.conflict {
                    ConflictPolicy::Fail => {
                        return Err(RelocateError::DestinationConflict {
                            source_path: source.to_path_buf(),
                            destination: preferred,
                        });
                    }
                    ConflictPolicy::AutoRename => auto_rename_path(&preferred),
                }
            };

            match self.move_file(source, &target) {
                // Someone took the name after the check; pick another.
                Err(RelocateError::DestinationConflict { .. })
                    if self.options.conflict == ConflictPolicy::AutoRename => {}
                result => return result.map(|()| target),
            }
        }
    }

    /// Move `source` to `target` without ever replacing an existing target.
    ///
    /// A hard link claims the target atomically; the source is unlinked
    /// afterwards. Filesystems without hard links fall back to rename.
    fn move_file(&self, source: &Path, target: &Path) -> Result<(), RelocateError> {
        match fs::hard_link(source, target) {
            Ok(()) => {
                if let Err(e) = fs::remove_file(source) {
                    let _ = fs::remove_file(target);
                    return Err(RelocateError::io(source, e));
                }
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(RelocateError::DestinationConflict {
                    source_path: source.to_path_buf(),
                    destination: target.to_path_buf(),
                })
            }
            Err(e) if e.kind() == ErrorKind::CrossesDevices => self.move_across(source, target),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(RelocateError::io(source, e)),
            Err(e) => {
                debug!(path = %source.display(), error = %e, "hard link failed, renaming");
                match fs::rename(source, target) {
                    Ok(()) => Ok(()),
                    Err(e) if e.kind() == ErrorKind::CrossesDevices => {
                        self.move_across(source, target)
                    }
                    Err(e) => Err(RelocateError::io(source, e)),
                }
            }
        }
    }

    fn move_across(&self, source: &Path, target: &Path) -> Result<(), RelocateError> {
        match self.options.cross_device {
            CrossDevicePolicy::CopyThenDelete => {
                debug!(path = %source.display(), "move crosses devices, copying");
                copy_then_delete(source, target)
            }
            CrossDevicePolicy::Fail => Err(RelocateError::CrossDevice {
                source_path: source.to_path_buf(),
            }),
        }
    }
}

/// Move a file by copying it and removing the source.
///
/// The target is created exclusively, so an existing file is never
/// overwritten. On any failure the partial target is removed and the source
/// stays where it was.
pub(crate) fn copy_then_delete(source: &Path, target: &Path) -> Result<(), RelocateError> {
    let mut input = File::open(source).map_err(|e| RelocateError::io(source, e))?;
    let metadata = input.metadata().map_err(|e| RelocateError::io(source, e))?;

    let mut output = match OpenOptions::new().write(true).create_new(true).open(target) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            return Err(RelocateError::DestinationConflict {
                source_path: source.to_path_buf(),
                destination: target.to_path_buf(),
            });
        }
        Err(e) => return Err(RelocateError::io(source, e)),
    };

    let copied = io::copy(&mut input, &mut output).and_then(|_| {
        output.set_permissions(metadata.permissions())?;
        if let Ok(modified) = metadata.modified() {
            output.set_modified(modified)?;
        }
        output.sync_all()
    });
    drop(output);

    if let Err(e) = copied {
        let _ = fs::remove_file(target);
        return Err(RelocateError::io(source, e));
    }

    if let Err(e) = fs::remove_file(source) {
        // Leave only the source behind.
        let _ = fs::remove_file(target);
        return Err(RelocateError::io(source, e));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stalefile_core::FileEntry;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn matched(path: &Path) -> MatchedFile {
        let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        MatchedFile::new(FileEntry::new(path), size, SystemTime::UNIX_EPOCH)
    }

    #[test]
    fn test_relocate_one() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("old.iso");
        fs::write(&source, "payload").unwrap();
        let trash = temp.path().join("trash");

        let relocator = Relocator::new(&trash);
        relocator.ensure_destination().unwrap();
        let target = relocator.relocate_one(&matched(&source)).unwrap();

        assert_eq!(target, trash.join("old.iso"));
        assert!(!source.exists());
        assert_eq!(fs::read_to_string(&target).unwrap(), "payload");
    }

    #[test]
    fn test_conflict_fails_by_default() {
        let temp = TempDir::new().unwrap();
        let trash = temp.path().join("trash");
        fs::create_dir(&trash).unwrap();
        fs::write(trash.join("dup.log"), "existing").unwrap();
        let source = temp.path().join("dup.log");
        fs::write(&source, "new").unwrap();

        let err = Relocator::new(&trash)
            .relocate_one(&matched(&source))
            .unwrap_err();

        assert!(matches!(err, RelocateError::DestinationConflict { .. }));
        assert_eq!(fs::read_to_string(&source).unwrap(), "new");
        assert_eq!(fs::read_to_string(trash.join("dup.log")).unwrap(), "existing");
    }

    #[test]
    fn test_conflict_auto_rename() {
        let temp = TempDir::new().unwrap();
        let trash = temp.path().join("trash");
        fs::create_dir(&trash).unwrap();
        fs::write(trash.join("dup.log"), "existing").unwrap();
        let source = temp.path().join("dup.log");
        fs::write(&source, "new").unwrap();

        let relocator = Relocator::new(&trash).with_options(RelocateOptions {
            conflict: ConflictPolicy::AutoRename,
            ..Default::default()
        });
        let target = relocator.relocate_one(&matched(&source)).unwrap();

        assert_eq!(target, trash.join("dup (1).log"));
        assert_eq!(fs::read_to_string(&target).unwrap(), "new");
        assert_eq!(fs::read_to_string(trash.join("dup.log")).unwrap(), "existing");
    }

    #[test]
    fn test_move_never_replaces_existing_target() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("late.log");
        let target = temp.path().join("taken.log");
        fs::write(&source, "source").unwrap();
        fs::write(&target, "target").unwrap();

        // The target appears after any occupancy check would have run.
        let err = Relocator::new(temp.path())
            .move_file(&source, &target)
            .unwrap_err();

        assert!(matches!(err, RelocateError::DestinationConflict { .. }));
        assert_eq!(fs::read_to_string(&source).unwrap(), "source");
        assert_eq!(fs::read_to_string(&target).unwrap(), "target");
    }

    /// Make `dir` read-only. Returns false when the current user can still
    /// write to it (root), in which case the caller should skip.
    #[cfg(unix)]
    fn make_read_only(dir: &Path) -> bool {
        use std::os::unix::fs::PermissionsExt;

        fs::set_permissions(dir, fs::Permissions::from_mode(0o555)).unwrap();
        let check = dir.join(".write-check");
        if fs::write(&check, "").is_ok() {
            let _ = fs::remove_file(&check);
            restore_writable(dir);
            return false;
        }
        true
    }

    #[cfg(unix)]
    fn restore_writable(dir: &Path) {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_relocate_keeps_source_when_it_cannot_be_removed() {
        let temp = TempDir::new().unwrap();
        let locked = temp.path().join("locked");
        fs::create_dir(&locked).unwrap();
        let source = locked.join("pinned.iso");
        fs::write(&source, "pinned").unwrap();
        let trash = temp.path().join("trash");
        fs::create_dir(&trash).unwrap();

        if !make_read_only(&locked) {
            eprintln!("skipping: directory permissions not enforced for this user");
            return;
        }
        let result = Relocator::new(&trash).relocate_one(&matched(&source));
        restore_writable(&locked);

        assert!(matches!(result, Err(RelocateError::PermissionDenied { .. })));
        assert_eq!(fs::read_to_string(&source).unwrap(), "pinned");
        assert!(!trash.join("pinned.iso").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_removed_when_source_cannot_be_deleted() {
        let temp = TempDir::new().unwrap();
        let locked = temp.path().join("locked");
        fs::create_dir(&locked).unwrap();
        let source = locked.join("pinned.bin");
        fs::write(&source, "pinned").unwrap();
        let target = temp.path().join("copy.bin");

        if !make_read_only(&locked) {
            eprintln!("skipping: directory permissions not enforced for this user");
            return;
        }
        let result = copy_then_delete(&source, &target);
        restore_writable(&locked);

        assert!(matches!(result, Err(RelocateError::PermissionDenied { .. })));
        assert_eq!(fs::read_to_string(&source).unwrap(), "pinned");
        assert!(!target.exists());
    }

    #[test]
    fn test_copy_then_delete() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("src.bin");
        let target = temp.path().join("dst.bin");
        let mtime = SystemTime::now() - Duration::from_secs(86_400 * 400);
        {
            let file = File::create(&source).unwrap();
            io::Write::write_all(&mut &file, b"bytes on disk").unwrap();
            file.set_modified(mtime).unwrap();
        }

        copy_then_delete(&source, &target).unwrap();

        assert!(!source.exists());
        assert_eq!(fs::read(&target).unwrap(), b"bytes on disk");
        let copied_mtime = fs::metadata(&target).unwrap().modified().unwrap();
        let drift = copied_mtime
            .duration_since(mtime)
            .unwrap_or_else(|e| e.duration());
        assert!(drift < Duration::from_secs(1));
    }

    #[test]
    fn test_copy_never_overwrites() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("src.bin");
        let target = temp.path().join("dst.bin");
        fs::write(&source, "source").unwrap();
        fs::write(&target, "target").unwrap();

        let err = copy_then_delete(&source, &target).unwrap_err();

        assert!(matches!(err, RelocateError::DestinationConflict { .. }));
        assert_eq!(fs::read_to_string(&source).unwrap(), "source");
        assert_eq!(fs::read_to_string(&target).unwrap(), "target");
    }

    #[test]
    fn test_copy_missing_source() {
        let temp = TempDir::new().unwrap();
        let err = copy_then_delete(&temp.path().join("nope"), &temp.path().join("dst")).unwrap_err();

        assert!(matches!(err, RelocateError::SourceVanished { .. }));
        assert!(!temp.path().join("dst").exists());
    }
}
