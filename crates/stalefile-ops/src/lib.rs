//! Relocation engine for stalefile.
//!
//! This crate moves the files a scan matched into a holding directory.
//! Each file is handled independently: a failure is logged, recorded in the
//! [`RelocationReport`], and the batch continues. A failed move never
//! deletes the source.
//!
//! Moves are plain renames. When a rename crosses filesystems the default
//! [`CrossDevicePolicy::CopyThenDelete`] copies the file into an exclusively
//! created target, syncs it, and only then removes the source;
//! [`CrossDevicePolicy::Fail`] reports such files as failed instead.

mod conflict;
mod progress;
mod relocate;
mod task;

pub use conflict::{auto_rename_path, ConflictPolicy};
pub use progress::{FailureKind, RelocateProgress, RelocationFailure, RelocationReport};
pub use relocate::{CrossDevicePolicy, RelocateOptions, Relocator};
pub use task::{start_relocate, RelocateEvent};

/// Default channel buffer size for relocation progress updates.
pub const OPERATION_CHANNEL_SIZE: usize = 100;
