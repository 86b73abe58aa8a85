//! Core types for stalefile.
//!
//! This crate provides the data model shared by the scanner and the
//! relocator: file entries, filter criteria, the match set, and the error
//! taxonomy.

mod config;
mod entry;
mod error;
mod matches;
mod settings;

pub use config::{FilterCriteria, FilterCriteriaBuilder, ScanConfig, ScanConfigBuilder, SECONDS_PER_DAY};
pub use entry::FileEntry;
pub use error::{EntryError, RelocateError, ScanError, ScanWarning, SettingsError, WarningKind};
pub use matches::{MatchSet, MatchedFile, RunStats};
pub use settings::Settings;
