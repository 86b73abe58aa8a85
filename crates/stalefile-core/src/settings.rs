//! Settings file support.
//!
//! A settings file is a small TOML document whose values sit between the
//! built-in defaults and command-line flags:
//!
//! ```toml
//! dir = "/home/me"
//! trash = "/home/me/trash"
//! size_mb = 250
//! days = 180
//! exclude = [".docx", ".xlsx", ".iso"]
//! threads = 4
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::SettingsError;

/// Values loaded from a settings file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Directory to scan.
    pub dir: Option<PathBuf>,
    /// Directory matched files are moved to.
    pub trash: Option<PathBuf>,
    /// Size limit in MiB.
    pub size_mb: Option<u64>,
    /// Age limit in days.
    pub days: Option<f64>,
    /// Excluded extensions.
    pub exclude: Option<Vec<String>>,
    /// Worker threads.
    pub threads: Option<usize>,
}

impl Settings {
    /// Parse settings from a TOML string.
    pub fn from_toml_str(contents: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(contents)?)
    }

    /// Read and parse a settings file.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }
}
