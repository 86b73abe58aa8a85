//! Filter and scan configuration types.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::SystemTime;

use derive_builder::Builder;
use serde::Serialize;

use crate::ScanError;

/// Seconds in one day, used for age computations.
pub const SECONDS_PER_DAY: f64 = 60.0 * 60.0 * 24.0;

const DEFAULT_SIZE_LIMIT: u64 = 100 * 1024 * 1024;
const DEFAULT_AGE_LIMIT_DAYS: f64 = 365.0;
const DEFAULT_EXCLUDED: [&str; 2] = [".docx", ".xlsx"];

/// Thresholds a file must exceed to be reported.
///
/// Both limits are exclusive: a file exactly at the size or age limit does
/// not match.
#[derive(Debug, Clone, PartialEq, Builder, Serialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct FilterCriteria {
    /// Files must be strictly larger than this.
    #[builder(default = "DEFAULT_SIZE_LIMIT")]
    pub size_limit_bytes: u64,

    /// Files must be strictly older than this many days.
    #[builder(default = "DEFAULT_AGE_LIMIT_DAYS")]
    pub age_limit_days: f64,

    /// Extensions (with leading dot) that never match.
    #[builder(setter(custom), default = "default_excluded()")]
    pub excluded_extensions: BTreeSet<String>,
}

fn default_excluded() -> BTreeSet<String> {
    normalize_extensions(DEFAULT_EXCLUDED)
}

/// Ensure every extension starts with a dot; drop empty strings.
fn normalize_extensions<I, S>(extensions: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    extensions
        .into_iter()
        .map(|ext| ext.as_ref().trim().to_string())
        .filter(|ext| !ext.is_empty())
        .map(|ext| if ext.starts_with('.') { ext } else { format!(".{ext}") })
        .collect()
}

impl FilterCriteriaBuilder {
    /// Set excluded extensions. `"pdf"` and `".pdf"` are equivalent.
    pub fn excluded_extensions<I, S>(&mut self, extensions: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.excluded_extensions = Some(normalize_extensions(extensions));
        self
    }

    fn validate(&self) -> Result<(), String> {
        check_limits(
            self.size_limit_bytes.unwrap_or(DEFAULT_SIZE_LIMIT),
            self.age_limit_days.unwrap_or(DEFAULT_AGE_LIMIT_DAYS),
        )
    }
}

fn check_limits(size_limit_bytes: u64, age_limit_days: f64) -> Result<(), String> {
    if size_limit_bytes == 0 {
        return Err("Size limit must be positive".to_string());
    }
    if !age_limit_days.is_finite() || age_limit_days < 0.0 {
        return Err(format!(
            "Age limit must be a non-negative number of days, got {age_limit_days}"
        ));
    }
    Ok(())
}

impl FilterCriteria {
    /// Create a new criteria builder.
    pub fn builder() -> FilterCriteriaBuilder {
        FilterCriteriaBuilder::default()
    }

    /// Re-check the limits. Fields are public, so a built value can still
    /// be edited into an invalid state.
    pub fn validate(&self) -> Result<(), ScanError> {
        check_limits(self.size_limit_bytes, self.age_limit_days)
            .map_err(|message| ScanError::InvalidConfig { message })
    }

    /// Size predicate.
    pub fn exceeds_size(&self, size_bytes: u64) -> bool {
        size_bytes > self.size_limit_bytes
    }

    /// Age predicate, measured from `now`.
    pub fn exceeds_age(&self, modified: SystemTime, now: SystemTime) -> bool {
        age_in_days(modified, now) > self.age_limit_days
    }

    /// Extension predicate: true when the extension is excluded.
    pub fn is_excluded(&self, extension: &str) -> bool {
        self.excluded_extensions.contains(extension)
    }
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            size_limit_bytes: DEFAULT_SIZE_LIMIT,
            age_limit_days: DEFAULT_AGE_LIMIT_DAYS,
            excluded_extensions: default_excluded(),
        }
    }
}

/// Age of a modification time in fractional days.
///
/// Modification times in the future count as zero days old.
pub(crate) fn age_in_days(modified: SystemTime, now: SystemTime) -> f64 {
    now.duration_since(modified)
        .map(|age| age.as_secs_f64() / SECONDS_PER_DAY)
        .unwrap_or(0.0)
}

/// Configuration for a scan run.
#[derive(Debug, Clone, Builder, Serialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Root directory to scan.
    pub root: PathBuf,

    /// Thresholds applied to every file.
    #[builder(default)]
    pub criteria: FilterCriteria,

    /// Number of worker threads (0 = available parallelism).
    #[builder(default = "0")]
    pub threads: usize,

    /// Include hidden files (starting with .).
    #[builder(default = "true")]
    pub include_hidden: bool,

    /// Maximum depth to traverse (None = unlimited).
    #[builder(default)]
    pub max_depth: Option<usize>,

    /// Directories that are never descended into.
    #[builder(default)]
    pub skip_paths: Vec<PathBuf>,

    /// "Now" for age computations, fixed for the whole run.
    #[builder(default = "SystemTime::now()")]
    pub reference_time: SystemTime,
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref root) = self.root {
            if root.as_os_str().is_empty() {
                return Err("Root path cannot be empty".to_string());
            }
        } else {
            return Err("Root path is required".to_string());
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a config for scanning a path with the given criteria.
    pub fn new(root: impl Into<PathBuf>, criteria: FilterCriteria) -> Self {
        Self {
            root: root.into(),
            criteria,
            threads: 0,
            include_hidden: true,
            max_depth: None,
            skip_paths: Vec::new(),
            reference_time: SystemTime::now(),
        }
    }
}
