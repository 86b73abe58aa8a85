//! Per-entry filter evaluation.

use std::time::SystemTime;

use stalefile_core::{EntryError, FileEntry, FilterCriteria, MatchedFile};

/// Evaluate one entry against the criteria.
///
/// Predicates run in a fixed order (size, age, extension) and stop at the
/// first one that fails, so a file that is too small costs a single stat.
pub fn evaluate(
    entry: &FileEntry,
    criteria: &FilterCriteria,
    now: SystemTime,
) -> Result<Option<MatchedFile>, EntryError> {
    let size = entry.size_bytes()?;
    if !criteria.exceeds_size(size) {
        return Ok(None);
    }

    let modified = entry.modified_time()?;
    if !criteria.exceeds_age(modified, now) {
        return Ok(None);
    }

    if criteria.is_excluded(&entry.extension()) {
        return Ok(None);
    }

    Ok(Some(MatchedFile::new(entry.clone(), size, modified)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;

    const DAY: Duration = Duration::from_secs(86_400);

    fn write_file(path: &Path, size: u64, age: Duration, now: SystemTime) {
        let file = File::create(path).unwrap();
        file.set_len(size).unwrap();
        file.set_modified(now - age).unwrap();
    }

    fn criteria() -> FilterCriteria {
        FilterCriteria::builder()
            .size_limit_bytes(1000u64)
            .age_limit_days(30.0)
            .excluded_extensions([".pdf"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_all_predicates_pass() {
        let temp = TempDir::new().unwrap();
        let now = SystemTime::now();
        let path = temp.path().join("big.log");
        write_file(&path, 2000, DAY * 40, now);

        let matched = evaluate(&FileEntry::new(&path), &criteria(), now)
            .unwrap()
            .unwrap();
        assert_eq!(matched.size_bytes, 2000);
        assert_eq!(matched.path(), path);
    }

    #[test]
    fn test_each_predicate_rejects() {
        let temp = TempDir::new().unwrap();
        let now = SystemTime::now();
        let cases = [
            ("small.log", 1000, DAY * 40),
            ("fresh.log", 2000, DAY * 29),
            ("old.pdf", 2000, DAY * 40),
        ];

        for (name, size, age) in cases {
            let path = temp.path().join(name);
            write_file(&path, size, age, now);
            let result = evaluate(&FileEntry::new(&path), &criteria(), now).unwrap();
            assert!(result.is_none(), "{name} should not match");
        }
    }

    #[test]
    fn test_vanished_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("gone.bin");
        fs::write(&path, "x").unwrap();
        let entry = FileEntry::new(&path);
        fs::remove_file(&path).unwrap();

        let err = evaluate(&entry, &criteria(), SystemTime::now()).unwrap_err();
        assert!(matches!(err, EntryError::Vanished { .. }));
    }
}
