//! Shared sink for worker results.

use parking_lot::Mutex;

use stalefile_core::{MatchSet, MatchedFile, RunStats, ScanWarning};

/// Accumulates matches and warnings from concurrent workers.
///
/// All mutation happens under one lock, so a match and its byte total are
/// always added together.
#[derive(Debug, Default)]
pub(crate) struct MatchCollector {
    inner: Mutex<Collected>,
}

#[derive(Debug, Default)]
struct Collected {
    matches: MatchSet,
    warnings: Vec<ScanWarning>,
}

impl MatchCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a match, returning the stats after the append.
    pub fn push(&self, matched: MatchedFile) -> RunStats {
        let mut inner = self.inner.lock();
        inner.matches.push(matched);
        inner.matches.stats()
    }

    pub fn warn(&self, warning: ScanWarning) {
        self.inner.lock().warnings.push(warning);
    }

    pub fn stats(&self) -> RunStats {
        self.inner.lock().matches.stats()
    }

    /// Take the results once every worker has finished.
    pub fn finish(self) -> (MatchSet, Vec<ScanWarning>) {
        let inner = self.inner.into_inner();
        (inner.matches, inner.warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stalefile_core::FileEntry;
    use std::time::SystemTime;

    #[test]
    fn test_concurrent_pushes() {
        let collector = MatchCollector::new();

        std::thread::scope(|s| {
            for t in 0..8 {
                let collector = &collector;
                s.spawn(move || {
                    for i in 0..100 {
                        let entry = FileEntry::new(format!("/t{t}/f{i}"));
                        collector.push(MatchedFile::new(entry, 3, SystemTime::UNIX_EPOCH));
                    }
                });
            }
        });

        let (matches, warnings) = collector.finish();
        assert_eq!(matches.len(), 800);
        assert_eq!(matches.stats().total_bytes, 2400);
        assert!(warnings.is_empty());
    }
}
