use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::probe::{SizeProbe, Tally};
use crate::report::{DirectorySizeReport, ScanFailure};

/// Measures the shared package cache.
#[derive(Debug, Clone)]
pub struct CacheAnalyzer {
    root: PathBuf,
    size: SizeProbe,
}

impl CacheAnalyzer {
    pub fn new(root: impl Into<PathBuf>, size: SizeProbe) -> Self {
        Self {
            root: root.into(),
            size,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Total size of the cache and of each of its immediate subdirectories.
    ///
    /// A cache root that does not exist is a valid state and yields an empty
    /// report. Unreadable entries below the root are left out of the sizes and
    /// listed in [`DirectorySizeReport::failures`]; a subdirectory holding one
    /// is reported as 0 bytes.
    pub fn analyze(&self) -> Result<DirectorySizeReport> {
        let Some(tally) = self.tally_or_missing()? else {
            return Ok(DirectorySizeReport::empty(&self.root));
        };
        let mut failures = tally.failures;

        let breakdown = match self.size.breakdown(&self.root) {
            Ok(breakdown) => Some(breakdown.sizes),
            Err(err) => {
                if !failures.iter().any(|f| f.path == self.root) {
                    failures.push(ScanFailure::located(err, &self.root));
                }
                None
            }
        };

        Ok(DirectorySizeReport {
            path: self.root.clone(),
            size_bytes: tally.bytes,
            breakdown,
            failures,
        })
    }

    /// Readable cache bytes and the entries that could not be read; empty
    /// when the cache does not exist.
    pub fn tally(&self) -> Result<Tally> {
        Ok(self.tally_or_missing()?.unwrap_or_default())
    }

    /// Readable cache bytes without the per-subdirectory breakdown; 0 when
    /// the cache does not exist.
    pub fn total(&self) -> Result<u64> {
        Ok(self.tally()?.bytes)
    }

    fn tally_or_missing(&self) -> Result<Option<Tally>> {
        match self.size.tally(&self.root) {
            Ok(tally) => Ok(Some(tally)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }
}
