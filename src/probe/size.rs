use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::{HoldError, Result};
use crate::report::ScanFailure;

/// How file sizes are counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SizeMode {
    /// Space actually allocated on disk, like `du`.
    #[default]
    Disk,
    /// Logical file length, like `du --apparent-size`.
    Apparent,
}

/// Result of [`SizeProbe::breakdown`].
#[derive(Debug, Default)]
pub struct Breakdown {
    pub sizes: BTreeMap<String, u64>,
    pub failures: Vec<ScanFailure>,
}

impl Breakdown {
    pub fn total(&self) -> u64 {
        self.sizes.values().sum()
    }
}

/// Result of [`SizeProbe::tally`].
#[derive(Debug, Default)]
pub struct Tally {
    pub bytes: u64,
    pub failures: Vec<ScanFailure>,
}

/// Measures directory subtrees.
///
/// Only non-directory entries contribute bytes, so a directory measures
/// exactly the sum of its children. Symbolic links are never followed and
/// hard-linked files count once per measurement.
#[derive(Debug, Clone, Copy, Default)]
pub struct SizeProbe {
    mode: SizeMode,
}

impl SizeProbe {
    pub fn new(mode: SizeMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> SizeMode {
        self.mode
    }

    /// Total bytes under `path`, rescanned on every call.
    ///
    /// A `path` that is itself a symbolic link is resolved; links below it
    /// are not.
    ///
    /// # Errors
    ///
    /// [`HoldError::NotFound`] when `path` does not exist and
    /// [`HoldError::PermissionDenied`] when it or anything below it cannot be
    /// read.
    pub fn measure(&self, path: &Path) -> Result<u64> {
        self.walk(path, Err)
    }

    /// Bytes under `path` that could be read, with every entry that could
    /// not.
    ///
    /// # Errors
    ///
    /// Only when `path` itself cannot be inspected.
    pub fn tally(&self, path: &Path) -> Result<Tally> {
        let mut failures = Vec::new();
        let bytes = self.walk(path, |err| {
            failures.push(ScanFailure::located(err, path));
            Ok(())
        })?;
        Ok(Tally { bytes, failures })
    }

    fn walk(
        &self,
        path: &Path,
        mut on_error: impl FnMut(HoldError) -> Result<()>,
    ) -> Result<u64> {
        let root = fs::metadata(path).map_err(|source| HoldError::io(path, source))?;
        if !root.is_dir() {
            return Ok(self.entry_bytes(&root));
        }

        let mut seen_inodes = HashSet::new();
        let mut total = 0u64;

        for entry in WalkDir::new(path).min_depth(1).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    on_error(HoldError::walk(path, err))?;
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(err) => {
                    on_error(HoldError::walk(entry.path(), err))?;
                    continue;
                }
            };
            if !first_link(&metadata, &mut seen_inodes) {
                continue;
            }
            total = total.saturating_add(self.entry_bytes(&metadata));
        }

        Ok(total)
    }

    /// Size of every immediate child directory of `path`.
    ///
    /// A child that fails to measure is reported as 0 bytes and listed in
    /// [`Breakdown::failures`]; only failing to list `path` itself is an
    /// error.
    pub fn breakdown(&self, path: &Path) -> Result<Breakdown> {
        let entries = fs::read_dir(path).map_err(|source| HoldError::io(path, source))?;
        let mut breakdown = Breakdown::default();

        for entry in entries {
            let entry = entry.map_err(|source| HoldError::io(path, source))?;
            let child = entry.path();
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if !is_dir {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            match self.measure(&child) {
                Ok(size) => {
                    breakdown.sizes.insert(name, size);
                }
                Err(error) => {
                    breakdown.sizes.insert(name, 0);
                    breakdown.failures.push(ScanFailure::new(child, error));
                }
            }
        }

        Ok(breakdown)
    }

    fn entry_bytes(&self, metadata: &fs::Metadata) -> u64 {
        match self.mode {
            SizeMode::Apparent => metadata.len(),
            SizeMode::Disk => allocated_bytes(metadata),
        }
    }
}

#[cfg(unix)]
fn allocated_bytes(metadata: &fs::Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    // st_blocks is always in 512-byte units regardless of the fs block size
    metadata.blocks().saturating_mul(512)
}

#[cfg(not(unix))]
fn allocated_bytes(metadata: &fs::Metadata) -> u64 {
    metadata.len()
}

/// Returns false for the second and later sightings of a hard-linked inode.
#[cfg(unix)]
fn first_link(metadata: &fs::Metadata, seen: &mut HashSet<(u64, u64)>) -> bool {
    use std::os::unix::fs::MetadataExt;
    if metadata.nlink() <= 1 {
        return true;
    }
    seen.insert((metadata.dev(), metadata.ino()))
}

#[cfg(not(unix))]
fn first_link(_metadata: &fs::Metadata, _seen: &mut HashSet<(u64, u64)>) -> bool {
    true
}
