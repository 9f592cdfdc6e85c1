use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{HoldError, Result};
use crate::probe::{MetadataProbe, SizeProbe, VCS_MARKERS};
use crate::report::{EnvironmentRecord, EnvironmentScan, PackageSizeEntry, ScanFailure};

/// Finds environment directories under a base path and measures them.
#[derive(Debug, Clone)]
pub struct EnvironmentAnalyzer {
    size: SizeProbe,
    metadata: MetadataProbe,
    max_depth: usize,
}

impl EnvironmentAnalyzer {
    pub fn new(size: SizeProbe, metadata: MetadataProbe, max_depth: usize) -> Self {
        Self {
            size,
            metadata,
            max_depth,
        }
    }

    /// Directory name that marks an environment (`.venv`).
    pub fn marker(&self) -> &str {
        self.metadata.env_marker()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn size_probe(&self) -> SizeProbe {
        self.size
    }

    /// Lazily walk `base` up to the configured depth, yielding every
    /// environment directory.
    ///
    /// Matched environments are leaves: the walk never descends into them.
    /// Traversal errors are yielded in place so the caller can skip them.
    pub fn discover(&self, base: &Path) -> Discover {
        self.discover_with_depth(base, self.max_depth)
    }

    /// [`Self::discover`] with an explicit depth limit.
    pub fn discover_with_depth(&self, base: &Path, max_depth: usize) -> Discover {
        Discover {
            base: base.to_path_buf(),
            marker: self.marker().to_string(),
            walker: WalkDir::new(base)
                .follow_links(false)
                .max_depth(max_depth)
                .into_iter(),
        }
    }

    /// Size and activity signals for one environment directory.
    pub fn analyze_one(&self, env: &Path) -> Result<EnvironmentRecord> {
        let project = env.parent().unwrap_or(env);

        let size_bytes = self.size.measure(env)?;
        let last_modified = self.metadata.last_modified(project)?;
        let has_version_control = self.metadata.has_version_control(project);
        let last_vcs_activity = if has_version_control {
            self.metadata.last_vcs_activity(project)
        } else {
            None
        };
        let source_file_count = self.metadata.count_source_files(project)?;

        Ok(EnvironmentRecord {
            path: env.to_path_buf(),
            size_bytes,
            last_modified,
            has_version_control,
            last_vcs_activity,
            source_file_count,
        })
    }

    /// Discover and analyze every environment under `base`, largest first.
    ///
    /// One unreadable environment never aborts the scan; it lands in
    /// [`EnvironmentScan::failures`].
    pub fn analyze_all(&self, base: &Path) -> EnvironmentScan {
        let mut scan = EnvironmentScan::default();

        for found in self.discover(base) {
            let env = match found {
                Ok(env) => env,
                Err(err) => {
                    scan.failures.push(ScanFailure::located(err, base));
                    continue;
                }
            };

            match self.analyze_one(&env) {
                Ok(record) => scan.records.push(record),
                Err(err) => scan.failures.push(ScanFailure::new(env, err)),
            }
        }

        scan.records.sort_by(|a, b| {
            b.size_bytes
                .cmp(&a.size_bytes)
                .then_with(|| a.path.cmp(&b.path))
        });
        scan
    }

    /// The `n` largest installed packages of an environment, largest first
    /// and ties broken by name.
    ///
    /// An environment without a `site-packages` directory has no packages.
    pub fn top_packages(&self, env: &Path, n: usize) -> Result<Vec<PackageSizeEntry>> {
        let Some(site_packages) = site_packages_dir(env) else {
            return Ok(Vec::new());
        };

        let mut packages = Vec::new();
        for name in package_dirs(&site_packages)? {
            // A package that vanished or is unreadable is simply not ranked
            let Ok(size_bytes) = self.size.measure(&site_packages.join(&name)) else {
                continue;
            };
            if size_bytes > 0 {
                packages.push(PackageSizeEntry { name, size_bytes });
            }
        }

        packages.sort_by(|a, b| {
            b.size_bytes
                .cmp(&a.size_bytes)
                .then_with(|| a.name.cmp(&b.name))
        });
        packages.truncate(n);
        Ok(packages)
    }

    /// Names of the packages installed in an environment.
    pub fn installed_packages(&self, env: &Path) -> Result<BTreeSet<String>> {
        match site_packages_dir(env) {
            Some(site_packages) => Ok(package_dirs(&site_packages)?.into_iter().collect()),
            None => Ok(BTreeSet::new()),
        }
    }
}

/// Iterator returned by [`EnvironmentAnalyzer::discover`].
pub struct Discover {
    base: PathBuf,
    marker: String,
    walker: walkdir::IntoIter,
}

impl Iterator for Discover {
    type Item = Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(err) => return Some(Err(HoldError::walk(&self.base, err))),
            };

            if !entry.file_type().is_dir() || entry.depth() == 0 {
                continue;
            }

            let name = entry.file_name();
            let is_environment = name == self.marker.as_str();
            let is_vcs = VCS_MARKERS.iter().any(|marker| name == *marker);

            if is_environment {
                self.walker.skip_current_dir();
                return Some(Ok(entry.into_path()));
            }
            if is_vcs {
                self.walker.skip_current_dir();
            }
        }
    }
}

/// Locate `lib/pythonX.Y/site-packages` (or `Lib/site-packages` on Windows).
fn site_packages_dir(env: &Path) -> Option<PathBuf> {
    let windows_layout = env.join("Lib").join("site-packages");
    if windows_layout.is_dir() {
        return Some(windows_layout);
    }

    let mut candidates: Vec<PathBuf> = fs::read_dir(env.join("lib"))
        .ok()?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().starts_with("python"))
        .map(|entry| entry.path().join("site-packages"))
        .filter(|path| path.is_dir())
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}

/// Package directories inside `site-packages`, skipping install metadata.
fn package_dirs(site_packages: &Path) -> Result<Vec<String>> {
    let entries =
        fs::read_dir(site_packages).map_err(|source| HoldError::io(site_packages, source))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| HoldError::io(site_packages, source))?;
        if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".dist-info") || name == "__pycache__" {
            continue;
        }
        names.push(name);
    }
    Ok(names)
}
