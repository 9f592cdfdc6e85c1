//! Plain data produced by one analysis run.
//!
//! Every value here is a snapshot: it is rebuilt on each run and never cached
//! or persisted. Only the log entries in [`crate::journal`] outlive a run.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::HoldError;

/// A path that could not be processed during a bulk operation.
#[derive(Debug)]
pub struct ScanFailure {
    pub path: PathBuf,
    pub error: HoldError,
}

impl ScanFailure {
    pub fn new(path: impl Into<PathBuf>, error: HoldError) -> Self {
        Self {
            path: path.into(),
            error,
        }
    }

    /// A failure located at the path the error names, or at `fallback` when
    /// it names none.
    pub fn located(error: HoldError, fallback: &Path) -> Self {
        let path = match &error {
            HoldError::NotFound(path)
            | HoldError::PermissionDenied { path, .. }
            | HoldError::IoError { path, .. } => path.clone(),
            _ => fallback.to_path_buf(),
        };
        Self { path, error }
    }
}

impl fmt::Display for ScanFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.error)
    }
}

/// Size of a directory and, optionally, of each of its immediate
/// subdirectories.
#[derive(Debug)]
pub struct DirectorySizeReport {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub breakdown: Option<BTreeMap<String, u64>>,
    /// Entries that could not be read. Their bytes are missing from
    /// `size_bytes`, and a subdirectory holding one appears in `breakdown`
    /// as 0.
    pub failures: Vec<ScanFailure>,
}

impl DirectorySizeReport {
    /// Report for a directory that does not exist.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            size_bytes: 0,
            breakdown: None,
            failures: Vec::new(),
        }
    }

    pub fn exists(&self) -> bool {
        self.breakdown.is_some() || self.size_bytes > 0 || !self.failures.is_empty()
    }

    /// Breakdown entries ordered largest first, ties by name.
    pub fn sorted_breakdown(&self) -> Vec<(&str, u64)> {
        let mut entries: Vec<(&str, u64)> = self
            .breakdown
            .iter()
            .flatten()
            .map(|(name, size)| (name.as_str(), *size))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }
}

/// Signals gathered for one discovered environment directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentRecord {
    /// The environment directory itself (`project/.venv`).
    pub path: PathBuf,
    pub size_bytes: u64,
    /// Newest file modification anywhere in the project.
    pub last_modified: DateTime<Utc>,
    pub has_version_control: bool,
    pub last_vcs_activity: Option<DateTime<Utc>>,
    pub source_file_count: usize,
}

impl EnvironmentRecord {
    /// The project directory owning this environment.
    pub fn project_path(&self) -> &Path {
        self.path.parent().unwrap_or(&self.path)
    }

    /// Whole days since any file in the project changed; the inactivity
    /// signal counts the same days.
    pub fn days_since_modified(&self, now: DateTime<Utc>) -> i64 {
        now.signed_duration_since(self.last_modified)
            .num_days()
            .max(0)
    }
}

/// Installed package and the space it occupies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSizeEntry {
    pub name: String,
    pub size_bytes: u64,
}

/// Every environment found under a base path, plus the ones that could not
/// be analyzed.
#[derive(Debug, Default)]
pub struct EnvironmentScan {
    /// Ordered largest first.
    pub records: Vec<EnvironmentRecord>,
    pub failures: Vec<ScanFailure>,
}

impl EnvironmentScan {
    pub fn total_bytes(&self) -> u64 {
        self.records.iter().map(|r| r.size_bytes).sum()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// What a cleanup candidate would remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    Cache,
    Environment,
}

impl fmt::Display for CandidateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateKind::Cache => f.write_str("cache"),
            CandidateKind::Environment => f.write_str("environment"),
        }
    }
}

/// How confident the analysis is that removal loses nothing of value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Safety {
    Safe,
    Caution,
}

impl fmt::Display for Safety {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Safety::Safe => f.write_str("safe"),
            Safety::Caution => f.write_str("caution"),
        }
    }
}

/// A heuristic that matched, with the observed value that triggered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reason {
    /// No file in the project changed for longer than the inactivity window.
    Inactive { days: i64 },
    /// The project has no version control and its environment is small.
    UntrackedAndSmall { size_bytes: u64 },
    /// The project holds almost no source files.
    FewSourceFiles { count: usize },
    /// Cache contents are re-downloaded on demand.
    RebuildableCache,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::Inactive { days } => write!(f, "Inactive for {days} days"),
            Reason::UntrackedAndSmall { .. } => f.write_str("No version control and relatively small"),
            Reason::FewSourceFiles { count } => write!(f, "Very few source files ({count})"),
            Reason::RebuildableCache => {
                f.write_str("Cached packages are re-downloaded when needed")
            }
        }
    }
}

/// A flagged cache or environment with its estimated recovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupCandidate {
    pub kind: CandidateKind,
    pub target: PathBuf,
    /// Never larger than the measured size of `target`.
    pub estimated_bytes_freed: u64,
    pub safety: Safety,
    /// Every matched reason, in rule order.
    pub rationale: Vec<Reason>,
}
