use std::fs;
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use git2::Repository;
use walkdir::{DirEntry, WalkDir};

use crate::error::{HoldError, Result};

/// Directory names that mark a version-controlled project root.
pub const VCS_MARKERS: &[&str] = &[".git", ".hg", ".svn"];

/// Derives activity signals for the project that owns an environment.
#[derive(Debug, Clone)]
pub struct MetadataProbe {
    env_marker: String,
    source_extension: String,
}

impl MetadataProbe {
    /// `env_marker` is the environment directory name (`.venv`) and
    /// `source_extension` the project's source file extension without the
    /// dot (`py`).
    pub fn new(env_marker: impl Into<String>, source_extension: impl Into<String>) -> Self {
        Self {
            env_marker: env_marker.into(),
            source_extension: source_extension.into().trim_start_matches('.').to_string(),
        }
    }

    pub fn env_marker(&self) -> &str {
        &self.env_marker
    }

    /// Newest modification time of any file under `project`.
    ///
    /// The directory's own mtime is only used when the tree holds no readable
    /// files, since a stale directory mtime hides writes deeper down.
    /// Unreadable entries below the root are skipped.
    pub fn last_modified(&self, project: &Path) -> Result<DateTime<Utc>> {
        let root = fs::metadata(project).map_err(|source| HoldError::io(project, source))?;

        let newest = WalkDir::new(project)
            .follow_links(false)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| entry.metadata().ok()?.modified().ok())
            .max();

        let newest = match newest {
            Some(time) => time,
            None => root
                .modified()
                .map_err(|source| HoldError::io(project, source))?,
        };

        Ok(to_utc(newest))
    }

    /// Whether a recognized VCS metadata directory sits at the project root.
    pub fn has_version_control(&self, project: &Path) -> bool {
        VCS_MARKERS
            .iter()
            .any(|marker| project.join(marker).exists())
    }

    /// Commit time of `HEAD`, when the project is a Git repository with at
    /// least one commit.
    ///
    /// Other version control systems are detected but report no activity.
    pub fn last_vcs_activity(&self, project: &Path) -> Option<DateTime<Utc>> {
        if !project.join(".git").exists() {
            return None;
        }

        let repo = Repository::open(project).ok()?;
        let commit = repo.head().ok()?.peel_to_commit().ok()?;
        DateTime::from_timestamp(commit.time().seconds(), 0)
    }

    /// Number of source files under `project`, not counting anything inside
    /// environment or VCS metadata directories.
    pub fn count_source_files(&self, project: &Path) -> Result<usize> {
        fs::metadata(project).map_err(|source| HoldError::io(project, source))?;

        let count = WalkDir::new(project)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.is_excluded_dir(entry))
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file() && self.is_source(entry.path()))
            .count();

        Ok(count)
    }

    fn is_excluded_dir(&self, entry: &DirEntry) -> bool {
        if !entry.file_type().is_dir() {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        name == self.env_marker.as_str() || VCS_MARKERS.contains(&name.as_ref())
    }

    fn is_source(&self, path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext.to_string_lossy() == self.source_extension.as_str())
    }
}

pub(crate) fn to_utc(time: SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(time)
}
