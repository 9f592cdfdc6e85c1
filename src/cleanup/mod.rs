//! Destructive cleanup actions.
//!
//! Every action here takes a [`Confirmation`], which callers only create once
//! the user has explicitly agreed. Completed actions are appended to the
//! cleanup log; a failure to log is attached to the outcome as a warning and
//! never turns a completed action into an error.


use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::Utc;
use regex::Regex;

use crate::analysis::CacheAnalyzer;
use crate::error::{HoldError, Result};
use crate::journal::{CleanupLogEntry, CleanupOperation, LogStore};
use crate::probe::SizeProbe;
use crate::report::{CandidateKind, CleanupCandidate, ScanFailure};
use crate::runner::ProcessRunner;

/// Command used to empty the package cache.
pub const DEFAULT_CLEAN_COMMAND: &str = "uv cache clean";

/// Proof that the user agreed to a destructive action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation(());

impl Confirmation {
    /// Record that the user explicitly confirmed, e.g. by passing `--yes`.
    pub fn given() -> Self {
        Confirmation(())
    }
}

/// Result of one cleanup action.
#[derive(Debug)]
pub struct CleanupOutcome {
    pub operation: CleanupOperation,
    pub target: PathBuf,
    pub bytes_freed: u64,
    pub size_after: Option<u64>,
    pub files_removed: Option<u64>,
    pub success: bool,
    pub message: String,
    /// Set when the outcome could not be logged cleanly.
    pub log_warning: Option<HoldError>,
}

impl CleanupOutcome {
    fn log_entry(&self) -> CleanupLogEntry {
        CleanupLogEntry {
            timestamp: Utc::now(),
            operation: self.operation,
            target: self.target.clone(),
            bytes_freed: self.bytes_freed,
            size_after: self.size_after,
            files_removed: self.files_removed,
            success: self.success,
            message: self.message.clone(),
        }
    }
}

/// Outcomes of removing many environments at once.
#[derive(Debug, Default)]
pub struct SweepReport {
    pub removed: Vec<CleanupOutcome>,
    pub failures: Vec<ScanFailure>,
}

impl SweepReport {
    pub fn bytes_freed(&self) -> u64 {
        self.removed.iter().map(|o| o.bytes_freed).sum()
    }
}

/// Executes cache cleaning and environment removal.
pub struct Cleaner<R> {
    cache: CacheAnalyzer,
    size: SizeProbe,
    env_marker: String,
    runner: R,
    clean_command: String,
    log: Option<LogStore<CleanupLogEntry>>,
}

impl<R: ProcessRunner> Cleaner<R> {
    pub fn new(
        cache: CacheAnalyzer,
        size: SizeProbe,
        env_marker: impl Into<String>,
        runner: R,
    ) -> Self {
        Self {
            cache,
            size,
            env_marker: env_marker.into(),
            runner,
            clean_command: DEFAULT_CLEAN_COMMAND.to_string(),
            log: None,
        }
    }

    /// Replace the cache-clean command.
    pub fn with_clean_command(mut self, command: impl Into<String>) -> Self {
        self.clean_command = command.into();
        self
    }

    /// Append every completed action to `log`.
    pub fn with_log(mut self, log: LogStore<CleanupLogEntry>) -> Self {
        self.log = Some(log);
        self
    }

    pub fn clean_command(&self) -> &str {
        &self.clean_command
    }

    /// Empty the package cache with the cache-clean command.
    ///
    /// The command's exit status is trusted: on success the whole measured
    /// cache counts as freed unless `verify` asks for a second measurement.
    /// A missing cache is an unsuccessful outcome, not an error.
    ///
    /// # Errors
    ///
    /// [`HoldError::CommandExecution`] when the command cannot be started, or
    /// an I/O error when the cache cannot be measured.
    pub fn clean_cache(&self, _confirmed: Confirmation, verify: bool) -> Result<CleanupOutcome> {
        let root = self.cache.root().to_path_buf();

        if !root.exists() {
            return Ok(CleanupOutcome {
                operation: CleanupOperation::CacheClean,
                target: root,
                bytes_freed: 0,
                size_after: None,
                files_removed: None,
                success: false,
                message: "Cache directory does not exist".to_string(),
                log_warning: None,
            });
        }

        let size_before = self.cache.total()?;
        let working_dir = root.parent().unwrap_or(&root);
        let output = self.runner.run(&self.clean_command, working_dir)?;
        let files_removed = parse_files_removed(&output.combined());

        let mut outcome = if output.success() {
            let size_after = if verify {
                Some(self.cache.total()?)
            } else {
                None
            };
            CleanupOutcome {
                operation: CleanupOperation::CacheClean,
                target: root,
                bytes_freed: size_after
                    .map_or(size_before, |after| size_before.saturating_sub(after)),
                size_after,
                files_removed,
                success: true,
                message: "Cache cleaned successfully".to_string(),
                log_warning: None,
            }
        } else {
            let detail = output.stderr.trim();
            let command = &self.clean_command;
            let message = match output.exit_code {
                Some(code) if detail.is_empty() => {
                    format!("'{command}' exited with status {code}")
                }
                Some(code) => format!("'{command}' exited with status {code}: {detail}"),
                None => format!("'{command}' was terminated by a signal"),
            };
            CleanupOutcome {
                operation: CleanupOperation::CacheClean,
                target: root,
                bytes_freed: 0,
                size_after: None,
                files_removed,
                success: false,
                message,
                log_warning: None,
            }
        };

        self.record(&mut outcome);
        Ok(outcome)
    }

    /// Validate a removal target and return its size, without removing it.
    ///
    /// # Errors
    ///
    /// [`HoldError::NotFound`] when `env` does not exist and
    /// [`HoldError::NotAnEnvironment`] when it is not a directory named after
    /// the environment marker.
    pub fn plan_removal(&self, env: &Path) -> Result<u64> {
        let metadata = fs::symlink_metadata(env).map_err(|source| HoldError::io(env, source))?;

        let named_like_env = env
            .file_name()
            .is_some_and(|name| name == self.env_marker.as_str());
        if !named_like_env || !metadata.is_dir() {
            return Err(HoldError::NotAnEnvironment {
                path: env.to_path_buf(),
                marker: self.env_marker.clone(),
            });
        }

        self.size.measure(env)
    }

    /// Irreversibly delete one environment directory.
    ///
    /// # Errors
    ///
    /// Everything [`Self::plan_removal`] rejects, plus I/O errors from the
    /// removal itself.
    pub fn remove_environment(
        &self,
        env: &Path,
        _confirmed: Confirmation,
    ) -> Result<CleanupOutcome> {
        let size = self.plan_removal(env)?;

        fs::remove_dir_all(env).map_err(|source| HoldError::io(env, source))?;

        let mut outcome = CleanupOutcome {
            operation: CleanupOperation::EnvironmentRemoval,
            target: env.to_path_buf(),
            bytes_freed: size,
            size_after: Some(0),
            files_removed: None,
            success: true,
            message: format!("Removed {}", env.display()),
            log_warning: None,
        };
        self.record(&mut outcome);
        Ok(outcome)
    }

    /// Remove every environment candidate. A failed removal is collected and
    /// the sweep continues.
    pub fn sweep(&self, candidates: &[CleanupCandidate], confirmed: Confirmation) -> SweepReport {
        let mut report = SweepReport::default();

        for candidate in candidates
            .iter()
            .filter(|c| c.kind == CandidateKind::Environment)
        {
            match self.remove_environment(&candidate.target, confirmed) {
                Ok(outcome) => report.removed.push(outcome),
                Err(err) => report
                    .failures
                    .push(ScanFailure::new(&candidate.target, err)),
            }
        }

        report
    }

    fn record(&self, outcome: &mut CleanupOutcome) {
        let Some(log) = &self.log else {
            return;
        };
        outcome.log_warning = match log.append(outcome.log_entry()) {
            Ok(appended) => appended.discarded,
            Err(err) => Some(err),
        };
    }
}

/// File count from cache-clean output such as `Removed 88974 files (1.2GiB)`.
pub fn parse_files_removed(output: &str) -> Option<u64> {
    static FILES_REMOVED_RE: OnceLock<Regex> = OnceLock::new();

    let re = FILES_REMOVED_RE.get_or_init(|| {
        Regex::new(r"Removed (\d+) files?").expect("files removed regex should compile")
    });
    re.captures(output)?[1].parse().ok()
}
