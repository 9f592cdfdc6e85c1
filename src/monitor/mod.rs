//! Before/after disk usage around an external command.
//!
//! [`SpaceMonitor::monitor`] snapshots the cache and the environments of a
//! project, runs the command to completion, snapshots again and reports what
//! changed: bytes per area and the packages that appeared or disappeared.


use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::analysis::{CacheAnalyzer, EnvironmentAnalyzer};
use crate::error::{HoldError, Result};
use crate::journal::{LogStore, MonitorLogEntry};
use crate::report::ScanFailure;
use crate::runner::{CommandOutput, ProcessRunner};
use crate::units::signed_delta;

/// Point-in-time usage of the cache and one project's environments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageSnapshot {
    pub taken_at: DateTime<Utc>,
    pub cache_bytes: u64,
    pub environment_bytes: u64,
    pub environments: Vec<PathBuf>,
    /// Union of installed package names across the environments.
    pub packages: BTreeSet<String>,
}

impl UsageSnapshot {
    pub fn total_bytes(&self) -> u64 {
        self.cache_bytes.saturating_add(self.environment_bytes)
    }
}

/// One monitored command.
#[derive(Debug)]
pub struct MonitorSession {
    pub command: String,
    pub working_dir: PathBuf,
    pub started_at: DateTime<Utc>,
    pub before: UsageSnapshot,
    pub after: UsageSnapshot,
    pub output: CommandOutput,
    pub delta_bytes: i64,
    pub cache_delta: i64,
    pub environment_delta: i64,
    pub new_packages: BTreeSet<String>,
    pub removed_packages: BTreeSet<String>,
    /// Environments that could not be measured in either snapshot.
    pub failures: Vec<ScanFailure>,
    /// Set when the session could not be logged cleanly. The session itself
    /// is still complete.
    pub log_warning: Option<HoldError>,
}

impl MonitorSession {
    pub fn exit_code(&self) -> Option<i32> {
        self.output.exit_code
    }

    fn log_entry(&self) -> MonitorLogEntry {
        MonitorLogEntry {
            timestamp: self.started_at,
            command: self.command.clone(),
            working_dir: self.working_dir.clone(),
            bytes_before: self.before.total_bytes(),
            bytes_after: self.after.total_bytes(),
            delta_bytes: self.delta_bytes,
            cache_delta: self.cache_delta,
            environment_delta: self.environment_delta,
            new_packages: self.new_packages.iter().cloned().collect(),
            removed_packages: self.removed_packages.iter().cloned().collect(),
            exit_code: self.output.exit_code,
        }
    }
}

/// Runs commands between two usage snapshots.
pub struct SpaceMonitor<R> {
    cache: CacheAnalyzer,
    environments: EnvironmentAnalyzer,
    runner: R,
    log: Option<LogStore<MonitorLogEntry>>,
}

impl<R: ProcessRunner> SpaceMonitor<R> {
    pub fn new(cache: CacheAnalyzer, environments: EnvironmentAnalyzer, runner: R) -> Self {
        Self {
            cache,
            environments,
            runner,
            log: None,
        }
    }

    /// Append every session to `log`.
    pub fn with_log(mut self, log: LogStore<MonitorLogEntry>) -> Self {
        self.log = Some(log);
        self
    }

    /// Measure the cache and every environment under `project_dir`.
    ///
    /// Environments that cannot be read are left out of the snapshot and
    /// returned as failures.
    pub fn snapshot(&self, project_dir: &Path) -> Result<(UsageSnapshot, Vec<ScanFailure>)> {
        let taken_at = Utc::now();
        let cache = self.cache.tally()?;

        let mut snapshot = UsageSnapshot {
            taken_at,
            cache_bytes: cache.bytes,
            environment_bytes: 0,
            environments: Vec::new(),
            packages: BTreeSet::new(),
        };
        let mut failures = cache.failures;

        for found in self.environments.discover(project_dir) {
            let env = match found {
                Ok(env) => env,
                Err(err) => {
                    failures.push(ScanFailure::located(err, project_dir));
                    continue;
                }
            };

            match self.environments.size_probe().measure(&env) {
                Ok(bytes) => snapshot.environment_bytes += bytes,
                Err(err) => {
                    failures.push(ScanFailure::new(&env, err));
                    continue;
                }
            }
            match self.environments.installed_packages(&env) {
                Ok(packages) => snapshot.packages.extend(packages),
                Err(err) => failures.push(ScanFailure::new(&env, err)),
            }
            snapshot.environments.push(env);
        }

        snapshot.environments.sort();
        Ok((snapshot, failures))
    }

    /// Run `command` in `project_dir` and report the space it consumed.
    ///
    /// # Errors
    ///
    /// [`HoldError::CommandExecution`] when the command cannot be started. A
    /// command that exits non-zero still produces a session.
    pub fn monitor(&self, command: &str, project_dir: &Path) -> Result<MonitorSession> {
        let started_at = Utc::now();
        let (before, mut failures) = self.snapshot(project_dir)?;

        let output = self.runner.run(command, project_dir)?;

        let (after, after_failures) = self.snapshot(project_dir)?;
        failures.extend(after_failures);

        let mut session = MonitorSession {
            command: command.to_string(),
            working_dir: project_dir.to_path_buf(),
            started_at,
            delta_bytes: signed_delta(before.total_bytes(), after.total_bytes()),
            cache_delta: signed_delta(before.cache_bytes, after.cache_bytes),
            environment_delta: signed_delta(before.environment_bytes, after.environment_bytes),
            new_packages: after.packages.difference(&before.packages).cloned().collect(),
            removed_packages: before.packages.difference(&after.packages).cloned().collect(),
            before,
            after,
            output,
            failures,
            log_warning: None,
        };

        if let Some(log) = &self.log {
            session.log_warning = match log.append(session.log_entry()) {
                Ok(appended) => appended.discarded,
                Err(err) => Some(err),
            };
        }

        Ok(session)
    }
}
