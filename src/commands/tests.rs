use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Duration, TimeZone, Utc};
use tempfile::TempDir;

use super::display;
use super::*;
use crate::analysis::{Recommendation, RecommendationKind};
use crate::cli::{GlobalOpts, ThresholdOpts};
use crate::journal::{CleanupLogEntry, CleanupOperation, DEFAULT_CAPACITY, LogStore};
use crate::monitor::{MonitorSession, UsageSnapshot};
use crate::report::{
    CandidateKind, CleanupCandidate, DirectorySizeReport, EnvironmentRecord, PackageSizeEntry,
    Reason, Safety,
};
use crate::runner::CommandOutput;

struct Sandbox {
    temp: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            temp: TempDir::new().unwrap(),
        }
    }

    fn path(&self) -> &Path {
        self.temp.path()
    }

    fn opts(&self) -> GlobalOpts {
        GlobalOpts::builder()
            .cache_dir(self.path().join("cache"))
            .base_path(self.path().join("code"))
            .cleanup_log(self.path().join("cleanup.json"))
            .monitor_log(self.path().join("monitor.json"))
            .apparent_size(true)
            .thresholds(ThresholdOpts::default().ignore_below("0"))
            .quiet(true)
            .build()
    }

    fn run(&self, command: Commands) -> crate::error::Result<()> {
        let cli = Cli::builder()
            .global_opts(self.opts())
            .command(command)
            .build()?;
        execute_with_dir(&cli, Some(self.path()))
    }

    fn env(&self, project: &str) -> PathBuf {
        let env = self.path().join("code").join(project).join(".venv");
        fs::create_dir_all(env.join("bin")).unwrap();
        fs::write(env.join("bin/python"), vec![b'x'; 2_000]).unwrap();
        env
    }
}

fn record(path: &str, size_bytes: u64, age_days: i64) -> EnvironmentRecord {
    EnvironmentRecord {
        path: PathBuf::from(path),
        size_bytes,
        last_modified: Utc::now() - Duration::days(age_days),
        has_version_control: true,
        last_vcs_activity: None,
        source_file_count: 12,
    }
}

#[test]
fn test_remove_without_yes_is_a_dry_run() {
    let sandbox = Sandbox::new();
    let env = sandbox.env("demo");

    sandbox
        .run(Commands::Remove {
            path: env.clone(),
            yes: false,
        })
        .unwrap();
    assert!(env.exists());

    sandbox
        .run(Commands::Remove {
            path: env.clone(),
            yes: true,
        })
        .unwrap();
    assert!(!env.exists());

    let logged = LogStore::<CleanupLogEntry>::open(sandbox.path().join("cleanup.json"), DEFAULT_CAPACITY)
        .read()
        .unwrap();
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].bytes_freed, 2_000);
}

#[test]
fn test_remove_resolves_relative_paths_against_working_dir() {
    let sandbox = Sandbox::new();
    let env = sandbox.env("demo");

    sandbox
        .run(Commands::Remove {
            path: PathBuf::from("code/demo/.venv"),
            yes: true,
        })
        .unwrap();
    assert!(!env.exists());
}

#[test]
fn test_remove_refuses_project_directory() {
    let sandbox = Sandbox::new();
    let env = sandbox.env("demo");

    let err = sandbox
        .run(Commands::Remove {
            path: env.parent().unwrap().to_path_buf(),
            yes: true,
        })
        .unwrap_err();
    assert!(matches!(err, HoldError::NotAnEnvironment { .. }));
    assert!(env.exists());
}

#[test]
fn test_sweep_removes_only_unused_environments() {
    let sandbox = Sandbox::new();
    let sparse = sandbox.env("sparse");
    let busy = sandbox.env("busy");
    fs::create_dir(busy.parent().unwrap().join(".git")).unwrap();
    for i in 0..6 {
        fs::write(busy.parent().unwrap().join(format!("m{i}.py")), "").unwrap();
    }
    let cli_opts = GlobalOpts::builder()
        .cache_dir(sandbox.path().join("cache"))
        .base_path(sandbox.path().join("code"))
        .cleanup_log(sandbox.path().join("cleanup.json"))
        .apparent_size(true)
        .thresholds(
            ThresholdOpts::default()
                .ignore_below("0")
                .small_env_size("1K"),
        )
        .quiet(true)
        .build();
    let cli = Cli::builder()
        .global_opts(cli_opts)
        .command(Commands::Sweep { yes: true })
        .build()
        .unwrap();

    execute_with_dir(&cli, Some(sandbox.path())).unwrap();

    assert!(!sparse.exists());
    assert!(busy.exists());
}

#[test]
fn test_history_clear_and_empty_logs() {
    let sandbox = Sandbox::new();
    let log_path = sandbox.path().join("cleanup.json");
    fs::write(&log_path, "[]").unwrap();

    sandbox
        .run(Commands::History {
            monitor: false,
            limit: 5,
            clear: false,
        })
        .unwrap();
    sandbox
        .run(Commands::History {
            monitor: true,
            limit: 5,
            clear: false,
        })
        .unwrap();
    sandbox
        .run(Commands::History {
            monitor: false,
            limit: 5,
            clear: true,
        })
        .unwrap();
    assert!(!log_path.exists());
}

#[test]
fn test_corrupt_history_is_an_error() {
    let sandbox = Sandbox::new();
    fs::write(sandbox.path().join("monitor.json"), "oops").unwrap();

    let err = sandbox
        .run(Commands::History {
            monitor: true,
            limit: 5,
            clear: false,
        })
        .unwrap_err();
    assert!(matches!(err, HoldError::LogCorrupt { .. }));
}

#[test]
fn test_invalid_cache_threshold_is_reported() {
    let sandbox = Sandbox::new();
    let err = sandbox
        .run(Commands::Recommend {
            cache_threshold: "huge".to_string(),
            env_count_threshold: 10,
        })
        .unwrap_err();
    assert!(matches!(err, HoldError::InvalidSize(..)));
}

#[test]
fn test_read_only_commands_tolerate_missing_directories() {
    let sandbox = Sandbox::new();
    sandbox.run(Commands::Analyze { top: 5 }).unwrap();
    sandbox.run(Commands::Candidates).unwrap();
    sandbox
        .run(Commands::CleanCache {
            yes: false,
            verify: false,
            clean_command: "false".to_string(),
        })
        .unwrap();
}

// Rendering

#[test]
fn test_cache_report_lists_largest_first() {
    let report = DirectorySizeReport {
        path: PathBuf::from("/home/me/.cache/uv"),
        size_bytes: 15 * 1024 * 1024 * 1024,
        breakdown: Some(BTreeMap::from([
            ("archive-v0".to_string(), 5 * 1024 * 1024 * 1024),
            ("wheels-v1".to_string(), 10 * 1024 * 1024 * 1024),
        ])),
        failures: Vec::new(),
    };

    let text = display::cache_report(&report, 10);
    assert!(text.contains("Total: 15.00 GB"));
    let wheels = text.find("wheels-v1").unwrap();
    let archive = text.find("archive-v0").unwrap();
    assert!(wheels < archive);

    let missing = display::cache_report(&DirectorySizeReport::empty("/nowhere"), 10);
    assert!(missing.contains("(not found)"));
}

#[test]
fn test_environment_table_truncates() {
    let records = vec![
        record("/code/a/.venv", 3_000, 1),
        record("/code/b/.venv", 2_000, 40),
        record("/code/c/.venv", 1_000, 2),
    ];

    let text = display::environment_table(&records, 2, Utc::now());
    assert!(text.starts_with("Environments: 3 (5.86 KB)"));
    assert!(text.contains("/code/a/.venv"));
    assert!(text.contains("40d"));
    assert!(!text.contains("/code/c/.venv"));
    assert!(text.contains("... and 1 more"));
}

#[test]
fn test_environment_table_idle_days_ignore_recent_commits() {
    let mut stale = record("/code/old/.venv", 1_000, 45);
    stale.last_vcs_activity = Some(Utc::now() - Duration::days(2));

    let text = display::environment_table(&[stale], 10, Utc::now());
    assert!(text.contains("45d"));
    assert!(!text.contains(" 2d"));
}

#[test]
fn test_package_table() {
    let env = record("/code/a/.venv", 3_000, 1);
    let packages = vec![PackageSizeEntry {
        name: "numpy".to_string(),
        size_bytes: 1536,
    }];
    let text = display::package_table(&env, &packages);
    assert!(text.contains("1.50 KB  numpy"));
    assert!(display::package_table(&env, &[]).contains("(no packages found)"));
}

#[test]
fn test_candidate_table_shows_every_reason() {
    let candidates = vec![CleanupCandidate {
        kind: CandidateKind::Environment,
        target: PathBuf::from("/code/old/.venv"),
        estimated_bytes_freed: 50 * 1024 * 1024,
        safety: Safety::Safe,
        rationale: vec![
            Reason::Inactive { days: 45 },
            Reason::FewSourceFiles { count: 2 },
        ],
    }];

    let text = display::candidate_table(&candidates);
    assert!(text.contains("[safe] environment /code/old/.venv (50.00 MB)"));
    assert!(text.contains("- Inactive for 45 days"));
    assert!(text.contains("- Very few source files (2)"));
    assert!(text.contains("Potential savings: 50.00 MB"));
    assert_eq!(display::candidate_table(&[]), "Nothing to clean up.\n");
}

#[test]
fn test_recommendation_list() {
    let advice = vec![
        Recommendation {
            kind: RecommendationKind::CleanCache,
            action: "Clean the package cache".to_string(),
            potential_savings: 6 * 1024 * 1024 * 1024,
            description: "The cache holds 6.00 GB.".to_string(),
        },
        Recommendation {
            kind: RecommendationKind::Review,
            action: "Review environments".to_string(),
            potential_savings: 0,
            description: "There are 12 environments.".to_string(),
        },
    ];

    let text = display::recommendation_list(&advice);
    assert!(text.contains("1. Clean the package cache (saves 6.00 GB)"));
    assert!(text.contains("2. Review environments\n"));
    assert!(display::recommendation_list(&[]).contains("healthy"));
}

#[test]
fn test_monitor_summary() {
    let snapshot = |cache_bytes: u64, packages: &[&str]| UsageSnapshot {
        taken_at: Utc::now(),
        cache_bytes,
        environment_bytes: 1024,
        environments: vec![PathBuf::from("/code/demo/.venv")],
        packages: packages.iter().map(|p| p.to_string()).collect(),
    };
    let session = MonitorSession {
        command: "uv pip install requests".to_string(),
        working_dir: PathBuf::from("/code/demo"),
        started_at: Utc::now(),
        before: snapshot(0, &["six"]),
        after: snapshot(120 * 1024 * 1024, &["requests", "six"]),
        output: CommandOutput {
            exit_code: Some(0),
            ..CommandOutput::default()
        },
        delta_bytes: 120 * 1024 * 1024,
        cache_delta: 120 * 1024 * 1024,
        environment_delta: 0,
        new_packages: BTreeSet::from(["requests".to_string()]),
        removed_packages: BTreeSet::new(),
        failures: Vec::new(),
        log_warning: None,
    };

    let text = display::monitor_summary(&session);
    assert!(text.contains("Command: uv pip install requests"));
    assert!(text.contains("Total change: +120.00 MB"));
    assert!(text.contains("New packages: requests"));
    assert!(!text.contains("Removed packages"));
}

#[test]
fn test_cleanup_history_marks_failures() {
    let entry = CleanupLogEntry {
        timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        operation: CleanupOperation::CacheClean,
        target: PathBuf::from("/home/me/.cache/uv"),
        bytes_freed: 0,
        size_after: None,
        files_removed: None,
        success: false,
        message: "locked".to_string(),
    };

    let text = display::cleanup_history(&[entry]);
    assert!(text.starts_with("2024-05-01 12:00:00  cache clean"));
    assert!(text.contains("(failed)"));
    assert_eq!(display::cleanup_history(&[]), "No cleanup history.\n");
}
