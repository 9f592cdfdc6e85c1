mod common;

use chrono::Utc;
use predicates::prelude::*;
use uv_hold::analysis::{
    CacheAnalyzer, CandidatePolicy, EnvironmentAnalyzer, RecommendationKind, RecommendationPolicy,
    Survey, Thresholds, candidates, recommendations,
};
use uv_hold::cli::{Cli, Commands, GlobalOpts};
use uv_hold::commands::execute_with_dir;
use uv_hold::journal::{
    CleanupLogEntry, CleanupOperation, DEFAULT_CAPACITY, LogStore, MonitorLogEntry,
};
use uv_hold::probe::{MetadataProbe, SizeMode, SizeProbe};
use uv_hold::report::{CandidateKind, Reason, Safety};

use crate::common::{TempHomeGuard, Workspace, stderr, stdout};

const MB: u64 = 1024 * 1024;

fn analyzers(ws: &Workspace) -> (CacheAnalyzer, EnvironmentAnalyzer) {
    let size = SizeProbe::new(SizeMode::Apparent);
    (
        CacheAnalyzer::new(ws.cache(), size),
        EnvironmentAnalyzer::new(size, MetadataProbe::new(".venv", "py"), 8),
    )
}

fn policy() -> CandidatePolicy {
    CandidatePolicy {
        thresholds: Thresholds::new(30, 500 * MB, 5),
        ignore_below_bytes: 0,
    }
}

/// Three projects: an abandoned script, an active tracked app and a tracked
/// library nobody touched in months.
fn populate(ws: &Workspace) {
    ws.cache_file("wheels-v1", "numpy.whl", 40_000);
    ws.cache_file("archive-v0", "blob", 20_000);

    let scratch = ws.project("scratch", 2);
    ws.install(&scratch, "requests", 3_000);
    ws.age(&scratch, 45);

    let app = ws.project("clients/app", 12);
    ws.install(&app, "django", 9_000);
    ws.install(&app, "attrs", 1_000);
    ws.commit_all(&app);

    let lib = ws.project("lib", 8);
    ws.install(&lib, "numpy", 6_000);
    ws.commit_all(&lib);
    ws.age(&lib, 120);
}

#[test]
fn test_survey_flags_abandoned_environments() {
    let ws = Workspace::new();
    populate(&ws);
    let (cache, environments) = analyzers(&ws);

    let survey = Survey::take(&cache, &environments, &ws.code()).unwrap();
    assert_eq!(survey.cache_bytes(), 60_000);
    assert_eq!(survey.environments.len(), 3);
    assert!(survey.environments.failures.is_empty());

    let breakdown = survey.cache.breakdown.as_ref().unwrap();
    assert_eq!(breakdown.len(), 2);
    assert_eq!(breakdown["wheels-v1"], 40_000);
    assert_eq!(breakdown["archive-v0"], 20_000);

    let found = candidates(&survey, &policy(), Utc::now());
    let summary: Vec<(CandidateKind, String, Safety)> = found
        .iter()
        .map(|c| {
            (
                c.kind,
                c.target
                    .strip_prefix(ws.root())
                    .unwrap()
                    .display()
                    .to_string(),
                c.safety,
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            (CandidateKind::Cache, "cache".to_string(), Safety::Safe),
            (
                CandidateKind::Environment,
                "code/scratch/.venv".to_string(),
                Safety::Safe
            ),
            (
                CandidateKind::Environment,
                "code/lib/.venv".to_string(),
                Safety::Safe
            ),
        ]
    );

    let scratch = &found[1];
    assert_eq!(scratch.rationale.len(), 3);
    assert!(matches!(scratch.rationale[0], Reason::Inactive { days } if days >= 44));
    assert!(matches!(scratch.rationale[1], Reason::UntrackedAndSmall { .. }));
    assert_eq!(scratch.rationale[2], Reason::FewSourceFiles { count: 2 });

    let lib = &found[2];
    assert_eq!(lib.rationale.len(), 1);
    assert!(lib.estimated_bytes_freed <= survey.environments.total_bytes());
}

#[test]
fn test_largest_packages_of_an_environment() {
    let ws = Workspace::new();
    populate(&ws);
    let (_, environments) = analyzers(&ws);

    let env = ws.code().join("clients/app/.venv");
    let top = environments.top_packages(&env, 1).unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].name, "django");
    assert_eq!(top[0].size_bytes, 9_000);
}

#[test]
fn test_recommendations_for_a_cluttered_machine() {
    let ws = Workspace::new();
    populate(&ws);
    let (cache, environments) = analyzers(&ws);
    let survey = Survey::take(&cache, &environments, &ws.code()).unwrap();
    let found = candidates(&survey, &policy(), Utc::now());

    let advice = recommendations(
        &survey,
        &found,
        &RecommendationPolicy {
            cache_threshold_bytes: 50_000,
            environment_count_threshold: 2,
        },
    );
    let kinds: Vec<RecommendationKind> = advice.iter().map(|r| r.kind).collect();
    assert_eq!(
        kinds,
        vec![
            RecommendationKind::CleanCache,
            RecommendationKind::RemoveEnvironments,
            RecommendationKind::Review,
        ]
    );
    assert_eq!(advice[1].potential_savings, 3_000 + 10 + 6_000 + 10);
}

#[test]
fn test_library_commands_use_home_defaults() {
    let home = TempHomeGuard::new();
    let ws = Workspace::new();
    let env = ws.install(&ws.project("demo", 1), "six", 100);

    let cli = Cli::builder()
        .global_opts(
            GlobalOpts::builder()
                .cache_dir(ws.cache())
                .base_path(ws.code())
                .apparent_size(true)
                .quiet(true)
                .build(),
        )
        .command(Commands::Remove {
            path: env.clone(),
            yes: true,
        })
        .build()
        .unwrap();
    execute_with_dir(&cli, Some(ws.root())).unwrap();
    assert!(!env.exists());

    let log = home.home().join(".uv_disk_cleanup_log.json");
    let entries = LogStore::<CleanupLogEntry>::open(&log, DEFAULT_CAPACITY)
        .read()
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].operation, CleanupOperation::EnvironmentRemoval);
    assert_eq!(entries[0].target, env);
}

#[test]
fn test_binary_analyze_and_candidates() {
    let home = TempHomeGuard::new();
    let ws = Workspace::new();
    populate(&ws);

    let output = ws.run(home.home(), &["analyze", "--top", "5"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(predicate::str::contains("Environments: 3").eval(&text));
    assert!(predicate::str::contains("wheels-v1").eval(&text));
    assert!(predicate::str::contains("Largest packages in").eval(&text));
    assert!(predicate::str::contains("django").eval(&text));

    let output = ws.run(home.home(), &["candidates"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(predicate::str::contains("scratch/.venv").eval(&text));
    assert!(predicate::str::contains("lib/.venv").eval(&text));
    assert!(predicate::str::contains("app/.venv").not().eval(&text));
    assert!(predicate::str::contains("Very few source files (2)").eval(&text));
}

#[test]
fn test_binary_sweep_requires_yes() {
    let home = TempHomeGuard::new();
    let ws = Workspace::new();
    populate(&ws);
    let scratch = ws.code().join("scratch/.venv");
    let app = ws.code().join("clients/app/.venv");

    let output = ws.run(home.home(), &["sweep"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(predicate::str::contains("--yes").eval(&stdout(&output)));
    assert!(scratch.exists());

    let output = ws.run(home.home(), &["sweep", "--yes"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(predicate::str::contains("Removed 2 environment(s)").eval(&stdout(&output)));
    assert!(!scratch.exists());
    assert!(app.exists());

    let output = ws.run(home.home(), &["history"]);
    let text = stdout(&output);
    assert_eq!(text.matches("environment removal").count(), 2);
}

#[test]
fn test_binary_remove_rejects_non_environment() {
    let home = TempHomeGuard::new();
    let ws = Workspace::new();
    let project = ws.project("demo", 1);
    ws.install(&project, "six", 10);

    let output = ws.run(home.home(), &["remove", project.to_str().unwrap(), "--yes"]);
    assert!(!output.status.success());
    assert!(predicate::str::contains("not a '.venv' directory").eval(&stderr(&output)));
    assert!(project.join(".venv").exists());
}

#[cfg(unix)]
#[test]
fn test_binary_clean_cache() {
    let home = TempHomeGuard::new();
    let ws = Workspace::new();
    populate(&ws);
    let clean = format!(
        "rm -rf '{}'/* && echo 'Removed 2 files (58.6KiB)'",
        ws.cache().display()
    );

    let output = ws.run(home.home(), &["clean-cache", "--clean-command", &clean]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(predicate::str::contains("Would run").eval(&stdout(&output)));
    assert!(ws.cache().join("wheels-v1/numpy.whl").exists());

    let output = ws.run(
        home.home(),
        &["clean-cache", "--yes", "--verify", "--clean-command", &clean],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(predicate::str::contains("freed 58.59 KB (2 files)").eval(&text));
    assert!(predicate::str::contains("0.00 B remaining").eval(&text));
    assert!(!ws.cache().join("wheels-v1").exists());

    let entries = LogStore::<CleanupLogEntry>::open(ws.cleanup_log(), DEFAULT_CAPACITY)
        .read()
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].files_removed, Some(2));
    assert_eq!(entries[0].size_after, Some(0));
}

#[cfg(unix)]
#[test]
fn test_binary_monitor_records_new_packages() {
    let home = TempHomeGuard::new();
    let ws = Workspace::new();
    let project = ws.project("demo", 3);
    ws.install(&project, "six", 100);
    let install = format!(
        "mkdir -p .venv/lib/python3.12/site-packages/requests && \
         head -c 5000 /dev/zero > .venv/lib/python3.12/site-packages/requests/__init__.py && \
         head -c 7000 /dev/zero > '{}/requests.whl' && echo installed",
        ws.cache().display()
    );

    let output = ws.run(
        home.home(),
        &[
            "monitor",
            "--project-dir",
            project.to_str().unwrap(),
            "--",
            &install,
        ],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(predicate::str::contains("installed").eval(&text));
    assert!(predicate::str::contains("New packages: requests").eval(&text));
    assert!(predicate::str::contains("Total change: +11.72 KB").eval(&text));

    let entries = LogStore::<MonitorLogEntry>::open(ws.monitor_log(), DEFAULT_CAPACITY)
        .read()
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].delta_bytes, 12_000);
    assert_eq!(entries[0].cache_delta, 7_000);
    assert_eq!(entries[0].environment_delta, 5_000);
    assert_eq!(entries[0].new_packages, vec!["requests".to_string()]);
    assert_eq!(entries[0].exit_code, Some(0));

    let output = ws.run(home.home(), &["history", "--monitor"]);
    assert!(predicate::str::contains("+11.72 KB").eval(&stdout(&output)));
}

#[cfg(unix)]
#[test]
fn test_binary_monitor_reports_failing_command() {
    let home = TempHomeGuard::new();
    let ws = Workspace::new();
    let project = ws.project("demo", 1);

    let output = ws.run(
        home.home(),
        &["monitor", "--project-dir", project.to_str().unwrap(), "--", "exit", "3"],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(predicate::str::contains("Exit code: 3").eval(&stdout(&output)));
    assert!(predicate::str::contains("exited with status 3").eval(&stderr(&output)));
    assert!(predicate::str::contains("Total change: 0.00 B").eval(&stdout(&output)));

    let entries = LogStore::<MonitorLogEntry>::open(ws.monitor_log(), DEFAULT_CAPACITY)
        .read()
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].exit_code, Some(3));
    assert_eq!(entries[0].command, "exit 3");
}
