//! Destructive commands: clean-cache, remove, sweep.
//!
//! Each one only previews its effect unless `--yes` was given.

use std::path::Path;

use chrono::Utc;

use super::analyze::take_survey;
use super::display;
use crate::analysis::candidates;
use crate::cleanup::{Cleaner, CleanupOutcome, Confirmation, DEFAULT_CLEAN_COMMAND};
use crate::cli::{GlobalOpts, normalize_path};
use crate::error::Result;
use crate::journal::{DEFAULT_CAPACITY, LogStore};
use crate::logging::Logger;
use crate::report::CandidateKind;
use crate::runner::ShellRunner;
use crate::units::format_size;

fn cleaner(opts: &GlobalOpts, clean_command: &str) -> Result<Cleaner<ShellRunner>> {
    let log = LogStore::open(opts.get_cleanup_log()?, DEFAULT_CAPACITY);
    Ok(Cleaner::new(
        opts.cache_analyzer()?,
        opts.size_probe(),
        opts.env_name(),
        ShellRunner,
    )
    .with_clean_command(clean_command)
    .with_log(log))
}

fn confirmation(yes: bool) -> Option<Confirmation> {
    yes.then(Confirmation::given)
}

fn report_outcome(log: &Logger, outcome: &CleanupOutcome) {
    println!("{}", display::outcome_line(outcome));
    if let Some(warning) = &outcome.log_warning {
        log.warn(format!("Cleanup completed but was not logged cleanly: {warning}"));
    }
}

/// Executes the clean-cache command.
pub fn clean_cache(opts: &GlobalOpts, yes: bool, verify: bool, clean_command: &str) -> Result<()> {
    let log = opts.logger();
    let cleaner = cleaner(opts, clean_command)?;
    let cache = opts.cache_analyzer()?;

    let Some(confirmed) = confirmation(yes) else {
        let size = cache.total()?;
        println!(
            "Would run '{}' and free about {} from {}",
            cleaner.clean_command(),
            format_size(size),
            cache.root().display()
        );
        println!("Re-run with --yes to clean the cache.");
        return Ok(());
    };

    log.info(format!("Running '{}'...", cleaner.clean_command()));
    let outcome = cleaner.clean_cache(confirmed, verify)?;
    report_outcome(&log, &outcome);
    Ok(())
}

/// Executes the remove command.
pub fn remove(opts: &GlobalOpts, path: &Path, yes: bool) -> Result<()> {
    let log = opts.logger();
    let cleaner = cleaner(opts, DEFAULT_CLEAN_COMMAND)?;
    let env = normalize_path(path);

    let Some(confirmed) = confirmation(yes) else {
        let size = cleaner.plan_removal(&env)?;
        println!("Would remove {} ({})", env.display(), format_size(size));
        println!("Re-run with --yes to delete it.");
        return Ok(());
    };

    log.verbose(1, format!("Removing {}", env.display()));
    let outcome = cleaner.remove_environment(&env, confirmed)?;
    report_outcome(&log, &outcome);
    Ok(())
}

/// Executes the sweep command.
///
/// Removes every environment classified as unused. The cache is left alone;
/// use `clean-cache` for it.
pub fn sweep(opts: &GlobalOpts, yes: bool) -> Result<()> {
    let log = opts.logger();
    let policy = opts.thresholds().candidate_policy()?;
    let survey = take_survey(opts, &log)?;

    let environments: Vec<_> = candidates(&survey, &policy, Utc::now())
        .into_iter()
        .filter(|c| c.kind == CandidateKind::Environment)
        .collect();

    if environments.is_empty() {
        println!("No unused environments found.");
        return Ok(());
    }

    let Some(confirmed) = confirmation(yes) else {
        print!("{}", display::candidate_table(&environments));
        println!("Re-run with --yes to delete these environments.");
        return Ok(());
    };

    let cleaner = cleaner(opts, DEFAULT_CLEAN_COMMAND)?;
    let report = cleaner.sweep(&environments, confirmed);

    for outcome in &report.removed {
        report_outcome(&log, outcome);
    }
    for failure in &report.failures {
        log.warn(format!("Could not remove {failure}"));
    }
    println!(
        "Removed {} environment(s), freed {}",
        report.removed.len(),
        format_size(report.bytes_freed())
    );
    Ok(())
}
