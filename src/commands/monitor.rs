//! Monitor command implementation.

use std::path::Path;

use super::display;
use crate::cli::{GlobalOpts, normalize_path};
use crate::error::{HoldError, Result};
use crate::journal::{DEFAULT_CAPACITY, LogStore};
use crate::monitor::SpaceMonitor;
use crate::runner::ShellRunner;

/// Executes the monitor command.
///
/// The command runs through the shell in the project directory, with its
/// output captured and echoed once it finishes. A non-zero exit is reported
/// but does not fail uv-hold.
pub fn monitor(
    opts: &GlobalOpts,
    project_dir: Option<&Path>,
    command: &[String],
    working_dir: &Path,
) -> Result<()> {
    let log = opts.logger();

    if command.is_empty() {
        return Err(HoldError::ConfigError(
            "No command given to monitor".to_string(),
        ));
    }
    let command_line = command.join(" ");
    let project_dir = match project_dir {
        Some(dir) if dir.is_relative() => normalize_path(working_dir.join(dir)),
        Some(dir) => normalize_path(dir),
        None => working_dir.to_path_buf(),
    };

    let monitor = SpaceMonitor::new(
        opts.cache_analyzer()?,
        opts.environment_analyzer(),
        ShellRunner,
    )
    .with_log(LogStore::open(opts.get_monitor_log()?, DEFAULT_CAPACITY));

    log.info(format!(
        "Monitoring '{command_line}' in {}",
        project_dir.display()
    ));
    let session = monitor.monitor(&command_line, &project_dir)?;

    if !session.output.stdout.is_empty() {
        print!("{}", session.output.stdout);
    }
    if !session.output.stderr.is_empty() {
        eprint!("{}", session.output.stderr);
    }

    print!("{}", display::monitor_summary(&session));

    for line in display::failure_lines(&session.failures) {
        log.warn(line);
    }
    if let Some(code) = session.exit_code().filter(|code| *code != 0) {
        log.warn(format!("'{command_line}' exited with status {code}"));
    }
    if let Some(warning) = &session.log_warning {
        log.warn(format!("Session was not logged cleanly: {warning}"));
    }
    log.verbose(
        1,
        format!("Session logged to {}", opts.get_monitor_log()?.display()),
    );
    Ok(())
}
