//! Implementation of uv-hold subcommands.
//!
//! `mod.rs` is a thin dispatcher; command logic lives in dedicated modules
//! (`analyze`, `clean`, `monitor`, `history`) and rendering in `display`.

use std::path::{Path, PathBuf};

use crate::cli::{Cli, Commands};
use crate::error::{HoldError, Result};

pub(crate) mod analyze;
pub(crate) mod clean;
pub(crate) mod display;
pub(crate) mod history;
pub(crate) mod monitor;

pub use analyze::{analyze, candidates, recommend};
pub use clean::{clean_cache, remove, sweep};
pub use history::history;
pub use monitor::monitor;

#[cfg(test)]
mod tests;

/// Execute commands based on the parsed CLI arguments.
pub fn execute(cli: &Cli) -> Result<()> {
    execute_with_dir(cli, None)
}

/// Execute commands with an explicit working directory.
///
/// The working directory is where `monitor` runs when no project directory is
/// given.
pub fn execute_with_dir(cli: &Cli, working_dir: Option<&Path>) -> Result<()> {
    let opts = cli.global_opts();

    let current_dir = if let Some(dir) = working_dir {
        dir.to_path_buf()
    } else {
        std::env::current_dir().map_err(|source| HoldError::IoError {
            path: PathBuf::from("."),
            source,
        })?
    };

    match cli.command() {
        Commands::Analyze { top } => analyze(opts, *top),
        Commands::Candidates => candidates(opts),
        Commands::Recommend {
            cache_threshold,
            env_count_threshold,
        } => recommend(opts, cache_threshold, *env_count_threshold),
        Commands::CleanCache {
            yes,
            verify,
            clean_command,
        } => clean_cache(opts, *yes, *verify, clean_command),
        Commands::Remove { path, yes } => {
            let path = if path.is_relative() {
                current_dir.join(path)
            } else {
                path.clone()
            };
            remove(opts, &path, *yes)
        }
        Commands::Sweep { yes } => sweep(opts, *yes),
        Commands::Monitor {
            project_dir,
            command,
        } => monitor(opts, project_dir.as_deref(), command, &current_dir),
        Commands::History {
            monitor,
            limit,
            clear,
        } => history(opts, *monitor, *limit, *clear),
    }
}
