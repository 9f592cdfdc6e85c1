//! # uv-hold CLI
//!
//! The command-line interface for uv-hold, which finds and reclaims disk
//! space held by the uv package cache and project virtual environments.
//!
//! ## Commands
//!
//! - **analyze**: Cache breakdown, environments, and largest packages
//! - **candidates**: Everything that could be cleaned, with reasons
//! - **recommend**: Suggested actions and their savings
//! - **clean-cache**: Empty the package cache
//! - **remove**: Delete one virtual environment
//! - **sweep**: Delete every unused environment
//! - **monitor**: Measure the space consumed by a command
//! - **history**: Show or clear the cleanup and monitor logs
//!
//! Destructive commands only preview their effect unless `--yes` is given.
//!
//! ## Environment Variables
//!
//! - `UV_CACHE_DIR`: Cache directory, as understood by uv itself
//! - `UV_HOLD_CACHE_DIR`: Cache directory override (wins over `UV_CACHE_DIR`)
//! - `UV_HOLD_BASE_PATH`: Directory searched for environments
//! - `UV_HOLD_VERBOSE`: Enable verbose output
//! - `UV_HOLD_QUIET`: Silence all output except reports and errors
//!
//! See `uv-hold --help` for the remaining variables.

use std::io::IsTerminal;

use clap::Parser;
use uv_hold::cli::Cli;

fn main() -> miette::Result<()> {
    miette::set_panic_hook();

    if std::io::stderr().is_terminal() {
        miette::set_hook(Box::new(|_| {
            Box::new(
                miette::GraphicalReportHandler::new()
                    .with_theme(miette::GraphicalTheme::unicode_nocolor())
                    .with_context_lines(3),
            )
        }))?;
    } else {
        // Plain output for logs and pipes
        miette::set_hook(Box::new(|_| {
            Box::new(
                miette::GraphicalReportHandler::new()
                    .with_theme(miette::GraphicalTheme::none())
                    .with_context_lines(0),
            )
        }))?;
    }

    let cli = Cli::parse();

    uv_hold::commands::execute(&cli).map_err(Into::into)
}
