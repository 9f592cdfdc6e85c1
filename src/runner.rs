//! Running external commands.
//!
//! Cache cleaning and monitoring both shell out. They do so through
//! [`ProcessRunner`] so tests can substitute a runner that mutates a fixture
//! tree instead of invoking a real package manager.

use std::io;
use std::path::Path;
use std::process::Command;

use crate::error::{HoldError, Result};

/// Captured result of a command that was started.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Stdout followed by stderr, for tools that report on either stream.
    pub fn combined(&self) -> String {
        let mut text = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&self.stderr);
        }
        text
    }
}

/// Runs a command line in a working directory.
///
/// Implementations must return [`HoldError::CommandExecution`] only when the
/// command could not be started. A command that runs and fails is reported
/// through [`CommandOutput::exit_code`].
pub trait ProcessRunner {
    fn run(&self, command: &str, working_dir: &Path) -> Result<CommandOutput>;
}

/// Runs commands through the platform shell (`sh -c`, or `cmd /C` on
/// Windows), capturing both output streams.
///
/// The shell reports a program it cannot find or execute through its own
/// exit status (127 and 126, or 9009 for `cmd`). Those statuses are
/// returned as [`HoldError::CommandExecution`], the same as a shell that
/// fails to spawn.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl ProcessRunner for ShellRunner {
    fn run(&self, command: &str, working_dir: &Path) -> Result<CommandOutput> {
        let mut shell = if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C");
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.arg("-c");
            cmd
        };

        let output = shell
            .arg(command)
            .current_dir(working_dir)
            .output()
            .map_err(|source| HoldError::CommandExecution {
                command: command.to_string(),
                source,
            })?;

        let captured = CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if let Some(kind) = captured.exit_code.and_then(launch_failure) {
            return Err(HoldError::CommandExecution {
                command: command.to_string(),
                source: io::Error::new(kind, captured.stderr.trim().to_string()),
            });
        }
        Ok(captured)
    }
}

fn launch_failure(exit_code: i32) -> Option<io::ErrorKind> {
    match exit_code {
        127 if cfg!(unix) => Some(io::ErrorKind::NotFound),
        126 if cfg!(unix) => Some(io::ErrorKind::PermissionDenied),
        9009 if cfg!(windows) => Some(io::ErrorKind::NotFound),
        _ => None,
    }
}
