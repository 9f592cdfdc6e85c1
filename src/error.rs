//! Error types for uv-hold.
//!
//! This module defines all error types used throughout uv-hold, using
//! a combination of `thiserror` for ergonomic error definitions and `miette`
//! for rich diagnostic output.
//!
//! # Error Handling Strategy
//!
//! - All errors derive from [`HoldError`]
//! - Filesystem errors are classified by [`std::io::ErrorKind`] through
//!   [`HoldError::io`], so a missing path always surfaces as
//!   [`HoldError::NotFound`] and an unreadable one as
//!   [`HoldError::PermissionDenied`]
//! - Bulk scans never abort on a single bad path; they collect the error next
//!   to the path in a [`ScanFailure`](crate::report::ScanFailure)
//! - Errors are automatically converted to `miette::Result` for CLI output
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use uv_hold::error::{HoldError, Result};
//!
//! fn require_cache(path: &Path) -> Result<()> {
//!     if !path.exists() {
//!         return Err(HoldError::NotFound(path.to_path_buf()));
//!     }
//!     Ok(())
//! }
//! ```

use std::io;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use thiserror::Error;

/// Error types that can occur in uv-hold operations
#[derive(Error, Debug, Diagnostic)]
pub enum HoldError {
    /// A path that was asked to be measured or removed does not exist.
    ///
    /// Many callers treat this as an empty state (a missing cache is simply
    /// a cache of size zero).
    #[error("Path not found: '{0}'")]
    #[diagnostic(code(uv_hold::fs::not_found))]
    NotFound(
        /// The missing path
        PathBuf,
    ),

    /// A path exists but could not be read.
    ///
    /// Scans skip such paths with a warning instead of aborting.
    #[error("Permission denied reading '{path}'")]
    #[diagnostic(
        code(uv_hold::fs::permission_denied),
        help("Check the ownership and mode of the directory, or run as its owner.")
    )]
    PermissionDenied {
        /// The unreadable path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Any other file system I/O error.
    #[error("I/O error accessing '{path}'")]
    #[diagnostic(code(uv_hold::io_error))]
    IoError {
        /// The path that caused the I/O error
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// An external command could not be started at all.
    ///
    /// A command that starts and exits with a non-zero status is not an
    /// error; only a failure to launch it is.
    #[error("Failed to run command '{command}'")]
    #[diagnostic(
        code(uv_hold::command::execution),
        help("Make sure the program exists and is on your PATH.")
    )]
    CommandExecution {
        /// The command line that was attempted
        command: String,
        /// The underlying spawn error
        #[source]
        source: io::Error,
    },

    /// A cleanup or monitor log could not be written.
    ///
    /// The action that produced the entry has already completed; this error
    /// is reported next to its outcome and never undoes it.
    #[error("Failed to write log file '{path}'")]
    #[diagnostic(
        code(uv_hold::log::write_error),
        help("Check that the log's directory exists and is writable, or pass another log path.")
    )]
    LogWrite {
        /// The log file path
        path: PathBuf,
        /// The underlying error
        #[source]
        source: io::Error,
    },

    /// A log file exists but does not contain a JSON array of entries.
    #[error("Log file '{path}' is not a valid JSON log")]
    #[diagnostic(
        code(uv_hold::log::corrupt),
        help("Run 'uv-hold history --clear' to start a fresh log.")
    )]
    LogCorrupt {
        /// The log file path
        path: PathBuf,
        /// The underlying parse error
        #[source]
        source: serde_json::Error,
    },

    /// Invalid size specification such as `--small-env-size`.
    ///
    /// Valid suffixes are B (bytes), K (kilobytes), M (megabytes),
    /// G (gigabytes), or T (terabytes). Numbers without suffix are bytes.
    #[error("Invalid size: '{0}' - {1}")]
    #[diagnostic(
        code(uv_hold::config::invalid_size),
        help(
            "Specify a size as a number with optional suffix (e.g., '5G', '500M', '1024K', or \
             raw bytes)"
        )
    )]
    InvalidSize(
        /// The invalid size value provided
        String,
        /// Description of the parsing error
        String,
    ),

    /// Configuration could not be resolved.
    #[error("Configuration error: {0}")]
    #[diagnostic(
        code(uv_hold::config::error),
        help("Check the required configuration parameters.")
    )]
    ConfigError(
        /// Description of the configuration error
        String,
    ),

    /// A removal target is not an environment directory.
    ///
    /// Removal only ever deletes directories named after the environment
    /// marker (`.venv` by default).
    #[error("Refusing to remove '{path}': not a '{marker}' directory")]
    #[diagnostic(
        code(uv_hold::remove::not_an_environment),
        help("Pass the path of the environment directory itself, e.g. 'project/.venv'.")
    )]
    NotAnEnvironment {
        /// The rejected path
        path: PathBuf,
        /// The expected directory name
        marker: String,
    },
}

impl HoldError {
    /// Classify an I/O error raised while accessing `path`.
    pub fn io(path: &Path, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => HoldError::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => HoldError::PermissionDenied {
                path: path.to_path_buf(),
                source,
            },
            _ => HoldError::IoError {
                path: path.to_path_buf(),
                source,
            },
        }
    }

    /// Classify a `walkdir` traversal error, falling back to `root` when the
    /// error carries no path of its own.
    pub(crate) fn walk(root: &Path, err: walkdir::Error) -> Self {
        let path = err.path().unwrap_or(root).to_path_buf();
        match err.into_io_error() {
            Some(source) => HoldError::io(&path, source),
            None => HoldError::IoError {
                path,
                source: io::Error::other("filesystem loop detected"),
            },
        }
    }

    /// Whether this error means the path simply does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, HoldError::NotFound(_))
    }
}

/// Type alias for Results in this crate
pub type Result<T> = std::result::Result<T, HoldError>;
