//! Command-line interface definitions for uv-hold.
//!
//! This module defines the CLI structure using clap, including all subcommands
//! and their arguments. The main entry point is the [`Cli`] struct.
//!
//! # Example
//!
//! ```no_run
//! use clap::Parser;
//! use uv_hold::cli::{Cli, Commands};
//!
//! let cli = Cli::parse();
//!
//! match cli.command() {
//!     Commands::Analyze { top } => println!("Showing the {top} largest packages"),
//!     Commands::Remove { path, .. } => println!("Removing {}", path.display()),
//!     _ => {}
//! }
//! ```


use std::path::{Component, Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::analysis::{CacheAnalyzer, CandidatePolicy, EnvironmentAnalyzer, Thresholds};
use crate::cleanup::DEFAULT_CLEAN_COMMAND;
use crate::error::{HoldError, Result};
use crate::logging::Logger;
use crate::probe::{MetadataProbe, SizeMode, SizeProbe};
use crate::units::parse_size;

/// Directory levels below the base path searched for environments.
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// Main command-line interface for uv-hold.
///
/// This struct represents the top-level CLI configuration, containing both
/// global options that apply to all commands and the specific subcommand
/// to execute.
#[derive(Debug, Parser)]
#[command(
    name = "uv-hold",
    bin_name = "uv-hold",
    author,
    version,
    about = "Find and reclaim disk space held by the uv cache and project virtual environments",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    global_opts: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

/// Global options that apply to all uv-hold commands.
///
/// These control where the cache and projects live, how sizes are measured,
/// where logs are kept, and how chatty the output is.
#[derive(Debug, Parser)]
pub struct GlobalOpts {
    /// Package cache directory (defaults to $UV_CACHE_DIR, then ~/.cache/uv)
    #[arg(long, global = true, env = "UV_HOLD_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Directory searched for project environments (defaults to
    /// ~/code/python)
    #[arg(long, global = true, env = "UV_HOLD_BASE_PATH")]
    base_path: Option<PathBuf>,

    /// How many directory levels below the base path to search
    #[arg(
        long,
        global = true,
        default_value_t = DEFAULT_MAX_DEPTH,
        env = "UV_HOLD_MAX_DEPTH"
    )]
    max_depth: usize,

    /// Directory name that marks a virtual environment
    #[arg(long, global = true, default_value = ".venv", env = "UV_HOLD_ENV_NAME")]
    env_name: String,

    /// Extension of the projects' source files
    #[arg(long, global = true, default_value = "py", env = "UV_HOLD_SOURCE_EXT")]
    source_ext: String,

    /// Report logical file sizes instead of allocated disk blocks
    #[arg(long, global = true, env = "UV_HOLD_APPARENT_SIZE")]
    apparent_size: bool,

    /// Cleanup log file (defaults to ~/.uv_disk_cleanup_log.json)
    #[arg(long, global = true, env = "UV_HOLD_CLEANUP_LOG")]
    cleanup_log: Option<PathBuf>,

    /// Monitor log file (defaults to ~/.uv_space_log.json)
    #[arg(long, global = true, env = "UV_HOLD_MONITOR_LOG")]
    monitor_log: Option<PathBuf>,

    #[command(flatten)]
    thresholds: ThresholdOpts,

    /// Enable verbose output (use multiple times for more verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count, env = "UV_HOLD_VERBOSE")]
    verbose: u8,

    /// Silence all output except for reports and errors
    #[arg(
        short,
        long,
        global = true,
        conflicts_with = "verbose",
        env = "UV_HOLD_QUIET"
    )]
    quiet: bool,
}

/// Limits used to decide whether an environment is unused.
#[derive(Debug, Clone, Args)]
pub struct ThresholdOpts {
    /// Days without any file change after which a project is inactive
    #[arg(long, global = true, default_value_t = 30, env = "UV_HOLD_INACTIVE_DAYS")]
    inactive_days: u32,

    /// Environments of unversioned projects smaller than this are flagged
    /// (e.g., "500M", "1G")
    #[arg(
        long,
        global = true,
        default_value = "500M",
        env = "UV_HOLD_SMALL_ENV_SIZE"
    )]
    small_env_size: String,

    /// Projects with fewer source files than this are flagged
    #[arg(long, global = true, default_value_t = 5, env = "UV_HOLD_MIN_SOURCE_FILES")]
    min_source_files: usize,

    /// Environments smaller than this are never listed as candidates
    #[arg(long, global = true, default_value = "1M", env = "UV_HOLD_IGNORE_BELOW")]
    ignore_below: String,
}

impl Default for ThresholdOpts {
    fn default() -> Self {
        Self {
            inactive_days: 30,
            small_env_size: "500M".to_string(),
            min_source_files: 5,
            ignore_below: "1M".to_string(),
        }
    }
}

impl ThresholdOpts {
    pub fn inactive_days(mut self, days: u32) -> Self {
        self.inactive_days = days;
        self
    }

    pub fn small_env_size(mut self, size: impl Into<String>) -> Self {
        self.small_env_size = size.into();
        self
    }

    pub fn min_source_files(mut self, count: usize) -> Self {
        self.min_source_files = count;
        self
    }

    pub fn ignore_below(mut self, size: impl Into<String>) -> Self {
        self.ignore_below = size.into();
        self
    }

    /// Parse the options into classifier thresholds.
    pub fn thresholds(&self) -> Result<Thresholds> {
        Ok(Thresholds::new(
            self.inactive_days,
            parse_size(&self.small_env_size)?,
            self.min_source_files,
        ))
    }

    /// Parse the options into the policy used to list candidates.
    pub fn candidate_policy(&self) -> Result<CandidatePolicy> {
        Ok(CandidatePolicy {
            thresholds: self.thresholds()?,
            ignore_below_bytes: parse_size(&self.ignore_below)?,
        })
    }
}

impl GlobalOpts {
    /// Create a new builder for constructing `GlobalOpts` programmatically.
    pub fn builder() -> GlobalOptsBuilder {
        GlobalOptsBuilder::default()
    }

    /// The effective cache directory.
    ///
    /// `--cache-dir` wins, then the package manager's own `UV_CACHE_DIR`,
    /// then `~/.cache/uv`.
    pub fn get_cache_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.cache_dir {
            return Ok(normalize_path(dir));
        }
        if let Some(dir) = std::env::var_os("UV_CACHE_DIR").filter(|d| !d.is_empty()) {
            return Ok(normalize_path(PathBuf::from(dir)));
        }
        Ok(home_dir()?.join(".cache").join("uv"))
    }

    /// The effective base path searched for environments.
    pub fn get_base_path(&self) -> Result<PathBuf> {
        match &self.base_path {
            Some(path) => Ok(normalize_path(path)),
            None => Ok(home_dir()?.join("code").join("python")),
        }
    }

    /// The effective cleanup log path.
    pub fn get_cleanup_log(&self) -> Result<PathBuf> {
        match &self.cleanup_log {
            Some(path) => Ok(normalize_path(path)),
            None => Ok(home_dir()?.join(".uv_disk_cleanup_log.json")),
        }
    }

    /// The effective monitor log path.
    pub fn get_monitor_log(&self) -> Result<PathBuf> {
        match &self.monitor_log {
            Some(path) => Ok(normalize_path(path)),
            None => Ok(home_dir()?.join(".uv_space_log.json")),
        }
    }

    pub fn size_probe(&self) -> SizeProbe {
        if self.apparent_size {
            SizeProbe::new(SizeMode::Apparent)
        } else {
            SizeProbe::new(SizeMode::Disk)
        }
    }

    pub fn metadata_probe(&self) -> MetadataProbe {
        MetadataProbe::new(&self.env_name, &self.source_ext)
    }

    pub fn cache_analyzer(&self) -> Result<CacheAnalyzer> {
        Ok(CacheAnalyzer::new(self.get_cache_dir()?, self.size_probe()))
    }

    pub fn environment_analyzer(&self) -> EnvironmentAnalyzer {
        EnvironmentAnalyzer::new(self.size_probe(), self.metadata_probe(), self.max_depth)
    }

    pub(crate) fn logger(&self) -> Logger {
        Logger::new(self.verbose, self.quiet)
    }

    /// Get the cache directory option
    pub fn cache_dir(&self) -> Option<&Path> {
        self.cache_dir.as_deref()
    }

    /// Get the base path option
    pub fn base_path(&self) -> Option<&Path> {
        self.base_path.as_deref()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn env_name(&self) -> &str {
        &self.env_name
    }

    pub fn source_ext(&self) -> &str {
        &self.source_ext
    }

    pub fn apparent_size(&self) -> bool {
        self.apparent_size
    }

    pub fn thresholds(&self) -> &ThresholdOpts {
        &self.thresholds
    }

    /// Get the verbose level
    pub fn verbose(&self) -> u8 {
        self.verbose
    }

    /// Check if quiet mode is enabled
    pub fn quiet(&self) -> bool {
        self.quiet
    }
}

/// Builder for constructing `GlobalOpts` programmatically.
///
/// This builder provides a fluent API for creating `GlobalOpts` instances
/// without going through command-line parsing. Useful for testing and
/// programmatic usage.
#[derive(Debug)]
pub struct GlobalOptsBuilder {
    cache_dir: Option<PathBuf>,
    base_path: Option<PathBuf>,
    max_depth: usize,
    env_name: String,
    source_ext: String,
    apparent_size: bool,
    cleanup_log: Option<PathBuf>,
    monitor_log: Option<PathBuf>,
    thresholds: ThresholdOpts,
    verbose: u8,
    quiet: bool,
}

impl Default for GlobalOptsBuilder {
    fn default() -> Self {
        Self {
            cache_dir: None,
            base_path: None,
            max_depth: DEFAULT_MAX_DEPTH,
            env_name: ".venv".to_string(),
            source_ext: "py".to_string(),
            apparent_size: false,
            cleanup_log: None,
            monitor_log: None,
            thresholds: ThresholdOpts::default(),
            verbose: 0,
            quiet: false,
        }
    }
}

impl GlobalOptsBuilder {
    /// Set the cache directory.
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Set the base path searched for environments.
    pub fn base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn env_name(mut self, name: impl Into<String>) -> Self {
        self.env_name = name.into();
        self
    }

    pub fn source_ext(mut self, ext: impl Into<String>) -> Self {
        self.source_ext = ext.into();
        self
    }

    /// Measure logical file sizes instead of disk blocks.
    pub fn apparent_size(mut self, enabled: bool) -> Self {
        self.apparent_size = enabled;
        self
    }

    pub fn cleanup_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.cleanup_log = Some(path.into());
        self
    }

    pub fn monitor_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.monitor_log = Some(path.into());
        self
    }

    pub fn thresholds(mut self, thresholds: ThresholdOpts) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Set the verbosity level (0 = normal, 1+ = verbose).
    pub fn verbose(mut self, level: u8) -> Self {
        self.verbose = level;
        self
    }

    /// Enable or disable quiet mode.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Build the `GlobalOpts` instance with the configured values.
    pub fn build(self) -> GlobalOpts {
        GlobalOpts {
            cache_dir: self.cache_dir,
            base_path: self.base_path,
            max_depth: self.max_depth,
            env_name: self.env_name,
            source_ext: self.source_ext,
            apparent_size: self.apparent_size,
            cleanup_log: self.cleanup_log,
            monitor_log: self.monitor_log,
            thresholds: self.thresholds,
            verbose: self.verbose,
            quiet: self.quiet,
        }
    }
}

impl Cli {
    /// Get the global options
    pub fn global_opts(&self) -> &GlobalOpts {
        &self.global_opts
    }

    /// Get the command
    pub fn command(&self) -> &Commands {
        &self.command
    }

    /// Create a builder for programmatic construction
    pub fn builder() -> CliBuilder {
        CliBuilder::default()
    }
}

/// Builder for [`Cli`]
#[derive(Debug, Default)]
pub struct CliBuilder {
    global_opts: Option<GlobalOpts>,
    command: Option<Commands>,
}

impl CliBuilder {
    /// Set the global options
    pub fn global_opts(mut self, opts: GlobalOpts) -> Self {
        self.global_opts = Some(opts);
        self
    }

    /// Set the command
    pub fn command(mut self, command: Commands) -> Self {
        self.command = Some(command);
        self
    }

    /// Build the Cli instance
    pub fn build(self) -> Result<Cli> {
        let command = self
            .command
            .ok_or_else(|| HoldError::ConfigError("Command is required".to_string()))?;

        Ok(Cli {
            global_opts: self
                .global_opts
                .unwrap_or_else(|| GlobalOpts::builder().build()),
            command,
        })
    }
}

fn home_dir() -> Result<PathBuf> {
    home::home_dir().ok_or_else(|| {
        HoldError::ConfigError(
            "Could not determine the home directory; pass the path explicitly".to_string(),
        )
    })
}

/// Normalize a path to be absolute and clean, without requiring it to exist.
///
/// This function:
/// - Converts relative paths to absolute using the current directory
/// - Removes `.` and `..` components where possible
/// - Does NOT resolve symlinks (preserves user intent)
/// - Does NOT require the path to exist
pub(crate) fn normalize_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();

    let absolute = if path.is_relative() {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    } else {
        path.to_path_buf()
    };

    let mut components = Vec::new();
    for component in absolute.components() {
        match component {
            Component::ParentDir => {
                if let Some(last) = components.last()
                    && !matches!(last, Component::ParentDir | Component::RootDir)
                {
                    components.pop();
                    continue;
                }
                if matches!(components.last(), Some(Component::RootDir)) {
                    continue;
                }
                components.push(component);
            }
            Component::CurDir => continue,
            _ => components.push(component),
        }
    }

    components.into_iter().collect()
}

/// Available uv-hold subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Show what the cache and the environments occupy
    ///
    /// Prints the cache size with its largest subdirectories, every
    /// environment under the base path (largest first), and the largest
    /// packages of the largest environment.
    Analyze {
        /// Number of entries shown in each ranking
        #[arg(long, default_value_t = 10, env = "UV_HOLD_TOP")]
        top: usize,
    },

    /// List everything that could be cleaned, with the reasons
    ///
    /// Environments are flagged when any signal matches:
    /// - no file changed for longer than --inactive-days
    /// - no version control and smaller than --small-env-size
    /// - fewer source files than --min-source-files
    Candidates,

    /// Suggest cleanup actions and the space they would free
    Recommend {
        /// Recommend cleaning the cache once it is larger than this
        #[arg(long, default_value = "5G", env = "UV_HOLD_CACHE_THRESHOLD")]
        cache_threshold: String,

        /// Suggest a review once there are more environments than this
        #[arg(long, default_value_t = 10, env = "UV_HOLD_ENV_COUNT_THRESHOLD")]
        env_count_threshold: usize,
    },

    /// Empty the package cache
    ///
    /// Runs the cache-clean command (default: `uv cache clean`). Without
    /// --yes only the size that would be freed is shown.
    CleanCache {
        /// Actually clean; without this flag nothing is changed
        #[arg(short, long)]
        yes: bool,

        /// Measure the cache again after cleaning
        #[arg(long)]
        verify: bool,

        /// Command that empties the cache
        #[arg(long, default_value = DEFAULT_CLEAN_COMMAND, env = "UV_HOLD_CLEAN_COMMAND")]
        clean_command: String,
    },

    /// Delete one virtual environment
    ///
    /// The path must be an existing environment directory (e.g.
    /// `project/.venv`). Without --yes only the size is shown.
    Remove {
        /// Environment directory to delete
        path: PathBuf,

        /// Actually delete; without this flag nothing is changed
        #[arg(short, long)]
        yes: bool,
    },

    /// Delete every environment listed by `candidates`
    Sweep {
        /// Actually delete; without this flag nothing is changed
        #[arg(short, long)]
        yes: bool,
    },

    /// Run a command and report the disk space it consumed
    ///
    /// Measures the cache and the project's environments before and after the
    /// command, and lists packages that were installed or removed. Example:
    /// `uv-hold monitor -- uv pip install requests`
    Monitor {
        /// Project whose environments are measured (defaults to the current
        /// directory)
        #[arg(long, env = "UV_HOLD_PROJECT_DIR")]
        project_dir: Option<PathBuf>,

        /// The command to run
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Show or clear the cleanup log (or the monitor log with --monitor)
    History {
        /// Show the monitor log instead of the cleanup log
        #[arg(long)]
        monitor: bool,

        /// Number of entries to show, newest first
        #[arg(long, default_value_t = 20)]
        limit: usize,

        /// Delete the log instead of showing it
        #[arg(long)]
        clear: bool,
    },
}
