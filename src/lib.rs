//! # uv-hold
//!
//! Finds the disk space held by the uv package cache and by per-project
//! virtual environments, flags what is safe to reclaim, and reclaims it on
//! request.
//!
//! ## Overview
//!
//! Python projects managed with uv accumulate a shared download cache and one
//! `.venv` per project. Both grow silently. uv-hold measures them, decides
//! which environments look abandoned, and records every cleanup it performs.
//!
//! ## Key Features
//!
//! - **Disk-usage accounting**: block-level sizes like `du`, or apparent sizes
//!   with `--apparent-size`
//! - **Unused-environment detection**: inactivity, missing version control
//!   and near-empty projects, each reported as a separate reason
//! - **Space monitoring**: before/after deltas and new packages around any
//!   command, e.g. `uv pip install`
//! - **Capped JSON logs**: the last 100 cleanups and monitor sessions
//!
//! ## Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`probe`]: size and project-activity measurements
//! - [`analysis`]: cache and environment analyzers, the classifier, and
//!   candidate and recommendation derivation
//! - [`monitor`]: before/after snapshots around an external command
//! - [`cleanup`]: confirmed cache cleaning and environment removal
//! - [`journal`]: the capped cleanup and monitor logs
//! - [`runner`]: the external process seam
//! - [`cli`] and [`commands`]: the command-line interface
//! - [`error`]: error types and handling with thiserror + miette
//!
//! ## Usage
//!
//! ```bash
//! # Where did my disk go?
//! uv-hold analyze
//!
//! # What could be removed, and why?
//! uv-hold candidates
//!
//! # How much does this install cost?
//! uv-hold monitor -- uv pip install torch
//! ```
//!
//! ## Library Usage
//!
//! ```no_run
//! use uv_hold::cli::{Cli, Commands, GlobalOpts};
//! use uv_hold::commands;
//!
//! let cli = Cli::builder()
//!     .global_opts(GlobalOpts::builder().base_path("/home/me/code/python").build())
//!     .command(Commands::Candidates)
//!     .build()?;
//!
//! commands::execute(&cli)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Error Handling
//!
//! The crate uses a combination of:
//! - `thiserror` for strongly-typed errors
//! - `miette` for rich diagnostic output in CLI
//!
//! All public functions return `Result` types with descriptive error variants.

pub mod analysis;
pub mod cleanup;
pub mod cli;
pub mod commands;
pub mod error;
pub mod journal;
pub mod monitor;
pub mod probe;
pub mod report;
pub mod runner;
pub mod units;

// Internal modules
mod logging;
