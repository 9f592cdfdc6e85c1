//! Cache and environment analysis.
//!
//! This module turns raw probe measurements into the reports and cleanup
//! candidates the commands display:
//!
//! - [`CacheAnalyzer`]: size of the package cache and its subdirectories
//! - [`EnvironmentAnalyzer`]: discovery and measurement of `.venv`
//!   directories, plus per-package sizes
//! - [`classifier`]: OR-of-signals detection of unused environments
//! - [`Survey`]: one full analysis run, from which [`candidates`] and
//!   [`recommendations`] are derived
//!
//! # Example
//!
//! ```no_run
//! use chrono::Utc;
//! use uv_hold::analysis::{
//!     CacheAnalyzer, CandidatePolicy, EnvironmentAnalyzer, Survey, Thresholds, candidates,
//! };
//! use uv_hold::probe::{MetadataProbe, SizeProbe};
//!
//! let size = SizeProbe::default();
//! let cache = CacheAnalyzer::new("/home/me/.cache/uv", size);
//! let envs = EnvironmentAnalyzer::new(size, MetadataProbe::new(".venv", "py"), 8);
//!
//! let survey = Survey::take(&cache, &envs, "/home/me/code/python".as_ref())?;
//! let policy = CandidatePolicy {
//!     thresholds: Thresholds::new(30, 500 * 1024 * 1024, 5),
//!     ignore_below_bytes: 1024 * 1024,
//! };
//! for candidate in candidates(&survey, &policy, Utc::now()) {
//!     println!("{} ({} bytes)", candidate.target.display(), candidate.estimated_bytes_freed);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod cache;
pub mod classifier;
mod environment;
mod survey;

pub use cache::CacheAnalyzer;
pub use classifier::{Thresholds, Usage, classify};
pub use environment::{Discover, EnvironmentAnalyzer};
pub use survey::{
    CandidatePolicy, Recommendation, RecommendationKind, RecommendationPolicy, Survey,
    candidates, recommendations,
};
