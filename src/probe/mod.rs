//! Read-only filesystem probes.
//!
//! - [`SizeProbe`] measures directory subtrees
//! - [`MetadataProbe`] derives activity signals for a project directory
//!
//! Neither probe caches anything; each call rescans the filesystem.

mod metadata;
mod size;

pub use metadata::{MetadataProbe, VCS_MARKERS};
pub(crate) use metadata::to_utc;
pub use size::{Breakdown, SizeMode, SizeProbe, Tally};
