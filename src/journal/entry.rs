use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupOperation {
    CacheClean,
    EnvironmentRemoval,
}

impl fmt::Display for CleanupOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanupOperation::CacheClean => write!(f, "cache clean"),
            CleanupOperation::EnvironmentRemoval => write!(f, "environment removal"),
        }
    }
}

/// One executed cleanup action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupLogEntry {
    pub timestamp: DateTime<Utc>,
    pub operation: CleanupOperation,
    pub target: PathBuf,
    pub bytes_freed: u64,
    /// Size of the target afterwards, when it was measured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_after: Option<u64>,
    /// File count reported by the cache-clean command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files_removed: Option<u64>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

/// One monitored command and the space it consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorLogEntry {
    pub timestamp: DateTime<Utc>,
    pub command: String,
    pub working_dir: PathBuf,
    pub bytes_before: u64,
    pub bytes_after: u64,
    pub delta_bytes: i64,
    pub cache_delta: i64,
    pub environment_delta: i64,
    #[serde(default)]
    pub new_packages: Vec<String>,
    #[serde(default)]
    pub removed_packages: Vec<String>,
    pub exit_code: Option<i32>,
}
