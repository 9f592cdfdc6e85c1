//! Capped JSON logs of cleanup actions and monitor sessions.
//!
//! A [`LogStore`] is a file holding a JSON array of entries. It is created
//! lazily on the first append and never holds more than its capacity: every
//! append evicts the oldest entries beyond it. Writes go to a temporary file
//! that is then renamed over the log, so a crash never leaves half an array
//! behind.
//!
//! # Example
//!
//! ```no_run
//! use uv_hold::journal::{CleanupLogEntry, DEFAULT_CAPACITY, LogStore};
//!
//! let log = LogStore::<CleanupLogEntry>::open("/home/me/.uv_disk_cleanup_log.json", DEFAULT_CAPACITY);
//! for entry in log.recent(10)? {
//!     println!("{} {} {}", entry.timestamp, entry.operation, entry.bytes_freed);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod entry;

use std::fs::{self, File};
use std::io::{self, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

pub use self::entry::{CleanupLogEntry, CleanupOperation, MonitorLogEntry};
use crate::error::{HoldError, Result};

/// Number of entries kept by the cleanup and monitor logs.
pub const DEFAULT_CAPACITY: usize = 100;

/// An append-only JSON log holding at most `capacity` entries.
#[derive(Debug, Clone)]
pub struct LogStore<T> {
    path: PathBuf,
    capacity: usize,
    _entries: PhantomData<fn() -> T>,
}

/// What an append did besides adding the entry.
#[derive(Debug)]
pub struct Appended {
    /// Entries in the log after the append.
    pub retained: usize,
    /// Set when the existing file was unreadable and had to be replaced.
    pub discarded: Option<HoldError>,
}

impl<T> LogStore<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Bind a store to `path`. Nothing touches the disk until the first
    /// [`append`](Self::append).
    pub fn open(path: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            path: path.into(),
            capacity,
            _entries: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries, oldest first. A log that was never written is empty.
    ///
    /// # Errors
    ///
    /// [`HoldError::LogCorrupt`] when the file is not a JSON array of
    /// entries, or an I/O error when it cannot be read.
    pub fn read(&self) -> Result<Vec<T>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(HoldError::io(&self.path, source)),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content).map_err(|source| HoldError::LogCorrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// The last `limit` entries, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<T>> {
        let mut entries = self.read()?;
        entries.reverse();
        entries.truncate(limit);
        Ok(entries)
    }

    /// Append `entry`, evicting the oldest entries beyond the capacity.
    ///
    /// A corrupt log is replaced by a fresh one holding only `entry`; the
    /// parse error is returned in [`Appended::discarded`].
    ///
    /// # Errors
    ///
    /// [`HoldError::LogWrite`] when the log cannot be written.
    pub fn append(&self, entry: T) -> Result<Appended> {
        let (mut entries, discarded) = match self.read() {
            Ok(entries) => (entries, None),
            Err(err @ HoldError::LogCorrupt { .. }) => (Vec::new(), Some(err)),
            Err(err) => return Err(self.write_error(err)),
        };

        entries.push(entry);
        truncate_oldest(&mut entries, self.capacity);
        self.write(&entries)?;

        Ok(Appended {
            retained: entries.len(),
            discarded,
        })
    }

    /// Delete the log file. Clearing a log that does not exist succeeds.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(HoldError::LogWrite {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn write(&self, entries: &[T]) -> Result<()> {
        let log_write = |source: io::Error| HoldError::LogWrite {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(log_write)?;
        }

        let json = serde_json::to_string_pretty(entries).map_err(|e| log_write(e.into()))?;

        let temp_path = self.path.with_extension("json.tmp");
        let mut temp_file = File::create(&temp_path).map_err(log_write)?;
        temp_file.write_all(json.as_bytes()).map_err(log_write)?;
        temp_file.write_all(b"\n").map_err(log_write)?;
        temp_file.sync_all().map_err(log_write)?;

        fs::rename(&temp_path, &self.path).map_err(|source| {
            let _ = fs::remove_file(&temp_path);
            log_write(source)
        })
    }

    fn write_error(&self, err: HoldError) -> HoldError {
        match err {
            HoldError::NotFound(_) => HoldError::LogWrite {
                path: self.path.clone(),
                source: io::Error::from(io::ErrorKind::NotFound),
            },
            HoldError::PermissionDenied { source, .. } | HoldError::IoError { source, .. } => {
                HoldError::LogWrite {
                    path: self.path.clone(),
                    source,
                }
            }
            other => other,
        }
    }
}

/// Drop entries from the front until at most `capacity` remain.
fn truncate_oldest<T>(entries: &mut Vec<T>, capacity: usize) {
    if entries.len() > capacity {
        let excess = entries.len() - capacity;
        entries.drain(..excess);
    }
}
