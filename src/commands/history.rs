//! History command implementation.

use super::display;
use crate::cli::GlobalOpts;
use crate::error::Result;
use crate::journal::{CleanupLogEntry, DEFAULT_CAPACITY, LogStore, MonitorLogEntry};

/// Executes the history command: shows or clears one of the two logs.
pub fn history(opts: &GlobalOpts, monitor: bool, limit: usize, clear: bool) -> Result<()> {
    let log = opts.logger();

    if monitor {
        let store = LogStore::<MonitorLogEntry>::open(opts.get_monitor_log()?, DEFAULT_CAPACITY);
        if clear {
            store.clear()?;
            log.info(format!("Cleared {}", store.path().display()));
            return Ok(());
        }
        log.verbose(1, format!("Reading {}", store.path().display()));
        print!("{}", display::monitor_history(&store.recent(limit)?));
    } else {
        let store = LogStore::<CleanupLogEntry>::open(opts.get_cleanup_log()?, DEFAULT_CAPACITY);
        if clear {
            store.clear()?;
            log.info(format!("Cleared {}", store.path().display()));
            return Ok(());
        }
        log.verbose(1, format!("Reading {}", store.path().display()));
        print!("{}", display::cleanup_history(&store.recent(limit)?));
    }
    Ok(())
}
