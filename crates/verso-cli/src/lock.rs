//! State-file locking.
//!
//! The engine assumes one writer at a time. Separate `verso` processes get
//! that discipline from an advisory file lock (`flock(2)` on Unix) via the
//! `fs2` crate. The OS releases the lock if the process dies.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use fs2::FileExt;

/// Name of the lock file inside `.verso/`.
pub const LOCK_FILE: &str = "verso.lock";

/// An exclusive lock on a verso state directory.
///
/// Held for the lifetime of the value and released on drop.
#[derive(Debug)]
pub struct StateLock {
    _file: File,
}

impl StateLock {
    /// Acquire the lock, polling until `timeout` expires.
    pub fn acquire(dir: &Path, timeout: Duration) -> Result<Self> {
        let lock_path = dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("cannot open {}", lock_path.display()))?;

        let start = Instant::now();
        let poll_interval = Duration::from_millis(10);

        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(StateLock { _file: file }),
                Err(_) if start.elapsed() >= timeout => {
                    bail!(
                        "could not lock {} within {}ms",
                        lock_path.display(),
                        timeout.as_millis()
                    );
                }
                Err(_) => std::thread::sleep(poll_interval),
            }
        }
    }
}
