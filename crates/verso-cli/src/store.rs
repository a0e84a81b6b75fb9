//! On-disk home for a repository between invocations.
//!
//! The engine itself is purely in-memory. The CLI keeps a JSON snapshot in
//! `.verso/state.json` and holds an exclusive lock on `.verso/` for the
//! whole load, mutate, save cycle of one command.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::debug;
use verso_core::{RepoSnapshot, Repository};

use crate::fsutil::atomic_write;
use crate::lock::StateLock;
use crate::settings::Settings;

/// Snapshot file name inside the state directory.
pub const STATE_FILE: &str = "state.json";

/// A locked state directory.
#[derive(Debug)]
pub struct Store {
    state_path: PathBuf,
    _lock: StateLock,
}

impl Store {
    /// Open an existing state directory.
    pub fn open(cwd: &Path, settings: &Settings) -> Result<Self> {
        let dir = cwd.join(&settings.state_dir);
        if !dir.join(STATE_FILE).exists() {
            bail!(
                "not a verso repository (missing {}); run `verso init`",
                settings.state_dir.join(STATE_FILE).display()
            );
        }
        Self::lock(dir, settings)
    }

    /// Open the state directory, creating it if needed.
    pub fn create(cwd: &Path, settings: &Settings) -> Result<Self> {
        let dir = cwd.join(&settings.state_dir);
        fs::create_dir_all(&dir).with_context(|| format!("cannot create {}", dir.display()))?;
        Self::lock(dir, settings)
    }

    fn lock(dir: PathBuf, settings: &Settings) -> Result<Self> {
        let lock = StateLock::acquire(&dir, Duration::from_millis(settings.lock_timeout_ms))?;
        Ok(Self {
            state_path: dir.join(STATE_FILE),
            _lock: lock,
        })
    }

    /// Load the stored repository, if one has been saved.
    pub fn load(&self) -> Result<Option<Repository>> {
        if !self.state_path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&self.state_path)
            .with_context(|| format!("cannot read {}", self.state_path.display()))?;
        let snapshot: RepoSnapshot = serde_json::from_str(&data)
            .with_context(|| format!("corrupt state file {}", self.state_path.display()))?;
        let repo = Repository::from_snapshot(snapshot)?;
        debug!(path = %self.state_path.display(), "loaded repository");
        Ok(Some(repo))
    }

    /// Load the stored repository, failing if there is none.
    pub fn load_existing(&self) -> Result<Repository> {
        match self.load()? {
            Some(repo) => Ok(repo),
            None => bail!("not a verso repository; run `verso init`"),
        }
    }

    /// Persist the repository atomically.
    pub fn save(&self, repo: &Repository) -> Result<()> {
        let json = serde_json::to_string_pretty(&repo.snapshot())?;
        atomic_write(&self.state_path, json.as_bytes())?;
        debug!(path = %self.state_path.display(), "saved repository");
        Ok(())
    }
}
