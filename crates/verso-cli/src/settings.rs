//! CLI settings.
//!
//! Layered with `figment`: built-in defaults, then `verso.toml` in the
//! working directory, then `VERSO_*` environment variables (nested keys
//! use a double underscore, e.g. `VERSO_ENGINE__ID_STRATEGY=sequential`).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use verso_core::EngineConfig;

/// Optional per-directory config file.
pub const CONFIG_FILE: &str = "verso.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the state file, relative to the working directory.
    pub state_dir: PathBuf,
    /// Author recorded when `commit` is given no `--author`.
    pub author: String,
    pub lock_timeout_ms: u64,
    /// Only consulted when a repository is first created.
    pub engine: EngineConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from(".verso"),
            author: "anonymous".to_string(),
            lock_timeout_ms: 5000,
            engine: EngineConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings for a working directory.
    pub fn load(cwd: &Path) -> Result<Self> {
        Self::figment(cwd)
            .merge(Env::prefixed("VERSO_").split("__"))
            .extract()
            .context("invalid verso configuration")
    }

    /// Defaults merged with the config file, without the environment.
    fn figment(cwd: &Path) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(cwd.join(CONFIG_FILE)))
    }
}
