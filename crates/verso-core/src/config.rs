//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::id::{ContentHashIds, IdStrategy, SequentialIds};

/// Which commit identifier scheme a repository uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdStrategyKind {
    /// SHA-256 over the commit's content and sequence number.
    #[default]
    ContentHash,
    /// Prefix + repository instance id + monotonic counter.
    Sequential,
}

impl std::str::FromStr for IdStrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "content-hash" | "content_hash" | "hash" => Ok(IdStrategyKind::ContentHash),
            "sequential" | "counter" => Ok(IdStrategyKind::Sequential),
            other => Err(format!("unknown id strategy: '{other}'")),
        }
    }
}

/// Settings fixed when a repository is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Name of the branch created by `initialize`.
    pub default_branch: String,
    pub id_strategy: IdStrategyKind,
    /// Prefix for sequential ids.
    pub id_prefix: String,
    /// Number of id characters shown in messages and listings.
    pub short_id_len: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_branch: "main".to_string(),
            id_strategy: IdStrategyKind::ContentHash,
            id_prefix: "commit_".to_string(),
            short_id_len: 7,
        }
    }
}

impl EngineConfig {
    /// Build the identifier strategy this config selects.
    pub fn build_id_strategy(&self) -> Box<dyn IdStrategy> {
        match self.id_strategy {
            IdStrategyKind::ContentHash => Box::new(ContentHashIds),
            IdStrategyKind::Sequential => Box::new(SequentialIds::new(self.id_prefix.clone())),
        }
    }
}
