//! Commits: immutable snapshots of staged content.
//!
//! A commit records what was staged, who committed it, why, and on which
//! branch. Once built, nothing in the crate mutates a commit.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque commit identifier, unique within one repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(String);

impl CommitId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The first `len` characters (the whole id if shorter).
    pub fn short(&self, len: usize) -> &str {
        match self.0.char_indices().nth(len) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CommitId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Content of one path together with the moment it was staged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StagedFile {
    pub content: String,
    pub staged_at: DateTime<Utc>,
}

/// A commit: snapshot of the staging area plus metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Commit {
    /// Identifier produced by the repository's id strategy.
    pub id: CommitId,
    /// Caller-supplied description of the change.
    pub message: String,
    /// Caller-supplied identity.
    pub author: String,
    /// When the commit was created.
    pub timestamp: DateTime<Utc>,
    /// Path -> content exactly as staged at commit time.
    pub files: BTreeMap<String, StagedFile>,
    /// Branch that was checked out when the commit was made.
    pub branch: String,
}

impl Commit {
    /// Abbreviated id for display.
    pub fn short_id(&self, len: usize) -> &str {
        self.id.short(len)
    }

    /// Content recorded for `path`, if this commit touched it.
    pub fn file(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(|f| f.content.as_str())
    }

    /// Paths recorded in this commit, sorted.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }
}
