//! Branches: named, ordered sequences of commit ids.

use serde::{Deserialize, Serialize};

use crate::commit::CommitId;

/// A branch and its history, oldest commit first.
///
/// Branches only hold ids; the commits themselves live once in the
/// repository's commit store and are shared by every branch naming them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Branch {
    pub name: String,
    pub commits: Vec<CommitId>,
}

impl Branch {
    /// A branch with no history.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commits: Vec::new(),
        }
    }

    /// A new branch whose history is a copy of `from`'s.
    pub fn fork(name: impl Into<String>, from: &Branch) -> Self {
        Self {
            name: name.into(),
            commits: from.commits.clone(),
        }
    }

    /// Newest commit id, if any.
    pub fn tip(&self) -> Option<&CommitId> {
        self.commits.last()
    }
}
