//! Staging area.
//!
//! Holds content that will go into the next commit, keyed by path.
//! Staging the same path again replaces the earlier entry.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::commit::StagedFile;

/// Pending content waiting for the next commit.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StagingArea {
    /// Map of path -> staged content.
    pub entries: BTreeMap<String, StagedFile>,
}

impl StagingArea {
    /// Insert or overwrite `path`, stamped with the current time.
    pub fn stage(&mut self, path: &str, content: String) {
        self.entries.insert(
            path.to_string(),
            StagedFile {
                content,
                staged_at: Utc::now(),
            },
        );
    }

    /// Staged content for `path`.
    pub fn get(&self, path: &str) -> Option<&StagedFile> {
        self.entries.get(path)
    }

    /// Staged paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Move every entry out, leaving the area empty.
    pub fn take(&mut self) -> BTreeMap<String, StagedFile> {
        std::mem::take(&mut self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_staging() {
        let staging = StagingArea::default();
        assert!(staging.is_empty());
        assert!(staging.get("foo.rs").is_none());
    }

    #[test]
    fn test_last_write_wins() {
        let mut staging = StagingArea::default();
        staging.stage("f.txt", "v1".to_string());
        staging.stage("f.txt", "v2".to_string());

        assert_eq!(staging.len(), 1);
        assert_eq!(staging.get("f.txt").unwrap().content, "v2");
    }

    #[test]
    fn test_accepts_empty_path_and_content() {
        let mut staging = StagingArea::default();
        staging.stage("", String::new());
        assert_eq!(staging.paths(), vec![String::new()]);
        assert_eq!(staging.get("").unwrap().content, "");
    }

    #[test]
    fn test_take_clears() {
        let mut staging = StagingArea::default();
        staging.stage("b.txt", "b".to_string());
        staging.stage("a.txt", "a".to_string());

        let taken = staging.take();
        assert_eq!(taken.len(), 2);
        assert!(staging.is_empty());
        assert_eq!(taken.keys().collect::<Vec<_>>(), vec!["a.txt", "b.txt"]);
    }
}
