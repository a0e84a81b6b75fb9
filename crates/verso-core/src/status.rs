//! Repository status snapshot.

use serde::Serialize;

/// Read-only view of the repository returned by `Repository::status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    pub current_branch: String,
    /// Staged paths, sorted.
    pub staged_paths: Vec<String>,
    /// Branch names in creation order.
    pub branch_names: Vec<String>,
    /// Total commits ever made in this repository.
    pub commit_count: usize,
}

impl Status {
    /// True if nothing is staged.
    pub fn is_clean(&self) -> bool {
        self.staged_paths.is_empty()
    }

    /// Format a brief one-line summary.
    pub fn brief(&self) -> String {
        let staged = if self.is_clean() {
            "clean".to_string()
        } else {
            format!("{}-staged", self.staged_paths.len())
        };
        format!(
            "on:{} {} branches:{} commits:{}",
            self.current_branch,
            staged,
            self.branch_names.len(),
            self.commit_count
        )
    }
}
