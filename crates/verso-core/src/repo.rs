//! Repository: the main entry point for verso operations.
//!
//! A Repository ties together the staging area, the commit store and the
//! branch table. It is a plain owned value: callers construct one, keep
//! it, and pass it by reference to whatever needs it. Nothing here does
//! I/O; persistence goes through [`RepoSnapshot`].

use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::branch::Branch;
use crate::commit::{Commit, CommitId, StagedFile};
use crate::config::EngineConfig;
use crate::diff::{self, DiffLine, FileDiff};
use crate::error::{VersoError, VersoResult};
use crate::id::{CommitDraft, IdStrategy};
use crate::staging::StagingArea;
use crate::status::Status;

/// Result of staging one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageOutcome {
    pub path: String,
    /// Every path staged after this call, sorted.
    pub staged: Vec<String>,
}

impl fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} staged", self.path)
    }
}

/// Serializable copy of a repository's full state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepoSnapshot {
    pub instance: Uuid,
    pub config: EngineConfig,
    /// Every commit ever made, oldest first.
    pub commits: Vec<Commit>,
    /// Branches in creation order.
    pub branches: Vec<Branch>,
    pub current_branch: String,
    pub staging: StagingArea,
    /// Sequence number the next commit will receive.
    pub next_seq: u64,
}

/// An in-memory verso repository.
pub struct Repository {
    /// Distinguishes this repository from any other, for id generation.
    instance: Uuid,
    config: EngineConfig,
    ids: Box<dyn IdStrategy>,
    /// Every commit ever made, oldest first. Never shrinks except on `initialize`.
    commits: Vec<Commit>,
    /// Commit id -> position in `commits`.
    by_id: HashMap<CommitId, usize>,
    /// Branches in creation order.
    branches: Vec<Branch>,
    current: String,
    staging: StagingArea,
    /// Monotonic across `initialize`, so ids stay unique for the instance's lifetime.
    next_seq: u64,
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("instance", &self.instance)
            .field("current", &self.current)
            .field("branches", &self.branches.len())
            .field("commits", &self.commits.len())
            .field("staged", &self.staging.len())
            .finish()
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository {
    /// Create an initialized repository with the default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an initialized repository with an explicit configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        let ids = config.build_id_strategy();
        Self::with_id_strategy(config, ids)
    }

    /// Create a repository that generates ids with a caller-supplied strategy.
    pub fn with_id_strategy(config: EngineConfig, ids: Box<dyn IdStrategy>) -> Self {
        let current = config.default_branch.clone();
        Self {
            instance: Uuid::new_v4(),
            branches: vec![Branch::new(current.clone())],
            current,
            config,
            ids,
            commits: Vec::new(),
            by_id: HashMap::new(),
            staging: StagingArea::default(),
            next_seq: 1,
        }
    }

    /// Discard all commits, branches and staged content.
    ///
    /// Leaves one empty default branch checked out. The id sequence is
    /// not reset.
    pub fn initialize(&mut self) {
        self.commits.clear();
        self.by_id.clear();
        self.branches = vec![Branch::new(self.config.default_branch.clone())];
        self.current = self.config.default_branch.clone();
        self.staging = StagingArea::default();
        info!(branch = %self.current, "repository initialized");
    }

    /// Stage `content` under `path`, replacing anything staged there before.
    ///
    /// Path and content are taken as-is; empty values are allowed.
    pub fn stage(&mut self, path: &str, content: impl Into<String>) -> StageOutcome {
        self.staging.stage(path, content.into());
        debug!(path, staged = self.staging.len(), "staged file");
        StageOutcome {
            path: path.to_string(),
            staged: self.staging.paths(),
        }
    }

    /// Snapshot the staging area into a new commit on the current branch.
    ///
    /// Fails with [`VersoError::NothingToCommit`] when nothing is staged,
    /// leaving the repository untouched.
    pub fn commit(&mut self, message: &str, author: &str) -> VersoResult<Commit> {
        if self.staging.is_empty() {
            warn!(branch = %self.current, "commit refused: nothing staged");
            return Err(VersoError::NothingToCommit);
        }

        let timestamp = Utc::now();
        let files = self.staging.take();
        let seq = self.next_seq;
        let id = self.ids.generate(
            seq,
            &CommitDraft {
                instance: &self.instance,
                message,
                author,
                timestamp: &timestamp,
                branch: &self.current,
                files: &files,
            },
        );
        assert!(
            !self.by_id.contains_key(&id),
            "id strategy produced duplicate commit id {id}"
        );

        let commit = Commit {
            id: id.clone(),
            message: message.to_string(),
            author: author.to_string(),
            timestamp,
            files,
            branch: self.current.clone(),
        };

        let position = self.current_position();
        self.next_seq += 1;
        self.by_id.insert(id.clone(), self.commits.len());
        self.commits.push(commit.clone());
        self.branches[position].commits.push(id);

        info!(
            id = commit.short_id(self.config.short_id_len),
            branch = %commit.branch,
            files = commit.files.len(),
            "created commit"
        );
        Ok(commit)
    }

    /// Create `name` as a copy of the current branch's history.
    ///
    /// Returns all branch names, in creation order.
    pub fn create_branch(&mut self, name: &str) -> VersoResult<Vec<String>> {
        if self.find_branch(name).is_some() {
            warn!(branch = name, "branch already exists");
            return Err(VersoError::BranchAlreadyExists(name.to_string()));
        }
        let branch = Branch::fork(name, &self.branches[self.current_position()]);
        info!(
            branch = name,
            from = %self.current,
            commits = branch.commits.len(),
            "created branch"
        );
        self.branches.push(branch);
        Ok(self.branch_names())
    }

    /// Switch the current branch. Staged content is left as it is.
    pub fn checkout(&mut self, name: &str) -> VersoResult<()> {
        if self.find_branch(name).is_none() {
            warn!(branch = name, "checkout of unknown branch");
            return Err(VersoError::BranchNotFound(name.to_string()));
        }
        debug!(from = %self.current, to = name, "checked out branch");
        self.current = name.to_string();
        Ok(())
    }

    /// Remove a branch that is not checked out.
    ///
    /// Returns whether a branch was actually removed; deleting an unknown
    /// name is a no-op. Commits stay in the store either way.
    pub fn delete_branch(&mut self, name: &str) -> VersoResult<bool> {
        if name == self.current {
            warn!(branch = name, "refusing to delete current branch");
            return Err(VersoError::CannotDeleteCurrentBranch(name.to_string()));
        }
        match self.find_branch(name) {
            Some(position) => {
                self.branches.remove(position);
                info!(branch = name, "deleted branch");
                Ok(true)
            }
            None => {
                debug!(branch = name, "delete of unknown branch ignored");
                Ok(false)
            }
        }
    }

    /// Current branch, staged paths, branch names and commit count.
    pub fn status(&self) -> Status {
        Status {
            current_branch: self.current.clone(),
            staged_paths: self.staging.paths(),
            branch_names: self.branch_names(),
            commit_count: self.commits.len(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn current_branch(&self) -> &str {
        &self.current
    }

    /// Branch names in creation order.
    pub fn branch_names(&self) -> Vec<String> {
        self.branches.iter().map(|b| b.name.clone()).collect()
    }

    pub fn branch(&self, name: &str) -> Option<&Branch> {
        self.find_branch(name).map(|i| &self.branches[i])
    }

    /// Total commits ever made (since the last `initialize`).
    pub fn commit_count(&self) -> usize {
        self.commits.len()
    }

    /// Staged content for `path`.
    pub fn staged(&self, path: &str) -> Option<&StagedFile> {
        self.staging.get(path)
    }

    /// Every commit, newest first.
    pub fn log(&self) -> Vec<&Commit> {
        self.commits.iter().rev().collect()
    }

    /// Commits of one branch, newest first.
    pub fn branch_log(&self, name: &str) -> VersoResult<Vec<&Commit>> {
        let branch = self
            .branch(name)
            .ok_or_else(|| VersoError::BranchNotFound(name.to_string()))?;
        Ok(branch
            .commits
            .iter()
            .rev()
            .filter_map(|id| self.get_commit(id.as_str()))
            .collect())
    }

    /// Look up a commit by its full id.
    pub fn get_commit(&self, id: &str) -> Option<&Commit> {
        self.by_id
            .get(&CommitId::new(id))
            .map(|&i| &self.commits[i])
    }

    /// Look up a commit by full id or unique prefix.
    pub fn resolve_commit(&self, prefix: &str) -> VersoResult<&Commit> {
        if let Some(commit) = self.get_commit(prefix) {
            return Ok(commit);
        }
        if prefix.is_empty() {
            return Err(VersoError::CommitNotFound(prefix.to_string()));
        }
        let mut matches = self
            .commits
            .iter()
            .filter(|c| c.id.as_str().starts_with(prefix));
        match (matches.next(), matches.next()) {
            (Some(commit), None) => Ok(commit),
            (Some(_), Some(_)) => Err(VersoError::AmbiguousCommitId(prefix.to_string())),
            (None, _) => Err(VersoError::CommitNotFound(prefix.to_string())),
        }
    }

    /// Commits preceding `id` in its history, newest first.
    ///
    /// Every branch holding `id` shares the same history up to it, so the
    /// first such branch is used. A commit no branch holds any more has no
    /// known ancestry.
    pub fn ancestors(&self, id: &str) -> VersoResult<Vec<&Commit>> {
        let commit = self.resolve_commit(id)?;
        let history = self.branches.iter().find_map(|b| {
            b.commits
                .iter()
                .position(|c| *c == commit.id)
                .map(|pos| &b.commits[..pos])
        });
        Ok(history
            .unwrap_or_default()
            .iter()
            .rev()
            .filter_map(|c| self.get_commit(c.as_str()))
            .collect())
    }

    /// Diff every file of a commit against its previous committed version.
    pub fn diff_commit(&self, id: &str) -> VersoResult<Vec<FileDiff>> {
        let commit = self.resolve_commit(id)?;
        let ancestors = self.ancestors(commit.id.as_str())?;
        Ok(commit
            .files
            .iter()
            .map(|(path, file)| {
                let old = ancestors.iter().find_map(|c| c.file(path)).unwrap_or("");
                FileDiff::compute(path, old, &file.content)
            })
            .collect())
    }

    /// Content of `path` in the newest commit on the current branch that recorded it.
    pub fn committed_content(&self, path: &str) -> Option<&str> {
        let branch = &self.branches[self.current_position()];
        branch
            .commits
            .iter()
            .rev()
            .filter_map(|id| self.get_commit(id.as_str()))
            .find_map(|c| c.file(path))
    }

    /// Diff the last committed content of `path` against its staged content.
    ///
    /// Returns `None` if `path` is not staged. A path never committed on
    /// the current branch diffs against empty content.
    pub fn diff_staged(&self, path: &str) -> Option<Vec<DiffLine>> {
        let staged = self.staging.get(path)?;
        let old = self.committed_content(path).unwrap_or("");
        Some(diff::generate_diff(old, &staged.content))
    }

    /// Copy the full state out for an external store.
    pub fn snapshot(&self) -> RepoSnapshot {
        RepoSnapshot {
            instance: self.instance,
            config: self.config.clone(),
            commits: self.commits.clone(),
            branches: self.branches.clone(),
            current_branch: self.current.clone(),
            staging: self.staging.clone(),
            next_seq: self.next_seq,
        }
    }

    /// Rebuild a repository from a snapshot, checking its invariants.
    pub fn from_snapshot(snapshot: RepoSnapshot) -> VersoResult<Self> {
        let mut by_id = HashMap::with_capacity(snapshot.commits.len());
        for (i, commit) in snapshot.commits.iter().enumerate() {
            if by_id.insert(commit.id.clone(), i).is_some() {
                return Err(VersoError::InvalidSnapshot(format!(
                    "duplicate commit id {}",
                    commit.id
                )));
            }
        }

        let mut names = HashSet::new();
        for branch in &snapshot.branches {
            if !names.insert(branch.name.as_str()) {
                return Err(VersoError::InvalidSnapshot(format!(
                    "duplicate branch {}",
                    branch.name
                )));
            }
            if let Some(missing) = branch.commits.iter().find(|id| !by_id.contains_key(*id)) {
                return Err(VersoError::InvalidSnapshot(format!(
                    "branch {} references unknown commit {missing}",
                    branch.name
                )));
            }
        }

        if !names.contains(snapshot.current_branch.as_str()) {
            return Err(VersoError::InvalidSnapshot(format!(
                "current branch {} does not exist",
                snapshot.current_branch
            )));
        }
        if snapshot.next_seq <= snapshot.commits.len() as u64 {
            return Err(VersoError::InvalidSnapshot(format!(
                "sequence {} is behind {} commit(s)",
                snapshot.next_seq,
                snapshot.commits.len()
            )));
        }

        let ids = snapshot.config.build_id_strategy();
        Ok(Self {
            instance: snapshot.instance,
            config: snapshot.config,
            ids,
            commits: snapshot.commits,
            by_id,
            branches: snapshot.branches,
            current: snapshot.current_branch,
            staging: snapshot.staging,
            next_seq: snapshot.next_seq,
        })
    }

    fn find_branch(&self, name: &str) -> Option<usize> {
        self.branches.iter().position(|b| b.name == name)
    }

    /// Position of the current branch; it always exists.
    fn current_position(&self) -> usize {
        match self.find_branch(&self.current) {
            Some(i) => i,
            None => unreachable!("current branch {} missing from branch table", self.current),
        }
    }
}
