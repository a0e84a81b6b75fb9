//! Error types for verso operations.

use thiserror::Error;

/// Every condition a repository operation can refuse with.
///
/// These are expected domain outcomes, not faults: the caller gets the
/// message back and the repository is left exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersoError {
    /// The staging area was empty at commit time.
    #[error("Nothing to commit")]
    NothingToCommit,
    /// A branch with this name already exists.
    #[error("Branch already exists: {0}")]
    BranchAlreadyExists(String),
    /// No branch with this name exists.
    #[error("Branch does not exist: {0}")]
    BranchNotFound(String),
    /// The checked-out branch cannot be removed.
    #[error("Cannot delete current branch: {0}")]
    CannotDeleteCurrentBranch(String),
    /// No commit matches the given id or prefix.
    #[error("Commit not found: {0}")]
    CommitNotFound(String),
    /// More than one commit matches the given prefix.
    #[error("Ambiguous commit id '{0}': use more characters")]
    AmbiguousCommitId(String),
    /// A restored snapshot breaks a repository invariant.
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

/// Convenience alias for Results in verso.
pub type VersoResult<T> = Result<T, VersoError>;
