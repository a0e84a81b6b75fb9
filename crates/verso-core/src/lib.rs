//! verso-core: an in-memory versioned-content engine.
//!
//! Tracks named text artifacts through a staging area, snapshots them into
//! immutable **commits**, keeps commits in named **branches**, and computes
//! line-level **diffs** between any two contents. The library does no I/O;
//! callers own a [`Repository`] and persist it through [`RepoSnapshot`] if
//! they want it to outlive the process.

pub mod branch;
pub mod commit;
pub mod config;
pub mod diff;
pub mod error;
pub mod id;
pub mod repo;
pub mod staging;
pub mod status;

pub use commit::{Commit, CommitId, StagedFile};
pub use config::{EngineConfig, IdStrategyKind};
pub use diff::{file_stats, generate_diff, DiffLine, FileDiff, FileStats, LineTag};
pub use error::{VersoError, VersoResult};
pub use repo::{RepoSnapshot, Repository, StageOutcome};
pub use status::Status;
