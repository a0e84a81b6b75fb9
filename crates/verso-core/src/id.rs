//! Commit identifier generation.
//!
//! Identifier generation is a strategy: the repository owns a monotonic
//! sequence number and hands it, together with the commit being built,
//! to an [`IdStrategy`]. Both shipped strategies fold the sequence number
//! into the id, so two commits of one repository never share an id.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::commit::{CommitId, StagedFile};

/// Everything known about a commit before its id exists.
#[derive(Debug, Clone, Copy)]
pub struct CommitDraft<'a> {
    /// Instance id of the repository creating the commit.
    pub instance: &'a Uuid,
    pub message: &'a str,
    pub author: &'a str,
    pub timestamp: &'a DateTime<Utc>,
    pub branch: &'a str,
    pub files: &'a BTreeMap<String, StagedFile>,
}

/// Produces commit identifiers.
///
/// Implementations must return distinct ids for distinct `seq` values
/// within one repository instance.
pub trait IdStrategy: Send + Sync {
    fn generate(&self, seq: u64, draft: &CommitDraft<'_>) -> CommitId;
}

/// SHA-256 over the draft, hex encoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentHashIds;

impl IdStrategy for ContentHashIds {
    fn generate(&self, seq: u64, draft: &CommitDraft<'_>) -> CommitId {
        let mut hasher = Sha256::new();
        hasher.update(draft.instance.as_bytes());
        hasher.update(seq.to_le_bytes());
        update_field(&mut hasher, draft.message.as_bytes());
        update_field(&mut hasher, draft.author.as_bytes());
        update_field(&mut hasher, draft.timestamp.to_rfc3339().as_bytes());
        update_field(&mut hasher, draft.branch.as_bytes());
        for (path, file) in draft.files {
            update_field(&mut hasher, path.as_bytes());
            update_field(&mut hasher, file.content.as_bytes());
        }
        CommitId::new(hex_encode(&hasher.finalize()))
    }
}

/// `{prefix}{instance}-{seq}` with the first 8 hex digits of the instance id.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl IdStrategy for SequentialIds {
    fn generate(&self, seq: u64, draft: &CommitDraft<'_>) -> CommitId {
        let instance = draft.instance.simple().to_string();
        CommitId::new(format!("{}{}-{seq:06}", self.prefix, &instance[..8]))
    }
}

/// Length-prefix each field so adjacent fields cannot run together.
fn update_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

/// Encode raw bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(content: &str) -> BTreeMap<String, StagedFile> {
        let mut map = BTreeMap::new();
        map.insert(
            "a.txt".to_string(),
            StagedFile {
                content: content.to_string(),
                staged_at: Utc::now(),
            },
        );
        map
    }

    #[test]
    fn test_content_hash_deterministic() {
        let instance = Uuid::new_v4();
        let ts = Utc::now();
        let f = files("hello");
        let draft = CommitDraft {
            instance: &instance,
            message: "msg",
            author: "bob",
            timestamp: &ts,
            branch: "main",
            files: &f,
        };
        let h1 = ContentHashIds.generate(1, &draft);
        let h2 = ContentHashIds.generate(1, &draft);
        assert_eq!(h1, h2);
        // SHA-256 produces 64 hex characters
        assert_eq!(h1.as_str().len(), 64);
    }

    #[test]
    fn test_content_hash_differs_by_sequence() {
        let instance = Uuid::new_v4();
        let ts = Utc::now();
        let f = files("same");
        let draft = CommitDraft {
            instance: &instance,
            message: "same",
            author: "same",
            timestamp: &ts,
            branch: "main",
            files: &f,
        };
        assert_ne!(
            ContentHashIds.generate(1, &draft),
            ContentHashIds.generate(2, &draft)
        );
    }

    #[test]
    fn test_field_boundaries_matter() {
        let instance = Uuid::new_v4();
        let ts = Utc::now();
        let f = files("x");
        let a = CommitDraft {
            instance: &instance,
            message: "ab",
            author: "c",
            timestamp: &ts,
            branch: "main",
            files: &f,
        };
        let b = CommitDraft {
            message: "a",
            author: "bc",
            ..a
        };
        assert_ne!(ContentHashIds.generate(1, &a), ContentHashIds.generate(1, &b));
    }

    #[test]
    fn test_sequential_format() {
        let instance = Uuid::new_v4();
        let ts = Utc::now();
        let f = files("x");
        let draft = CommitDraft {
            instance: &instance,
            message: "m",
            author: "a",
            timestamp: &ts,
            branch: "main",
            files: &f,
        };
        let id = SequentialIds::new("commit_").generate(42, &draft);
        assert!(id.as_str().starts_with("commit_"));
        assert!(id.as_str().ends_with("-000042"));
        assert_ne!(id, SequentialIds::new("commit_").generate(43, &draft));
    }
}
