//! Persisted records of the commit history.
//!
//! Branches own an append-only chain of commits. Each commit points at exactly
//! one revision, and each revision holds an immutable content snapshot. None
//! of these records is ever mutated or deleted once written.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::{BranchId, CommitId, IntentId, RevisionId};

/// A manuscript document: section name to arbitrarily structured value.
pub type Content = BTreeMap<String, Value>;

/// An independent commit chain for one manuscript.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub id: BranchId,
    pub manuscript_id: String,
    pub created_at: DateTime<Utc>,
}

/// An immutable pointer to a content snapshot plus chain linkage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    pub id: CommitId,
    pub branch_id: BranchId,
    /// `None` only for the first commit of a branch.
    pub parent_commit_id: Option<CommitId>,
    /// Hex BLAKE3 hash over the commit's linkage fields.
    pub commit_hash: String,
    pub commit_message: Option<String>,
    /// Rows written by older authoring flows may lack a revision link.
    pub revision_id: Option<RevisionId>,
    /// Hex hash of the linked revision's canonical content. Informational only.
    pub content_hash: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Commit {
    /// Returns `true` if this is the first commit of its branch.
    pub fn is_root(&self) -> bool {
        self.parent_commit_id.is_none()
    }
}

/// An immutable content snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Revision {
    pub id: RevisionId,
    pub branch_id: BranchId,
    pub content: Content,
    /// 1-based, strictly increasing per branch.
    pub revision_number: u64,
    pub commit_message: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle of a rollback intent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentStatus {
    /// Audited, but the new revision has not been created yet.
    Pending,
    /// Claimed by one caller that is creating the new revision.
    #[serde(rename = "in_progress")]
    InProgress,
    /// The new revision and commit exist.
    Completed,
}

/// Durable record of a requested rollback, written in the same transaction
/// as its audit event and completed once the new revision exists.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackIntent {
    pub id: IntentId,
    pub branch_id: BranchId,
    pub target_commit_id: CommitId,
    pub target_revision_id: RevisionId,
    pub content_hash: String,
    pub commit_message: String,
    pub actor_id: String,
    pub status: IntentStatus,
    pub new_revision_id: Option<RevisionId>,
    pub new_revision_number: Option<u64>,
    pub new_commit_id: Option<CommitId>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl RollbackIntent {
    /// Returns `true` while the new revision is still outstanding.
    pub fn is_pending(&self) -> bool {
        self.status == IntentStatus::Pending
    }

    /// Returns `true` until the intent is completed.
    pub fn is_open(&self) -> bool {
        self.status != IntentStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn commit_serializes_camel_case() {
        let commit = Commit {
            id: CommitId::new(),
            branch_id: BranchId::new(),
            parent_commit_id: None,
            commit_hash: "ab".into(),
            commit_message: Some("first draft".into()),
            revision_id: Some(RevisionId::new()),
            content_hash: None,
            created_by: "author-1".into(),
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&commit).unwrap();
        assert!(value.get("parentCommitId").is_some());
        assert!(value.get("commitHash").is_some());
        assert_eq!(value["createdBy"], json!("author-1"));
        assert!(commit.is_root());
    }

    #[test]
    fn revision_content_roundtrips() {
        let mut content = Content::new();
        content.insert("chapter-1".into(), json!({"title": "Opening", "words": 1200}));
        let revision = Revision {
            id: RevisionId::new(),
            branch_id: BranchId::new(),
            content,
            revision_number: 1,
            commit_message: None,
            created_by: "author-1".into(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&revision).unwrap();
        let back: Revision = serde_json::from_str(&json).unwrap();
        assert_eq!(back, revision);
    }
}
