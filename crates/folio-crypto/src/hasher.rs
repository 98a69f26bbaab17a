use chrono::{DateTime, Utc};
use folio_types::{BranchId, CommitId, Content, RevisionId};
use serde_json::json;

use crate::canonical::{canonical_content, canonical_value};

/// Domain-separated BLAKE3 hasher.
///
/// The domain tag is prepended to every input, so a document and a commit
/// with identical bytes never share a hash.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for canonical revision content.
    pub const CONTENT: Self = Self {
        domain: "folio-content-v1",
    };
    /// Hasher for commit linkage records.
    pub const COMMIT: Self = Self {
        domain: "folio-commit-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        *hasher.finalize().as_bytes()
    }

    /// Hash raw bytes and return the lowercase hex digest.
    pub fn hash_hex(&self, data: &[u8]) -> String {
        hex::encode(self.hash(data))
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

/// Hex content hash of a document, computed over its canonical rendering.
pub fn content_hash(content: &Content) -> String {
    ContentHasher::CONTENT.hash_hex(canonical_content(content).as_bytes())
}

/// Fields covered by a commit hash.
#[derive(Clone, Debug)]
pub struct CommitFields<'a> {
    pub branch_id: BranchId,
    pub parent_commit_id: Option<CommitId>,
    pub revision_id: Option<RevisionId>,
    pub content_hash: Option<&'a str>,
    pub message: Option<&'a str>,
    pub author: &'a str,
    pub created_at: DateTime<Utc>,
}

/// Hex hash identifying a commit's position and payload in its chain.
pub fn commit_hash(fields: &CommitFields<'_>) -> String {
    let record = json!({
        "branchId": fields.branch_id,
        "parentCommitId": fields.parent_commit_id,
        "revisionId": fields.revision_id,
        "contentHash": fields.content_hash,
        "message": fields.message,
        "author": fields.author,
        "createdAt": fields.created_at,
    });
    ContentHasher::COMMIT.hash_hex(canonical_value(&record).as_bytes())
}
