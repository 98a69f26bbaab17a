//! Request options and response bodies of the Folio operations.
//!
//! Every response serializes with camelCase field names.

use std::fmt;
use std::str::FromStr;

use folio_diff::SectionChange;
use folio_types::{BranchId, Commit, CommitId, IntentId, RevisionId};
use serde::{Deserialize, Serialize};

use crate::error::SdkError;

/// How a diff is produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffStrategy {
    /// Recomputed from the two revisions on every request.
    #[default]
    Computed,
    /// Read from a persisted diff. Always rejected as not implemented.
    Stored,
}

impl DiffStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            DiffStrategy::Computed => "computed",
            DiffStrategy::Stored => "stored",
        }
    }
}

impl fmt::Display for DiffStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiffStrategy {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "computed" => Ok(DiffStrategy::Computed),
            "stored" => Ok(DiffStrategy::Stored),
            other => Err(SdkError::InvalidRequest(format!(
                "unsupported diff strategy {other:?}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCommitsResponse {
    pub branch_id: BranchId,
    pub commits: Vec<Commit>,
    pub total: u64,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffResponse {
    pub from_commit_id: CommitId,
    pub to_commit_id: CommitId,
    pub strategy: DiffStrategy,
    pub unified_diff: String,
    pub section_summary: Vec<SectionChange>,
    pub added_line_count: usize,
    pub removed_line_count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackResponse {
    pub success: bool,
    pub new_revision_id: RevisionId,
    pub new_revision_number: u64,
    pub new_commit_id: CommitId,
    pub rolled_back_to_commit_id: CommitId,
    pub intent_id: IntentId,
}
