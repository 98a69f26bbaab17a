//! Transport-agnostic API for Folio.
//!
//! [`Folio`] exposes the three public operations (list a branch's commits,
//! diff two commits, roll a branch back to an earlier commit) with request
//! validation, camelCase response bodies and a single error taxonomy
//! ([`ErrorKind`]) that transports map onto their own status codes.

pub mod error;
pub mod response;
pub mod service;

pub use error::{ErrorKind, SdkError, SdkResult};
pub use response::{DiffResponse, DiffStrategy, ListCommitsResponse, RollbackResponse};
pub use service::{Folio, Pagination};

// Re-export key types
pub use folio_diff::{SectionAction, SectionChange};
pub use folio_types::{Branch, BranchId, Commit, CommitId, Content, IntentId, RevisionId};
