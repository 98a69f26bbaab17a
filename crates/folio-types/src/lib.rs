//! Foundation types for Folio, the manuscript version-control core.
//!
//! Every other Folio crate depends on `folio-types`.
//!
//! # Key Types
//!
//! - [`BranchId`], [`CommitId`], [`RevisionId`], [`IntentId`] -- UUID v7 identifiers
//! - [`Branch`] -- an independent commit chain for one manuscript
//! - [`Commit`] -- immutable pointer to a revision plus chain linkage
//! - [`Revision`] -- immutable content snapshot
//! - [`Content`] -- keyed manuscript document (section name → value)
//! - [`AuditEvent`] -- append-only audit record with a dedupe key
//! - [`RollbackIntent`] -- outbox row tracking a rollback until its revision exists

pub mod audit;
pub mod error;
pub mod id;
pub mod records;

pub use audit::{ActorType, AuditEvent};
pub use error::TypeError;
pub use id::{BranchId, CommitId, IntentId, RevisionId};
pub use records::{Branch, Commit, Content, IntentStatus, Revision, RollbackIntent};
