//! Append-only commit history storage for Folio.
//!
//! Every branch owns a singly-linked chain of commits, and every commit points
//! at one immutable revision. Storage is relational in shape: tables of
//! branches, commits, revisions, audit events and rollback intents, written
//! through explicit transactions.
//!
//! # Storage Backends
//!
//! - [`Database`] -- in-memory tables with exclusive write [`Transaction`]s
//! - [`InMemoryCommitStore`] -- the [`CommitStore`] implementation over it
//!
//! # Design Rules
//!
//! 1. Commits and revisions are immutable once committed; nothing deletes them.
//! 2. A commit's parent is the head of its own branch at append time.
//! 3. A transaction's writes become visible all at once, or not at all.
//! 4. Reads never block on anything but an open write transaction.
//! 5. All storage errors are propagated, never silently ignored.

pub mod database;
pub mod error;
pub mod memory;
pub mod traits;

pub use database::{Database, NewCommit, Tables, Transaction};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryCommitStore;
pub use traits::{CommitPage, CommitStore};
